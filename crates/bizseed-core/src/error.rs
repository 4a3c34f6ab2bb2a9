//! # Error Types
//!
//! Defines `BizSeedError`, the unified error enum for every failure mode in
//! the BizSeed pipeline. Every variant carries enough context (domain, table
//! name, column name, store path) to diagnose a failed run without re-running
//! it.
//!
//! The variants fall into four groups:
//!
//! - catalog defects (`UnknownDomain`, `SchemaDefinition`, `CyclicSchema`,
//!   `CatalogFile`): fatal at load time, never fixed by retrying;
//! - caller-input defects (`UnknownTable`, `InvalidRowCount`,
//!   `EmptyParentPool`, `Config`): the run is aborted before anything is
//!   written;
//! - I/O failures while writing (`Materialization`): the destination is left
//!   untouched or in its prior valid state;
//! - verification-time failures (`MissingTable`, `DatabaseUnreadable`).

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can occur in BizSeed operations.
#[derive(Error, Debug)]
pub enum BizSeedError {
    #[error("Unknown domain '{domain}'. Registered domains: {available}")]
    UnknownDomain { domain: String, available: String },

    #[error("Invalid schema definition in domain '{domain}', table '{table}': {message}")]
    SchemaDefinition {
        domain: String,
        table: String,
        message: String,
    },

    #[error("Circular dependency in domain '{domain}' involving tables: {tables}\n  Every foreign key must point at a table that can be generated first.")]
    CyclicSchema { domain: String, tables: String },

    #[error("Row plan names table '{table}' which does not exist in domain '{domain}'")]
    UnknownTable { domain: String, table: String },

    #[error("Invalid row count {requested} for table '{table}': counts must be positive")]
    InvalidRowCount { table: String, requested: i64 },

    #[error("Cannot populate {table}.{column}: referenced table '{referenced_table}' has no generated rows\n  Request at least one row for '{referenced_table}' in the row plan.")]
    EmptyParentPool {
        table: String,
        column: String,
        referenced_table: String,
    },

    #[error("Materialization failed on table '{table}': {message}\n  Cause: {source}")]
    Materialization {
        table: String,
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Table '{table}' is missing from {}\n  The store was not fully materialized.", path.display())]
    MissingTable { table: String, path: PathBuf },

    #[error("Cannot read database {}: {source}", path.display())]
    DatabaseUnreadable {
        path: PathBuf,
        #[source]
        source: sqlx::Error,
    },

    #[error("Catalog file error in {}: {message}", path.display())]
    CatalogFile { path: PathBuf, message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

pub type Result<T> = std::result::Result<T, BizSeedError>;

impl BizSeedError {
    /// Wrap a driver or filesystem error raised while writing `table`.
    pub(crate) fn materialization(
        table: impl Into<String>,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        BizSeedError::Materialization {
            table: table.into(),
            message: message.into(),
            source: Box::new(source),
        }
    }
}
