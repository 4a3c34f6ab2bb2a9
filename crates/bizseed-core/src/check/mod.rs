//! # Integrity Verification
//!
//! Audits a materialized store against its catalog entry: for every declared
//! foreign key, counts child rows whose non-null FK value has no matching
//! parent row. Dangling references are reported as data (`Violation`), not
//! errors; only an unreadable store or a missing table fails the audit.
//!
//! The store is opened read-only and never modified.

pub mod fingerprint;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;
use std::fmt;
use std::path::Path;

use crate::error::{BizSeedError, Result};
use crate::output::direct::quote_identifier;
use crate::schema::catalog::DomainSchema;
use crate::schema::sqlite::{open_read_only, StoreInspector};
use crate::schema::types::{ForeignKeySpec, TableSpec};

/// Rows of `table` whose `foreign_key_column` points at no row of
/// `referenced_table`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    pub table: String,
    pub foreign_key_column: String,
    pub referenced_table: String,
    pub offending_row_count: i64,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} -> {}: {} dangling row(s)",
            self.table, self.foreign_key_column, self.referenced_table, self.offending_row_count
        )
    }
}

/// Human-readable summary for terminal output.
pub fn summary(violations: &[Violation]) -> String {
    if violations.is_empty() {
        return "All foreign keys resolve.".to_string();
    }

    let mut lines = vec![format!(
        "{} foreign key(s) with dangling references:",
        violations.len()
    )];
    for v in violations {
        lines.push(format!("  ! {}", v));
    }
    lines.join("\n")
}

/// Audit the store at `path` against `schema`.
///
/// Returns one `Violation` per foreign key with at least one dangling row,
/// in declaration order; an empty vector means the store is consistent.
pub async fn verify(path: &Path, schema: &DomainSchema) -> Result<Vec<Violation>> {
    let pool = open_read_only(path).await?;
    let result = audit(&pool, path, schema).await;
    pool.close().await;
    result
}

async fn audit(pool: &SqlitePool, path: &Path, schema: &DomainSchema) -> Result<Vec<Violation>> {
    let inspector = StoreInspector::new(pool, path);

    for table in schema.tables.values() {
        if !inspector.has_table(&table.name).await? {
            return Err(BizSeedError::MissingTable {
                table: table.name.clone(),
                path: path.to_path_buf(),
            });
        }
    }

    let mut violations = Vec::new();
    for (table, fk) in schema.foreign_keys() {
        let sql = anti_join_sql(table, fk);
        let row = sqlx::query(&sql)
            .fetch_one(pool)
            .await
            .map_err(|e| BizSeedError::DatabaseUnreadable {
                path: path.to_path_buf(),
                source: e,
            })?;
        let offending: i64 = row.get("n");

        tracing::debug!(
            "{}.{} -> {}: {} dangling",
            table.name,
            fk.column,
            fk.references,
            offending
        );

        if offending > 0 {
            violations.push(Violation {
                table: table.name.clone(),
                foreign_key_column: fk.column.clone(),
                referenced_table: fk.references.clone(),
                offending_row_count: offending,
            });
        }
    }

    if !violations.is_empty() {
        tracing::warn!(
            "{} foreign key(s) with dangling references in {}",
            violations.len(),
            path.display()
        );
    }
    Ok(violations)
}

/// Count child rows with a non-null FK value and no matching parent.
fn anti_join_sql(table: &TableSpec, fk: &ForeignKeySpec) -> String {
    let column = quote_identifier(&fk.column);
    let parent_key = quote_identifier(&fk.referenced_column);
    format!(
        "SELECT COUNT(*) AS n FROM {} AS c LEFT JOIN {} AS p ON c.{} = p.{} \
         WHERE c.{} IS NOT NULL AND p.{} IS NULL",
        quote_identifier(&table.name),
        quote_identifier(&fk.references),
        column,
        parent_key,
        column,
        parent_key
    )
}
