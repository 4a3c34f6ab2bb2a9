//! Typed catalog of business domains and read-back of materialized stores.

pub mod builtin;
pub mod catalog;
pub mod file;
pub mod sqlite;
pub mod types;

pub use catalog::{Catalog, DomainSchema};
pub use types::{ColumnSpec, ColumnType, ForeignKeySpec, KeyStrategy, TableSpec, TextKind};
