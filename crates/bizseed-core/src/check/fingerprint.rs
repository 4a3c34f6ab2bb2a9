//! Structural fingerprints.
//!
//! A fingerprint is the SHA-256 of a normalized serialization: tables sorted
//! by name, columns in declaration order, foreign keys sorted. A catalog
//! entry and a store materialized from it produce the same fingerprint, and
//! so do two stores generated from the same domain.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::schema::catalog::DomainSchema;
use crate::schema::sqlite::{StoreStructure, StoredForeignKey};

#[derive(Serialize)]
struct NormalizedTable {
    columns: Vec<NormalizedColumn>,
    foreign_keys: Vec<StoredForeignKey>,
}

#[derive(Serialize)]
struct NormalizedColumn {
    name: String,
    declared_type: String,
    not_null: bool,
    primary_key: bool,
}

/// Fingerprint of a store's structure as read back from disk.
pub fn structure_fingerprint(structure: &StoreStructure) -> String {
    let normalized: BTreeMap<&str, NormalizedTable> = structure
        .tables
        .values()
        .map(|table| {
            let columns = table
                .columns
                .iter()
                .map(|c| NormalizedColumn {
                    name: c.name.clone(),
                    declared_type: c.declared_type.to_uppercase(),
                    not_null: c.not_null,
                    primary_key: c.primary_key,
                })
                .collect();
            let mut foreign_keys = table.foreign_keys.clone();
            foreign_keys.sort();
            (table.name.as_str(), NormalizedTable { columns, foreign_keys })
        })
        .collect();

    digest(&normalized)
}

/// Fingerprint of the structure a catalog entry materializes to.
pub fn schema_fingerprint(schema: &DomainSchema) -> String {
    let normalized: BTreeMap<&str, NormalizedTable> = schema
        .tables
        .values()
        .map(|table| {
            let columns = table
                .columns
                .iter()
                .map(|c| NormalizedColumn {
                    name: c.name.clone(),
                    declared_type: c.column_type.sql_type(),
                    // SQLite reports INTEGER PRIMARY KEY columns as nullable.
                    not_null: !c.nullable && !c.is_primary_key(),
                    primary_key: c.is_primary_key(),
                })
                .collect();
            let mut foreign_keys: Vec<StoredForeignKey> = table
                .foreign_keys
                .iter()
                .map(|fk| StoredForeignKey {
                    column: fk.column.clone(),
                    referenced_table: fk.references.clone(),
                    referenced_column: fk.referenced_column.clone(),
                })
                .collect();
            foreign_keys.sort();
            (table.name.as_str(), NormalizedTable { columns, foreign_keys })
        })
        .collect();

    digest(&normalized)
}

fn digest(normalized: &BTreeMap<&str, NormalizedTable>) -> String {
    let serialized = serde_json::to_string(normalized).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    format!("{:x}", hasher.finalize())
}
