//! Read the structure of a materialized store back from disk.
//!
//! Everything here opens the file read-only. The structure comes from
//! SQLite's own catalog (`sqlite_master`, `PRAGMA table_info`,
//! `PRAGMA foreign_key_list`), so it reflects what was actually written, not
//! what the catalog entry says should have been.

use indexmap::IndexMap;
use serde::Serialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;

use crate::error::{BizSeedError, Result};
use crate::output::direct::quote_identifier;
use crate::schema::types::METADATA_TABLE;

/// Tables, columns, foreign keys, row counts and metadata of a store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStructure {
    /// Domain tables, sorted by name. Excludes `sqlite_*` and the metadata table.
    pub tables: IndexMap<String, StoredTable>,
    /// Contents of the metadata table, empty if it is absent.
    pub metadata: IndexMap<String, String>,
}

impl StoreStructure {
    pub fn table(&self, name: &str) -> Option<&StoredTable> {
        self.tables.get(name)
    }

    pub fn total_rows(&self) -> i64 {
        self.tables.values().map(|t| t.row_count).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredTable {
    pub name: String,
    pub columns: Vec<StoredColumn>,
    pub foreign_keys: Vec<StoredForeignKey>,
    pub row_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredColumn {
    pub name: String,
    /// Type as declared in `CREATE TABLE`, e.g. `DECIMAL(12,2)`.
    pub declared_type: String,
    pub not_null: bool,
    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct StoredForeignKey {
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// Open a store read-only. Fails with `DatabaseUnreadable` if the file is
/// missing or is not a SQLite database.
pub async fn open_read_only(path: &Path) -> Result<SqlitePool> {
    let unreadable = |source: sqlx::Error| BizSeedError::DatabaseUnreadable {
        path: path.to_path_buf(),
        source,
    };

    let options = SqliteConnectOptions::new()
        .filename(path)
        .read_only(true)
        .create_if_missing(false);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(unreadable)?;

    // Connecting is lazy about the file header; force a read.
    sqlx::query("SELECT COUNT(*) FROM sqlite_master")
        .fetch_one(&pool)
        .await
        .map_err(unreadable)?;

    Ok(pool)
}

/// Read the full structure of the store at `path`.
pub async fn read_structure(path: &Path) -> Result<StoreStructure> {
    let pool = open_read_only(path).await?;
    let inspector = StoreInspector::new(&pool, path);
    let structure = inspector.inspect().await;
    pool.close().await;
    structure
}

/// Catalog queries over an open store.
pub struct StoreInspector<'a> {
    pool: &'a SqlitePool,
    path: &'a Path,
}

impl<'a> StoreInspector<'a> {
    pub fn new(pool: &'a SqlitePool, path: &'a Path) -> Self {
        Self { pool, path }
    }

    fn unreadable(&self, source: sqlx::Error) -> BizSeedError {
        BizSeedError::DatabaseUnreadable {
            path: self.path.to_path_buf(),
            source,
        }
    }

    pub async fn inspect(&self) -> Result<StoreStructure> {
        let names = self.table_names().await?;

        let mut tables = IndexMap::new();
        for name in names.into_iter().filter(|n| n != METADATA_TABLE) {
            let table = StoredTable {
                columns: self.columns(&name).await?,
                foreign_keys: self.foreign_keys(&name).await?,
                row_count: self.row_count(&name).await?,
                name: name.clone(),
            };
            tables.insert(name, table);
        }

        Ok(StoreStructure {
            tables,
            metadata: self.metadata().await?,
        })
    }

    /// All user tables, sorted by name, including the metadata table.
    pub async fn table_names(&self) -> Result<Vec<String>> {
        let query = "SELECT name FROM sqlite_master \
                     WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name";
        let rows = sqlx::query(query)
            .fetch_all(self.pool)
            .await
            .map_err(|e| self.unreadable(e))?;

        Ok(rows.iter().map(|row| row.get("name")).collect())
    }

    pub async fn has_table(&self, table: &str) -> Result<bool> {
        let query = "SELECT COUNT(*) AS n FROM sqlite_master WHERE type = 'table' AND name = ?";
        let row = sqlx::query(query)
            .bind(table)
            .fetch_one(self.pool)
            .await
            .map_err(|e| self.unreadable(e))?;
        let count: i64 = row.get("n");
        Ok(count > 0)
    }

    async fn columns(&self, table: &str) -> Result<Vec<StoredColumn>> {
        let query = format!("PRAGMA table_info({})", quote_identifier(table));
        let rows = sqlx::query(&query)
            .fetch_all(self.pool)
            .await
            .map_err(|e| self.unreadable(e))?;

        Ok(rows
            .iter()
            .map(|row| {
                let notnull: i32 = row.get("notnull");
                let pk: i32 = row.get("pk");
                StoredColumn {
                    name: row.get("name"),
                    declared_type: row.get("type"),
                    not_null: notnull != 0,
                    primary_key: pk > 0,
                }
            })
            .collect())
    }

    async fn foreign_keys(&self, table: &str) -> Result<Vec<StoredForeignKey>> {
        let query = format!("PRAGMA foreign_key_list({})", quote_identifier(table));
        let rows = sqlx::query(&query)
            .fetch_all(self.pool)
            .await
            .map_err(|e| self.unreadable(e))?;

        let mut keys: Vec<StoredForeignKey> = rows
            .iter()
            .map(|row| StoredForeignKey {
                column: row.get("from"),
                referenced_table: row.get("table"),
                referenced_column: row.get("to"),
            })
            .collect();
        // PRAGMA lists keys in reverse declaration order.
        keys.reverse();
        Ok(keys)
    }

    pub async fn row_count(&self, table: &str) -> Result<i64> {
        let query = format!("SELECT COUNT(*) AS n FROM {}", quote_identifier(table));
        let row = sqlx::query(&query)
            .fetch_one(self.pool)
            .await
            .map_err(|e| self.unreadable(e))?;
        Ok(row.get("n"))
    }

    async fn metadata(&self) -> Result<IndexMap<String, String>> {
        if !self.has_table(METADATA_TABLE).await? {
            return Ok(IndexMap::new());
        }

        let query = format!(
            "SELECT key, value FROM {} ORDER BY rowid",
            quote_identifier(METADATA_TABLE)
        );
        let rows = sqlx::query(&query)
            .fetch_all(self.pool)
            .await
            .map_err(|e| self.unreadable(e))?;

        Ok(rows
            .iter()
            .map(|row| {
                let key: String = row.get("key");
                let value: Option<String> = row.get("value");
                (key, value.unwrap_or_default())
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqliteJournalMode;

    async fn write_store(path: &Path, statements: &[&str]) {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete);
        let pool = SqlitePool::connect_with(options).await.unwrap();
        for statement in statements {
            sqlx::query(statement).execute(&pool).await.unwrap();
        }
        pool.close().await;
    }

    #[tokio::test]
    async fn test_read_structure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shop.db");
        write_store(
            &path,
            &[
                "CREATE TABLE customers (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
                "CREATE TABLE orders (id INTEGER PRIMARY KEY, \
                 customer_id INTEGER NOT NULL REFERENCES customers(id), total DECIMAL(12,2))",
                "CREATE TABLE _company_metadata (key TEXT PRIMARY KEY, value TEXT)",
                "INSERT INTO customers VALUES (1, 'Ada'), (2, 'Grace')",
                "INSERT INTO orders VALUES (1, 2, 9.5)",
                "INSERT INTO _company_metadata VALUES ('domain', 'shop')",
            ],
        )
        .await;

        let structure = read_structure(&path).await.unwrap();

        let names: Vec<&String> = structure.tables.keys().collect();
        assert_eq!(names, vec!["customers", "orders"]);
        assert_eq!(structure.total_rows(), 3);
        assert_eq!(structure.metadata.get("domain").map(String::as_str), Some("shop"));

        let orders = structure.table("orders").unwrap();
        assert_eq!(
            orders.foreign_keys,
            vec![StoredForeignKey {
                column: "customer_id".into(),
                referenced_table: "customers".into(),
                referenced_column: "id".into(),
            }]
        );
        assert!(orders.columns[0].primary_key);
        assert!(orders.columns[1].not_null);
        assert_eq!(orders.columns[2].declared_type, "DECIMAL(12,2)");
        assert!(!orders.columns[2].not_null);
    }

    #[tokio::test]
    async fn test_missing_store_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_structure(&dir.path().join("absent.db")).await.unwrap_err();
        assert!(matches!(err, BizSeedError::DatabaseUnreadable { .. }));
        assert!(!dir.path().join("absent.db").exists());
    }

    #[tokio::test]
    async fn test_garbage_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.db");
        let text = "this is not a database, just some text long enough to fill a header";
        std::fs::write(&path, text).unwrap();

        let err = read_structure(&path).await.unwrap_err();
        assert!(matches!(err, BizSeedError::DatabaseUnreadable { .. }));
    }
}
