//! # Store Materialization
//!
//! Writes a domain's tables and synthesized rows into a fresh SQLite file.
//!
//! The store is built in a temporary file next to the destination and only
//! renamed over it once everything has been committed, so the destination
//! is either untouched or holds a complete store. All DDL and inserts run in
//! a single transaction with `foreign_keys = OFF` and journal mode `DELETE`,
//! leaving a single-file artifact with no `-wal`/`-journal` siblings.
//!
//! Rows are inserted with batched multi-row `INSERT` statements, which is
//! plenty for SQLite inside one transaction.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use std::path::{Path, PathBuf};
use tempfile::TempPath;

use crate::error::{BizSeedError, Result};
use crate::generate::providers::DateWindow;
use crate::generate::synth::GeneratedRow;
use crate::schema::catalog::DomainSchema;
use crate::schema::types::{ColumnType, TableSpec, METADATA_TABLE};

/// Batch size for multi-row INSERT statements.
const INSERT_BATCH_SIZE: usize = 100;

/// Table name used in errors raised outside any particular table.
const SESSION: &str = "(session)";

/// Facts about a run recorded in the store's metadata table.
#[derive(Debug, Clone)]
pub struct StoreMetadata {
    pub domain: String,
    pub seed: u64,
    pub generated_at: DateTime<Utc>,
    pub company_id: Option<String>,
    pub company_name: Option<String>,
    pub date_window: Option<DateWindow>,
}

impl StoreMetadata {
    pub fn new(domain: impl Into<String>, seed: u64) -> Self {
        Self {
            domain: domain.into(),
            seed,
            generated_at: Utc::now(),
            company_id: None,
            company_name: None,
            date_window: None,
        }
    }

    /// Key/value pairs in the order they are written.
    pub fn entries(&self) -> Vec<(&'static str, String)> {
        let mut entries = Vec::new();
        if let Some(id) = &self.company_id {
            entries.push(("company_id", id.clone()));
        }
        if let Some(name) = &self.company_name {
            entries.push(("company_name", name.clone()));
        }
        entries.push(("domain", self.domain.clone()));
        entries.push(("seed", self.seed.to_string()));
        entries.push(("generated_at", self.generated_at.to_rfc3339()));
        if let Some(window) = &self.date_window {
            entries.push(("date_start", window.start.to_string()));
            entries.push(("date_end", window.end.to_string()));
        }
        entries
    }
}

/// An in-progress store. Created by [`Materializer::begin`], finished by
/// [`Materializer::commit`] or discarded by [`Materializer::abort`].
///
/// Dropping a session without committing also discards the temporary file.
pub struct Materializer {
    destination: PathBuf,
    temp_path: TempPath,
    pool: SqlitePool,
    tx: Transaction<'static, Sqlite>,
    last_table: String,
    rows_written: usize,
}

impl Materializer {
    /// Open a temporary store next to `destination` and start the
    /// transaction.
    pub async fn begin(destination: &Path) -> Result<Self> {
        let parent = match destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&parent).map_err(|e| {
            BizSeedError::materialization(
                SESSION,
                format!("cannot create directory {}", parent.display()),
                e,
            )
        })?;

        let temp_path = tempfile::Builder::new()
            .prefix(".bizseed-")
            .suffix(".partial")
            .tempfile_in(&parent)
            .map_err(|e| {
                BizSeedError::materialization(
                    SESSION,
                    format!("cannot create temporary file in {}", parent.display()),
                    e,
                )
            })?
            .into_temp_path();

        let options = SqliteConnectOptions::new()
            .filename(&temp_path)
            .create_if_missing(true)
            .foreign_keys(false)
            .journal_mode(SqliteJournalMode::Delete);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| BizSeedError::materialization(SESSION, "failed to open store", e))?;

        let tx = pool
            .begin()
            .await
            .map_err(|e| BizSeedError::materialization(SESSION, "failed to begin transaction", e))?;

        tracing::debug!(
            "Materializing {} via {}",
            destination.display(),
            temp_path.display()
        );

        Ok(Self {
            destination: destination.to_path_buf(),
            temp_path,
            pool,
            tx,
            last_table: SESSION.to_string(),
            rows_written: 0,
        })
    }

    /// Create every table of `schema` in generation order, then an index
    /// on each foreign-key column.
    pub async fn create_tables(&mut self, schema: &DomainSchema) -> Result<()> {
        for table in schema.generation_order() {
            let sql = create_table_sql(table);
            self.execute(&table.name, &sql, "CREATE TABLE failed").await?;
        }
        for table in schema.generation_order() {
            for sql in create_index_sql(table) {
                self.execute(&table.name, &sql, "CREATE INDEX failed").await?;
            }
        }
        Ok(())
    }

    /// Insert `rows` into `table` in batches. Returns the number of rows
    /// written.
    pub async fn insert_rows(&mut self, table: &TableSpec, rows: &[GeneratedRow]) -> Result<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let columns: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        let quoted_table = quote_identifier(&table.name);
        let col_list = columns
            .iter()
            .map(|c| quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", ");

        for chunk in rows.chunks(INSERT_BATCH_SIZE) {
            let sql = build_batched_insert(&quoted_table, &col_list, &columns, chunk);
            self.execute(&table.name, &sql, "INSERT failed within transaction")
                .await?;
        }

        self.rows_written += rows.len();
        Ok(rows.len())
    }

    /// Create the metadata table and record `metadata` in it.
    pub async fn write_metadata(&mut self, metadata: &StoreMetadata) -> Result<()> {
        let table = quote_identifier(METADATA_TABLE);
        let create = format!("CREATE TABLE {} (\"key\" TEXT PRIMARY KEY, \"value\" TEXT)", table);
        self.execute(METADATA_TABLE, &create, "CREATE TABLE failed")
            .await?;

        let entries = metadata.entries();
        if entries.is_empty() {
            return Ok(());
        }
        let values = entries
            .iter()
            .map(|(k, v)| format!("({}, {})", quote_literal(k), quote_literal(v)))
            .collect::<Vec<_>>()
            .join(", ");
        let insert = format!("INSERT INTO {} (\"key\", \"value\") VALUES {}", table, values);
        self.execute(METADATA_TABLE, &insert, "INSERT failed within transaction")
            .await
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }

    /// Commit and move the store into place. Returns the destination path.
    pub async fn commit(self) -> Result<PathBuf> {
        let Self {
            destination,
            temp_path,
            pool,
            tx,
            last_table,
            rows_written,
        } = self;

        if let Err(e) = tx.commit().await {
            pool.close().await;
            return Err(BizSeedError::materialization(
                last_table,
                "failed to commit transaction",
                e,
            ));
        }
        pool.close().await;

        temp_path.persist(&destination).map_err(|e| {
            BizSeedError::materialization(
                last_table.clone(),
                format!("cannot move store into place at {}", destination.display()),
                e.error,
            )
        })?;

        tracing::info!(
            "Wrote {} rows to {}",
            rows_written,
            destination.display()
        );
        Ok(destination)
    }

    /// Roll back and delete the temporary store. The destination is left as
    /// it was.
    pub async fn abort(self) {
        let Self {
            temp_path, pool, tx, ..
        } = self;

        if let Err(e) = tx.rollback().await {
            tracing::warn!("Rollback of {} failed: {}", temp_path.display(), e);
        }
        pool.close().await;
        if let Err(e) = temp_path.close() {
            tracing::warn!("Could not remove temporary store: {}", e);
        }
    }

    async fn execute(&mut self, table: &str, sql: &str, message: &str) -> Result<()> {
        self.last_table = table.to_string();
        sqlx::query(sql)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| {
                BizSeedError::materialization(
                    table,
                    format!("{}: {}", message, truncate_sql(sql, 200)),
                    e,
                )
            })?;
        Ok(())
    }
}

/// Write a complete store in one call: every table of `schema`, the rows in
/// `rows_by_table` (tables without an entry stay empty) and the metadata.
pub async fn materialize(
    schema: &DomainSchema,
    rows_by_table: &IndexMap<String, Vec<GeneratedRow>>,
    destination: &Path,
    metadata: &StoreMetadata,
) -> Result<PathBuf> {
    let mut session = Materializer::begin(destination).await?;

    match write_all(&mut session, schema, rows_by_table, metadata).await {
        Ok(()) => session.commit().await,
        Err(e) => {
            session.abort().await;
            Err(e)
        }
    }
}

async fn write_all(
    session: &mut Materializer,
    schema: &DomainSchema,
    rows_by_table: &IndexMap<String, Vec<GeneratedRow>>,
    metadata: &StoreMetadata,
) -> Result<()> {
    session.create_tables(schema).await?;
    for table in schema.generation_order() {
        if let Some(rows) = rows_by_table.get(&table.name) {
            session.insert_rows(table, rows).await?;
        }
    }
    session.write_metadata(metadata).await
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// `CREATE TABLE` for one catalog table, including its foreign keys and a
/// `CHECK` for status columns.
pub fn create_table_sql(table: &TableSpec) -> String {
    let mut defs: Vec<String> = table
        .columns
        .iter()
        .map(|column| {
            let name = quote_identifier(&column.name);
            let mut def = format!("{} {}", name, column.column_type.sql_type());
            if column.is_primary_key() {
                def.push_str(" PRIMARY KEY");
            } else if !column.nullable {
                def.push_str(" NOT NULL");
            }
            if let ColumnType::Status { values } = &column.column_type {
                let allowed = values
                    .iter()
                    .map(|v| quote_literal(v))
                    .collect::<Vec<_>>()
                    .join(", ");
                def.push_str(&format!(" CHECK ({} IN ({}))", name, allowed));
            }
            def
        })
        .collect();

    for fk in &table.foreign_keys {
        defs.push(format!(
            "FOREIGN KEY ({}) REFERENCES {} ({})",
            quote_identifier(&fk.column),
            quote_identifier(&fk.references),
            quote_identifier(&fk.referenced_column)
        ));
    }

    format!(
        "CREATE TABLE {} ({})",
        quote_identifier(&table.name),
        defs.join(", ")
    )
}

/// `CREATE INDEX` statements for the foreign-key columns of `table`, named
/// `idx_<table>_<column>`.
pub fn create_index_sql(table: &TableSpec) -> Vec<String> {
    table
        .foreign_keys
        .iter()
        .map(|fk| {
            format!(
                "CREATE INDEX IF NOT EXISTS {} ON {} ({})",
                quote_identifier(&format!("idx_{}_{}", table.name, fk.column)),
                quote_identifier(&table.name),
                quote_identifier(&fk.column)
            )
        })
        .collect()
}

/// Build a batched multi-row INSERT statement.
///
/// Produces: `INSERT INTO "table" ("col1", "col2") VALUES (v1, v2), (v3, v4)`
pub fn build_batched_insert(
    quoted_table: &str,
    col_list: &str,
    columns: &[&str],
    rows: &[GeneratedRow],
) -> String {
    let mut sql = format!("INSERT INTO {} ({}) VALUES ", quoted_table, col_list);

    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            sql.push_str(", ");
        }
        sql.push('(');
        for (j, col) in columns.iter().enumerate() {
            if j > 0 {
                sql.push_str(", ");
            }
            let literal = row
                .get(*col)
                .map(|v| v.to_sql_literal())
                .unwrap_or_else(|| "NULL".to_string());
            sql.push_str(&literal);
        }
        sql.push(')');
    }

    sql
}

/// Quote a SQL identifier.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Truncate a SQL string for error messages.
fn truncate_sql(sql: &str, max_len: usize) -> String {
    match sql.char_indices().nth(max_len) {
        Some((idx, _)) => format!("{}...", &sql[..idx]),
        None => sql.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::value::Value;
    use crate::schema::catalog::Catalog;
    use crate::schema::types::*;
    use sqlx::Row;
    use std::borrow::Cow;

    fn row(pairs: &[(&str, Value)]) -> GeneratedRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_build_batched_insert() {
        let rows = [
            row(&[
                ("name", Value::Text(Cow::Borrowed("Alice"))),
                ("age", Value::Int(30)),
            ]),
            row(&[("name", Value::Text(Cow::Borrowed("Bob"))), ("age", Value::Null)]),
        ];

        let sql = build_batched_insert("\"users\"", "\"name\", \"age\"", &["name", "age"], &rows);

        assert!(sql.starts_with("INSERT INTO \"users\" (\"name\", \"age\") VALUES "));
        assert!(sql.contains("('Alice', 30)"));
        assert!(sql.contains("('Bob', NULL)"));
    }

    #[test]
    fn test_create_table_sql() {
        let orders = TableSpec::new("orders")
            .column(ColumnSpec::id())
            .column(ColumnSpec::reference("customer_id"))
            .column(ColumnSpec::status("status", &["pending", "shipped"]))
            .column(ColumnSpec::text("note", TextKind::Sentence).nullable())
            .references("customer_id", "customers");

        let sql = create_table_sql(&orders);
        assert_eq!(
            sql,
            "CREATE TABLE \"orders\" (\"id\" INTEGER PRIMARY KEY, \
             \"customer_id\" INTEGER NOT NULL, \
             \"status\" TEXT NOT NULL CHECK (\"status\" IN ('pending', 'shipped')), \
             \"note\" TEXT, \
             FOREIGN KEY (\"customer_id\") REFERENCES \"customers\" (\"id\"))"
        );
    }

    #[test]
    fn test_create_index_sql() {
        let lines = TableSpec::new("order_items")
            .column(ColumnSpec::id())
            .column(ColumnSpec::reference("order_id"))
            .column(ColumnSpec::reference("product_id"))
            .references("order_id", "orders")
            .references("product_id", "products");

        assert_eq!(
            create_index_sql(&lines),
            vec![
                "CREATE INDEX IF NOT EXISTS \"idx_order_items_order_id\" \
                 ON \"order_items\" (\"order_id\")",
                "CREATE INDEX IF NOT EXISTS \"idx_order_items_product_id\" \
                 ON \"order_items\" (\"product_id\")",
            ]
        );
        let categories = TableSpec::new("categories").column(ColumnSpec::id());
        assert!(create_index_sql(&categories).is_empty());
    }

    #[test]
    fn test_quote_identifier() {
        assert_eq!(quote_identifier("users"), "\"users\"");
        assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_literal("it's"), "'it''s'");
    }

    #[test]
    fn test_truncate_sql() {
        assert_eq!(truncate_sql("SELECT 1", 200), "SELECT 1");
        let long = "x".repeat(300);
        let truncated = truncate_sql(&long, 200);
        assert_eq!(truncated.len(), 203);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_metadata_entries() {
        let mut metadata = StoreMetadata::new("retail", 42);
        metadata.company_id = Some("acme".into());
        let keys: Vec<&str> = metadata.entries().iter().map(|(k, _)| *k).collect();
        assert_eq!(keys, vec!["company_id", "domain", "seed", "generated_at"]);
    }

    #[tokio::test]
    async fn test_materialize_writes_complete_store() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("retail.db");
        let catalog = Catalog::builtin().unwrap();
        let schema = catalog.get_schema("retail").unwrap();

        let mut rows = IndexMap::new();
        rows.insert(
            "categories".to_string(),
            vec![
                row(&[
                    ("id", Value::Int(1)),
                    ("name", Value::Text(Cow::Borrowed("toys"))),
                    ("description", Value::Null),
                ]),
                row(&[
                    ("id", Value::Int(2)),
                    ("name", Value::Text(Cow::Borrowed("games"))),
                    ("description", Value::Null),
                ]),
            ],
        );

        let path = materialize(schema, &rows, &dest, &StoreMetadata::new("retail", 7))
            .await
            .unwrap();
        assert_eq!(path, dest);

        let pool = SqlitePool::connect_with(SqliteConnectOptions::new().filename(&dest))
            .await
            .unwrap();
        let count: i64 = sqlx::query("SELECT COUNT(*) AS n FROM categories")
            .fetch_one(&pool)
            .await
            .unwrap()
            .get("n");
        assert_eq!(count, 2);
        let orders: i64 = sqlx::query("SELECT COUNT(*) AS n FROM orders")
            .fetch_one(&pool)
            .await
            .unwrap()
            .get("n");
        assert_eq!(orders, 0);
        let seed: String = sqlx::query("SELECT value FROM _company_metadata WHERE key = 'seed'")
            .fetch_one(&pool)
            .await
            .unwrap()
            .get("value");
        assert_eq!(seed, "7");

        let indexes: Vec<String> = sqlx::query(
            "SELECT name FROM sqlite_master \
             WHERE type = 'index' AND name LIKE 'idx_%' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap()
        .iter()
        .map(|r| r.get::<String, _>("name"))
        .collect();
        let expected: Vec<String> = schema
            .foreign_keys()
            .map(|(table, fk)| format!("idx_{}_{}", table.name, fk.column))
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        assert_eq!(indexes, expected);
        assert!(indexes.contains(&"idx_orders_customer_id".to_string()));
        pool.close().await;

        let leftovers: Vec<_> = std::fs::read_dir(dest.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(leftovers, vec!["retail.db".to_string()]);
    }

    #[tokio::test]
    async fn test_failed_insert_leaves_destination_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("store.db");
        std::fs::write(&dest, b"previous").unwrap();

        let catalog = Catalog::builtin().unwrap();
        let schema = catalog.get_schema("retail").unwrap();

        // Status outside its CHECK set makes the insert fail.
        let mut rows = IndexMap::new();
        rows.insert(
            "orders".to_string(),
            vec![row(&[
                ("id", Value::Int(1)),
                ("customer_id", Value::Int(1)),
                ("order_date", Value::Text(Cow::Borrowed("2024-01-01 00:00:00"))),
                ("total_amount", Value::Decimal(10.0)),
                ("status", Value::Text(Cow::Borrowed("teleported"))),
                ("shipping_address", Value::Text(Cow::Borrowed("1 Main St"))),
            ])],
        );

        let err = materialize(schema, &rows, &dest, &StoreMetadata::new("retail", 1))
            .await
            .unwrap_err();
        match err {
            BizSeedError::Materialization { table, message, .. } => {
                assert_eq!(table, "orders");
                assert!(message.starts_with("INSERT failed"));
            }
            other => panic!("expected Materialization, got {:?}", other),
        }

        assert_eq!(std::fs::read(&dest).unwrap(), b"previous");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
