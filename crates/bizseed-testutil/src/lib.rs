//! Shared fixtures and out-of-band SQLite helpers for BizSeed tests.
//!
//! The store helpers open their own connections, independent of the code
//! under test, so tests can inspect or tamper with a generated store.

use std::path::{Path, PathBuf};

use bizseed_core::generate::providers::DateWindow;
use bizseed_core::schema::types::{ColumnSpec, TableSpec, TextKind};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool};
use sqlx::Row;
use tempfile::TempDir;

/// A small two-level domain: customers, products, orders, order_lines.
pub fn shop_tables() -> Vec<TableSpec> {
    vec![
        TableSpec::new("customers")
            .column(ColumnSpec::id())
            .column(ColumnSpec::text("name", TextKind::FullName))
            .column(ColumnSpec::text("email", TextKind::Email)),
        TableSpec::new("products")
            .column(ColumnSpec::id())
            .column(ColumnSpec::text("name", TextKind::ProductName))
            .column(ColumnSpec::decimal("price", 1.0, 100.0)),
        TableSpec::new("orders")
            .column(ColumnSpec::id())
            .column(ColumnSpec::reference("customer_id"))
            .column(ColumnSpec::status("status", &["open", "paid", "void"]))
            .column(ColumnSpec::timestamp("placed_at"))
            .references("customer_id", "customers"),
        TableSpec::new("order_lines")
            .column(ColumnSpec::id())
            .column(ColumnSpec::reference("order_id"))
            .column(ColumnSpec::reference("product_id"))
            .column(ColumnSpec::reference("gift_for_id").nullable())
            .column(ColumnSpec::integer("quantity", 1, 9))
            .references("order_id", "orders")
            .references("product_id", "products")
            .references("gift_for_id", "customers"),
    ]
}

/// Two tables referencing each other; always rejected by the catalog.
pub fn circular_tables() -> Vec<TableSpec> {
    vec![
        TableSpec::new("users")
            .column(ColumnSpec::id())
            .column(ColumnSpec::reference("team_id"))
            .references("team_id", "teams"),
        TableSpec::new("teams")
            .column(ColumnSpec::id())
            .column(ColumnSpec::reference("owner_id"))
            .references("owner_id", "users"),
    ]
}

/// Fixed date window so generated rows do not depend on the current date.
pub fn fixed_window() -> DateWindow {
    DateWindow {
        start: chrono_date(2024, 1, 1),
        end: chrono_date(2024, 12, 31),
    }
}

fn chrono_date(y: i32, m: u32, d: u32) -> chrono::NaiveDate {
    chrono::NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A temporary directory for generated stores, removed on drop.
pub struct TempStores {
    dir: TempDir,
}

impl TempStores {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    /// Path of a store named `name` inside the directory (not created).
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// File names currently in the directory, sorted.
    pub fn entries(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

impl Default for TempStores {
    fn default() -> Self {
        Self::new()
    }
}

async fn connect(path: &Path) -> SqlitePool {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .foreign_keys(false)
        .journal_mode(SqliteJournalMode::Delete);
    SqlitePool::connect_with(options).await.unwrap()
}

/// `SELECT COUNT(*)` over `table`.
pub async fn count_rows(path: &Path, table: &str) -> i64 {
    let pool = connect(path).await;
    let count: i64 = sqlx::query(&format!("SELECT COUNT(*) AS n FROM \"{}\"", table))
        .fetch_one(&pool)
        .await
        .unwrap()
        .get("n");
    pool.close().await;
    count
}

/// Rows of `table` matching the SQL `predicate`.
pub async fn count_where(path: &Path, table: &str, predicate: &str) -> i64 {
    let pool = connect(path).await;
    let count: i64 = sqlx::query(&format!(
        "SELECT COUNT(*) AS n FROM \"{}\" WHERE {}",
        table, predicate
    ))
    .fetch_one(&pool)
    .await
    .unwrap()
    .get("n");
    pool.close().await;
    count
}

/// Names of the indexes SQLite holds for `table`, sorted, without the
/// automatic ones.
pub async fn index_names(path: &Path, table: &str) -> Vec<String> {
    let pool = connect(path).await;
    let names = sqlx::query(
        "SELECT name FROM sqlite_master \
         WHERE type = 'index' AND tbl_name = ? AND name NOT LIKE 'sqlite_%' ORDER BY name",
    )
    .bind(table)
    .fetch_all(&pool)
    .await
    .unwrap()
    .iter()
    .map(|r| r.get::<String, _>("name"))
    .collect();
    pool.close().await;
    names
}

/// Integer values of `column` ordered by `id`; NULLs are `None`.
pub async fn column_values(path: &Path, table: &str, column: &str) -> Vec<Option<i64>> {
    let pool = connect(path).await;
    let rows = sqlx::query(&format!(
        "SELECT \"{}\" AS v FROM \"{}\" ORDER BY id",
        column, table
    ))
    .fetch_all(&pool)
    .await
    .unwrap();
    pool.close().await;
    rows.iter().map(|r| r.get::<Option<i64>, _>("v")).collect()
}

/// Every row of `table` as text, ordered by `id`, for whole-store comparisons.
pub async fn dump_table(path: &Path, table: &str) -> Vec<String> {
    let pool = connect(path).await;
    let columns: Vec<String> = sqlx::query(&format!("PRAGMA table_info(\"{}\")", table))
        .fetch_all(&pool)
        .await
        .unwrap()
        .iter()
        .map(|r| r.get::<String, _>("name"))
        .collect();
    let select = columns
        .iter()
        .map(|c| format!("quote(\"{}\")", c))
        .collect::<Vec<_>>()
        .join(" || '|' || ");
    let lines = sqlx::query(&format!(
        "SELECT {} AS line FROM \"{}\" ORDER BY id",
        select, table
    ))
    .fetch_all(&pool)
    .await
    .unwrap()
    .iter()
    .map(|r| r.get::<String, _>("line"))
    .collect();
    pool.close().await;
    lines
}

/// Delete the row with primary key `id`, bypassing any integrity checks.
pub async fn delete_row(path: &Path, table: &str, id: i64) {
    let pool = connect(path).await;
    sqlx::query(&format!("DELETE FROM \"{}\" WHERE id = ?", table))
        .bind(id)
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;
}

/// Drop `table` from the store.
pub async fn drop_table(path: &Path, table: &str) {
    let pool = connect(path).await;
    sqlx::query(&format!("DROP TABLE \"{}\"", table))
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;
}
