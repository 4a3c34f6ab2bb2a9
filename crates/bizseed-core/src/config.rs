//! # Configuration File Parser
//!
//! Reads and parses `bizseed.toml`, the optional configuration file that
//! supplies defaults for the `bizseed` CLI. Supports:
//!
//! - `[generate]`: default domain, rows per table, seed, output path, null
//!   rate, whether to verify after generating, extra catalog file
//! - `[generate.dates]`: the date window for `date`/`timestamp` columns
//! - `[company]`: company id and name recorded in the store metadata
//! - `[tables.<name>]`: per-table row count overrides
//!
//! Example `bizseed.toml`:
//!
//! ```toml
//! [generate]
//! domain = "retail"
//! rows = 25
//! seed = 42
//! output = "data/retail.db"
//! verify = true
//!
//! [generate.dates]
//! start = "2023-01-01"
//! end = "2024-12-31"
//!
//! [company]
//! id = "acme"
//! name = "Acme Retail"
//!
//! [tables.order_items]
//! rows = 120
//! ```
//!
//! CLI flags always win over values from this file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{BizSeedError, Result};
use crate::generate::engine::CompanyInfo;
use crate::generate::plan::RowPlan;
use crate::generate::providers::DateWindow;
use crate::schema::catalog::DomainSchema;

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "bizseed.toml";

/// Top-level bizseed.toml structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BizSeedConfig {
    pub generate: GenerateConfig,
    pub company: Option<CompanyConfig>,
    /// Per-table overrides, keyed by table name.
    pub tables: BTreeMap<String, TableConfig>,

    /// Absolute path to the directory containing bizseed.toml, so relative
    /// paths in the file resolve against it rather than the CWD.
    #[serde(skip)]
    pub config_dir: Option<PathBuf>,
}

/// Default generation settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    pub domain: Option<String>,
    /// Rows for every table without a `[tables.<name>]` override.
    pub rows: Option<i64>,
    /// Fixed random seed for reproducible stores.
    pub seed: Option<u64>,
    pub output: Option<PathBuf>,
    pub null_rate: Option<f64>,
    /// Audit foreign keys right after generating.
    pub verify: Option<bool>,
    /// TOML catalog file with additional domains.
    pub catalog: Option<PathBuf>,
    pub dates: DatesConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatesConfig {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CompanyConfig {
    pub id: String,
    pub name: String,
}

/// Per-table configuration override.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    pub rows: Option<i64>,
}

/// Read and parse a bizseed.toml file from the given directory.
///
/// Returns `None` if the file doesn't exist (config is optional).
/// Returns an error if the file exists but can't be parsed or is invalid.
pub fn read_config(dir: &Path) -> Result<Option<BizSeedConfig>> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(&path).map_err(|e| BizSeedError::Config {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;

    let mut config: BizSeedConfig = toml::from_str(&content).map_err(|e| BizSeedError::Config {
        message: format!("Failed to parse {}: {}", path.display(), e),
    })?;

    config.config_dir = Some(std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf()));
    config.validate()?;

    tracing::debug!("Loaded {}", path.display());
    Ok(Some(config))
}

impl BizSeedConfig {
    /// Row plan for `schema`: `[generate] rows` for every table, then the
    /// `[tables.*]` overrides. Empty if neither is set.
    pub fn row_plan(&self, schema: &DomainSchema) -> RowPlan {
        let base = match self.generate.rows {
            Some(rows) => RowPlan::uniform(schema, rows),
            None => RowPlan::new(),
        };
        base.merge(&self.table_row_overrides())
    }

    /// Build a row plan from the [tables] section alone.
    pub fn table_row_overrides(&self) -> RowPlan {
        self.tables
            .iter()
            .filter_map(|(name, tc)| tc.rows.map(|rows| (name.clone(), rows)))
            .collect()
    }

    /// Date window from `[generate.dates]`, filling unset ends from `fallback`.
    pub fn date_window(&self, fallback: DateWindow) -> Result<DateWindow> {
        DateWindow::new(
            self.generate.dates.start.unwrap_or(fallback.start),
            self.generate.dates.end.unwrap_or(fallback.end),
        )
    }

    pub fn company_info(&self) -> Option<CompanyInfo> {
        self.company.as_ref().map(|c| CompanyInfo {
            id: c.id.clone(),
            name: c.name.clone(),
        })
    }

    /// Resolve a path from the file against the config directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.config_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    pub fn catalog_path(&self) -> Option<PathBuf> {
        self.generate.catalog.as_deref().map(|p| self.resolve_path(p))
    }

    pub fn output_path(&self) -> Option<PathBuf> {
        self.generate.output.as_deref().map(|p| self.resolve_path(p))
    }

    /// Validate semantic constraints that serde cannot enforce.
    pub fn validate(&self) -> Result<()> {
        if let Some(rate) = self.generate.null_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(BizSeedError::Config {
                    message: format!(
                        "[generate] null_rate = {} is outside 0..1. \
                         Use e.g. 0.1 for 10% NULLs in nullable columns.",
                        rate
                    ),
                });
            }
        }

        if let (Some(start), Some(end)) = (self.generate.dates.start, self.generate.dates.end) {
            if start > end {
                return Err(BizSeedError::Config {
                    message: format!(
                        "[generate.dates] start ({}) is after end ({})",
                        start, end
                    ),
                });
            }
        }

        if let Some(company) = &self.company {
            if company.id.trim().is_empty() {
                return Err(BizSeedError::Config {
                    message: "[company] id must not be empty".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Warnings for `[tables.*]` entries that name no table of `schema`.
    pub fn validate_against_schema(&self, schema: &DomainSchema) -> Vec<String> {
        self.tables
            .keys()
            .filter(|name| schema.table(name).is_none())
            .map(|name| {
                format!(
                    "bizseed.toml: [tables.{}] does not exist in domain '{}'",
                    name, schema.domain
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog::Catalog;

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[generate]
domain = "technology"
rows = 20
seed = 42
output = "out/tech.db"
null_rate = 0.25
verify = true

[generate.dates]
start = "2023-01-01"
end = "2023-06-30"

[company]
id = "c-17"
name = "Globex"

[tables.users]
rows = 3

[tables.subscriptions]
rows = 5
"#;
        let config: BizSeedConfig = toml::from_str(toml).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.generate.domain.as_deref(), Some("technology"));
        assert_eq!(config.generate.seed, Some(42));
        assert_eq!(config.generate.verify, Some(true));
        assert_eq!(config.company_info().unwrap().name, "Globex");
        assert_eq!(
            config.generate.dates.start,
            NaiveDate::from_ymd_opt(2023, 1, 1)
        );

        let overrides = config.table_row_overrides();
        assert_eq!(overrides.get("users"), Some(3));
        assert_eq!(overrides.get("subscriptions"), Some(5));
    }

    #[test]
    fn test_parse_empty_config() {
        let config: BizSeedConfig = toml::from_str("").unwrap();
        assert!(config.generate.domain.is_none());
        assert!(config.company.is_none());
        assert!(config.table_row_overrides().is_empty());
    }

    #[test]
    fn test_row_plan_merges_defaults_and_overrides() {
        let catalog = Catalog::builtin().unwrap();
        let schema = catalog.get_schema("technology").unwrap();
        let config: BizSeedConfig = toml::from_str(
            r#"
[generate]
rows = 10

[tables.support_tickets]
rows = 40
"#,
        )
        .unwrap();

        let plan = config.row_plan(schema);
        assert_eq!(plan.len(), schema.table_count());
        assert_eq!(plan.get("users"), Some(10));
        assert_eq!(plan.get("support_tickets"), Some(40));
    }

    #[test]
    fn test_date_window_fallback() {
        let fallback = DateWindow::new(
            NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2020, 12, 31).unwrap(),
        )
        .unwrap();
        let config: BizSeedConfig = toml::from_str(
            r#"
[generate.dates]
end = "2020-06-30"
"#,
        )
        .unwrap();

        let window = config.date_window(fallback).unwrap();
        assert_eq!(window.start, fallback.start);
        assert_eq!(window.end, NaiveDate::from_ymd_opt(2020, 6, 30).unwrap());
    }

    #[test]
    fn test_validate_rejects_bad_null_rate() {
        let config: BizSeedConfig = toml::from_str("[generate]\nnull_rate = 1.5\n").unwrap();
        assert!(matches!(config.validate(), Err(BizSeedError::Config { .. })));
    }

    #[test]
    fn test_validate_rejects_inverted_dates() {
        let config: BizSeedConfig = toml::from_str(
            "[generate.dates]\nstart = \"2024-02-01\"\nend = \"2024-01-01\"\n",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_read_config_nonexistent() {
        let result = read_config(Path::new("/nonexistent/dir"));
        assert!(result.unwrap().is_none());
    }

    #[test]
    fn test_read_config_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[generate]\noutput = \"stores/retail.db\"\ncatalog = \"/etc/bizseed/extra.toml\"\n",
        )
        .unwrap();

        let config = read_config(dir.path()).unwrap().unwrap();
        let expected = std::fs::canonicalize(dir.path()).unwrap();
        assert_eq!(config.config_dir.as_deref(), Some(expected.as_path()));
        assert_eq!(config.output_path(), Some(expected.join("stores/retail.db")));
        assert_eq!(
            config.catalog_path(),
            Some(PathBuf::from("/etc/bizseed/extra.toml"))
        );
    }

    #[test]
    fn test_read_config_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "this is not valid [[[toml").unwrap();
        assert!(read_config(dir.path()).is_err());
    }

    #[test]
    fn test_validate_against_schema() {
        let catalog = Catalog::builtin().unwrap();
        let schema = catalog.get_schema("retail").unwrap();
        let config: BizSeedConfig =
            toml::from_str("[tables.orders]\nrows = 4\n[tables.invoices]\nrows = 2\n").unwrap();

        let warnings = config.validate_against_schema(schema);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("invoices"));
    }
}
