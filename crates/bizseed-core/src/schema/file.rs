//! TOML catalog files.
//!
//! A catalog file declares extra domains next to the built-in ones:
//!
//! ```toml
//! [[domains]]
//! name = "aquarium"
//!
//! [[domains.tables]]
//! name = "tanks"
//! columns = [
//!     { name = "id", type = "id", primary_key = "sequential" },
//!     { name = "volume_liters", type = "integer", min = 20, max = 2000 },
//! ]
//! ```
//!
//! Parsing only checks shape; `Catalog::register` does the semantic
//! validation.

use serde::Deserialize;
use std::path::Path;

use crate::error::{BizSeedError, Result};
use crate::schema::types::TableSpec;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    domains: Vec<DomainDefinition>,
}

/// One domain as written in a catalog file.
#[derive(Debug, Clone, Deserialize)]
pub struct DomainDefinition {
    pub name: String,
    #[serde(default)]
    pub tables: Vec<TableSpec>,
}

/// Read and parse a catalog file.
pub fn read_catalog_file(path: &Path) -> Result<Vec<DomainDefinition>> {
    let content = std::fs::read_to_string(path).map_err(|e| BizSeedError::CatalogFile {
        path: path.to_path_buf(),
        message: format!("cannot read file: {}", e),
    })?;

    let definitions = parse_catalog(&content).map_err(|message| BizSeedError::CatalogFile {
        path: path.to_path_buf(),
        message,
    })?;

    tracing::debug!(
        "Read {} domain(s) from {}",
        definitions.len(),
        path.display()
    );
    Ok(definitions)
}

/// Parse catalog TOML text.
pub fn parse_catalog(content: &str) -> std::result::Result<Vec<DomainDefinition>, String> {
    let file: CatalogFile = toml::from_str(content).map_err(|e| e.to_string())?;
    if file.domains.is_empty() {
        return Err("no [[domains]] declared".to_string());
    }
    Ok(file.domains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BizSeedError;
    use crate::schema::catalog::Catalog;
    use crate::schema::types::{ColumnType, TextKind};

    const AQUARIUM: &str = r#"
[[domains]]
name = "aquarium"

[[domains.tables]]
name = "species"
columns = [
    { name = "id", type = "id", primary_key = "sequential" },
    { name = "common_name", type = "text", kind = "word" },
    { name = "water", type = "status", values = ["fresh", "salt", "brackish"] },
]

[[domains.tables]]
name = "fish"
columns = [
    { name = "id", type = "id", primary_key = "sequential" },
    { name = "species_id", type = "id" },
    { name = "price", type = "decimal", min = 2.5, max = 120 },
    { name = "nickname", type = "text", kind = "first_name", nullable = true },
]
foreign_keys = [{ column = "species_id", references = "species" }]
"#;

    #[test]
    fn test_parse_domain_definitions() {
        let domains = parse_catalog(AQUARIUM).unwrap();
        assert_eq!(domains.len(), 1);

        let fish = &domains[0].tables[1];
        assert_eq!(fish.name, "fish");
        assert_eq!(fish.foreign_keys[0].referenced_column, "id");
        assert!(fish.column_spec("nickname").unwrap().nullable);
        assert_eq!(
            fish.column_spec("nickname").unwrap().column_type,
            ColumnType::Text {
                kind: TextKind::FirstName
            }
        );
    }

    #[test]
    fn test_file_domain_registers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aquarium.toml");
        std::fs::write(&path, AQUARIUM).unwrap();

        let mut catalog = Catalog::builtin().unwrap();
        catalog.load_file(&path).unwrap();

        let schema = catalog.get_schema("aquarium").unwrap();
        let order: Vec<&str> = schema.generation_order().map(|t| t.name.as_str()).collect();
        assert_eq!(order, vec!["species", "fish"]);
    }

    #[test]
    fn test_infinite_decimal_bounds_rejected_on_load() {
        let toml = r#"
[[domains]]
name = "ledger"

[[domains.tables]]
name = "entries"
columns = [
    { name = "id", type = "id", primary_key = "sequential" },
    { name = "amount", type = "decimal", min = -inf, max = inf },
]
"#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.toml");
        std::fs::write(&path, toml).unwrap();

        let mut catalog = Catalog::new();
        match catalog.load_file(&path) {
            Err(BizSeedError::SchemaDefinition { table, message, .. }) => {
                assert_eq!(table, "entries");
                assert!(message.contains("not finite"));
            }
            other => panic!("expected SchemaDefinition, got {:?}", other),
        }
        assert!(catalog.get_schema("ledger").is_err());
    }

    #[test]
    fn test_unknown_text_kind_rejected() {
        let toml = r#"
[[domains]]
name = "bad"

[[domains.tables]]
name = "t"
columns = [{ name = "id", type = "text", kind = "emoji" }]
"#;
        assert!(parse_catalog(toml).is_err());
    }

    #[test]
    fn test_empty_file_rejected() {
        assert_eq!(
            parse_catalog("").unwrap_err(),
            "no [[domains]] declared".to_string()
        );
    }

    #[test]
    fn test_invalid_file_leaves_catalog_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        // Second domain references a table that does not exist.
        std::fs::write(
            &path,
            r#"
[[domains]]
name = "ok"
[[domains.tables]]
name = "a"
columns = [{ name = "id", type = "id", primary_key = "sequential" }]

[[domains]]
name = "broken"
[[domains.tables]]
name = "b"
columns = [
    { name = "id", type = "id", primary_key = "sequential" },
    { name = "a_id", type = "id" },
]
foreign_keys = [{ column = "a_id", references = "a" }]
"#,
        )
        .unwrap();

        let mut catalog = Catalog::new();
        assert!(matches!(
            catalog.load_file(&path),
            Err(BizSeedError::SchemaDefinition { .. })
        ));
        assert_eq!(catalog.domains().count(), 0);
    }

    #[test]
    fn test_missing_file() {
        let err = read_catalog_file(Path::new("/nonexistent/catalog.toml")).unwrap_err();
        assert!(matches!(err, BizSeedError::CatalogFile { .. }));
    }
}
