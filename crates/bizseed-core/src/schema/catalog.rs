//! # Schema Catalog
//!
//! The catalog maps a business domain ("retail", "healthcare", ...) to its
//! typed table definitions. Every entry is validated once, when it is
//! registered: identifiers, primary keys, foreign-key targets, value ranges
//! and the absence of dependency cycles. A defective entry is rejected as a
//! whole and never partially registered.
//!
//! A `Catalog` is immutable once built and is `Send + Sync`, so independent
//! generation runs can share one behind an `Arc`.

use indexmap::IndexMap;
use regex::Regex;
use std::path::Path;

use crate::error::{BizSeedError, Result};
use crate::graph::topo;
use crate::schema::types::{
    ColumnSpec, ColumnType, ForeignKeySpec, RowRule, TableSpec, METADATA_TABLE,
};

/// One validated catalog entry.
#[derive(Debug, Clone)]
pub struct DomainSchema {
    pub domain: String,
    /// Tables in declaration order.
    pub tables: IndexMap<String, TableSpec>,
    generation_order: Vec<String>,
}

impl DomainSchema {
    /// Validate `tables` and build the entry for `domain`.
    pub fn new(domain: &str, tables: Vec<TableSpec>) -> Result<Self> {
        let tables = validate_tables(domain, tables)?;
        let generation_order = topo::order_names(domain, &tables)?;

        Ok(Self {
            domain: domain.to_string(),
            tables,
            generation_order,
        })
    }

    pub fn table(&self, name: &str) -> Option<&TableSpec> {
        self.tables.get(name)
    }

    /// Tables in generation order (every parent before its children).
    pub fn generation_order(&self) -> impl Iterator<Item = &TableSpec> + '_ {
        self.generation_order
            .iter()
            .filter_map(move |name| self.tables.get(name))
    }

    /// Every declared foreign key with its owning table, in declaration order.
    pub fn foreign_keys(&self) -> impl Iterator<Item = (&TableSpec, &ForeignKeySpec)> + '_ {
        self.tables
            .values()
            .flat_map(|t| t.foreign_keys.iter().map(move |fk| (t, fk)))
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn foreign_key_count(&self) -> usize {
        self.tables.values().map(|t| t.foreign_keys.len()).sum()
    }

    pub fn column_count(&self) -> usize {
        self.tables.values().map(|t| t.columns.len()).sum()
    }
}

/// Registry of validated domain schemas.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    domains: IndexMap<String, DomainSchema>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding the built-in business domains.
    pub fn builtin() -> Result<Self> {
        let mut catalog = Self::new();
        for (domain, tables) in crate::schema::builtin::domains() {
            catalog.register(domain, tables)?;
        }
        Ok(catalog)
    }

    /// Validate and add a domain. Domain names are matched case-insensitively.
    pub fn register(&mut self, domain: &str, tables: Vec<TableSpec>) -> Result<()> {
        let key = normalize_domain(domain);
        if self.domains.contains_key(&key) {
            return Err(BizSeedError::SchemaDefinition {
                domain: key,
                table: "*".to_string(),
                message: "domain is already registered".to_string(),
            });
        }

        let schema = DomainSchema::new(&key, tables)?;
        tracing::debug!(
            "Registered domain '{}' ({} tables, {} foreign keys)",
            key,
            schema.table_count(),
            schema.foreign_key_count()
        );
        self.domains.insert(key, schema);
        Ok(())
    }

    /// Register every domain defined in a TOML catalog file.
    ///
    /// All domains in the file are validated before any is added, so a
    /// defective file leaves the catalog unchanged.
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let definitions = crate::schema::file::read_catalog_file(path)?;

        let mut staged = self.clone();
        for definition in definitions {
            staged.register(&definition.name, definition.tables)?;
        }
        *self = staged;
        Ok(())
    }

    /// Look up a domain's schema.
    pub fn get_schema(&self, domain: &str) -> Result<&DomainSchema> {
        self.domains
            .get(&normalize_domain(domain))
            .ok_or_else(|| BizSeedError::UnknownDomain {
                domain: domain.to_string(),
                available: self.domains.keys().cloned().collect::<Vec<_>>().join(", "),
            })
    }

    /// Registered domain names, in registration order.
    pub fn domains(&self) -> impl Iterator<Item = &str> + '_ {
        self.domains.keys().map(|k| k.as_str())
    }

    pub fn schemas(&self) -> impl Iterator<Item = &DomainSchema> + '_ {
        self.domains.values()
    }
}

fn normalize_domain(domain: &str) -> String {
    domain.trim().to_lowercase()
}

/// Structural checks for one domain. Returns the tables keyed by name in
/// declaration order.
fn validate_tables(domain: &str, tables: Vec<TableSpec>) -> Result<IndexMap<String, TableSpec>> {
    let identifier = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").map_err(|e| BizSeedError::Config {
        message: format!("identifier pattern failed to compile: {}", e),
    })?;

    let defect = |table: &str, message: String| BizSeedError::SchemaDefinition {
        domain: domain.to_string(),
        table: table.to_string(),
        message,
    };

    if !identifier.is_match(domain) {
        return Err(defect("*", format!("'{}' is not a valid domain name", domain)));
    }
    if tables.is_empty() {
        return Err(defect("*", "domain declares no tables".to_string()));
    }

    let mut by_name: IndexMap<String, TableSpec> = IndexMap::new();

    for table in tables {
        if !identifier.is_match(&table.name) {
            return Err(defect(&table.name, "invalid table name".to_string()));
        }
        if table.name.eq_ignore_ascii_case(METADATA_TABLE) {
            return Err(defect(
                &table.name,
                format!("'{}' is reserved for store metadata", METADATA_TABLE),
            ));
        }
        if by_name.contains_key(&table.name) {
            return Err(defect(&table.name, "table is declared twice".to_string()));
        }

        let mut seen = Vec::new();
        for column in &table.columns {
            if !identifier.is_match(&column.name) {
                return Err(defect(
                    &table.name,
                    format!("invalid column name '{}'", column.name),
                ));
            }
            if seen.contains(&column.name.as_str()) {
                return Err(defect(
                    &table.name,
                    format!("column '{}' is declared twice", column.name),
                ));
            }
            seen.push(column.name.as_str());
            validate_column_type(&table.name, &column.name, &column.column_type)
                .map_err(|message| defect(&table.name, message))?;
        }

        let primary_keys: Vec<_> = table.columns.iter().filter(|c| c.is_primary_key()).collect();
        match primary_keys.as_slice() {
            [pk] => {
                if pk.column_type != ColumnType::Id {
                    return Err(defect(
                        &table.name,
                        format!("primary key '{}' must have type id", pk.name),
                    ));
                }
                if pk.nullable {
                    return Err(defect(
                        &table.name,
                        format!("primary key '{}' cannot be nullable", pk.name),
                    ));
                }
            }
            [] => return Err(defect(&table.name, "no primary key column".to_string())),
            _ => {
                return Err(defect(
                    &table.name,
                    "more than one primary key column".to_string(),
                ))
            }
        }

        for rule in &table.rules {
            validate_rule(&table, rule).map_err(|message| {
                defect(&table.name, format!("rule '{}': {}", rule, message))
            })?;
        }

        by_name.insert(table.name.clone(), table);
    }

    for table in by_name.values() {
        let mut fk_columns: Vec<&str> = Vec::new();
        for fk in &table.foreign_keys {
            let reference = format!(
                "{}.{} -> {}.{}",
                table.name, fk.column, fk.references, fk.referenced_column
            );

            if fk_columns.contains(&fk.column.as_str()) {
                return Err(defect(
                    &table.name,
                    format!("column '{}' has more than one foreign key", fk.column),
                ));
            }
            fk_columns.push(&fk.column);

            let column = table.column_spec(&fk.column).ok_or_else(|| {
                defect(
                    &table.name,
                    format!("foreign key {} uses undeclared column '{}'", reference, fk.column),
                )
            })?;
            if column.column_type != ColumnType::Id {
                return Err(defect(
                    &table.name,
                    format!("foreign key column in {} must have type id", reference),
                ));
            }
            if column.is_primary_key() {
                return Err(defect(
                    &table.name,
                    format!("foreign key {} cannot use the primary key column", reference),
                ));
            }

            let parent = by_name.get(&fk.references).ok_or_else(|| {
                defect(
                    &table.name,
                    format!(
                        "foreign key {} references unknown table '{}'",
                        reference, fk.references
                    ),
                )
            })?;
            let parent_pk = parent.primary_key().map(|c| c.name.as_str());
            if parent_pk != Some(fk.referenced_column.as_str()) {
                return Err(defect(
                    &table.name,
                    format!(
                        "foreign key {} must reference the primary key of '{}'",
                        reference, fk.references
                    ),
                ));
            }
        }
    }

    Ok(by_name)
}

fn validate_rule(table: &TableSpec, rule: &RowRule) -> std::result::Result<(), String> {
    let column = rule_column(table, rule.column())?;
    let other = rule_column(table, rule.other())?;
    if column.name == other.name {
        return Err("a column cannot be compared with itself".to_string());
    }

    match rule {
        RowRule::Below { .. } => match (lowest(&column.column_type), lowest(&other.column_type)) {
            (Some(low), Some(bound_low)) if low < bound_low => Ok(()),
            (Some(_), Some(_)) => Err(format!(
                "'{}' cannot go below the smallest '{}'",
                column.name, other.name
            )),
            _ => Err("both columns must be integer or decimal".to_string()),
        },
        RowRule::NotBefore { .. } => match (&column.column_type, &other.column_type) {
            (ColumnType::Date, ColumnType::Date) => Ok(()),
            (ColumnType::Timestamp, ColumnType::Timestamp) => Ok(()),
            _ => Err("both columns must be dates or both timestamps".to_string()),
        },
    }
}

fn rule_column<'a>(
    table: &'a TableSpec,
    name: &str,
) -> std::result::Result<&'a ColumnSpec, String> {
    let column = table
        .column_spec(name)
        .ok_or_else(|| format!("unknown column '{}'", name))?;
    if column.is_primary_key() || table.foreign_key_for(name).is_some() {
        return Err(format!("key column '{}' cannot take part in a rule", name));
    }
    Ok(column)
}

/// Smallest value a numeric column can generate.
fn lowest(column_type: &ColumnType) -> Option<f64> {
    match column_type {
        ColumnType::Integer { min, .. } => Some(*min as f64),
        ColumnType::Decimal { min, scale, .. } => {
            let factor = 10f64.powi(*scale as i32);
            Some((min * factor).ceil() / factor)
        }
        _ => None,
    }
}

/// Largest magnitude a scaled decimal bound may reach and still map exactly
/// onto an integer grid (2^53).
const MAX_SCALED_DECIMAL: f64 = 9_007_199_254_740_992.0;

fn validate_column_type(
    table: &str,
    column: &str,
    column_type: &ColumnType,
) -> std::result::Result<(), String> {
    match column_type {
        ColumnType::Integer { min, max } if min > max => Err(format!(
            "{}.{}: integer range {}..{} is empty",
            table, column, min, max
        )),
        ColumnType::Decimal { min, max, scale } => {
            validate_decimal(*min, *max, *scale).map_err(|m| format!("{}.{}: {}", table, column, m))
        }
        ColumnType::Status { values } if values.is_empty() => Err(format!(
            "{}.{}: status column needs at least one value",
            table, column
        )),
        _ => Ok(()),
    }
}

fn validate_decimal(min: f64, max: f64, scale: u32) -> std::result::Result<(), String> {
    if !min.is_finite() || !max.is_finite() || !(max - min).is_finite() {
        return Err(format!("decimal range {}..{} is not finite", min, max));
    }
    if min > max {
        return Err(format!("decimal range {}..{} is empty", min, max));
    }
    if scale > 10 {
        return Err(format!("decimal scale {} exceeds 10", scale));
    }

    let factor = 10f64.powi(scale as i32);
    if min.abs().max(max.abs()) * factor > MAX_SCALED_DECIMAL {
        return Err(format!(
            "decimal range {}..{} is too wide for scale {}",
            min, max, scale
        ));
    }
    if (min * factor).ceil() > (max * factor).floor() {
        return Err(format!(
            "decimal range {}..{} holds no value at scale {}",
            min, max, scale
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::*;

    fn shop() -> Vec<TableSpec> {
        vec![
            TableSpec::new("customers")
                .column(ColumnSpec::id())
                .column(ColumnSpec::text("name", TextKind::FullName)),
            TableSpec::new("orders")
                .column(ColumnSpec::id())
                .column(ColumnSpec::reference("customer_id"))
                .references("customer_id", "customers"),
        ]
    }

    fn expect_definition_error(result: Result<()>, table: &str, fragment: &str) {
        match result {
            Err(BizSeedError::SchemaDefinition {
                table: t, message, ..
            }) => {
                assert_eq!(t, table);
                assert!(
                    message.contains(fragment),
                    "message '{}' should mention '{}'",
                    message,
                    fragment
                );
            }
            other => panic!("expected SchemaDefinition, got {:?}", other),
        }
    }

    #[test]
    fn test_builtin_catalog_loads() {
        let catalog = Catalog::builtin().unwrap();
        let domains: Vec<&str> = catalog.domains().collect();
        assert_eq!(domains, vec!["retail", "healthcare", "technology", "finance"]);
    }

    #[test]
    fn test_get_schema_case_insensitive() {
        let catalog = Catalog::builtin().unwrap();
        let schema = catalog.get_schema("Retail").unwrap();
        assert_eq!(schema.domain, "retail");
        assert!(schema.table("orders").is_some());
    }

    #[test]
    fn test_unknown_domain() {
        let catalog = Catalog::builtin().unwrap();
        match catalog.get_schema("aquarium") {
            Err(BizSeedError::UnknownDomain { domain, available }) => {
                assert_eq!(domain, "aquarium");
                assert!(available.contains("retail"));
            }
            other => panic!("expected UnknownDomain, got {:?}", other.map(|s| &s.domain)),
        }
    }

    #[test]
    fn test_register_custom_domain() {
        let mut catalog = Catalog::new();
        catalog.register("shop", shop()).unwrap();

        let schema = catalog.get_schema("shop").unwrap();
        let order: Vec<&str> = schema.generation_order().map(|t| t.name.as_str()).collect();
        assert_eq!(order, vec!["customers", "orders"]);
        assert_eq!(schema.foreign_key_count(), 1);
    }

    #[test]
    fn test_duplicate_domain_rejected() {
        let mut catalog = Catalog::new();
        catalog.register("shop", shop()).unwrap();
        expect_definition_error(catalog.register("SHOP", shop()), "*", "already registered");
    }

    #[test]
    fn test_unknown_reference_rejected_and_not_registered() {
        let mut catalog = Catalog::new();
        let mut tables = shop();
        tables[1] = tables[1]
            .clone()
            .column(ColumnSpec::reference("store_id"))
            .references("store_id", "stores");

        expect_definition_error(
            catalog.register("shop", tables),
            "orders",
            "unknown table 'stores'",
        );
        assert!(catalog.get_schema("shop").is_err());
    }

    #[test]
    fn test_reference_must_target_primary_key() {
        let mut tables = shop();
        tables[1].foreign_keys[0].referenced_column = "name".to_string();

        expect_definition_error(
            Catalog::new().register("shop", tables),
            "orders",
            "primary key of 'customers'",
        );
    }

    #[test]
    fn test_foreign_key_column_must_exist() {
        let tables = vec![
            TableSpec::new("customers").column(ColumnSpec::id()),
            TableSpec::new("orders")
                .column(ColumnSpec::id())
                .references("customer_id", "customers"),
        ];

        expect_definition_error(
            Catalog::new().register("shop", tables),
            "orders",
            "undeclared column 'customer_id'",
        );
    }

    #[test]
    fn test_missing_primary_key_rejected() {
        let tables =
            vec![TableSpec::new("notes").column(ColumnSpec::text("body", TextKind::Sentence))];
        expect_definition_error(
            Catalog::new().register("notes", tables),
            "notes",
            "no primary key",
        );
    }

    #[test]
    fn test_reserved_table_name_rejected() {
        let tables = vec![TableSpec::new("_company_metadata").column(ColumnSpec::id())];
        expect_definition_error(
            Catalog::new().register("meta", tables),
            "_company_metadata",
            "reserved",
        );
    }

    #[test]
    fn test_invalid_identifier_rejected() {
        let tables = vec![TableSpec::new("order items").column(ColumnSpec::id())];
        expect_definition_error(
            Catalog::new().register("shop", tables),
            "order items",
            "invalid table name",
        );
    }

    #[test]
    fn test_empty_ranges_rejected() {
        let tables = vec![TableSpec::new("reviews")
            .column(ColumnSpec::id())
            .column(ColumnSpec::integer("rating", 5, 1))];
        expect_definition_error(
            Catalog::new().register("shop", tables),
            "reviews",
            "range 5..1",
        );

        let tables = vec![TableSpec::new("orders")
            .column(ColumnSpec::id())
            .column(ColumnSpec::status("status", &[]))];
        expect_definition_error(
            Catalog::new().register("shop", tables),
            "orders",
            "at least one value",
        );
    }

    fn priced(column: ColumnSpec) -> Vec<TableSpec> {
        vec![TableSpec::new("rates").column(ColumnSpec::id()).column(column)]
    }

    #[test]
    fn test_decimal_without_value_at_scale_rejected() {
        expect_definition_error(
            Catalog::new().register("fx", priced(ColumnSpec::decimal("rate", 1.001, 1.009))),
            "rates",
            "no value at scale 2",
        );
        // 1.01 sits on the grid
        assert!(Catalog::new()
            .register("fx", priced(ColumnSpec::decimal("rate", 1.001, 1.019)))
            .is_ok());
    }

    #[test]
    fn test_decimal_infinite_bounds_rejected() {
        let open_low = ColumnSpec::decimal("rate", f64::NEG_INFINITY, 1.0);
        expect_definition_error(Catalog::new().register("fx", priced(open_low)), "rates", "finite");

        let open_high = ColumnSpec::decimal("rate", 0.0, f64::INFINITY);
        expect_definition_error(
            Catalog::new().register("fx", priced(open_high)),
            "rates",
            "finite",
        );

        let nan = ColumnSpec::decimal("rate", f64::NAN, 1.0);
        expect_definition_error(Catalog::new().register("fx", priced(nan)), "rates", "finite");
    }

    #[test]
    fn test_decimal_overflowing_width_rejected() {
        let widest = ColumnSpec::decimal("rate", -f64::MAX, f64::MAX);
        expect_definition_error(Catalog::new().register("fx", priced(widest)), "rates", "finite");

        let huge = ColumnSpec::decimal("rate", 0.0, 1e300);
        expect_definition_error(Catalog::new().register("fx", priced(huge)), "rates", "too wide");
    }

    fn listing() -> TableSpec {
        TableSpec::new("listings")
            .column(ColumnSpec::id())
            .column(ColumnSpec::decimal("price", 5.0, 500.0))
            .column(ColumnSpec::decimal("cost", 2.0, 250.0))
            .column(ColumnSpec::timestamp("created_at"))
            .column(ColumnSpec::timestamp("updated_at"))
            .column(ColumnSpec::date("listed_on"))
    }

    #[test]
    fn test_row_rules_accepted() {
        let table = listing()
            .below("cost", "price")
            .not_before("updated_at", "created_at");
        let mut catalog = Catalog::new();
        catalog.register("market", vec![table]).unwrap();
        assert_eq!(catalog.get_schema("market").unwrap().tables["listings"].rules.len(), 2);
    }

    #[test]
    fn test_invalid_row_rules_rejected() {
        let cases = [
            (listing().below("margin", "price"), "unknown column 'margin'"),
            (listing().below("price", "cost"), "cannot go below"),
            (listing().below("cost", "created_at"), "integer or decimal"),
            (listing().not_before("updated_at", "listed_on"), "both timestamps"),
            (listing().below("id", "price"), "key column 'id'"),
            (listing().not_before("created_at", "created_at"), "itself"),
        ];
        for (table, fragment) in cases {
            expect_definition_error(
                Catalog::new().register("market", vec![table]),
                "listings",
                fragment,
            );
        }
    }

    #[test]
    fn test_cycle_rejected_at_registration() {
        let tables = vec![
            TableSpec::new("a")
                .column(ColumnSpec::id())
                .column(ColumnSpec::reference("b_id"))
                .references("b_id", "b"),
            TableSpec::new("b")
                .column(ColumnSpec::id())
                .column(ColumnSpec::reference("a_id"))
                .references("a_id", "a"),
        ];

        let mut catalog = Catalog::new();
        assert!(matches!(
            catalog.register("loop", tables),
            Err(BizSeedError::CyclicSchema { .. })
        ));
        assert_eq!(catalog.domains().count(), 0);
    }

    #[test]
    fn test_catalog_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Catalog>();
    }
}
