use indexmap::IndexMap;
use serde::Serialize;

use crate::error::{BizSeedError, Result};
use crate::schema::catalog::DomainSchema;

/// Requested row counts per table.
///
/// Counts are signed so that a caller's zero or negative request can be
/// represented and reported as `InvalidRowCount` instead of wrapping.
/// Tables of the domain that are absent from the plan are created empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowPlan {
    counts: IndexMap<String, i64>,
}

impl RowPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace one table's count (builder style).
    pub fn with(mut self, table: impl Into<String>, rows: i64) -> Self {
        self.set(table, rows);
        self
    }

    pub fn set(&mut self, table: impl Into<String>, rows: i64) {
        self.counts.insert(table.into(), rows);
    }

    /// The same count for every table of `schema`, in generation order.
    pub fn uniform(schema: &DomainSchema, rows: i64) -> Self {
        schema
            .generation_order()
            .map(|t| (t.name.clone(), rows))
            .collect()
    }

    /// Parse `table=rows` pairs separated by commas, e.g. `users=3,subscriptions=5`.
    pub fn parse(spec: &str) -> Result<Self> {
        let mut plan = Self::new();
        for pair in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (table, rows) = pair.split_once('=').ok_or_else(|| BizSeedError::Config {
                message: format!("row plan entry '{}' is not of the form table=rows", pair),
            })?;
            let rows: i64 = rows.trim().parse().map_err(|_| BizSeedError::Config {
                message: format!(
                    "row count '{}' for table '{}' is not an integer",
                    rows.trim(),
                    table.trim()
                ),
            })?;
            plan.set(table.trim(), rows);
        }
        Ok(plan)
    }

    /// Overlay `other` on this plan; entries in `other` win.
    pub fn merge(mut self, other: &RowPlan) -> Self {
        for (table, rows) in &other.counts {
            self.set(table.clone(), *rows);
        }
        self
    }

    pub fn get(&self, table: &str) -> Option<i64> {
        self.counts.get(table).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> + '_ {
        self.counts.iter().map(|(t, n)| (t.as_str(), *n))
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn total_rows(&self) -> i64 {
        self.counts.values().filter(|n| **n > 0).sum()
    }

    /// Check the plan against a domain without generating anything.
    ///
    /// Fails with `UnknownTable` for tables outside the domain,
    /// `InvalidRowCount` for counts below 1, and `EmptyParentPool` when a
    /// planned table references a table that will have no rows.
    pub fn validate(&self, schema: &DomainSchema) -> Result<()> {
        for (table, rows) in self.iter() {
            if schema.table(table).is_none() {
                return Err(BizSeedError::UnknownTable {
                    domain: schema.domain.clone(),
                    table: table.to_string(),
                });
            }
            if rows <= 0 {
                return Err(BizSeedError::InvalidRowCount {
                    table: table.to_string(),
                    requested: rows,
                });
            }
        }

        for table in schema.generation_order() {
            if self.get(&table.name).is_none() {
                continue;
            }
            for fk in &table.foreign_keys {
                if self.get(&fk.references).is_none() {
                    return Err(BizSeedError::EmptyParentPool {
                        table: table.name.clone(),
                        column: fk.column.clone(),
                        referenced_table: fk.references.clone(),
                    });
                }
            }
        }

        Ok(())
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for RowPlan {
    fn from_iter<I: IntoIterator<Item = (S, i64)>>(iter: I) -> Self {
        let mut plan = Self::new();
        for (table, rows) in iter {
            plan.set(table, rows);
        }
        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::catalog::Catalog;

    fn retail() -> DomainSchema {
        Catalog::builtin().unwrap().get_schema("retail").unwrap().clone()
    }

    #[test]
    fn test_parse() {
        let plan = RowPlan::parse("users=3, subscriptions = 5,").unwrap();
        assert_eq!(plan.get("users"), Some(3));
        assert_eq!(plan.get("subscriptions"), Some(5));
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.total_rows(), 8);
    }

    #[test]
    fn test_parse_keeps_negative_counts() {
        let plan = RowPlan::parse("users=-2").unwrap();
        assert_eq!(plan.get("users"), Some(-2));
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            RowPlan::parse("users"),
            Err(BizSeedError::Config { .. })
        ));
        assert!(matches!(
            RowPlan::parse("users=many"),
            Err(BizSeedError::Config { .. })
        ));
    }

    #[test]
    fn test_uniform_covers_every_table() {
        let schema = retail();
        let plan = RowPlan::uniform(&schema, 4);
        assert_eq!(plan.len(), schema.table_count());
        assert!(plan.validate(&schema).is_ok());
    }

    #[test]
    fn test_merge_overrides() {
        let plan = RowPlan::new()
            .with("users", 10)
            .with("subscriptions", 10)
            .merge(&RowPlan::new().with("users", 2));
        assert_eq!(plan.get("users"), Some(2));
        assert_eq!(plan.get("subscriptions"), Some(10));
    }

    #[test]
    fn test_validate_unknown_table() {
        let plan = RowPlan::new().with("customers", 2).with("invoices", 2);
        match plan.validate(&retail()) {
            Err(BizSeedError::UnknownTable { domain, table }) => {
                assert_eq!(domain, "retail");
                assert_eq!(table, "invoices");
            }
            other => panic!("expected UnknownTable, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_invalid_count() {
        let plan = RowPlan::new().with("customers", 0);
        assert!(matches!(
            plan.validate(&retail()),
            Err(BizSeedError::InvalidRowCount { requested: 0, .. })
        ));
    }

    #[test]
    fn test_validate_missing_parent() {
        let plan = RowPlan::new().with("customers", 3).with("orders", 4);
        assert!(plan.validate(&retail()).is_ok());

        let plan = RowPlan::new().with("orders", 4);
        match plan.validate(&retail()) {
            Err(BizSeedError::EmptyParentPool {
                table,
                referenced_table,
                ..
            }) => {
                assert_eq!(table, "orders");
                assert_eq!(referenced_table, "customers");
            }
            other => panic!("expected EmptyParentPool, got {:?}", other),
        }
    }
}
