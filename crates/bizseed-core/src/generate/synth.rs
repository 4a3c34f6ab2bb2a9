use indexmap::IndexMap;

use crate::error::{BizSeedError, Result};
use crate::generate::foreign_key::KeyPools;
use crate::generate::providers::ValueGenerator;
use crate::generate::value::Value;
use crate::schema::types::{ColumnType, RowRule, TableSpec};

/// Upper bound on rows reserved up front; larger tables grow as they go.
const MAX_PREALLOCATED_ROWS: usize = 1024;

/// Where a repaired `below` value lands between the column's smallest
/// value and the bound.
const BELOW_SHARE: f64 = 0.7;

/// One synthesized row: column name to value, in column declaration order.
pub type GeneratedRow = IndexMap<String, Value>;

/// Synthesize `row_count` rows for `table`.
///
/// - the primary key runs 1..=row_count;
/// - FK columns sample uniformly from the referenced table's pool in `pools`;
/// - nullable columns (FK or not) are NULL at the generator's null rate;
/// - every other value comes from `values`;
/// - the table's rules are applied last, see [`apply_rules`].
///
/// All referenced pools are checked before any row is produced, so a missing
/// parent fails fast with `EmptyParentPool`. On success the table's keys are
/// recorded in `pools` for the tables generated after it.
pub fn synthesize<G: ValueGenerator + ?Sized>(
    table: &TableSpec,
    row_count: i64,
    pools: &mut KeyPools,
    values: &mut G,
) -> Result<Vec<GeneratedRow>> {
    if row_count <= 0 {
        return Err(BizSeedError::InvalidRowCount {
            table: table.name.clone(),
            requested: row_count,
        });
    }

    for fk in &table.foreign_keys {
        if pools.is_empty(&fk.references) {
            return Err(BizSeedError::EmptyParentPool {
                table: table.name.clone(),
                column: fk.column.clone(),
                referenced_table: fk.references.clone(),
            });
        }
    }

    let count = row_count as usize;
    let reserved = count.min(MAX_PREALLOCATED_ROWS);
    let mut rows = Vec::with_capacity(reserved);
    let mut keys = Vec::with_capacity(reserved);

    for row_index in 0..count {
        let mut row = GeneratedRow::with_capacity(table.columns.len());

        for column in &table.columns {
            let value = if column.is_primary_key() {
                let key = row_index as i64 + 1;
                keys.push(key);
                Value::Int(key)
            } else if column.nullable && values.roll_null() {
                Value::Null
            } else if let Some(fk) = table.foreign_key_for(&column.name) {
                match pools.pick(&fk.references, values) {
                    Some(key) => Value::Int(key),
                    None => {
                        return Err(BizSeedError::EmptyParentPool {
                            table: table.name.clone(),
                            column: fk.column.clone(),
                            referenced_table: fk.references.clone(),
                        })
                    }
                }
            } else {
                values.value(&table.name, column, row_index)
            };

            row.insert(column.name.clone(), value);
        }

        apply_rules(table, &mut row);
        rows.push(row);
    }

    tracing::debug!("Synthesized {} rows for '{}'", rows.len(), table.name);
    pools.record(&table.name, keys);
    Ok(rows)
}

/// Bring `row` in line with the table's rules, in declaration order.
///
/// A `below` column that reaches its bound is moved onto its own grid,
/// `BELOW_SHARE` of the way from its smallest value to just under the
/// bound. A `not_before` column earlier than its reference is raised to
/// it. Rows with NULL on either side are left alone.
pub fn apply_rules(table: &TableSpec, row: &mut GeneratedRow) {
    for rule in &table.rules {
        let Some(column) = table.column_spec(rule.column()) else {
            continue;
        };
        let (Some(current), Some(other)) = (row.get(rule.column()), row.get(rule.other())) else {
            continue;
        };

        let adjusted = match rule {
            RowRule::Below { .. } => below(&column.column_type, current, other),
            RowRule::NotBefore { .. } => not_before(current, other),
        };
        if let (Some(value), Some(slot)) = (adjusted, row.get_mut(rule.column())) {
            *slot = value;
        }
    }
}

fn below(column_type: &ColumnType, current: &Value, bound: &Value) -> Option<Value> {
    let (current, bound) = (current.as_number()?, bound.as_number()?);
    if current < bound {
        return None;
    }

    let (min, scale) = match column_type {
        ColumnType::Integer { min, .. } => (*min as f64, 0),
        ColumnType::Decimal { min, scale, .. } => (*min, *scale),
        _ => return None,
    };
    let factor = 10f64.powi(scale as i32);
    let lowest = (min * factor).ceil();
    let highest = (bound * factor).ceil() - 1.0;
    if highest < lowest {
        return None;
    }

    let steps = lowest + ((highest - lowest) * BELOW_SHARE).floor();
    Some(match column_type {
        ColumnType::Integer { .. } => Value::Int(steps as i64),
        _ => Value::Decimal(steps / factor),
    })
}

fn not_before(current: &Value, reference: &Value) -> Option<Value> {
    match (current, reference) {
        (Value::Date(c), Value::Date(r)) if c < r => Some(Value::Date(*r)),
        (Value::Timestamp(c), Value::Timestamp(r)) if c < r => Some(Value::Timestamp(*r)),
        _ => None,
    }
}
