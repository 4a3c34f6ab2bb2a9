use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Table as ComfyTable};
use serde::Serialize;

use bizseed_core::check::fingerprint::schema_fingerprint;
use bizseed_core::schema::types::TableSpec;

use crate::args::{SchemaArgs, SchemaFormat};

#[derive(Serialize)]
struct SchemaReport<'a> {
    domain: &'a str,
    fingerprint: String,
    /// Tables in generation order.
    tables: Vec<&'a TableSpec>,
}

pub fn run(args: &SchemaArgs, catalog_path: Option<&Path>) -> Result<()> {
    let config = super::load_config()?;
    let catalog = super::load_catalog(catalog_path, config.as_ref())?;
    let schema = catalog.get_schema(&args.domain)?;

    match args.format {
        SchemaFormat::Json => {
            let report = SchemaReport {
                domain: &schema.domain,
                fingerprint: schema_fingerprint(schema),
                tables: schema.generation_order().collect(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        SchemaFormat::Table => {
            println!("Domain: {}", schema.domain);
            println!(
                "Tables: {}  Columns: {}  Foreign Keys: {}",
                schema.table_count(),
                schema.column_count(),
                schema.foreign_key_count()
            );
            println!();

            for (position, table) in schema.generation_order().enumerate() {
                println!("━━━ {}. {} ━━━", position + 1, table.name);

                let mut t = ComfyTable::new();
                t.set_header(vec!["Column", "Type", "SQL", "Nullable", "PK", "FK"]);

                for column in &table.columns {
                    let fk_target = table
                        .foreign_key_for(&column.name)
                        .map(|fk| format!("→ {}.{}", fk.references, fk.referenced_column));

                    t.add_row(vec![
                        Cell::new(&column.name),
                        Cell::new(column.column_type.to_string()),
                        Cell::new(column.column_type.sql_type()),
                        Cell::new(if column.nullable { "YES" } else { "NO" }),
                        Cell::new(if column.is_primary_key() { "PK" } else { "" }),
                        Cell::new(fk_target.as_deref().unwrap_or("")),
                    ]);
                }

                println!("{}", t);
                if !table.rules.is_empty() {
                    let rules: Vec<String> = table.rules.iter().map(|r| r.to_string()).collect();
                    println!("Rules: {}", rules.join(", "));
                }
                println!();
            }
        }
    }

    Ok(())
}
