use anyhow::{Context, Result};
use comfy_table::{Cell, Table as ComfyTable};

use bizseed_core::check::fingerprint::structure_fingerprint;
use bizseed_core::schema::sqlite::read_structure;

use crate::args::{InspectArgs, SchemaFormat};

pub async fn run(args: &InspectArgs) -> Result<()> {
    let structure = read_structure(&args.db)
        .await
        .with_context(|| format!("Failed to inspect {}", args.db.display()))?;

    match args.format {
        SchemaFormat::Json => {
            let json = serde_json::json!({
                "database": args.db,
                "fingerprint": structure_fingerprint(&structure),
                "structure": structure,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        SchemaFormat::Table => {
            println!("Database: {}", args.db.display());
            println!(
                "Tables: {}  Rows: {}  Fingerprint: {}",
                structure.tables.len(),
                structure.total_rows(),
                &structure_fingerprint(&structure)[..16]
            );
            println!();

            let mut t = ComfyTable::new();
            t.set_header(vec!["Table", "Rows", "Columns", "References"]);
            for table in structure.tables.values() {
                let references: Vec<String> = table
                    .foreign_keys
                    .iter()
                    .map(|fk| format!("{} → {}", fk.column, fk.referenced_table))
                    .collect();
                t.add_row(vec![
                    Cell::new(&table.name),
                    Cell::new(table.row_count),
                    Cell::new(table.columns.len()),
                    Cell::new(references.join("\n")),
                ]);
            }
            println!("{}", t);

            if !structure.metadata.is_empty() {
                println!();
                let mut m = ComfyTable::new();
                m.set_header(vec!["Metadata", "Value"]);
                for (key, value) in &structure.metadata {
                    m.add_row(vec![Cell::new(key), Cell::new(value)]);
                }
                println!("{}", m);
            }
        }
    }

    Ok(())
}
