use std::path::Path;

use anyhow::Result;
use comfy_table::{Cell, Table as ComfyTable};

pub fn run(catalog_path: Option<&Path>) -> Result<()> {
    let config = super::load_config()?;
    let catalog = super::load_catalog(catalog_path, config.as_ref())?;

    let mut t = ComfyTable::new();
    t.set_header(vec!["Domain", "Tables", "Columns", "Foreign Keys", "Generation Order"]);

    for schema in catalog.schemas() {
        let order: Vec<&str> = schema.generation_order().map(|t| t.name.as_str()).collect();
        t.add_row(vec![
            Cell::new(&schema.domain),
            Cell::new(schema.table_count()),
            Cell::new(schema.column_count()),
            Cell::new(schema.foreign_key_count()),
            Cell::new(order.join(" → ")),
        ]);
    }

    println!("{}", t);
    Ok(())
}
