use std::path::Path;

use anyhow::Result;

use bizseed_core::graph::dag::DependencyGraph;
use bizseed_core::graph::visualize::{self, GraphFormat as VizFormat};

use crate::args::GraphArgs;

pub fn run(args: &GraphArgs, catalog_path: Option<&Path>) -> Result<()> {
    let config = super::load_config()?;
    let catalog = super::load_catalog(catalog_path, config.as_ref())?;
    let schema = catalog.get_schema(&args.domain)?;

    let dep_graph = DependencyGraph::from_tables(&schema.tables);

    let format = match args.format {
        crate::args::GraphFormat::Mermaid => VizFormat::Mermaid,
        crate::args::GraphFormat::Dot => VizFormat::Dot,
    };

    let output = visualize::visualize(&dep_graph, format);
    println!("{}", output);

    Ok(())
}
