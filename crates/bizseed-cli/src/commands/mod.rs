pub mod domains;
pub mod generate;
pub mod graph;
pub mod inspect;
pub mod schema;
pub mod verify;

use std::path::Path;

use anyhow::{Context, Result};

use bizseed_core::config::{read_config, BizSeedConfig};
use bizseed_core::Catalog;

/// Built-in domains plus, if given, a catalog file. An explicit `--catalog`
/// wins over `[generate] catalog` from bizseed.toml.
pub fn load_catalog(explicit: Option<&Path>, config: Option<&BizSeedConfig>) -> Result<Catalog> {
    let mut catalog = Catalog::builtin().context("Built-in catalog is invalid")?;

    let path = explicit
        .map(Path::to_path_buf)
        .or_else(|| config.and_then(|c| c.catalog_path()));
    if let Some(path) = path {
        catalog
            .load_file(&path)
            .with_context(|| format!("Failed to load catalog file {}", path.display()))?;
    }
    Ok(catalog)
}

/// Optional bizseed.toml from the current directory.
pub fn load_config() -> Result<Option<BizSeedConfig>> {
    Ok(read_config(Path::new("."))?)
}
