use std::path::Path;
use std::process;

use anyhow::{Context, Result};
use serde::Serialize;

use bizseed_core::check::{self, Violation};

use crate::args::{ReportFormat, VerifyArgs};

#[derive(Serialize)]
struct VerifyReport<'a> {
    database: &'a Path,
    domain: &'a str,
    consistent: bool,
    violations: &'a [Violation],
}

/// Audit a generated store.
///
/// Exit codes:
///   0: every foreign key resolves
///   1: the audit itself failed
///   2: dangling references found
pub async fn run(args: &VerifyArgs, catalog_path: Option<&Path>) -> Result<()> {
    let config = super::load_config()?;
    let catalog = super::load_catalog(catalog_path, config.as_ref())?;
    let schema = catalog.get_schema(&args.domain)?;

    let violations = check::verify(&args.db, schema)
        .await
        .with_context(|| format!("Failed to audit {}", args.db.display()))?;

    match args.format {
        ReportFormat::Json => {
            let report = VerifyReport {
                database: &args.db,
                domain: &schema.domain,
                consistent: violations.is_empty(),
                violations: &violations,
            };
            let json = serde_json::to_string_pretty(&report)
                .context("Failed to serialize violation report")?;
            println!("{}", json);
        }
        ReportFormat::Text => {
            println!("{}", check::summary(&violations));
        }
    }

    if !violations.is_empty() {
        process::exit(2);
    }

    Ok(())
}
