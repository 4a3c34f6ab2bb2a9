use std::path::Path;
use std::process;

use anyhow::{bail, Context, Result};
use comfy_table::{Cell, Table as ComfyTable};
use indicatif::{ProgressBar, ProgressStyle};

use bizseed_core::check::{self, Violation};
use bizseed_core::config::BizSeedConfig;
use bizseed_core::generate::engine::{generate_with_progress, DEFAULT_NULL_RATE};
use bizseed_core::schema::catalog::DomainSchema;
use bizseed_core::{CompanyInfo, DateWindow, GenerationOptions, GenerationRequest, RowPlan};

use crate::args::{Complexity, GenerateArgs};

/// Rows per table when neither `--rows`, `--table-rows` nor bizseed.toml
/// say otherwise.
const DEFAULT_ROWS: i64 = 100;

pub async fn run(args: &GenerateArgs, catalog_path: Option<&Path>) -> Result<()> {
    // Load optional bizseed.toml config
    let config = super::load_config()?;
    let catalog = super::load_catalog(catalog_path, config.as_ref())?;

    let Some(domain) = args
        .domain
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.generate.domain.clone()))
    else {
        bail!(
            "No domain given. Pass --domain, set BIZSEED_DOMAIN, \
             or add `domain` to [generate] in bizseed.toml.\n  Registered domains: {}",
            catalog.domains().collect::<Vec<_>>().join(", ")
        );
    };
    let schema = catalog.get_schema(&domain)?;

    if let Some(cfg) = &config {
        for warning in cfg.validate_against_schema(schema) {
            tracing::warn!("{}", warning);
        }
    }

    let Some(destination) = args
        .output
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.output_path()))
    else {
        bail!(
            "No output path given. Pass --output, set BIZSEED_OUTPUT, \
             or add `output` to [generate] in bizseed.toml."
        );
    };

    let plan = build_plan(args, config.as_ref(), schema)?;
    let options = build_options(args, config.as_ref())?;
    let company = resolve_company(args, config.as_ref(), &schema.domain);

    let request = GenerationRequest {
        domain: schema.domain.clone(),
        plan,
        destination,
        options,
        company: Some(company),
    };

    let total_rows = request.plan.total_rows().max(0) as u64;
    let pb = ProgressBar::new(total_rows);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.cyan} Generating {msg}... {bar:40.cyan/dim} {pos}/{len} ({eta})")?
            .progress_chars("█▓░"),
    );
    pb.set_message(schema.domain.clone());

    let handle = generate_with_progress(
        &catalog,
        &request,
        Some(&|table, current, _total| {
            pb.set_message(format!("{}.{}", schema.domain, table));
            pb.set_position(current as u64);
        }),
    )
    .await;
    let handle = match handle {
        Ok(handle) => handle,
        Err(err) => {
            pb.abandon();
            return Err(err).with_context(|| {
                format!("Failed to generate {}", request.destination.display())
            });
        }
    };
    pb.finish_with_message(format!("{} ✓", schema.domain));

    let should_verify = args.verify
        || config
            .as_ref()
            .and_then(|c| c.generate.verify)
            .unwrap_or(false);
    let violations: Option<Vec<Violation>> = if should_verify {
        Some(
            handle
                .verify(schema)
                .await
                .with_context(|| format!("Failed to audit {}", handle.path.display()))?,
        )
    } else {
        None
    };

    if args.json {
        let json = serde_json::json!({
            "handle": handle,
            "violations": violations,
        });
        println!("{}", serde_json::to_string_pretty(&json)?);
    } else {
        let mut t = ComfyTable::new();
        t.set_header(vec!["Table", "Rows"]);
        for (table, rows) in &handle.row_counts {
            t.add_row(vec![Cell::new(table), Cell::new(rows)]);
        }
        eprintln!("{}", t);
        eprintln!(
            "\n✓ Generated {} rows across {} tables → {}",
            handle.total_rows(),
            handle.row_counts.len(),
            handle.path.display()
        );
        eprintln!(
            "  domain {}  seed {}  company {}",
            handle.domain,
            handle.seed,
            handle.company.as_ref().map(|c| c.id.as_str()).unwrap_or("-")
        );
        if let Some(violations) = &violations {
            eprintln!("{}", check::summary(violations));
        }
    }

    if violations.is_some_and(|v| !v.is_empty()) {
        process::exit(2);
    }

    Ok(())
}

/// Row plan: `--rows`, `--complexity` or `[generate] rows` as the base,
/// then the `[tables.*]` overrides, then `--table-rows` on top.
///
/// If no base is configured anywhere and per-table counts are given, only
/// those tables are planned. With nothing configured at all, every table
/// gets `DEFAULT_ROWS`.
fn build_plan(
    args: &GenerateArgs,
    config: Option<&BizSeedConfig>,
    schema: &DomainSchema,
) -> Result<RowPlan> {
    let overrides = config
        .map(|c| c.table_row_overrides())
        .unwrap_or_default()
        .merge(&RowPlan::parse(&args.table_rows.join(","))?);

    let configured = config.and_then(|c| c.generate.rows);
    let base = match (args.rows, args.complexity, configured) {
        (Some(rows), _, _) => RowPlan::uniform(schema, rows),
        (None, Some(complexity), _) => complexity_plan(schema, complexity),
        (None, None, Some(rows)) => RowPlan::uniform(schema, rows),
        (None, None, None) if overrides.is_empty() => RowPlan::uniform(schema, DEFAULT_ROWS),
        (None, None, None) => RowPlan::new(),
    };

    Ok(base.merge(&overrides))
}

/// How a table is used within its domain, read off the foreign keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableRole {
    /// References nothing.
    Lookup,
    /// References other tables and is itself referenced.
    Core,
    /// References other tables, referenced by none.
    Transaction,
}

fn table_role(schema: &DomainSchema, table: &str) -> TableRole {
    let has_parents = schema
        .table(table)
        .is_some_and(|t| !t.foreign_keys.is_empty());
    let has_children = schema.foreign_keys().any(|(_, fk)| fk.references == table);
    match (has_parents, has_children) {
        (false, _) => TableRole::Lookup,
        (true, true) => TableRole::Core,
        (true, false) => TableRole::Transaction,
    }
}

fn preset_rows(complexity: Complexity, role: TableRole) -> i64 {
    match (complexity, role) {
        (Complexity::Simple, TableRole::Lookup) => 5,
        (Complexity::Simple, TableRole::Core) => 15,
        (Complexity::Simple, TableRole::Transaction) => 25,
        (Complexity::Medium, TableRole::Lookup) => 10,
        (Complexity::Medium, TableRole::Core) => 25,
        (Complexity::Medium, TableRole::Transaction) => 50,
        (Complexity::Complex, TableRole::Lookup) => 15,
        (Complexity::Complex, TableRole::Core) => 40,
        (Complexity::Complex, TableRole::Transaction) => 100,
        (Complexity::Enterprise, TableRole::Lookup) => 25,
        (Complexity::Enterprise, TableRole::Core) => 75,
        (Complexity::Enterprise, TableRole::Transaction) => 200,
    }
}

/// A count for every table of `schema`, sized by its role.
fn complexity_plan(schema: &DomainSchema, complexity: Complexity) -> RowPlan {
    schema
        .tables
        .keys()
        .map(|name| {
            let rows = preset_rows(complexity, table_role(schema, name));
            (name.clone(), rows)
        })
        .collect()
}

/// CLI flags win over bizseed.toml, which wins over the defaults.
fn build_options(
    args: &GenerateArgs,
    config: Option<&BizSeedConfig>,
) -> Result<GenerationOptions> {
    let fallback = DateWindow::default();
    let window = match config {
        Some(cfg) => cfg.date_window(fallback)?,
        None => fallback,
    };
    let date_window = DateWindow::new(
        args.start_date.unwrap_or(window.start),
        args.end_date.unwrap_or(window.end),
    )?;

    let options = GenerationOptions {
        seed: args.seed.or_else(|| config.and_then(|c| c.generate.seed)),
        date_window,
        null_rate: args
            .null_rate
            .or_else(|| config.and_then(|c| c.generate.null_rate))
            .unwrap_or(DEFAULT_NULL_RATE),
    };
    options.validate()?;
    Ok(options)
}

/// Company recorded in the store. Without an explicit id a fresh UUID is
/// assigned so every generated company is distinguishable.
fn resolve_company(
    args: &GenerateArgs,
    config: Option<&BizSeedConfig>,
    domain: &str,
) -> CompanyInfo {
    let configured = config.and_then(|c| c.company_info());

    let id = args
        .company_id
        .clone()
        .or_else(|| configured.as_ref().map(|c| c.id.clone()))
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let name = args
        .company_name
        .clone()
        .or_else(|| configured.map(|c| c.name))
        .unwrap_or_else(|| format!("Synthetic {} company", domain));

    CompanyInfo { id, name }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bizseed_core::Catalog;
    use clap::Parser;

    fn parse(argv: &[&str]) -> GenerateArgs {
        let mut full = vec!["bizseed", "generate"];
        full.extend_from_slice(argv);
        match crate::args::Cli::parse_from(full).command {
            crate::args::Command::Generate(args) => args,
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_plan_defaults_to_every_table() {
        let catalog = Catalog::builtin().unwrap();
        let schema = catalog.get_schema("retail").unwrap();
        let plan = build_plan(&parse(&["--domain", "retail"]), None, schema).unwrap();
        assert_eq!(plan.len(), schema.table_count());
        assert_eq!(plan.get("orders"), Some(DEFAULT_ROWS));
    }

    #[test]
    fn test_table_rows_alone_plan_only_those_tables() {
        let catalog = Catalog::builtin().unwrap();
        let schema = catalog.get_schema("technology").unwrap();
        let args = parse(&["--table-rows", "users=3,subscriptions=5"]);
        let plan = build_plan(&args, None, schema).unwrap();
        assert_eq!(plan.len(), 2);
        assert_eq!(plan.get("subscriptions"), Some(5));
    }

    #[test]
    fn test_cli_overrides_config() {
        let catalog = Catalog::builtin().unwrap();
        let schema = catalog.get_schema("technology").unwrap();
        let config: BizSeedConfig = toml::from_str(
            "[generate]\nrows = 10\nseed = 1\n[tables.users]\nrows = 4\n",
        )
        .unwrap();
        let args = parse(&["--rows", "20", "--table-rows", "users=2", "--seed", "9"]);

        let plan = build_plan(&args, Some(&config), schema).unwrap();
        assert_eq!(plan.get("products"), Some(20));
        assert_eq!(plan.get("users"), Some(2));

        let options = build_options(&args, Some(&config)).unwrap();
        assert_eq!(options.seed, Some(9));
        assert_eq!(options.null_rate, DEFAULT_NULL_RATE);
    }

    #[test]
    fn test_complexity_sizes_tables_by_role() {
        let catalog = Catalog::builtin().unwrap();
        let schema = catalog.get_schema("retail").unwrap();
        let args = parse(&["--complexity", "medium", "--table-rows", "reviews=3"]);

        let plan = build_plan(&args, None, schema).unwrap();
        assert_eq!(plan.len(), schema.table_count());
        assert_eq!(plan.get("categories"), Some(10));
        assert_eq!(plan.get("customers"), Some(10));
        assert_eq!(plan.get("products"), Some(25));
        assert_eq!(plan.get("orders"), Some(25));
        assert_eq!(plan.get("order_items"), Some(50));
        assert_eq!(plan.get("reviews"), Some(3));
    }

    #[test]
    fn test_complexity_beats_config_rows() {
        let catalog = Catalog::builtin().unwrap();
        let schema = catalog.get_schema("technology").unwrap();
        let config: BizSeedConfig = toml::from_str("[generate]\nrows = 10\n").unwrap();

        let args = parse(&["--complexity", "enterprise"]);
        let plan = build_plan(&args, Some(&config), schema).unwrap();
        assert_eq!(plan.get("users"), Some(25));
        assert_eq!(plan.get("support_tickets"), Some(200));
    }

    #[test]
    fn test_complexity_conflicts_with_rows() {
        let argv = ["bizseed", "generate", "--rows", "5", "--complexity", "simple"];
        assert!(crate::args::Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn test_company_defaults_to_uuid() {
        let company = resolve_company(&parse(&[]), None, "retail");
        assert!(uuid::Uuid::parse_str(&company.id).is_ok());

        let args = parse(&["--company-id", "c-1", "--company-name", "Acme"]);
        let named = resolve_company(&args, None, "retail");
        assert_eq!(
            named,
            CompanyInfo {
                id: "c-1".into(),
                name: "Acme".into()
            }
        );
    }
}
