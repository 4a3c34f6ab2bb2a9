use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "bizseed",
    about = "Generate self-consistent synthetic business databases",
    version,
    after_help = concat!(
        "Examples:\n",
        "  bizseed domains\n",
        "  bizseed schema --domain retail\n",
        "  bizseed generate --domain retail --output retail.db --rows 50 --seed 42\n",
        "  bizseed generate --domain finance --output bank.db --complexity enterprise\n",
        "  bizseed generate --domain technology --output tech.db \
         --table-rows users=3,subscriptions=5 --verify\n",
        "  bizseed verify --db retail.db --domain retail\n",
        "  bizseed inspect --db retail.db\n",
        "  bizseed graph --domain healthcare --format dot"
    )
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML catalog file with additional domains
    #[arg(long, global = true)]
    pub catalog: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the registered domains
    Domains,

    /// Show a domain's tables in generation order
    Schema(SchemaArgs),

    /// Visualize a domain's table dependency graph
    Graph(GraphArgs),

    /// Generate a database for a domain
    Generate(GenerateArgs),

    /// Audit a generated database for dangling foreign keys
    Verify(VerifyArgs),

    /// Show tables, row counts and metadata of a generated database
    Inspect(InspectArgs),
}

#[derive(Parser, Debug)]
pub struct SchemaArgs {
    /// Domain name (e.g. retail, healthcare, technology, finance)
    #[arg(long, env = "BIZSEED_DOMAIN")]
    pub domain: String,

    /// Output format
    #[arg(long, default_value = "table")]
    pub format: SchemaFormat,
}

#[derive(Parser, Debug)]
pub struct GraphArgs {
    /// Domain name
    #[arg(long, env = "BIZSEED_DOMAIN")]
    pub domain: String,

    /// Output format for the dependency graph
    #[arg(long, default_value = "mermaid")]
    pub format: GraphFormat,
}

#[derive(Parser, Debug)]
pub struct GenerateArgs {
    /// Domain to generate. Falls back to BIZSEED_DOMAIN, then bizseed.toml
    #[arg(long, env = "BIZSEED_DOMAIN")]
    pub domain: Option<String>,

    /// Destination SQLite file. Falls back to BIZSEED_OUTPUT, then bizseed.toml
    #[arg(short, long, env = "BIZSEED_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Rows for every table without a per-table override
    #[arg(long)]
    pub rows: Option<i64>,

    /// Size preset: row counts follow each table's role in the schema
    #[arg(long, conflicts_with = "rows")]
    pub complexity: Option<Complexity>,

    /// Per-table row counts (e.g., users=3,subscriptions=5)
    #[arg(long, value_delimiter = ',')]
    pub table_rows: Vec<String>,

    /// Random seed for deterministic generation
    #[arg(long)]
    pub seed: Option<u64>,

    /// Share of NULLs in nullable columns, 0..1
    #[arg(long)]
    pub null_rate: Option<f64>,

    /// First day of the date window (YYYY-MM-DD)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Last day of the date window (YYYY-MM-DD)
    #[arg(long)]
    pub end_date: Option<NaiveDate>,

    /// Company id recorded in the metadata table (default: random UUID)
    #[arg(long)]
    pub company_id: Option<String>,

    /// Company name recorded in the metadata table
    #[arg(long)]
    pub company_name: Option<String>,

    /// Audit foreign keys after generating
    #[arg(long)]
    pub verify: bool,

    /// Print the result as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct VerifyArgs {
    /// Path of the generated SQLite file
    #[arg(long)]
    pub db: PathBuf,

    /// Domain the database was generated for
    #[arg(long, env = "BIZSEED_DOMAIN")]
    pub domain: String,

    /// Output format for the violation report
    #[arg(long, default_value = "text")]
    pub format: ReportFormat,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Path of the generated SQLite file
    #[arg(long)]
    pub db: PathBuf,

    /// Output format
    #[arg(long, default_value = "table")]
    pub format: SchemaFormat,
}

/// Row-count presets, from a handful of rows per table up to a few hundred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Complexity {
    Simple,
    Medium,
    Complex,
    Enterprise,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum SchemaFormat {
    Table,
    Json,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum GraphFormat {
    Mermaid,
    Dot,
}
