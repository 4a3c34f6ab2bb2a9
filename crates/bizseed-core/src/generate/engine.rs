use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::check::fingerprint::schema_fingerprint;
use crate::check::{verify, Violation};
use crate::error::{BizSeedError, Result};
use crate::generate::foreign_key::KeyPools;
use crate::generate::plan::RowPlan;
use crate::generate::providers::{DateWindow, FakeValueGenerator, ValueGenerator};
use crate::generate::synth::synthesize;
use crate::output::direct::{Materializer, StoreMetadata};
use crate::schema::catalog::{Catalog, DomainSchema};

/// Share of nullable values left NULL when the caller does not say otherwise.
pub const DEFAULT_NULL_RATE: f64 = 0.1;

/// Progress callback: (table just written, rows written so far, total rows).
pub type ProgressCallback<'a> = &'a (dyn Fn(&str, usize, usize) + Send + Sync);

/// Company the store is generated for, recorded in its metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub id: String,
    pub name: String,
}

/// Knobs for value generation.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Fixed seed; `None` draws a random one, which is logged and recorded.
    pub seed: Option<u64>,
    pub date_window: DateWindow,
    /// Probability in `[0, 1]` that a nullable column is NULL.
    pub null_rate: f64,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            seed: None,
            date_window: DateWindow::default(),
            null_rate: DEFAULT_NULL_RATE,
        }
    }
}

impl GenerationOptions {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.null_rate) {
            return Err(BizSeedError::Config {
                message: format!("null rate {} must be between 0 and 1", self.null_rate),
            });
        }
        if self.date_window.start > self.date_window.end {
            return Err(BizSeedError::Config {
                message: format!(
                    "date window starts ({}) after it ends ({})",
                    self.date_window.start, self.date_window.end
                ),
            });
        }
        Ok(())
    }
}

/// Everything one generation run needs.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub domain: String,
    pub plan: RowPlan,
    pub destination: PathBuf,
    pub options: GenerationOptions,
    pub company: Option<CompanyInfo>,
}

impl GenerationRequest {
    pub fn new(domain: impl Into<String>, plan: RowPlan, destination: impl Into<PathBuf>) -> Self {
        Self {
            domain: domain.into(),
            plan,
            destination: destination.into(),
            options: GenerationOptions::default(),
            company: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.options.seed = Some(seed);
        self
    }

    pub fn with_date_window(mut self, window: DateWindow) -> Self {
        self.options.date_window = window;
        self
    }

    pub fn with_null_rate(mut self, null_rate: f64) -> Self {
        self.options.null_rate = null_rate;
        self
    }

    pub fn with_company(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.company = Some(CompanyInfo {
            id: id.into(),
            name: name.into(),
        });
        self
    }
}

/// A materialized store.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseHandle {
    pub path: PathBuf,
    pub domain: String,
    pub seed: u64,
    /// Rows per table in generation order; unplanned tables show 0.
    pub row_counts: IndexMap<String, i64>,
    /// Structure fingerprint of the domain (see `check::fingerprint`).
    pub fingerprint: String,
    pub company: Option<CompanyInfo>,
}

impl DatabaseHandle {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn total_rows(&self) -> i64 {
        self.row_counts.values().sum()
    }

    /// Audit the store's foreign keys.
    pub async fn verify(&self, schema: &DomainSchema) -> Result<Vec<Violation>> {
        verify(&self.path, schema).await
    }
}

/// Generate a complete store for `request`.
///
/// The row plan is validated before anything touches the disk. Tables are
/// then synthesized and inserted one at a time in generation order, the
/// transaction is committed once, and the finished file is moved to the
/// destination. On any error the destination is left as it was.
pub async fn generate(catalog: &Catalog, request: &GenerationRequest) -> Result<DatabaseHandle> {
    generate_with_progress(catalog, request, None).await
}

/// Like [`generate`], reporting progress after each table.
pub async fn generate_with_progress(
    catalog: &Catalog,
    request: &GenerationRequest,
    progress: Option<ProgressCallback<'_>>,
) -> Result<DatabaseHandle> {
    let schema = catalog.get_schema(&request.domain)?;
    request.options.validate()?;
    request.plan.validate(schema)?;

    let seed = request.options.seed.unwrap_or_else(rand::random);
    let mut values = FakeValueGenerator::seeded(
        seed,
        request.options.date_window,
        request.options.null_rate,
    );

    generate_with(schema, request, seed, &mut values, progress).await
}

/// Run generation for an already resolved schema with a caller-supplied
/// value generator. `seed` is only recorded; `values` decides every value.
pub async fn generate_with<G: ValueGenerator + Send + ?Sized>(
    schema: &DomainSchema,
    request: &GenerationRequest,
    seed: u64,
    values: &mut G,
    progress: Option<ProgressCallback<'_>>,
) -> Result<DatabaseHandle> {
    request.plan.validate(schema)?;

    info!(
        "Generating domain '{}' into {} (seed {}, {} planned rows)",
        schema.domain,
        request.destination.display(),
        seed,
        request.plan.total_rows()
    );

    let mut metadata = StoreMetadata::new(schema.domain.clone(), seed);
    metadata.date_window = Some(request.options.date_window);
    if let Some(company) = &request.company {
        metadata.company_id = Some(company.id.clone());
        metadata.company_name = Some(company.name.clone());
    }

    let mut session = Materializer::begin(&request.destination).await?;
    let populated = populate(
        &mut session,
        schema,
        &request.plan,
        values,
        &metadata,
        progress,
    )
    .await;
    let row_counts = match populated {
        Ok(counts) => counts,
        Err(e) => {
            session.abort().await;
            return Err(e);
        }
    };
    let path = session.commit().await?;

    Ok(DatabaseHandle {
        path,
        domain: schema.domain.clone(),
        seed,
        row_counts,
        fingerprint: schema_fingerprint(schema),
        company: request.company.clone(),
    })
}

async fn populate<G: ValueGenerator + Send + ?Sized>(
    session: &mut Materializer,
    schema: &DomainSchema,
    plan: &RowPlan,
    values: &mut G,
    metadata: &StoreMetadata,
    progress: Option<ProgressCallback<'_>>,
) -> Result<IndexMap<String, i64>> {
    session.create_tables(schema).await?;

    let total_rows = plan.total_rows().max(0) as usize;
    let mut pools = KeyPools::new();
    let mut row_counts = IndexMap::new();
    let mut written = 0usize;

    for table in schema.generation_order() {
        let count = match plan.get(&table.name) {
            Some(requested) => {
                let rows = synthesize(table, requested, &mut pools, values)?;
                written += session.insert_rows(table, &rows).await?;
                if let Some(cb) = progress {
                    cb(&table.name, written, total_rows);
                }
                rows.len() as i64
            }
            None => 0,
        };
        row_counts.insert(table.name.clone(), count);
    }

    session.write_metadata(metadata).await?;
    Ok(row_counts)
}
