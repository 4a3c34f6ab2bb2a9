//! # bizseed-core
//!
//! Generates self-consistent synthetic business databases. A domain's typed
//! catalog entry is ordered by its foreign keys, rows are synthesized table
//! by table from seeded value generators, and the result is materialized
//! into a single SQLite file whose foreign keys all resolve.

pub mod check;
pub mod config;
pub mod error;
pub mod generate;
pub mod graph;
pub mod output;
pub mod schema;

// Re-export key types for convenience
pub use check::{verify, Violation};
pub use error::{BizSeedError, Result};
pub use generate::engine::{
    generate, CompanyInfo, DatabaseHandle, GenerationOptions, GenerationRequest,
};
pub use generate::plan::RowPlan;
pub use generate::providers::DateWindow;
pub use schema::catalog::{Catalog, DomainSchema};
