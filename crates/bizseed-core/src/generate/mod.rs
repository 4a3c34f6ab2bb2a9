//! Row synthesis and the end-to-end generation pipeline.

pub mod engine;
pub mod foreign_key;
pub mod plan;
pub mod providers;
pub mod synth;
pub mod value;

pub use engine::{generate, CompanyInfo, DatabaseHandle, GenerationOptions, GenerationRequest};
pub use providers::{DateWindow, FakeValueGenerator, ValueGenerator};
pub use synth::{synthesize, GeneratedRow};
