//! Writing synthesized rows to SQLite stores.

pub mod direct;

pub use direct::{materialize, Materializer, StoreMetadata};
