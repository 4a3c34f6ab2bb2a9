//! # Parent Key Pools
//!
//! Tracks generated primary keys so child tables can pick valid FK
//! references. Parent tables are synthesized first (generation order), their
//! keys are recorded here, and child FK columns then sample from the pool of
//! the referenced table.

use std::collections::HashMap;

use crate::generate::providers::ValueGenerator;

/// Primary keys generated so far in one run, by table.
#[derive(Debug, Default)]
pub struct KeyPools {
    pools: HashMap<String, Vec<i64>>,
}

impl KeyPools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the keys generated for `table`, replacing any earlier entry.
    pub fn record(&mut self, table: &str, keys: Vec<i64>) {
        self.pools.insert(table.to_string(), keys);
    }

    /// Pick a key of `table` uniformly. `None` if the pool is absent or empty.
    pub fn pick<G: ValueGenerator + ?Sized>(&self, table: &str, values: &mut G) -> Option<i64> {
        self.pools
            .get(table)
            .filter(|pool| !pool.is_empty())
            .map(|pool| pool[values.pick(pool.len())])
    }

    pub fn keys(&self, table: &str) -> &[i64] {
        self.pools.get(table).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn len(&self, table: &str) -> usize {
        self.keys(table).len()
    }

    pub fn is_empty(&self, table: &str) -> bool {
        self.keys(table).is_empty()
    }
}
