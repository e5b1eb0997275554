//! Per-batch in-memory cache.
//!
//! Visualize writes a batch entry; search reads it. Entries hold the
//! feature collection, the ordered feature-id list, and the embedding
//! matrix — row `i` of the matrix belongs to id `i`, which search relies
//! on when mapping scores back to features. Re-visualizing a batch
//! replaces its entry wholesale.
//!
//! This is deliberately not a persistence layer: batches live for the
//! lifetime of the process, exactly as long as their signed video URLs
//! are useful.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::models::FeatureCollection;

/// Everything cached for one visualized batch.
#[derive(Debug, Clone)]
pub struct BatchEntry {
    pub features: FeatureCollection,
    /// Feature property ids, in feature order.
    pub ids: Vec<String>,
    /// One embedding row per id; empty when the provider is disabled.
    pub embeddings: Vec<Vec<f32>>,
}

impl BatchEntry {
    pub fn has_embeddings(&self) -> bool {
        !self.embeddings.is_empty()
    }
}

/// Thread-safe map from batch id to cached entry.
#[derive(Debug, Default)]
pub struct BatchStore {
    inner: RwLock<HashMap<String, BatchEntry>>,
}

impl BatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the entry for a batch.
    pub fn put(&self, batch_id: &str, entry: BatchEntry) {
        let mut map = self.inner.write().expect("batch store lock poisoned");
        map.insert(batch_id.to_string(), entry);
    }

    /// Clone out the entry for a batch, if loaded.
    pub fn get(&self, batch_id: &str) -> Option<BatchEntry> {
        let map = self.inner.read().expect("batch store lock poisoned");
        map.get(batch_id).cloned()
    }

    pub fn contains(&self, batch_id: &str) -> bool {
        let map = self.inner.read().expect("batch store lock poisoned");
        map.contains_key(batch_id)
    }
}
