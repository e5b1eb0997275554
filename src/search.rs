//! Semantic search over a cached batch.
//!
//! A query is embedded once and scored against every feature row of the
//! batch by cosine similarity — a deliberate linear scan, since batches
//! top out at a few thousand features. Matching policy:
//!
//! 1. Keep rows scoring above `search.score_threshold`.
//! 2. When more than `search.max_results` qualify, keep the highest-scoring
//!    `max_results` rows instead.
//! 3. Map rows to feature ids and deduplicate preserving score order
//!    (point and path features share an id).

use anyhow::{bail, Result};
use std::collections::HashSet;

use crate::config::Config;
use crate::embedding;
use crate::store::{BatchEntry, BatchStore};

/// Search a loaded batch for features matching a free-text query.
///
/// Returns matching feature ids ordered by descending score.
///
/// # Errors
///
/// - The batch is not loaded (`not loaded` — visualize first).
/// - The batch has no embeddings (`embeddings` disabled at visualize time).
/// - The query is empty, or the embedding provider fails.
pub async fn search_batch(
    config: &Config,
    store: &BatchStore,
    batch_id: &str,
    query: &str,
) -> Result<Vec<String>> {
    if query.trim().is_empty() {
        bail!("query must not be empty");
    }

    let entry = match store.get(batch_id) {
        Some(e) => e,
        None => bail!("batch not loaded: {}. Run visualize first.", batch_id),
    };

    if !entry.has_embeddings() {
        bail!("batch has no embeddings (embedding provider disabled)");
    }

    let provider = embedding::create_provider(&config.embedding)?;
    let query_vec = embedding::embed_query(provider.as_ref(), query).await?;

    Ok(rank_matches(
        &entry,
        &query_vec,
        config.search.score_threshold,
        config.search.max_results,
    ))
}

/// Score every row against the query vector and apply the
/// threshold/top-K/dedup policy. Pure function, separated for testing.
pub fn rank_matches(
    entry: &BatchEntry,
    query_vec: &[f32],
    score_threshold: f32,
    max_results: usize,
) -> Vec<String> {
    let mut scored: Vec<(usize, f32)> = entry
        .embeddings
        .iter()
        .enumerate()
        .map(|(i, row)| (i, embedding::cosine_similarity(query_vec, row)))
        .filter(|(_, score)| *score > score_threshold)
        .collect();

    // Highest score first; index ascending breaks ties deterministically
    scored.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    scored.truncate(max_results);

    let mut matching_ids = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (i, _) in &scored {
        if let Some(id) = entry.ids.get(*i) {
            if seen.insert(id.as_str()) {
                matching_ids.push(id.clone());
            }
        }
    }

    matching_ids
}
