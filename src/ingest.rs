//! Visualization pipeline orchestration.
//!
//! Coordinates the full flow for one batch: connector → normalization →
//! feature conversion → embedding → batch store. Embedding is skipped when
//! the provider is disabled; the batch is still cached so it can be
//! visualized, and searches against it report that embeddings are off.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::connector_csv;
use crate::connector_nomadic::NomadicClient;
use crate::embedding::{self, EmbeddingProvider};
use crate::features::{embedding_text, record_to_features};
use crate::models::{Feature, FeatureCollection, IncidentRecord};
use crate::store::{BatchEntry, BatchStore};

/// Outcome of one pipeline run.
#[derive(Debug)]
pub struct VisualizeOutcome {
    pub collection: FeatureCollection,
    /// Source rows dropped for invalid GPS data.
    pub skipped: usize,
    /// Feature rows embedded in this run.
    pub embedded: usize,
}

/// Run the pipeline for a batch and cache the result in `store`.
///
/// Always returns a feature collection — an empty source yields an empty
/// collection, not an error.
pub async fn run_visualize(
    config: &Config,
    store: &BatchStore,
    batch_id: &str,
    filter: Option<&str>,
) -> Result<VisualizeOutcome> {
    let (records, skipped) = load_records(config, batch_id, filter).await?;

    let features: Vec<Feature> = records.iter().flat_map(record_to_features).collect();
    let ids: Vec<String> = features.iter().map(|f| f.properties.id.clone()).collect();

    let embeddings = if config.embedding.is_enabled() && !features.is_empty() {
        let provider = embedding::create_provider(&config.embedding)?;
        embed_features(provider.as_ref(), config.embedding.batch_size, &features).await?
    } else {
        Vec::new()
    };
    let embedded = embeddings.len();

    let collection = FeatureCollection::new(features);
    store.put(
        batch_id,
        BatchEntry {
            features: collection.clone(),
            ids,
            embeddings,
        },
    );

    Ok(VisualizeOutcome {
        collection,
        skipped,
        embedded,
    })
}

/// Load and normalize records from the configured source.
async fn load_records(
    config: &Config,
    batch_id: &str,
    filter: Option<&str>,
) -> Result<(Vec<IncidentRecord>, usize)> {
    match config.data.source.as_str() {
        "csv" => {
            let scan = connector_csv::scan_csv(config, filter)?;
            Ok((scan.records, scan.skipped))
        }
        "nomadic" => {
            let client = NomadicClient::new(&config.nomadic)?;
            let fetch = client.fetch_batch(batch_id, filter).await?;
            Ok((fetch.records, fetch.skipped))
        }
        other => bail!("Unknown data source: {}", other),
    }
}

/// Embed every feature's text in `batch_size` chunks.
///
/// Row order matches feature order across chunk boundaries; the store
/// invariant that embedding row `i` belongs to id `i` is established here.
async fn embed_features(
    provider: &dyn EmbeddingProvider,
    batch_size: usize,
    features: &[Feature],
) -> Result<Vec<Vec<f32>>> {
    let texts: Vec<String> = features
        .iter()
        .map(|f| embedding_text(&f.properties))
        .collect();

    let mut vectors = Vec::with_capacity(texts.len());
    for batch in texts.chunks(batch_size) {
        let mut batch_vectors = provider.embed(batch).await?;
        vectors.append(&mut batch_vectors);
    }

    Ok(vectors)
}
