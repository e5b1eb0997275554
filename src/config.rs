use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub data: DataConfig,
    #[serde(default)]
    pub nomadic: NomadicConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
    /// Directory holding the browser client build. Served with HTML
    /// fallback when present; a warning is printed when it is not.
    #[serde(default)]
    pub static_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// Where batch events come from: "csv" (mock dataset) or "nomadic" (vendor API).
    #[serde(default = "default_source")]
    pub source: String,
    /// Path to the mock dataset, required when source = "csv".
    #[serde(default)]
    pub csv_path: Option<PathBuf>,
}

fn default_source() -> String {
    "csv".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct NomadicConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for NomadicConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
        }
    }
}

fn default_api_base() -> String {
    "https://api-prod.nomadicml.com".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            model: None,
            dims: None,
            batch_size: 64,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_batch_size() -> usize {
    64
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct SearchConfig {
    /// Minimum cosine similarity for a feature to match a query.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
    /// Cap on matches per query; the highest-scoring rows win.
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            score_threshold: default_score_threshold(),
            max_results: default_max_results(),
        }
    }
}

fn default_score_threshold() -> f32 {
    0.20
}
fn default_max_results() -> usize {
    100
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate data source
    match config.data.source.as_str() {
        "csv" => {
            if config.data.csv_path.is_none() {
                anyhow::bail!("data.csv_path must be set when data.source is 'csv'");
            }
        }
        "nomadic" => {}
        other => anyhow::bail!("Unknown data source: '{}'. Must be csv or nomadic.", other),
    }

    // Validate embedding
    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "openai" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled or openai.",
            other
        ),
    }

    // Validate search policy
    if !(-1.0..=1.0).contains(&config.search.score_threshold) {
        anyhow::bail!("search.score_threshold must be in [-1.0, 1.0]");
    }
    if config.search.max_results < 1 {
        anyhow::bail!("search.max_results must be >= 1");
    }

    Ok(config)
}
