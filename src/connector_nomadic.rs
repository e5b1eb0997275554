//! NomadicML vendor API connector.
//!
//! Fetches analysis events for a batch and signs video URLs. The API key
//! comes from the `NOMADIC_API_KEY` environment variable and is sent as an
//! `x-api-key` header.
//!
//! Transient failures (HTTP 429, 5xx, network errors) are retried with
//! exponential backoff; other client errors fail immediately.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::NomadicConfig;
use crate::connector_csv::matches_filter;
use crate::models::IncidentRecord;
use crate::video::UrlSigner;

/// One analysis event as returned by the vendor batch endpoint.
#[derive(Debug, Deserialize)]
struct ApiEvent {
    label: String,
    category: String,
    severity: String,
    timestamp: String,
    lat_start: Option<f64>,
    lon_start: Option<f64>,
    lat_end: Option<f64>,
    lon_end: Option<f64>,
    video_id: String,
    #[serde(default)]
    share_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BatchEventsResponse {
    events: Vec<ApiEvent>,
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    url: Option<String>,
}

/// Result of a batch fetch: usable records plus rows dropped for missing GPS.
#[derive(Debug)]
pub struct BatchFetch {
    pub records: Vec<IncidentRecord>,
    pub skipped: usize,
}

/// HTTP client for the NomadicML API.
pub struct NomadicClient {
    http: reqwest::Client,
    api_base: String,
    api_key: String,
    max_retries: u32,
}

impl NomadicClient {
    /// Build a client from config. Fails when `NOMADIC_API_KEY` is unset.
    pub fn new(config: &NomadicConfig) -> Result<Self> {
        let api_key = std::env::var("NOMADIC_API_KEY")
            .map_err(|_| anyhow::anyhow!("NOMADIC_API_KEY environment variable not set"))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            api_key,
            max_retries: config.max_retries,
        })
    }

    /// Fetch the analysis events of a batch and normalize them into records,
    /// applying the same label filter and GPS validation as the CSV connector.
    pub async fn fetch_batch(&self, batch_id: &str, filter: Option<&str>) -> Result<BatchFetch> {
        let url = format!("{}/api/batch/{}/events", self.api_base, batch_id);
        let json = self.get_with_retry(&url).await?;

        let response: BatchEventsResponse =
            serde_json::from_value(json).context("Invalid batch events response")?;

        let mut records = Vec::new();
        let mut skipped = 0usize;

        for event in response.events {
            if !matches_filter(&event.label, filter) {
                continue;
            }

            let (lat_start, lon_start) = match (event.lat_start, event.lon_start) {
                (Some(lat), Some(lon)) => (lat, lon),
                _ => {
                    skipped += 1;
                    continue;
                }
            };

            records.push(IncidentRecord {
                label: event.label,
                category: event.category,
                severity: event.severity,
                timestamp: event.timestamp,
                lat_start,
                lon_start,
                lat_end: event.lat_end.unwrap_or(lat_start),
                lon_end: event.lon_end.unwrap_or(lon_start),
                video_id: event.video_id,
                share_link: event.share_link.unwrap_or_default(),
            });
        }

        Ok(BatchFetch { records, skipped })
    }

    /// Request a fresh signed URL for a video.
    ///
    /// `POST /api/video/{id}/signed-url` with body `{"method": "GET"}`.
    /// A response without a `url` field means the video does not exist.
    pub async fn fetch_signed_url(&self, video_id: &str) -> Result<String> {
        let url = format!("{}/api/video/{}/signed-url", self.api_base, video_id);
        let body = serde_json::json!({ "method": "GET" });

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .http
                .post(&url)
                .header("x-api-key", &self.api_key)
                .json(&body)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let signed: SignedUrlResponse =
                            response.json().await.context("Invalid signed-url response")?;
                        return signed
                            .url
                            .ok_or_else(|| anyhow::anyhow!("video not found: {}", video_id));
                    }

                    if status.as_u16() == 404 {
                        bail!("video not found: {}", video_id);
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow::anyhow!(
                            "NomadicML API error {}: {}",
                            status,
                            body_text
                        ));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("NomadicML API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Signed URL request failed after retries")))
    }

    /// GET a JSON resource with the retry/backoff policy.
    async fn get_with_retry(&self, url: &str) -> Result<serde_json::Value> {
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let resp = self
                .http
                .get(url)
                .header("x-api-key", &self.api_key)
                .send()
                .await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        return response.json().await.context("Invalid JSON response");
                    }

                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err = Some(anyhow::anyhow!(
                            "NomadicML API error {}: {}",
                            status,
                            body_text
                        ));
                        continue;
                    }

                    let body_text = response.text().await.unwrap_or_default();
                    bail!("NomadicML API error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Request failed after retries")))
    }
}

#[async_trait]
impl UrlSigner for NomadicClient {
    async fn fetch_signed_url(&self, video_id: &str) -> Result<String> {
        NomadicClient::fetch_signed_url(self, video_id).await
    }
}
