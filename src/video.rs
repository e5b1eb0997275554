//! Signed video URL cache.
//!
//! Signed URLs from the vendor expire, so the map client refreshes them
//! through `/api/video-url`. The cache avoids re-signing a video on every
//! popup open; forced refresh always bypasses it and overwrites the entry
//! on success.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

/// Source of fresh signed URLs. Implemented by the vendor API client;
/// the cache dispatches through it.
#[async_trait]
pub trait UrlSigner: Send + Sync {
    async fn fetch_signed_url(&self, video_id: &str) -> Result<String>;
}

/// Process-wide signed-URL cache keyed by video id.
#[derive(Debug, Default)]
pub struct VideoUrlCache {
    inner: RwLock<HashMap<String, String>>,
}

impl VideoUrlCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, video_id: &str) -> Option<String> {
        let map = self.inner.read().expect("video cache lock poisoned");
        map.get(video_id).cloned()
    }

    pub fn put(&self, video_id: &str, url: &str) {
        let mut map = self.inner.write().expect("video cache lock poisoned");
        map.insert(video_id.to_string(), url.to_string());
    }

    /// Resolve a signed URL for a video, consulting the cache unless
    /// `force_refresh` is set. A fresh URL replaces the cached entry.
    pub async fn signed_url(
        &self,
        signer: &dyn UrlSigner,
        video_id: &str,
        force_refresh: bool,
    ) -> Result<String> {
        if !force_refresh {
            if let Some(url) = self.get(video_id) {
                return Ok(url);
            }
        }

        let url = signer.fetch_signed_url(video_id).await?;
        self.put(video_id, &url);
        Ok(url)
    }
}
