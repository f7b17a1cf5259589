//! HTTP client for the external music catalog search endpoint.

use super::{CatalogError, ResolvedTrack, TrackCatalog};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Spotify-style catalog search client.
///
/// Requests exactly one result per query and authenticates with the
/// caller-supplied bearer credential.
pub struct SpotifyCatalog {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    tracks: Option<TracksPage>,
}

#[derive(Deserialize)]
struct TracksPage {
    items: Option<Vec<TrackItem>>,
}

#[derive(Deserialize)]
struct TrackItem {
    id: String,
}

impl SpotifyCatalog {
    /// Create a new catalog client.
    ///
    /// # Arguments
    /// * `base_url` - Base URL of the catalog API (e.g., "https://api.spotify.com/v1")
    /// * `timeout_secs` - Request timeout in seconds
    pub fn new(base_url: String, timeout_secs: u64) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        // Ensure base_url doesn't have trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        Self { client, base_url }
    }

    /// Get the base URL of the catalog API.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TrackCatalog for SpotifyCatalog {
    async fn find_track(
        &self,
        query: &str,
        credential: &str,
    ) -> Result<Option<ResolvedTrack>, CatalogError> {
        let url = format!("{}/search", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("type", "track"), ("limit", "1")])
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CatalogError::Timeout
                } else {
                    CatalogError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Api {
                status: status.as_u16(),
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::InvalidResponse(e.to_string()))?;

        let first = body
            .tracks
            .and_then(|page| page.items)
            .unwrap_or_default()
            .into_iter()
            .next();

        Ok(first.map(|item| ResolvedTrack { id: item.id }))
    }
}
