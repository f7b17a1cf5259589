//! Catalog resolution of generated song picks.
//!
//! A pick is resolved by searching the external music catalog for its best
//! match. Resolution failure of a single pick is never fatal: every failure
//! class (bad status, empty result set, network error) collapses to "no
//! match" so that one broken lookup cannot take down the whole batch.

mod spotify;

pub use spotify::SpotifyCatalog;

use crate::curator::SongPick;
use crate::server::metrics;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

/// A catalog identifier for a resolved track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrack {
    pub id: String,
}

/// Errors that can occur when querying the track catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Search failed with status {status}")]
    Api { status: u16 },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request timeout")]
    Timeout,
}

/// Trait for music catalog search backends.
#[async_trait]
pub trait TrackCatalog: Send + Sync {
    /// Search the catalog for the single best match of `query`.
    ///
    /// The credential is caller-scoped and passed through on every call; the
    /// service never holds a catalog credential of its own.
    async fn find_track(
        &self,
        query: &str,
        credential: &str,
    ) -> Result<Option<ResolvedTrack>, CatalogError>;
}

/// Resolve one pick to a catalog track, absorbing every failure into `None`.
pub async fn resolve_track(
    catalog: &dyn TrackCatalog,
    pick: &SongPick,
    credential: &str,
) -> Option<ResolvedTrack> {
    let query = format!("{} {}", pick.title, pick.artist);

    match catalog.find_track(&query, credential).await {
        Ok(Some(track)) => {
            metrics::record_track_resolution("hit");
            Some(track)
        }
        Ok(None) => {
            debug!(title = %pick.title, artist = %pick.artist, "No catalog match");
            metrics::record_track_resolution("miss");
            None
        }
        Err(err) => {
            warn!(
                title = %pick.title,
                artist = %pick.artist,
                error = %err,
                "Catalog search failed"
            );
            metrics::record_track_resolution("error");
            None
        }
    }
}
