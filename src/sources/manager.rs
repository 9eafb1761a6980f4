use std::sync::Arc;

use tracing::{debug, info};

use super::plugin::{CatalogError, CatalogSource, SearchResult};
use crate::{common::types::UserId, protocol::tracks::Track};

/// Turns free-text queries into playable tracks.
pub struct SourceManager {
    source: Arc<dyn CatalogSource>,
    preferred_quality: String,
}

impl SourceManager {
    pub fn new(source: Arc<dyn CatalogSource>, preferred_quality: impl Into<String>) -> Self {
        let preferred_quality = preferred_quality.into();
        info!(
            "Catalog source: {} (preferred quality {})",
            source.name(),
            preferred_quality
        );
        Self {
            source,
            preferred_quality,
        }
    }

    /// Search and pick the most played result, bound to `requester`.
    pub async fn resolve(&self, query: &str, requester: UserId) -> Result<Track, CatalogError> {
        let mut results = self.source.search(query).await?;
        if results.is_empty() {
            return Err(CatalogError::NoResults(query.to_string()));
        }

        // Stable sort keeps catalog order among equal play counts.
        results.sort_by(|a, b| b.play_count.cmp(&a.play_count));
        let song = results.swap_remove(0);
        debug!("Resolved \"{}\" -> {} ({})", query, song.title, song.id);

        into_track(song, &self.preferred_quality, requester)
    }
}

/// Selects the preferred-quality stream, falling back to the last listed one.
pub fn pick_stream_url<'a>(song: &'a SearchResult, preferred_quality: &str) -> Option<&'a str> {
    song.downloads
        .iter()
        .find(|c| c.quality == preferred_quality)
        .or_else(|| song.downloads.last())
        .map(|c| c.url.as_str())
}

fn into_track(
    song: SearchResult,
    preferred_quality: &str,
    requester: UserId,
) -> Result<Track, CatalogError> {
    let stream_url = pick_stream_url(&song, preferred_quality)
        .ok_or_else(|| CatalogError::NoPlayableSource(song.title.clone()))?
        .to_string();

    Ok(Track {
        title: song.title,
        primary_artists: song.primary_artists,
        secondary_artists: song.secondary_artists,
        duration_secs: song.duration_secs,
        artwork_url: song.artwork.last().cloned(),
        stream_url,
        requester,
    })
}
