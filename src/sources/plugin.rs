use async_trait::async_trait;

/// One streamable rendition of a search result.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadCandidate {
    pub quality: String,
    pub url: String,
}

/// A catalog hit before it is bound to a requester.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub primary_artists: Vec<String>,
    pub secondary_artists: Vec<String>,
    pub duration_secs: u64,
    pub play_count: u64,
    /// Artwork URLs ordered from smallest to largest.
    pub artwork: Vec<String>,
    /// Download candidates in the order the catalog lists them.
    pub downloads: Vec<DownloadCandidate>,
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("no songs found for \"{0}\"")]
    NoResults(String),
    #[error("\"{0}\" has no streamable source")]
    NoPlayableSource(String),
    #[error("catalog request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("catalog returned an unexpected payload: {0}")]
    Payload(String),
}

/// A searchable music catalog.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Unique identifier for this source (e.g. "jiosaavn").
    fn name(&self) -> &str;

    /// Search the catalog. Results keep the catalog's own ordering.
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, CatalogError>;
}
