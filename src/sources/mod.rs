pub mod jiosaavn;
pub mod manager;
pub mod plugin;

pub use jiosaavn::JioSaavnSource;
pub use manager::SourceManager;
pub use plugin::{CatalogError, CatalogSource, DownloadCandidate, SearchResult};
