use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
    #[serde(default = "default_preferred_quality")]
    pub preferred_quality: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            search_limit: default_search_limit(),
            preferred_quality: default_preferred_quality(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_base_url() -> String {
    "https://saavn.dev".to_string()
}

fn default_search_limit() -> usize {
    20
}

fn default_preferred_quality() -> String {
    "320kbps".to_string()
}

fn default_timeout_ms() -> u64 {
    10_000
}
