use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;
use tracing::{debug, warn};

use super::plugin::{CatalogError, CatalogSource, DownloadCandidate, SearchResult};
use crate::configs::CatalogConfig;

/// Client for a JioSaavn-compatible search API (`/api/search/songs`).
pub struct JioSaavnSource {
    client: reqwest::Client,
    base_url: String,
    search_limit: usize,
}

impl JioSaavnSource {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            search_limit: config.search_limit,
        })
    }

    async fn get_json(&self, query: &str) -> Result<Value, CatalogError> {
        let limit = self.search_limit.to_string();
        let resp = self
            .client
            .get(format!("{}/api/search/songs", self.base_url))
            .query(&[("query", query), ("limit", limit.as_str()), ("page", "0")])
            .send()
            .await?;

        if !resp.status().is_success() {
            warn!("JioSaavn search returned status {}", resp.status());
            return Err(CatalogError::Payload(format!(
                "status {}",
                resp.status().as_u16()
            )));
        }

        Ok(resp.json::<Value>().await?)
    }
}

#[async_trait]
impl CatalogSource for JioSaavnSource {
    fn name(&self) -> &str {
        "jiosaavn"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, CatalogError> {
        debug!("JioSaavn search: {}", query);
        let json = self.get_json(query).await?;
        parse_search(&json)
    }
}

/// Parses a `/api/search/songs` response body.
pub fn parse_search(json: &Value) -> Result<Vec<SearchResult>, CatalogError> {
    if json.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(CatalogError::Payload("success=false".to_string()));
    }

    let results = json
        .get("data")
        .and_then(|d| d.get("results"))
        .and_then(Value::as_array)
        .ok_or_else(|| CatalogError::Payload("missing data.results".to_string()))?;

    Ok(results.iter().filter_map(parse_song).collect())
}

fn parse_song(song: &Value) -> Option<SearchResult> {
    let id = song.get("id").and_then(|v| {
        v.as_str()
            .map(|s| s.to_string())
            .or_else(|| v.as_i64().map(|i| i.to_string()))
    })?;
    let title = clean_string(song.get("name").and_then(Value::as_str)?);

    let artists = song.get("artists");
    let names = |key: &str| -> Vec<String> {
        artists
            .and_then(|a| a.get(key))
            .and_then(Value::as_array)
            .map(|arr| {
                arr.iter()
                    .filter_map(|a| a.get("name").and_then(Value::as_str))
                    .map(clean_string)
                    .collect()
            })
            .unwrap_or_default()
    };

    Some(SearchResult {
        id,
        title,
        primary_artists: names("primary"),
        secondary_artists: names("featured"),
        duration_secs: number_field(song.get("duration")),
        play_count: number_field(song.get("playCount")),
        artwork: url_list(song.get("image"))
            .into_iter()
            .map(|c| c.url)
            .collect(),
        downloads: url_list(song.get("downloadUrl")),
    })
}

/// Numbers arrive as JSON numbers, numeric strings or null.
fn number_field(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

fn url_list(value: Option<&Value>) -> Vec<DownloadCandidate> {
    value
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|item| {
                    let url = item.get("url").and_then(Value::as_str)?;
                    Some(DownloadCandidate {
                        quality: item
                            .get("quality")
                            .and_then(Value::as_str)
                            .unwrap_or_default()
                            .to_string(),
                        url: url.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

fn clean_string(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
