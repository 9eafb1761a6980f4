use serde::{Deserialize, Serialize};

use crate::{common::types::AnyResult, configs::*};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: Option<LoggingConfig>,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub pins: PinsConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl Config {
    pub fn load() -> AnyResult<Self> {
        let config_path = if std::path::Path::new("config.toml").exists() {
            "config.toml"
        } else if std::path::Path::new("config.default.toml").exists() {
            "config.default.toml"
        } else {
            return Err("config.toml or config.default.toml not found".into());
        };

        println!("Loading configuration from: {}", config_path);

        let config_str = std::fs::read_to_string(config_path)?;
        if config_str.trim().is_empty() {
            return Err(format!("{} is empty", config_path).into());
        }

        Self::parse(&config_str)
    }

    pub fn parse(raw: &str) -> AnyResult<Self> {
        let config: Config = toml::from_str(raw)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::parse(
            r#"
            [server]
            host = "127.0.0.1"
            port = 2333
            password = "secret"
            "#,
        )
        .expect("minimal config should parse");

        assert_eq!(config.server.port, 2333);
        assert_eq!(config.player.refresh_interval_secs, 5);
        assert_eq!(config.player.window_fallback_secs, 300);
        assert_eq!(config.voice.join_timeout_ms, 20_000);
        assert_eq!(config.pins.path, "data/stay247.json");
        assert!(config.voice.endpoints.is_empty());
    }

    #[test]
    fn test_voice_endpoints_are_keyed_by_channel() {
        let config = Config::parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 2333
            password = "secret"

            [voice]
            join_timeout_ms = 5000

            [voice.endpoints]
            "42" = "127.0.0.1:50000"
            "#,
        )
        .expect("config should parse");

        assert_eq!(config.voice.join_timeout_ms, 5000);
        assert_eq!(
            config.voice.endpoints.get("42").map(String::as_str),
            Some("127.0.0.1:50000")
        );
    }
}
