use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PinsConfig {
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default = "default_write_attempts")]
    pub write_attempts: u32,
}

impl Default for PinsConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            write_attempts: default_write_attempts(),
        }
    }
}

fn default_path() -> String {
    "data/stay247.json".to_string()
}

fn default_write_attempts() -> u32 {
    3
}
