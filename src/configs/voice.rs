use std::{collections::HashMap, time::Duration};

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct VoiceConfig {
    /// Upper bound for a join to reach the ready state.
    #[serde(default = "default_join_timeout_ms")]
    pub join_timeout_ms: u64,
    #[serde(default = "default_frame_duration_ms")]
    pub frame_duration_ms: u64,
    /// Voice channel id -> UDP media endpoint (`host:port`).
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
}

impl VoiceConfig {
    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            join_timeout_ms: default_join_timeout_ms(),
            frame_duration_ms: default_frame_duration_ms(),
            endpoints: HashMap::new(),
        }
    }
}

fn default_join_timeout_ms() -> u64 {
    20_000
}

fn default_frame_duration_ms() -> u64 {
    20
}
