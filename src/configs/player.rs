use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PlayerConfig {
    /// Seconds between now-playing card refreshes.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// Control window lifetime when the track duration is unknown.
    #[serde(default = "default_window_fallback_secs")]
    pub window_fallback_secs: u64,
    /// Upcoming tracks listed by the queue view.
    #[serde(default = "default_max_queue_preview")]
    pub max_queue_preview: usize,
}

impl PlayerConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs.max(1))
    }

    pub fn window_ttl(&self, duration_secs: u64) -> Duration {
        if duration_secs > 0 {
            Duration::from_secs(duration_secs)
        } else {
            Duration::from_secs(self.window_fallback_secs)
        }
    }
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            window_fallback_secs: default_window_fallback_secs(),
            max_queue_preview: default_max_queue_preview(),
        }
    }
}

fn default_refresh_interval_secs() -> u64 {
    5
}

fn default_window_fallback_secs() -> u64 {
    300
}

fn default_max_queue_preview() -> usize {
    10
}
