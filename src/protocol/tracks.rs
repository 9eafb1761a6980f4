use serde::{Deserialize, Serialize};

use crate::common::types::UserId;

/// A resolved, playable track. Immutable once enqueued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub title: String,
    pub primary_artists: Vec<String>,
    #[serde(default)]
    pub secondary_artists: Vec<String>,
    /// Length in seconds. Zero when the catalog does not know it.
    pub duration_secs: u64,
    pub artwork_url: Option<String>,
    /// Direct audio URL handed to the engine.
    pub stream_url: String,
    /// Only this user may drive the track's control window.
    pub requester: UserId,
}

impl Track {
    /// Comma-joined primary artists, or "Unknown Artist".
    pub fn artist_line(&self) -> String {
        if self.primary_artists.is_empty() {
            "Unknown Artist".to_string()
        } else {
            self.primary_artists.join(", ")
        }
    }

    pub fn lead_artist(&self) -> &str {
        self.primary_artists
            .first()
            .map(String::as_str)
            .unwrap_or("Unknown Artist")
    }

    pub fn is_requested_by(&self, user: UserId) -> bool {
        self.requester == user
    }
}

/// `m:ss` rendering used by the queue view and the card.
pub fn format_duration(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Track {
        Track {
            title: "Kesariya".to_string(),
            primary_artists: vec!["Pritam".to_string(), "Arijit Singh".to_string()],
            secondary_artists: vec!["Amitabh Bhattacharya".to_string()],
            duration_secs: 268,
            artwork_url: None,
            stream_url: "https://cdn.example/kesariya.mp4".to_string(),
            requester: UserId(7),
        }
    }

    #[test]
    fn test_artist_line() {
        let track = sample();
        assert_eq!(track.artist_line(), "Pritam, Arijit Singh");
        assert_eq!(track.lead_artist(), "Pritam");

        let anonymous = Track {
            primary_artists: vec![],
            ..sample()
        };
        assert_eq!(anonymous.artist_line(), "Unknown Artist");
        assert_eq!(anonymous.lead_artist(), "Unknown Artist");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(59), "0:59");
        assert_eq!(format_duration(268), "4:28");
        assert_eq!(format_duration(3600), "60:00");
    }

    #[test]
    fn test_requester_check() {
        let track = sample();
        assert!(track.is_requested_by(UserId(7)));
        assert!(!track.is_requested_by(UserId(8)));
    }
}
