//! Now-playing card rendering.

use crate::protocol::tracks::{Track, format_duration};

/// Pure card renderer: same inputs, same bytes.
pub trait CardRenderer: Send + Sync {
    fn render(&self, track: &Track, elapsed_secs: u64, paused: bool) -> Vec<u8>;
}

/// Plain UTF-8 card with a progress bar.
pub struct TextCardRenderer {
    bar_width: usize,
}

impl Default for TextCardRenderer {
    fn default() -> Self {
        Self { bar_width: 20 }
    }
}

impl TextCardRenderer {
    pub fn new(bar_width: usize) -> Self {
        Self {
            bar_width: bar_width.max(1),
        }
    }

    fn progress_bar(&self, elapsed_secs: u64, duration_secs: u64) -> String {
        let filled = if duration_secs > 0 {
            let ratio = elapsed_secs.min(duration_secs) as f64 / duration_secs as f64;
            (ratio * self.bar_width as f64).round() as usize
        } else {
            0
        };
        let mut bar = "=".repeat(filled);
        if filled < self.bar_width {
            bar.push('>');
            bar.push_str(&"-".repeat(self.bar_width - filled - 1));
        }
        bar
    }
}

impl CardRenderer for TextCardRenderer {
    fn render(&self, track: &Track, elapsed_secs: u64, paused: bool) -> Vec<u8> {
        let total = if track.duration_secs > 0 {
            format_duration(track.duration_secs)
        } else {
            "--:--".to_string()
        };

        let mut card = String::new();
        card.push_str(&track.title);
        card.push('\n');
        card.push_str(&track.artist_line());
        if !track.secondary_artists.is_empty() {
            card.push_str(" feat. ");
            card.push_str(&track.secondary_artists.join(", "));
        }
        card.push('\n');
        card.push_str(&format!(
            "[{}] {} / {}{}\n",
            self.progress_bar(elapsed_secs, track.duration_secs),
            format_duration(elapsed_secs),
            total,
            if paused { " (paused)" } else { "" }
        ));
        card.into_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::types::UserId;

    fn track(duration_secs: u64) -> Track {
        Track {
            title: "Ilahi".to_string(),
            primary_artists: vec!["Arijit Singh".to_string()],
            secondary_artists: vec![],
            duration_secs,
            artwork_url: None,
            stream_url: "https://cdn/ilahi.mp4".to_string(),
            requester: UserId(1),
        }
    }

    #[test]
    fn test_card_halfway() {
        let card = TextCardRenderer::new(10).render(&track(200), 100, false);
        let text = String::from_utf8(card).unwrap();
        assert_eq!(
            text,
            "Ilahi\nArijit Singh\n[=====>----] 1:40 / 3:20\n"
        );
    }

    #[test]
    fn test_card_paused_and_unknown_length() {
        let text = String::from_utf8(TextCardRenderer::new(4).render(&track(0), 65, true)).unwrap();
        assert!(text.ends_with("[>---] 1:05 / --:-- (paused)\n"));
    }

    #[test]
    fn test_full_bar_has_no_head() {
        let text = String::from_utf8(TextCardRenderer::new(4).render(&track(60), 60, false)).unwrap();
        assert!(text.contains("[====] 1:00 / 1:00"));
    }
}
