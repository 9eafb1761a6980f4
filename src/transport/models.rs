use serde::{Deserialize, Serialize};

use crate::{
    common::types::{ChannelId, UserId, WindowId},
    player::{Enqueued, NowPlayingView, SessionState},
    protocol::tracks::{Track, format_duration},
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRequest {
    pub query: String,
    pub user_id: UserId,
    pub voice_channel_id: Option<ChannelId>,
    pub text_channel_id: Option<ChannelId>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayResponse {
    pub track: Track,
    #[serde(flatten)]
    pub outcome: Enqueued,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinRequest {
    #[serde(default)]
    pub mode: Option<String>,
    pub voice_channel_id: Option<ChannelId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionRequest {
    pub window_id: WindowId,
    pub action: String,
    pub user_id: UserId,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResponse {
    pub applied: bool,
    pub state: SessionState,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResponse {
    pub removed: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    /// 1-based.
    pub position: usize,
    pub title: String,
    pub artists: String,
    pub duration: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueView {
    pub now_playing: Option<NowPlayingView>,
    pub upcoming: Vec<QueueEntry>,
    /// Queued tracks beyond `upcoming`.
    pub remaining: usize,
}

impl QueueView {
    pub fn new(now_playing: Option<NowPlayingView>, upcoming: &[Track], queue_length: usize) -> Self {
        Self {
            now_playing,
            upcoming: upcoming
                .iter()
                .enumerate()
                .map(|(i, track)| QueueEntry {
                    position: i + 1,
                    title: track.title.clone(),
                    artists: track.artist_line(),
                    duration: format_duration(track.duration_secs),
                })
                .collect(),
            remaining: queue_length.saturating_sub(upcoming.len()),
        }
    }

    pub fn empty() -> Self {
        Self {
            now_playing: None,
            upcoming: Vec::new(),
            remaining: 0,
        }
    }
}
