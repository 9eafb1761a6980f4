use std::{collections::VecDeque, sync::Arc};

use serde::Serialize;

use crate::{
    common::types::{ChannelId, GuildId, TrackToken, UserId},
    engine::PlaybackEngine,
    player::{progress::Progress, window::ControlWindow},
    protocol::tracks::Track,
    voice::VoiceConnection,
};

/// Externally visible lifecycle state of a guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    /// No session.
    Empty,
    /// A track is bound to the engine.
    Active,
    /// Connected and pinned with nothing to play.
    IdlePinned,
}

pub struct NowPlaying {
    pub track: Track,
    pub token: TrackToken,
    pub progress: Progress,
    pub window: Option<ControlWindow>,
    /// Ended on request rather than by running out.
    pub skipped: bool,
}

/// Everything owned by one guild. Always accessed under its session lock.
pub struct GuildPlayer {
    pub guild_id: GuildId,
    pub connection: Option<Arc<dyn VoiceConnection>>,
    pub engine: Option<Arc<dyn PlaybackEngine>>,
    pub queue: VecDeque<Track>,
    pub current: Option<NowPlaying>,
    pub stay_pinned: bool,
    pub pinned_channel: Option<ChannelId>,
    pub text_channel: Option<ChannelId>,
    /// Set once torn down. A released player is never reused.
    pub released: bool,
}

impl GuildPlayer {
    pub fn new(guild_id: GuildId) -> Self {
        Self {
            guild_id,
            connection: None,
            engine: None,
            queue: VecDeque::new(),
            current: None,
            stay_pinned: false,
            pinned_channel: None,
            text_channel: None,
            released: false,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.current.is_none() && self.queue.is_empty()
    }

    pub fn state(&self) -> SessionState {
        if self.released {
            SessionState::Empty
        } else if self.current.is_some() {
            SessionState::Active
        } else if self.stay_pinned && self.connection.is_some() {
            SessionState::IdlePinned
        } else {
            SessionState::Empty
        }
    }

    /// Stops everything and leaves voice. Idempotent.
    pub fn release(&mut self) {
        if let Some(now_playing) = self.current.take() {
            if let Some(window) = &now_playing.window {
                window.close();
            }
        }
        self.queue.clear();
        if let Some(engine) = self.engine.take() {
            engine.stop();
        }
        if let Some(connection) = self.connection.take() {
            connection.destroy();
        }
        self.released = true;
    }

    pub fn snapshot(&self, max_upcoming: usize) -> PlayerSnapshot {
        PlayerSnapshot {
            guild_id: self.guild_id.clone(),
            state: self.state(),
            voice_channel_id: self.connection.as_ref().map(|c| c.channel_id()),
            stay_pinned: self.stay_pinned,
            pinned_channel_id: self.pinned_channel,
            now_playing: self.current.as_ref().map(|np| NowPlayingView {
                token: np.token,
                track: np.track.clone(),
                elapsed_secs: np.progress.elapsed_secs(),
                paused: np.progress.is_paused(),
                requester: np.track.requester,
            }),
            queue_length: self.queue.len(),
            upcoming: self.queue.iter().take(max_upcoming).cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlayingView {
    pub token: TrackToken,
    pub track: Track,
    pub elapsed_secs: u64,
    pub paused: bool,
    pub requester: UserId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub guild_id: GuildId,
    pub state: SessionState,
    pub voice_channel_id: Option<ChannelId>,
    pub stay_pinned: bool,
    pub pinned_channel_id: Option<ChannelId>,
    pub now_playing: Option<NowPlayingView>,
    pub queue_length: usize,
    pub upcoming: Vec<Track>,
}
