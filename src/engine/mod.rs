//! Playback engine contract and the bundled streaming implementation.

use std::sync::Arc;

use crate::{
    common::types::{GuildId, TrackToken},
    voice::VoiceConnection,
};

pub mod decoder;
pub mod handle;
pub mod streaming;

pub use handle::{PlaybackState, TrackHandle};
pub use streaming::{StreamingEngine, StreamingEngineFactory};

/// Terminal signal for one bound track.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The stream ended, failed or was stopped. Sent exactly once per bind.
    Idle {
        guild_id: GuildId,
        token: TrackToken,
        error: Option<String>,
    },
}

pub type EngineEventSender = tokio::sync::mpsc::UnboundedSender<EngineEvent>;
pub type EngineEventReceiver = tokio::sync::mpsc::UnboundedReceiver<EngineEvent>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to fetch source: {0}")]
    Fetch(#[from] reqwest::Error),
    #[error("failed to decode source: {0}")]
    Decode(String),
    #[error("voice transport failed: {0}")]
    Transport(String),
}

/// A decode + transmit pipeline owned by one guild.
pub trait PlaybackEngine: Send + Sync {
    /// Start streaming `source_url`; the idle event will quote `token`.
    fn bind(&self, token: TrackToken, source_url: &str);

    /// Returns true when the call changed the state.
    fn pause(&self) -> bool;

    /// Returns true when the call changed the state.
    fn resume(&self) -> bool;

    /// Stop the bound track. Its idle event still fires.
    fn stop(&self);

    fn state(&self) -> PlaybackState;
}

/// Builds one engine per guild, bound to that guild's connection.
pub trait EngineFactory: Send + Sync {
    fn create(
        &self,
        guild_id: GuildId,
        connection: Arc<dyn VoiceConnection>,
        events: EngineEventSender,
    ) -> Arc<dyn PlaybackEngine>;
}
