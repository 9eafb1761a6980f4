use std::{
    sync::{
        Arc,
        atomic::{AtomicU8, AtomicU64, Ordering},
    },
    time::Duration,
};

use tokio_util::sync::CancellationToken;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PlaybackState {
    Playing = 0,
    Paused = 1,
    Stopped = 2,
}

impl PlaybackState {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Playing,
            1 => Self::Paused,
            _ => Self::Stopped,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == Self::Stopped
    }
}

/// Shared control block for one streaming track.
#[derive(Clone)]
pub struct TrackHandle {
    state: Arc<AtomicU8>,
    frames_sent: Arc<AtomicU64>,
    stop_token: CancellationToken,
}

impl Default for TrackHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackHandle {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(PlaybackState::Playing as u8)),
            frames_sent: Arc::new(AtomicU64::new(0)),
            stop_token: CancellationToken::new(),
        }
    }

    fn transition(&self, from: PlaybackState, to: PlaybackState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn pause(&self) -> bool {
        self.transition(PlaybackState::Playing, PlaybackState::Paused)
    }

    pub fn play(&self) -> bool {
        self.transition(PlaybackState::Paused, PlaybackState::Playing)
    }

    pub fn stop(&self) {
        self.state
            .store(PlaybackState::Stopped as u8, Ordering::Release);
        self.stop_token.cancel();
    }

    pub fn get_state(&self) -> PlaybackState {
        PlaybackState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Resolves once `stop` has been called.
    pub async fn stopped(&self) {
        self.stop_token.cancelled().await
    }

    pub fn record_frame(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    /// Audio actually transmitted, in milliseconds.
    pub fn get_position(&self, frame_duration: Duration) -> u64 {
        self.frames_sent.load(Ordering::Relaxed) * frame_duration.as_millis() as u64
    }
}
