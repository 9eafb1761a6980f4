//! Per-guild session orchestration.
//!
//! Each guild owns one [`GuildPlayer`] behind its own async lock. Every
//! mutation of a session (enqueue, advance, pause, skip, stop, pin, teardown)
//! happens while holding that lock, so two operations on the same guild never
//! interleave. Sessions of different guilds never contend.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use dashmap::DashMap;
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, info};

use crate::{
    common::types::{GuildId, Shared, TrackToken, WindowId},
    configs::PlayerConfig,
    engine::{EngineEvent, EngineEventReceiver, EngineEventSender, EngineFactory},
    pins::PinStore,
    player::context::{GuildPlayer, PlayerSnapshot, SessionState},
    presenter::Presenter,
    render::CardRenderer,
    voice::{JoinError, VoiceConnector},
};

mod advance;
mod controls;
mod lifecycle;
mod pin;
mod restore;


pub use controls::{ControlAction, Interaction};
pub use lifecycle::Enqueued;
pub use pin::{PinMode, PinOutcome};

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("Join a voice channel first")]
    NoVoiceChannel,
    #[error("Stay-connected is enabled. Disable it with the pin command first")]
    Pinned,
    #[error("could not join voice: {0}")]
    Join(#[from] JoinError),
}

/// External collaborators a [`PlayerManager`] drives.
pub struct ManagerDeps {
    pub connector: Arc<dyn VoiceConnector>,
    pub engines: Arc<dyn EngineFactory>,
    pub presenter: Arc<dyn Presenter>,
    pub renderer: Arc<dyn CardRenderer>,
    pub pins: Arc<PinStore>,
}

/// Where a control window routes its interactions.
#[derive(Debug, Clone)]
struct WindowRoute {
    guild_id: GuildId,
    token: TrackToken,
}

pub struct PlayerManager {
    players: DashMap<GuildId, Shared<GuildPlayer>>,
    windows: DashMap<WindowId, WindowRoute>,
    connector: Arc<dyn VoiceConnector>,
    engines: Arc<dyn EngineFactory>,
    presenter: Arc<dyn Presenter>,
    renderer: Arc<dyn CardRenderer>,
    pins: Arc<PinStore>,
    config: PlayerConfig,
    join_timeout: Duration,
    events_tx: EngineEventSender,
    next_token: AtomicU64,
}

impl PlayerManager {
    /// Returns the manager and the receiving end of its engine events.
    /// Hand the receiver to [`PlayerManager::run_events`].
    pub fn new(
        deps: ManagerDeps,
        config: PlayerConfig,
        join_timeout: Duration,
    ) -> (Arc<Self>, EngineEventReceiver) {
        let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
        let manager = Arc::new(Self {
            players: DashMap::new(),
            windows: DashMap::new(),
            connector: deps.connector,
            engines: deps.engines,
            presenter: deps.presenter,
            renderer: deps.renderer,
            pins: deps.pins,
            config,
            join_timeout,
            events_tx,
            next_token: AtomicU64::new(1),
        });
        (manager, events_rx)
    }

    /// Consumes engine events until every sender is gone.
    pub fn run_events(self: &Arc<Self>, mut events: EngineEventReceiver) -> JoinHandle<()> {
        let manager = Arc::downgrade(self);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(manager) = manager.upgrade() else {
                    break;
                };
                match event {
                    EngineEvent::Idle {
                        guild_id,
                        token,
                        error,
                    } => {
                        // Idle handling takes the session lock; don't stall other guilds.
                        tokio::spawn(async move {
                            manager.on_idle(guild_id, token, error).await;
                        });
                    }
                }
            }
            debug!("Engine event loop finished");
        })
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn session_count(&self) -> usize {
        self.players.len()
    }

    pub async fn state(&self, guild_id: &GuildId) -> SessionState {
        match self.player(guild_id) {
            Some(handle) => handle.lock().await.state(),
            None => SessionState::Empty,
        }
    }

    pub async fn snapshot(&self, guild_id: &GuildId) -> Option<PlayerSnapshot> {
        let handle = self.player(guild_id)?;
        let player = handle.lock().await;
        if player.released {
            return None;
        }
        Some(player.snapshot(self.config.max_queue_preview))
    }

    pub async fn snapshots(&self) -> Vec<PlayerSnapshot> {
        let handles: Vec<_> = self.players.iter().map(|e| e.value().clone()).collect();
        let mut out = Vec::with_capacity(handles.len());
        for handle in handles {
            let player = handle.lock().await;
            if !player.released {
                out.push(player.snapshot(self.config.max_queue_preview));
            }
        }
        out.sort_by(|a, b| a.guild_id.cmp(&b.guild_id));
        out
    }

    fn player(&self, guild_id: &GuildId) -> Option<Shared<GuildPlayer>> {
        self.players.get(guild_id).map(|p| p.value().clone())
    }

    fn player_or_insert(&self, guild_id: &GuildId) -> Shared<GuildPlayer> {
        self.players
            .entry(guild_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(GuildPlayer::new(guild_id.clone()))))
            .value()
            .clone()
    }

    /// Drops the map entry if it still points at `handle`.
    fn forget(&self, guild_id: &GuildId, handle: &Shared<GuildPlayer>) {
        if self
            .players
            .remove_if(guild_id, |_, current| Arc::ptr_eq(current, handle))
            .is_some()
        {
            info!("Session for guild {} released", guild_id);
        }
    }

    fn next_token(&self) -> TrackToken {
        TrackToken(self.next_token.fetch_add(1, Ordering::Relaxed))
    }
}
