use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::{PlayerError, PlayerManager, advance::Advance};
use crate::{
    common::types::{ChannelId, GuildId, Shared, TrackToken},
    player::context::GuildPlayer,
    protocol::{PlayerEvent, TrackEndReason, tracks::Track},
    voice::join_with_timeout,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Enqueued {
    /// Bound to the engine immediately.
    Started { token: TrackToken },
    /// Waiting behind the current track; `position` is 0-based.
    Queued { position: usize },
}

impl PlayerManager {
    /// Appends `track` to the guild's queue, creating and connecting the
    /// session first when needed. Starts playback if nothing is playing.
    pub async fn enqueue(
        self: &Arc<Self>,
        guild_id: &GuildId,
        track: Track,
        voice_channel: Option<ChannelId>,
        text_channel: Option<ChannelId>,
    ) -> Result<Enqueued, PlayerError> {
        loop {
            let handle = self.player_or_insert(guild_id);
            let mut player = handle.lock().await;
            if player.released {
                // Torn down between lookup and lock; the next lookup sees a fresh session.
                continue;
            }

            if let Err(e) = self.ensure_connection(&mut player, voice_channel).await {
                if player.is_idle() && !player.stay_pinned {
                    player.release();
                    self.forget(guild_id, &handle);
                }
                return Err(e);
            }

            if text_channel.is_some() {
                player.text_channel = text_channel;
            }
            player.queue.push_back(track.clone());

            if player.current.is_none() {
                if let Advance::Started(token) = self.advance_locked(&mut player) {
                    return Ok(Enqueued::Started { token });
                }
            }

            let position = player.queue.len() - 1;
            debug!("[{}] queued {} at {}", guild_id, track.title, position);
            self.presenter.announce(PlayerEvent::TrackQueued {
                guild_id: guild_id.clone(),
                position,
                track,
            });
            return Ok(Enqueued::Queued { position });
        }
    }

    /// Makes sure the session holds a live connection and an engine.
    pub(super) async fn ensure_connection(
        &self,
        player: &mut GuildPlayer,
        voice_channel: Option<ChannelId>,
    ) -> Result<(), PlayerError> {
        if let Some(connection) = &player.connection {
            if connection.is_alive() {
                if player.engine.is_none() {
                    player.engine = Some(self.engines.create(
                        player.guild_id.clone(),
                        connection.clone(),
                        self.events_tx.clone(),
                    ));
                }
                return Ok(());
            }
            warn!("[{}] voice connection lost, rejoining", player.guild_id);
            if let Some(engine) = player.engine.take() {
                engine.stop();
            }
            connection.destroy();
            player.connection = None;
        }

        let channel_id = voice_channel
            .or(player.pinned_channel)
            .ok_or(PlayerError::NoVoiceChannel)?;
        let connection =
            join_with_timeout(&*self.connector, &player.guild_id, channel_id, self.join_timeout)
                .await?;
        info!("[{}] joined voice channel {}", player.guild_id, channel_id);

        player.engine = Some(self.engines.create(
            player.guild_id.clone(),
            connection.clone(),
            self.events_tx.clone(),
        ));
        player.connection = Some(connection);
        Ok(())
    }

    /// The engine finished the track bound under `token`.
    pub async fn on_idle(self: &Arc<Self>, guild_id: GuildId, token: TrackToken, error: Option<String>) {
        let Some(handle) = self.player(&guild_id) else {
            debug!("[{}] idle {} for a released session", guild_id, token);
            return;
        };
        let mut player = handle.lock().await;
        if player.released || player.current.as_ref().map(|np| np.token) != Some(token) {
            debug!("[{}] stale idle {}", guild_id, token);
            return;
        }

        let Some(finished) = player.current.take() else {
            return;
        };
        let reason = if let Some(err) = &error {
            warn!("[{}] {} failed: {}", guild_id, finished.track.title, err);
            TrackEndReason::LoadFailed
        } else if finished.skipped {
            TrackEndReason::Stopped
        } else {
            TrackEndReason::Finished
        };
        drop(finished);
        self.presenter.announce(PlayerEvent::TrackEnd {
            guild_id: guild_id.clone(),
            token,
            reason,
        });

        if let Advance::NotStarted = self.advance_locked(&mut player) {
            if player.stay_pinned {
                info!("[{}] queue finished, staying connected", guild_id);
            } else {
                info!("[{}] queue finished, leaving voice", guild_id);
                self.release_locked(&handle, &mut player);
            }
        }
    }

    /// Ends the current track early. The next one starts on its idle event.
    pub async fn skip(&self, guild_id: &GuildId) -> bool {
        let Some(handle) = self.player(guild_id) else {
            return false;
        };
        let mut player = handle.lock().await;
        if player.released {
            return false;
        }
        Self::skip_locked(&mut player)
    }

    pub(super) fn skip_locked(player: &mut GuildPlayer) -> bool {
        let engine = player.engine.clone();
        let Some(now_playing) = player.current.as_mut() else {
            return false;
        };
        now_playing.skipped = true;
        if let Some(window) = now_playing.window.take() {
            window.close();
        }
        if let Some(engine) = engine {
            engine.stop();
        }
        info!("[{}] skipped {}", player.guild_id, now_playing.track.title);
        true
    }

    /// Tears the session down, leaves voice and forgets the pin.
    /// Returns whether a session existed.
    pub async fn stop(&self, guild_id: &GuildId) -> bool {
        loop {
            let handle = self.player_or_insert(guild_id);
            let mut player = handle.lock().await;
            if player.released {
                continue;
            }
            if player.connection.is_none() {
                // Nothing was connected; still clear the record under the guild lock.
                player.release();
                self.forget(guild_id, &handle);
                self.unpin_record(guild_id).await;
                return false;
            }
            self.stop_locked(&handle, &mut player).await;
            return true;
        }
    }

    /// Leaves voice and drops the queue and current track without touching
    /// the pin. Refused while the guild is pinned.
    pub async fn leave(&self, guild_id: &GuildId) -> Result<bool, PlayerError> {
        let Some(handle) = self.player(guild_id) else {
            return Ok(false);
        };
        let mut player = handle.lock().await;
        if player.released {
            return Ok(false);
        }
        if player.stay_pinned {
            return Err(PlayerError::Pinned);
        }
        if let Some(now_playing) = &player.current {
            self.presenter.announce(PlayerEvent::TrackEnd {
                guild_id: guild_id.clone(),
                token: now_playing.token,
                reason: TrackEndReason::Stopped,
            });
        }
        info!("[{}] leaving voice on request", guild_id);
        self.release_locked(&handle, &mut player);
        Ok(true)
    }

    pub(super) async fn stop_locked(&self, handle: &Shared<GuildPlayer>, player: &mut GuildPlayer) {
        if let Some(now_playing) = &player.current {
            self.presenter.announce(PlayerEvent::TrackEnd {
                guild_id: player.guild_id.clone(),
                token: now_playing.token,
                reason: TrackEndReason::Stopped,
            });
        }
        player.stay_pinned = false;
        player.pinned_channel = None;
        self.release_locked(handle, player);
        self.unpin_record(&player.guild_id).await;
    }

    pub(super) fn release_locked(&self, handle: &Shared<GuildPlayer>, player: &mut GuildPlayer) {
        player.release();
        self.forget(&player.guild_id, handle);
        self.presenter.announce(PlayerEvent::SessionReleased {
            guild_id: player.guild_id.clone(),
        });
    }

    pub(super) async fn unpin_record(&self, guild_id: &GuildId) {
        if let Err(e) = self.pins.remove(guild_id).await {
            error!("[{}] failed to clear pin record: {}", guild_id, e);
        }
    }

    pub async fn pause(&self, guild_id: &GuildId) -> bool {
        self.set_paused(guild_id, true).await
    }

    pub async fn resume(&self, guild_id: &GuildId) -> bool {
        self.set_paused(guild_id, false).await
    }

    async fn set_paused(&self, guild_id: &GuildId, paused: bool) -> bool {
        let Some(handle) = self.player(guild_id) else {
            return false;
        };
        let mut player = handle.lock().await;
        if player.released {
            return false;
        }
        let is_paused = player
            .current
            .as_ref()
            .is_some_and(|np| np.progress.is_paused());
        if player.current.is_none() || is_paused == paused {
            return false;
        }
        Self::toggle_pause_locked(&mut player).is_some()
    }

    /// Flips engine and elapsed-time accounting together.
    /// Returns the new paused flag, or `None` with nothing playing.
    pub(super) fn toggle_pause_locked(player: &mut GuildPlayer) -> Option<bool> {
        let engine = player.engine.clone()?;
        let now_playing = player.current.as_mut()?;
        let paused = if now_playing.progress.is_paused() {
            engine.resume();
            now_playing.progress.resume();
            false
        } else {
            engine.pause();
            now_playing.progress.pause();
            true
        };
        if let Some(window) = &now_playing.window {
            window.request_refresh();
        }
        Some(paused)
    }

    /// Drops every queued track. The current track keeps playing.
    pub async fn clear_queue(&self, guild_id: &GuildId) -> usize {
        let Some(handle) = self.player(guild_id) else {
            return 0;
        };
        let mut player = handle.lock().await;
        let removed = player.queue.len();
        player.queue.clear();
        removed
    }
}
