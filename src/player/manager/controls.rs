use std::{str::FromStr, sync::Arc, time::Duration};

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};
use tokio::{sync::Notify, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::PlayerManager;
use crate::{
    common::types::{ChannelId, GuildId, TrackToken, UserId, WindowId},
    presenter::MessageRef,
    protocol::{ControlButton, NowPlayingPayload, PlayerEvent, tracks::Track},
};

pub const NOT_REQUESTER: &str = "Only the requester can control this song.";
pub const SKIPPED: &str = "Skipped the song!";
pub const STOPPED: &str = "Stopped and left!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    PauseResume,
    Skip,
    Stop,
}

impl FromStr for ControlAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pause_resume" => Ok(Self::PauseResume),
            "skip" => Ok(Self::Skip),
            "stop" => Ok(Self::Stop),
            other => Err(format!("unknown control action: {}", other)),
        }
    }
}

/// Result of a control surface interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "message", rename_all = "camelCase")]
pub enum Interaction {
    /// Applied; the card redraws itself.
    Acknowledged,
    /// Applied; show this text to the actor only.
    Replied(String),
    /// Refused; show this text to the actor only.
    Rejected(String),
    /// The window no longer belongs to the current track.
    Stale,
}

pub(super) struct WindowTask {
    pub id: WindowId,
    pub guild_id: GuildId,
    pub channel_id: Option<ChannelId>,
    pub token: TrackToken,
    pub track: Track,
    pub ttl: Duration,
    pub cancel: CancellationToken,
    pub refresh: Arc<Notify>,
}

/// What the card needs from the session on each redraw.
struct CardState {
    elapsed_secs: u64,
    paused: bool,
    /// Engine already reported the end; the idle event is on its way.
    ended: bool,
}

impl PlayerManager {
    /// Applies a button press on control window `window_id`.
    pub async fn interact(
        &self,
        window_id: &WindowId,
        user: UserId,
        action: ControlAction,
    ) -> Interaction {
        let Some(route) = self.windows.get(window_id).map(|r| r.value().clone()) else {
            return Interaction::Stale;
        };
        let Some(handle) = self.player(&route.guild_id) else {
            return Interaction::Stale;
        };
        let mut player = handle.lock().await;

        let Some(now_playing) = player.current.as_ref() else {
            return Interaction::Stale;
        };
        let window_live = now_playing
            .window
            .as_ref()
            .is_some_and(|w| &w.id == window_id && !w.is_closed());
        if player.released || now_playing.token != route.token || !window_live {
            return Interaction::Stale;
        }

        if !now_playing.track.is_requested_by(user) {
            debug!(
                "[{}] user {} is not the requester of {}",
                route.guild_id, user, now_playing.track.title
            );
            return self.reply(&route.guild_id, user, Interaction::Rejected(NOT_REQUESTER.to_string()));
        }

        match action {
            ControlAction::PauseResume => {
                if let Some(paused) = Self::toggle_pause_locked(&mut player) {
                    info!(
                        "[{}] {} by {}",
                        route.guild_id,
                        if paused { "paused" } else { "resumed" },
                        user
                    );
                }
                Interaction::Acknowledged
            }
            ControlAction::Skip => {
                Self::skip_locked(&mut player);
                self.reply(&route.guild_id, user, Interaction::Replied(SKIPPED.to_string()))
            }
            ControlAction::Stop => {
                self.stop_locked(&handle, &mut player).await;
                self.reply(&route.guild_id, user, Interaction::Replied(STOPPED.to_string()))
            }
        }
    }

    fn reply(&self, guild_id: &GuildId, user: UserId, interaction: Interaction) -> Interaction {
        if let Interaction::Replied(content) | Interaction::Rejected(content) = &interaction {
            self.presenter.announce(PlayerEvent::EphemeralReply {
                guild_id: guild_id.clone(),
                user_id: user,
                content: content.clone(),
            });
        }
        interaction
    }

    /// Owns one control window: publishes the card, redraws it on every tick
    /// or refresh request, and removes it when the window ends.
    pub(super) async fn run_window(self: Arc<Self>, task: WindowTask) {
        let WindowTask {
            id,
            guild_id,
            channel_id,
            token,
            track,
            ttl,
            cancel,
            refresh,
        } = task;

        let initial = CardState {
            elapsed_secs: 0,
            paused: false,
            ended: false,
        };
        let message = match self
            .presenter
            .publish(&guild_id, channel_id, self.payload(&id, &track, &initial))
            .await
        {
            Ok(message) => Some(message),
            Err(e) => {
                warn!("[{}] failed to publish now-playing card: {}", guild_id, e);
                None
            }
        };

        let expiry = tokio::time::sleep(ttl);
        tokio::pin!(expiry);
        let period = self.config.refresh_interval();
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = &mut expiry => {
                    self.expire_window(&guild_id, token, &id).await;
                    break;
                }
                _ = refresh.notified() => {
                    if !self.redraw(&id, &guild_id, token, &track, message.as_ref()).await {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    if !self.redraw(&id, &guild_id, token, &track, message.as_ref()).await {
                        break;
                    }
                }
            }
        }

        self.windows.remove(&id);
        if let Some(message) = message {
            if let Err(e) = self.presenter.delete(&message).await {
                debug!("[{}] card already gone: {}", guild_id, e);
            }
        }
        debug!("[{}] control window {} closed", guild_id, id);
    }

    /// Returns false once the window's track is no longer current.
    async fn redraw(
        &self,
        id: &WindowId,
        guild_id: &GuildId,
        token: TrackToken,
        track: &Track,
        message: Option<&MessageRef>,
    ) -> bool {
        let Some(state) = self.card_state(guild_id, token).await else {
            return false;
        };
        let Some(message) = message.filter(|_| !state.ended) else {
            return true;
        };
        if let Err(e) = self.presenter.edit(message, self.payload(id, track, &state)).await {
            debug!("[{}] card refresh failed: {}", guild_id, e);
        }
        true
    }

    async fn card_state(&self, guild_id: &GuildId, token: TrackToken) -> Option<CardState> {
        let handle = self.player(guild_id)?;
        let player = handle.lock().await;
        let now_playing = player.current.as_ref().filter(|np| np.token == token)?;
        if player.released {
            return None;
        }
        Some(CardState {
            elapsed_secs: now_playing.progress.elapsed_secs(),
            paused: now_playing.progress.is_paused(),
            ended: player
                .engine
                .as_ref()
                .is_none_or(|engine| engine.state().is_terminal()),
        })
    }

    async fn expire_window(&self, guild_id: &GuildId, token: TrackToken, id: &WindowId) {
        let Some(handle) = self.player(guild_id) else {
            return;
        };
        let mut player = handle.lock().await;
        if let Some(now_playing) = player.current.as_mut().filter(|np| np.token == token) {
            if now_playing.window.as_ref().is_some_and(|w| &w.id == id) {
                debug!("[{}] control window {} expired", guild_id, id);
                now_playing.window = None;
            }
        }
    }

    fn payload(&self, id: &WindowId, track: &Track, state: &CardState) -> NowPlayingPayload {
        let image = self.renderer.render(track, state.elapsed_secs, state.paused);
        NowPlayingPayload {
            window_id: id.clone(),
            title: "Now Playing".to_string(),
            description: format!("{} - {}", track.title, track.lead_artist()),
            elapsed_secs: state.elapsed_secs,
            duration_secs: track.duration_secs,
            paused: state.paused,
            image: STANDARD.encode(image),
            buttons: ControlButton::row(state.paused),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parsing() {
        assert_eq!("pause_resume".parse::<ControlAction>(), Ok(ControlAction::PauseResume));
        assert_eq!("skip".parse::<ControlAction>(), Ok(ControlAction::Skip));
        assert!("volume".parse::<ControlAction>().is_err());
    }

    #[test]
    fn test_interaction_wire_shape() {
        let value = serde_json::to_value(Interaction::Rejected(NOT_REQUESTER.to_string())).unwrap();
        assert_eq!(value["result"], "rejected");
        assert_eq!(value["message"], NOT_REQUESTER);

        let value = serde_json::to_value(Interaction::Stale).unwrap();
        assert_eq!(value["result"], "stale");
    }
}
