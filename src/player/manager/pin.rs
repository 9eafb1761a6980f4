use std::{str::FromStr, sync::Arc};

use serde::Serialize;
use tracing::{error, info};

use super::{PlayerError, PlayerManager};
use crate::{
    common::types::{ChannelId, GuildId},
    protocol::PlayerEvent,
};

/// Requested change to a guild's stay-connected flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    On,
    Off,
    Toggle,
}

impl PinMode {
    pub fn resolve(self, currently_pinned: bool) -> bool {
        match self {
            Self::On => true,
            Self::Off => false,
            Self::Toggle => !currently_pinned,
        }
    }
}

impl FromStr for PinMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" | "enable" | "true" => Ok(Self::On),
            "off" | "disable" | "false" => Ok(Self::Off),
            "" | "toggle" => Ok(Self::Toggle),
            other => Err(format!("unknown pin mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PinOutcome {
    pub pinned: bool,
    pub channel_id: Option<ChannelId>,
}

impl PlayerManager {
    /// Enables or disables stay-connected for a guild.
    ///
    /// Enabling joins `voice_channel` when the guild has no connection yet.
    /// Disabling on an idle session leaves voice immediately.
    pub async fn set_pin(
        self: &Arc<Self>,
        guild_id: &GuildId,
        mode: PinMode,
        voice_channel: Option<ChannelId>,
    ) -> Result<PinOutcome, PlayerError> {
        loop {
            let handle = self.player_or_insert(guild_id);
            let mut player = handle.lock().await;
            if player.released {
                continue;
            }

            if !mode.resolve(player.stay_pinned) {
                let was_pinned = player.stay_pinned;
                player.stay_pinned = false;
                player.pinned_channel = None;
                self.unpin_record(guild_id).await;
                if player.is_idle() {
                    if player.connection.is_some() {
                        self.release_locked(&handle, &mut player);
                    } else {
                        player.release();
                        self.forget(guild_id, &handle);
                    }
                }
                if was_pinned {
                    info!("[{}] stay-connected disabled", guild_id);
                }
                self.presenter.announce(PlayerEvent::PinChanged {
                    guild_id: guild_id.clone(),
                    pinned: false,
                    channel_id: None,
                });
                return Ok(PinOutcome {
                    pinned: false,
                    channel_id: None,
                });
            }

            if player.connection.is_none() && voice_channel.is_none() {
                if player.is_idle() {
                    player.release();
                    self.forget(guild_id, &handle);
                }
                return Err(PlayerError::NoVoiceChannel);
            }
            if let Err(e) = self.ensure_connection(&mut player, voice_channel).await {
                if player.is_idle() {
                    player.release();
                    self.forget(guild_id, &handle);
                }
                return Err(e);
            }

            let channel_id = player
                .connection
                .as_ref()
                .map(|c| c.channel_id())
                .or(voice_channel);
            player.stay_pinned = true;
            player.pinned_channel = channel_id;

            if let Some(channel_id) = channel_id {
                if let Err(e) = self.pins.set(guild_id, channel_id).await {
                    error!("[{}] failed to persist pin record: {}", guild_id, e);
                }
            }
            info!("[{}] stay-connected enabled in {:?}", guild_id, channel_id);
            self.presenter.announce(PlayerEvent::PinChanged {
                guild_id: guild_id.clone(),
                pinned: true,
                channel_id,
            });
            return Ok(PinOutcome {
                pinned: true,
                channel_id,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_aliases() {
        for on in ["on", "enable", "TRUE"] {
            assert_eq!(on.parse::<PinMode>(), Ok(PinMode::On));
        }
        for off in ["off", "disable", "false"] {
            assert_eq!(off.parse::<PinMode>(), Ok(PinMode::Off));
        }
        assert_eq!("".parse::<PinMode>(), Ok(PinMode::Toggle));
        assert!("maybe".parse::<PinMode>().is_err());
    }

    #[test]
    fn test_toggle_flips() {
        assert!(PinMode::Toggle.resolve(false));
        assert!(!PinMode::Toggle.resolve(true));
        assert!(PinMode::On.resolve(true));
    }
}
