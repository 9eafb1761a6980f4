use serde::Serialize;

use crate::{
    common::types::{ChannelId, GuildId, TrackToken, UserId, WindowId},
    protocol::tracks::Track,
};

/// Messages pushed to websocket clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum OutgoingMessage {
    Ready {
        #[serde(rename = "clientId")]
        client_id: String,
    },
    /// A now-playing card was created, edited or removed.
    #[serde(rename = "card")]
    Card {
        #[serde(flatten)]
        card: CardMessage,
    },
    #[serde(rename = "event")]
    Event {
        #[serde(flatten)]
        event: PlayerEvent,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardMessage {
    pub action: CardAction,
    pub message_id: String,
    pub guild_id: GuildId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<ChannelId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<NowPlayingPayload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CardAction {
    Create,
    Edit,
    Delete,
}

/// Everything a chat client needs to draw the now-playing message.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NowPlayingPayload {
    pub window_id: WindowId,
    pub title: String,
    pub description: String,
    pub elapsed_secs: u64,
    pub duration_secs: u64,
    pub paused: bool,
    /// Rendered card, base64 encoded.
    pub image: String,
    pub buttons: Vec<ControlButton>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlButton {
    pub custom_id: &'static str,
    pub label: &'static str,
}

impl ControlButton {
    pub fn row(paused: bool) -> Vec<Self> {
        vec![
            Self {
                custom_id: "pause_resume",
                label: if paused { "Resume" } else { "Pause" },
            },
            Self {
                custom_id: "skip",
                label: "Skip",
            },
            Self {
                custom_id: "stop",
                label: "Stop",
            },
        ]
    }
}

/// Lifecycle events emitted by the player.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    #[serde(rename = "TrackStartEvent")]
    TrackStart {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        token: TrackToken,
        track: Track,
    },

    #[serde(rename = "TrackEndEvent")]
    TrackEnd {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        token: TrackToken,
        reason: TrackEndReason,
    },

    #[serde(rename = "TrackQueuedEvent")]
    TrackQueued {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        position: usize,
        track: Track,
    },

    #[serde(rename = "SessionReleasedEvent")]
    SessionReleased {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
    },

    #[serde(rename = "PinChangedEvent")]
    PinChanged {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        pinned: bool,
        #[serde(rename = "channelId", skip_serializing_if = "Option::is_none")]
        channel_id: Option<ChannelId>,
    },

    /// Reply visible only to `user_id`.
    #[serde(rename = "EphemeralReplyEvent")]
    EphemeralReply {
        #[serde(rename = "guildId")]
        guild_id: GuildId,
        #[serde(rename = "userId")]
        user_id: UserId,
        content: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TrackEndReason {
    Finished,
    LoadFailed,
    Stopped,
}
