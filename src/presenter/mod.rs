//! Chat-side publishing of now-playing cards.

use async_trait::async_trait;

use crate::{
    common::types::{ChannelId, GuildId},
    protocol::{NowPlayingPayload, PlayerEvent},
};

pub mod websocket;

pub use websocket::EventPresenter;

/// A message created by [`Presenter::publish`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub id: String,
    pub guild_id: GuildId,
    pub channel_id: Option<ChannelId>,
}

#[derive(Debug, thiserror::Error)]
pub enum PresentError {
    #[error("message {0} no longer exists")]
    Gone(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Sends, edits and removes messages on behalf of the player.
#[async_trait]
pub trait Presenter: Send + Sync {
    async fn publish(
        &self,
        guild_id: &GuildId,
        channel_id: Option<ChannelId>,
        payload: NowPlayingPayload,
    ) -> Result<MessageRef, PresentError>;

    async fn edit(&self, message: &MessageRef, payload: NowPlayingPayload)
    -> Result<(), PresentError>;

    async fn delete(&self, message: &MessageRef) -> Result<(), PresentError>;

    /// Fire-and-forget lifecycle notification.
    fn announce(&self, event: PlayerEvent);
}
