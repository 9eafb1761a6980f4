//! Voice transport: the network link decoded audio is transmitted over.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::common::types::{AnyResult, ChannelId, GuildId};

pub mod constants;
pub mod udp;

pub use udp::{UdpConnector, UdpVoiceLink};

#[derive(Debug, thiserror::Error)]
pub enum JoinError {
    #[error("voice channel {0} is not reachable")]
    ChannelUnavailable(ChannelId),
    #[error("voice channel {1} was not ready within {0:?}")]
    Timeout(Duration, ChannelId),
    #[error("voice handshake rejected: {0}")]
    Rejected(String),
    #[error("voice socket error: {0}")]
    Io(#[from] std::io::Error),
}

/// A live, exclusively owned link to one voice channel.
#[async_trait]
pub trait VoiceConnection: Send + Sync {
    fn channel_id(&self) -> ChannelId;

    /// False once destroyed or after the remote end went away.
    fn is_alive(&self) -> bool;

    /// Transmit one frame of interleaved stereo s16le PCM.
    async fn send_frame(&self, pcm: &[u8]) -> AnyResult<()>;

    /// Release the link. Idempotent.
    fn destroy(&self);
}

/// Establishes voice connections.
#[async_trait]
pub trait VoiceConnector: Send + Sync {
    /// Join `channel_id` and wait until the link is ready to carry audio.
    async fn join(
        &self,
        guild_id: &GuildId,
        channel_id: ChannelId,
    ) -> Result<Arc<dyn VoiceConnection>, JoinError>;
}

/// `join` bounded by `timeout`.
pub async fn join_with_timeout(
    connector: &dyn VoiceConnector,
    guild_id: &GuildId,
    channel_id: ChannelId,
    timeout: Duration,
) -> Result<Arc<dyn VoiceConnection>, JoinError> {
    match tokio::time::timeout(timeout, connector.join(guild_id, channel_id)).await {
        Ok(result) => result,
        Err(_) => Err(JoinError::Timeout(timeout, channel_id)),
    }
}
