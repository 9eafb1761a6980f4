use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::PlayerManager;
use crate::{
    common::types::{ChannelId, GuildId, Shared},
    player::context::GuildPlayer,
    voice::join_with_timeout,
};

impl PlayerManager {
    /// Rejoins every pinned channel from the persisted record, concurrently.
    /// Failed guilds keep their record and are retried on the next start.
    pub async fn restore(self: &Arc<Self>) -> usize {
        let pins = self.pins.load().await;
        if pins.is_empty() {
            debug!("No pinned sessions to restore");
            return 0;
        }

        info!("Restoring {} pinned sessions", pins.len());
        let total = pins.len();
        let attempts = pins
            .into_iter()
            .map(|(guild_id, channel_id)| self.restore_guild(guild_id, channel_id));
        let restored = join_all(attempts).await.into_iter().filter(|ok| *ok).count();

        info!("Restored {}/{} pinned sessions", restored, total);
        restored
    }

    async fn restore_guild(self: &Arc<Self>, guild_id: GuildId, channel_id: ChannelId) -> bool {
        // Reserved and locked before joining; commands for this guild wait behind the join.
        let reserved: Shared<GuildPlayer> =
            Arc::new(Mutex::new(GuildPlayer::new(guild_id.clone())));
        let mut player = reserved.clone().lock_owned().await;
        let existing = match self.players.entry(guild_id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(reserved.clone());
                None
            }
            Entry::Occupied(slot) => Some(slot.get().clone()),
        };
        if let Some(handle) = existing {
            return self.adopt_pin(&handle, &guild_id, channel_id).await;
        }

        if !self.pins.contains(&guild_id).await {
            debug!("[{}] pin cleared before restore", guild_id);
            player.release();
            self.forget(&guild_id, &reserved);
            return false;
        }

        let connection =
            match join_with_timeout(&*self.connector, &guild_id, channel_id, self.join_timeout)
                .await
            {
                Ok(connection) => connection,
                Err(e) => {
                    warn!("[{}] could not restore pinned session: {}", guild_id, e);
                    player.release();
                    self.forget(&guild_id, &reserved);
                    return false;
                }
            };

        player.engine = Some(self.engines.create(
            guild_id.clone(),
            connection.clone(),
            self.events_tx.clone(),
        ));
        player.connection = Some(connection);
        player.stay_pinned = true;
        player.pinned_channel = Some(channel_id);

        info!("[{}] rejoined pinned channel {}", guild_id, channel_id);
        true
    }

    /// A command created the session first; keep its connection and carry the pin over.
    async fn adopt_pin(
        &self,
        handle: &Shared<GuildPlayer>,
        guild_id: &GuildId,
        channel_id: ChannelId,
    ) -> bool {
        let mut current = handle.lock().await;
        if current.released || !self.pins.contains(guild_id).await {
            return false;
        }
        if !current.stay_pinned {
            current.stay_pinned = true;
            current.pinned_channel = Some(channel_id);
        }
        true
    }
}
