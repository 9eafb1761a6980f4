use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use tracing::{debug, trace};

use super::{MessageRef, PresentError, Presenter};
use crate::{
    common::types::{ChannelId, GuildId},
    protocol::{CardAction, CardMessage, NowPlayingPayload, OutgoingMessage, PlayerEvent},
};

/// Fans player output out to every connected websocket client.
#[derive(Default)]
pub struct EventPresenter {
    clients: DashMap<String, flume::Sender<String>>,
    live: DashSet<String>,
}

impl EventPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a client and returns the stream of serialized messages for it.
    pub fn register(&self, client_id: &str) -> flume::Receiver<String> {
        let (tx, rx) = flume::unbounded();
        self.clients.insert(client_id.to_string(), tx);
        debug!("Event client registered: {}", client_id);
        rx
    }

    pub fn unregister(&self, client_id: &str) {
        if self.clients.remove(client_id).is_some() {
            debug!("Event client unregistered: {}", client_id);
        }
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn broadcast(&self, message: &OutgoingMessage) {
        let json = match serde_json::to_string(message) {
            Ok(json) => json,
            Err(e) => {
                debug!("Failed to encode outgoing message: {}", e);
                return;
            }
        };
        trace!("broadcast: {}", json);
        self.clients
            .retain(|_, sender| sender.send(json.clone()).is_ok());
    }

    fn card(&self, action: CardAction, message: &MessageRef, payload: Option<NowPlayingPayload>) {
        self.broadcast(&OutgoingMessage::Card {
            card: CardMessage {
                action,
                message_id: message.id.clone(),
                guild_id: message.guild_id.clone(),
                channel_id: message.channel_id,
                payload,
            },
        });
    }
}

#[async_trait]
impl Presenter for EventPresenter {
    async fn publish(
        &self,
        guild_id: &GuildId,
        channel_id: Option<ChannelId>,
        payload: NowPlayingPayload,
    ) -> Result<MessageRef, PresentError> {
        let message = MessageRef {
            id: uuid::Uuid::new_v4().to_string(),
            guild_id: guild_id.clone(),
            channel_id,
        };
        self.live.insert(message.id.clone());
        self.card(CardAction::Create, &message, Some(payload));
        Ok(message)
    }

    async fn edit(
        &self,
        message: &MessageRef,
        payload: NowPlayingPayload,
    ) -> Result<(), PresentError> {
        if !self.live.contains(&message.id) {
            return Err(PresentError::Gone(message.id.clone()));
        }
        self.card(CardAction::Edit, message, Some(payload));
        Ok(())
    }

    async fn delete(&self, message: &MessageRef) -> Result<(), PresentError> {
        if self.live.remove(&message.id).is_none() {
            return Err(PresentError::Gone(message.id.clone()));
        }
        self.card(CardAction::Delete, message, None);
        Ok(())
    }

    fn announce(&self, event: PlayerEvent) {
        self.broadcast(&OutgoingMessage::Event { event });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{common::types::WindowId, protocol::ControlButton};

    fn payload() -> NowPlayingPayload {
        NowPlayingPayload {
            window_id: WindowId::from("w1".to_string()),
            title: "Now Playing".to_string(),
            description: "Song - Artist".to_string(),
            elapsed_secs: 0,
            duration_secs: 10,
            paused: false,
            image: String::new(),
            buttons: ControlButton::row(false),
        }
    }

    #[tokio::test]
    async fn test_card_lifecycle_is_broadcast() {
        let presenter = EventPresenter::new();
        let rx = presenter.register("client-a");

        let message = presenter
            .publish(&GuildId::from("1"), Some(ChannelId(2)), payload())
            .await
            .unwrap();
        presenter.edit(&message, payload()).await.unwrap();
        presenter.delete(&message).await.unwrap();

        let frames: Vec<serde_json::Value> = rx
            .drain()
            .map(|s| serde_json::from_str(&s).unwrap())
            .collect();
        let actions: Vec<&str> = frames
            .iter()
            .map(|f| f["action"].as_str().unwrap())
            .collect();
        assert_eq!(actions, vec!["create", "edit", "delete"]);
        assert_eq!(frames[0]["op"], "card");
        assert_eq!(frames[0]["payload"]["windowId"], "w1");
    }

    #[tokio::test]
    async fn test_edit_after_delete_is_gone() {
        let presenter = EventPresenter::new();
        let message = presenter
            .publish(&GuildId::from("1"), None, payload())
            .await
            .unwrap();
        presenter.delete(&message).await.unwrap();

        assert!(matches!(
            presenter.edit(&message, payload()).await,
            Err(PresentError::Gone(_))
        ));
        assert!(presenter.delete(&message).await.is_err());
    }

    #[test]
    fn test_disconnected_clients_are_pruned() {
        let presenter = EventPresenter::new();
        let rx = presenter.register("gone");
        drop(rx);
        presenter.announce(PlayerEvent::SessionReleased {
            guild_id: GuildId::from("1"),
        });
        assert_eq!(presenter.client_count(), 0);
    }
}
