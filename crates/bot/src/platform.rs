use std::{
    collections::HashMap,
    sync::atomic::{AtomicI64, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use paginator::{ChannelError, MessageChannel};
use shared::{
    domain::{ChannelId, MessageId, UserId},
    protocol::{MessageControls, MessageView, PageContent, PlatformEvent},
};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

/// In-process stand-in for the chat platform's message API.
///
/// Every successful mutation is published as a [`PlatformEvent`].
pub struct InMemoryPlatform {
    messages: RwLock<HashMap<MessageId, MessageView>>,
    next_message_id: AtomicI64,
    events: broadcast::Sender<PlatformEvent>,
}

impl InMemoryPlatform {
    pub fn new(events: broadcast::Sender<PlatformEvent>) -> Self {
        Self {
            messages: RwLock::new(HashMap::new()),
            next_message_id: AtomicI64::new(1),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlatformEvent> {
        self.events.subscribe()
    }

    pub async fn message(&self, message_id: MessageId) -> Option<MessageView> {
        self.messages.read().await.get(&message_id).cloned()
    }

    fn publish(&self, event: PlatformEvent) {
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl MessageChannel for InMemoryPlatform {
    async fn send(
        &self,
        channel_id: ChannelId,
        content: PageContent,
        controls: MessageControls,
    ) -> Result<MessageId, ChannelError> {
        let message_id = MessageId(self.next_message_id.fetch_add(1, Ordering::SeqCst));
        let view = MessageView {
            message_id,
            channel_id,
            content,
            controls,
            sent_at: Utc::now(),
            edited_at: None,
        };
        self.messages.write().await.insert(message_id, view.clone());
        debug!(message_id = message_id.0, channel_id = channel_id.0, "platform: message sent");
        self.publish(PlatformEvent::MessageSent { message: view });
        Ok(message_id)
    }

    async fn update(
        &self,
        message_id: MessageId,
        content: PageContent,
    ) -> Result<(), ChannelError> {
        {
            let mut messages = self.messages.write().await;
            let view = messages
                .get_mut(&message_id)
                .ok_or(ChannelError::MessageGone(message_id.0))?;
            view.content = content.clone();
            view.edited_at = Some(Utc::now());
        }
        self.publish(PlatformEvent::MessageUpdated {
            message_id,
            content,
        });
        Ok(())
    }

    async fn delete(&self, message_id: MessageId) -> Result<(), ChannelError> {
        self.messages
            .write()
            .await
            .remove(&message_id)
            .ok_or(ChannelError::MessageGone(message_id.0))?;
        debug!(message_id = message_id.0, "platform: message deleted");
        self.publish(PlatformEvent::MessageDeleted { message_id });
        Ok(())
    }

    async fn detach_controls(&self, message_id: MessageId) -> Result<(), ChannelError> {
        {
            let mut messages = self.messages.write().await;
            let view = messages
                .get_mut(&message_id)
                .ok_or(ChannelError::MessageGone(message_id.0))?;
            view.controls = MessageControls::None;
        }
        self.publish(PlatformEvent::ControlsDetached { message_id });
        Ok(())
    }

    async fn release_input(
        &self,
        message_id: MessageId,
        actor_id: UserId,
        symbol: &str,
    ) -> Result<(), ChannelError> {
        {
            let messages = self.messages.read().await;
            let view = messages
                .get(&message_id)
                .ok_or(ChannelError::MessageGone(message_id.0))?;
            let MessageControls::Reactions(symbols) = &view.controls else {
                return Err(ChannelError::Rejected(format!(
                    "message {} has no reaction controls",
                    message_id.0
                )));
            };
            if !symbols.iter().any(|candidate| candidate == symbol) {
                return Err(ChannelError::Rejected(format!(
                    "reaction {symbol} is not attached to message {}",
                    message_id.0
                )));
            }
        }
        self.publish(PlatformEvent::InputReleased {
            message_id,
            actor_id,
            symbol: symbol.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/platform_tests.rs"]
mod tests;
