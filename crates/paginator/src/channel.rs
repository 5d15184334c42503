use async_trait::async_trait;
use shared::{
    domain::{ChannelId, MessageId, UserId},
    protocol::{MessageControls, PageContent},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("message {0} no longer exists")]
    MessageGone(i64),
    #[error("platform rejected request: {0}")]
    Rejected(String),
    #[error("platform unavailable: {0}")]
    Unavailable(String),
}

/// Outbound side of the chat platform, as seen by a paginator session.
///
/// Every call is attempted once; the caller decides what a failure means.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    async fn send(
        &self,
        channel_id: ChannelId,
        content: PageContent,
        controls: MessageControls,
    ) -> Result<MessageId, ChannelError>;
    async fn update(&self, message_id: MessageId, content: PageContent)
        -> Result<(), ChannelError>;
    async fn delete(&self, message_id: MessageId) -> Result<(), ChannelError>;
    async fn detach_controls(&self, message_id: MessageId) -> Result<(), ChannelError>;
    /// Undo the owner's toggle on a reaction control so it can be pressed again.
    async fn release_input(
        &self,
        message_id: MessageId,
        actor_id: UserId,
        symbol: &str,
    ) -> Result<(), ChannelError>;
}
