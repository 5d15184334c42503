use std::sync::Arc;

use dashmap::{mapref::entry::Entry, DashMap};
use shared::{domain::MessageId, protocol::InteractionPayload};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("message {0} already has an active session")]
    AlreadyRegistered(i64),
}

/// Result of routing one interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// No live session owns the target message.
    NoSession,
    /// The session's mailbox was full; the event was discarded.
    Dropped,
}

/// Routes interactions to the one session that owns each message.
///
/// Each registered message gets a bounded mailbox so its events are consumed
/// strictly in arrival order by a single waiter.
pub struct InterestRegistry {
    mailboxes: DashMap<MessageId, mpsc::Sender<InteractionPayload>>,
    capacity: usize,
}

impl InterestRegistry {
    pub fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            mailboxes: DashMap::new(),
            capacity: capacity.max(1),
        })
    }

    /// Claims `message_id`. The claim is released when the returned
    /// [`Interest`] is dropped.
    pub fn register(self: &Arc<Self>, message_id: MessageId) -> Result<Interest, RegistryError> {
        match self.mailboxes.entry(message_id) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyRegistered(message_id.0)),
            Entry::Vacant(slot) => {
                let (tx, rx) = mpsc::channel(self.capacity);
                slot.insert(tx);
                debug!(message_id = message_id.0, "paginator: registered interest");
                Ok(Interest {
                    message_id,
                    events: rx,
                    registry: Arc::clone(self),
                })
            }
        }
    }

    pub fn dispatch(&self, event: InteractionPayload) -> Delivery {
        let message_id = event.message_id;
        let Some(sender) = self.mailboxes.get(&message_id) else {
            return Delivery::NoSession;
        };
        match sender.try_send(event) {
            Ok(()) => Delivery::Delivered,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(
                    message_id = message_id.0,
                    "paginator: session mailbox full; dropping interaction"
                );
                Delivery::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Delivery::NoSession,
        }
    }

    pub fn is_registered(&self, message_id: MessageId) -> bool {
        self.mailboxes.contains_key(&message_id)
    }

    pub fn len(&self) -> usize {
        self.mailboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mailboxes.is_empty()
    }

    fn deregister(&self, message_id: MessageId) {
        if self.mailboxes.remove(&message_id).is_some() {
            debug!(message_id = message_id.0, "paginator: released interest");
        }
    }
}

/// A live claim on one message's interaction stream.
pub struct Interest {
    message_id: MessageId,
    events: mpsc::Receiver<InteractionPayload>,
    registry: Arc<InterestRegistry>,
}

impl Interest {
    pub async fn recv(&mut self) -> Option<InteractionPayload> {
        self.events.recv().await
    }
}

impl Drop for Interest {
    fn drop(&mut self) {
        self.registry.deregister(self.message_id);
    }
}
