use std::{sync::Arc, time::Duration};

use shared::{
    domain::{ChannelId, InputModality, MessageId, UserId},
    protocol::{InteractionPayload, MessageControls},
};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub mod action;
pub mod channel;
pub mod driver;
pub mod normalizer;
pub mod page;
pub mod registry;
pub mod session;

#[cfg(test)]
mod test_support;

pub use action::{Action, ControlSymbol, SymbolTable};
pub use channel::{ChannelError, MessageChannel};
pub use driver::SessionOutcome;
pub use page::{page_count, ItemPageSource, LinePageSource, PageSource, RenderError};
pub use registry::{Delivery, InterestRegistry, RegistryError};
pub use session::{Session, SessionError, SessionState, Transition};

pub const DEFAULT_INACTIVITY_WINDOW: Duration = Duration::from_secs(30);
pub const DEFAULT_MAILBOX_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
pub struct PaginatorConfig {
    pub reaction_timeout: Duration,
    pub button_timeout: Duration,
    pub mailbox_capacity: usize,
}

impl Default for PaginatorConfig {
    fn default() -> Self {
        Self {
            reaction_timeout: DEFAULT_INACTIVITY_WINDOW,
            button_timeout: DEFAULT_INACTIVITY_WINDOW,
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}

impl PaginatorConfig {
    pub fn inactivity_window(&self, modality: InputModality) -> Duration {
        match modality {
            InputModality::Reaction => self.reaction_timeout,
            InputModality::Button => self.button_timeout,
        }
    }
}

#[derive(Debug, Error)]
pub enum PaginatorError {
    #[error("failed to render first page: {0}")]
    Render(#[from] RenderError),
    #[error("failed to send paginated message: {0}")]
    Send(#[source] ChannelError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

pub type DriverHandle = JoinHandle<Result<SessionOutcome, SessionError>>;

pub struct StartedSession {
    pub message_id: MessageId,
    /// `None` when the page set was empty and a static message was sent instead.
    pub driver: Option<DriverHandle>,
}

/// Entry point used by command handlers that produced a multi-page result.
#[derive(Clone)]
pub struct Paginator {
    channel: Arc<dyn MessageChannel>,
    registry: Arc<InterestRegistry>,
    config: PaginatorConfig,
}

impl Paginator {
    pub fn new(channel: Arc<dyn MessageChannel>, config: PaginatorConfig) -> Self {
        let registry = InterestRegistry::new(config.mailbox_capacity);
        Self {
            channel,
            registry,
            config,
        }
    }

    pub fn active_sessions(&self) -> usize {
        self.registry.len()
    }

    pub fn has_session(&self, message_id: MessageId) -> bool {
        self.registry.is_registered(message_id)
    }

    /// Routes a raw interaction to the session owning its message.
    pub fn dispatch(&self, event: InteractionPayload) -> Delivery {
        self.registry.dispatch(event)
    }

    /// Sends the first page and hands the message to a background driver.
    pub async fn start_session<P>(
        &self,
        channel_id: ChannelId,
        pages: P,
        owner: UserId,
        modality: InputModality,
    ) -> Result<MessageId, PaginatorError>
    where
        P: PageSource + 'static,
    {
        let started = self
            .spawn_session(channel_id, pages, owner, SymbolTable::for_modality(modality))
            .await?;
        Ok(started.message_id)
    }

    pub async fn spawn_session<P>(
        &self,
        channel_id: ChannelId,
        pages: P,
        owner: UserId,
        controls: SymbolTable,
    ) -> Result<StartedSession, PaginatorError>
    where
        P: PageSource + 'static,
    {
        if pages.is_empty() {
            let message_id = self
                .channel
                .send(channel_id, pages.empty_view(), MessageControls::None)
                .await
                .map_err(PaginatorError::Send)?;
            return Ok(StartedSession {
                message_id,
                driver: None,
            });
        }

        let first = pages.render(0)?;
        let message_id = self
            .channel
            .send(channel_id, first, controls.message_controls())
            .await
            .map_err(PaginatorError::Send)?;
        let interest = match self.registry.register(message_id) {
            Ok(interest) => interest,
            Err(err) => {
                // nothing will ever drive these controls
                if let Err(error) = self.channel.delete(message_id).await {
                    warn!(
                        message_id = message_id.0,
                        %error,
                        "paginator: failed to remove unclaimed message"
                    );
                }
                return Err(err.into());
            }
        };

        let modality = controls.modality();
        let window = self.config.inactivity_window(modality);
        let session = Session::new(message_id, owner, pages, controls, window);
        info!(
            message_id = message_id.0,
            channel_id = channel_id.0,
            owner_id = owner.0,
            pages = session.page_count(),
            ?modality,
            "paginator: session started"
        );

        let channel = Arc::clone(&self.channel);
        let driver = tokio::spawn(async move {
            let result = driver::drive(session, interest, channel).await;
            match &result {
                Ok(outcome) => info!(
                    message_id = outcome.message_id.0,
                    state = ?outcome.state,
                    index = outcome.index,
                    "paginator: session finished"
                ),
                Err(error) => error!(
                    message_id = message_id.0,
                    %error,
                    "paginator: session aborted"
                ),
            }
            result
        });

        Ok(StartedSession {
            message_id,
            driver: Some(driver),
        })
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
