use std::time::Duration;

use shared::domain::{InputModality, MessageId, UserId};
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::{
    action::{Action, SymbolTable},
    channel::{ChannelError, MessageChannel},
    page::PageSource,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Browsing,
    Saved,
    Dismissed,
    Expired,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Browsing)
    }
}

/// What a single input did to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The page at `index` was rendered and the message updated.
    Navigated { index: usize },
    /// Rendering failed; the session stayed on `index`.
    RenderFailed { index: usize },
    Terminated(SessionState),
    /// The session was already terminal.
    Ignored,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("message {message_id} {operation} failed: {source}")]
    Channel {
        message_id: i64,
        operation: &'static str,
        #[source]
        source: ChannelError,
    },
}

pub struct Session<P> {
    message_id: MessageId,
    owner: UserId,
    pages: P,
    controls: SymbolTable,
    current_index: usize,
    state: SessionState,
    inactivity: Duration,
    deadline: Instant,
}

impl<P: PageSource> Session<P> {
    /// Binds a session to a message that already shows page 0.
    pub fn new(
        message_id: MessageId,
        owner: UserId,
        pages: P,
        controls: SymbolTable,
        inactivity: Duration,
    ) -> Self {
        Self {
            message_id,
            owner,
            pages,
            controls,
            current_index: 0,
            state: SessionState::Browsing,
            inactivity,
            deadline: Instant::now() + inactivity,
        }
    }

    pub fn message_id(&self) -> MessageId {
        self.message_id
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn is_owner(&self, actor_id: UserId) -> bool {
        self.owner == actor_id
    }

    pub fn controls(&self) -> &SymbolTable {
        &self.controls
    }

    pub fn modality(&self) -> InputModality {
        self.controls.modality()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    fn refresh_deadline(&mut self) {
        self.deadline = Instant::now() + self.inactivity;
    }

    fn channel_error(&self, operation: &'static str, source: ChannelError) -> SessionError {
        SessionError::Channel {
            message_id: self.message_id.0,
            operation,
            source,
        }
    }

    /// Applies one normalized action.
    ///
    /// The index only moves once the target page has rendered and the message
    /// update went through, so a failed step leaves the previous page intact.
    pub async fn apply(
        &mut self,
        action: Action,
        channel: &dyn MessageChannel,
    ) -> Result<Transition, SessionError> {
        if self.state.is_terminal() {
            return Ok(Transition::Ignored);
        }

        match action {
            Action::Save => {
                channel
                    .detach_controls(self.message_id)
                    .await
                    .map_err(|source| self.channel_error("detach", source))?;
                self.finish(SessionState::Saved)
            }
            Action::Dismiss => {
                channel
                    .delete(self.message_id)
                    .await
                    .map_err(|source| self.channel_error("delete", source))?;
                self.finish(SessionState::Dismissed)
            }
            Action::First | Action::Prev | Action::Next | Action::Last => {
                let Some(target) = action.target_index(self.current_index, self.pages.len())
                else {
                    return Ok(Transition::Ignored);
                };

                let content = match self.pages.render(target) {
                    Ok(content) => content,
                    Err(error) => {
                        warn!(
                            message_id = self.message_id.0,
                            index = target,
                            %error,
                            "paginator: page render failed; staying on current page"
                        );
                        self.refresh_deadline();
                        return Ok(Transition::RenderFailed {
                            index: self.current_index,
                        });
                    }
                };

                channel
                    .update(self.message_id, content)
                    .await
                    .map_err(|source| self.channel_error("update", source))?;

                debug!(
                    message_id = self.message_id.0,
                    from = self.current_index,
                    to = target,
                    ?action,
                    "paginator: page changed"
                );
                self.current_index = target;
                self.refresh_deadline();
                Ok(Transition::Navigated { index: target })
            }
        }
    }

    /// Inactivity expiry: deletes the message and ends the session.
    pub async fn expire(&mut self, channel: &dyn MessageChannel) -> Result<Transition, SessionError> {
        if self.state.is_terminal() {
            return Ok(Transition::Ignored);
        }
        channel
            .delete(self.message_id)
            .await
            .map_err(|source| self.channel_error("delete", source))?;
        self.finish(SessionState::Expired)
    }

    fn finish(&mut self, state: SessionState) -> Result<Transition, SessionError> {
        self.state = state;
        info!(
            message_id = self.message_id.0,
            index = self.current_index,
            ?state,
            "paginator: session closed"
        );
        Ok(Transition::Terminated(state))
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
