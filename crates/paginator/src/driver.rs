use std::sync::Arc;

use shared::domain::{InputModality, MessageId};
use tokio::time;
use tracing::{debug, warn};

use crate::{
    channel::MessageChannel,
    normalizer::normalize,
    page::PageSource,
    registry::Interest,
    session::{Session, SessionError, SessionState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOutcome {
    pub message_id: MessageId,
    pub state: SessionState,
    pub index: usize,
}

/// Runs one session until it reaches a terminal state.
///
/// The wait on the mailbox is the only suspension point between inputs. An
/// elapsed deadline wins over a queued event. `interest` is owned by this
/// future, so the message is released on every exit path.
pub async fn drive<P: PageSource>(
    mut session: Session<P>,
    mut interest: Interest,
    channel: Arc<dyn MessageChannel>,
) -> Result<SessionOutcome, SessionError> {
    while !session.state().is_terminal() {
        tokio::select! {
            biased;

            _ = time::sleep_until(session.deadline()) => {
                session.expire(channel.as_ref()).await?;
            }
            event = interest.recv() => {
                let Some(event) = event else {
                    // mailbox closed under us; tear down as if idle
                    session.expire(channel.as_ref()).await?;
                    break;
                };

                let Some(action) = normalize(&event, &session) else {
                    debug!(
                        message_id = session.message_id().0,
                        actor_id = event.actor_id.0,
                        symbol = event.symbol(),
                        "paginator: ignoring interaction"
                    );
                    continue;
                };

                session.apply(action, channel.as_ref()).await?;

                if action.is_navigation() && session.modality() == InputModality::Reaction {
                    if let Err(error) = channel
                        .release_input(session.message_id(), event.actor_id, event.symbol())
                        .await
                    {
                        warn!(
                            message_id = session.message_id().0,
                            %error,
                            "paginator: failed to release reaction"
                        );
                    }
                }
            }
        }
    }

    Ok(SessionOutcome {
        message_id: session.message_id(),
        state: session.state(),
        index: session.current_index(),
    })
}

#[cfg(test)]
#[path = "tests/driver_tests.rs"]
mod tests;
