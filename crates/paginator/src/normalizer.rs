use shared::protocol::InteractionPayload;

use crate::{action::Action, page::PageSource, session::Session};

/// Resolves a raw interaction against the session it targets.
///
/// `None` means the event is ignored: it targets another message, comes from
/// another modality or a user other than the owner, uses a symbol outside the
/// session's controls, or arrives after the session stopped browsing.
pub fn normalize<P: PageSource>(
    event: &InteractionPayload,
    session: &Session<P>,
) -> Option<Action> {
    if event.message_id != session.message_id() || session.state().is_terminal() {
        return None;
    }
    if event.modality() != session.modality() || !session.is_owner(event.actor_id) {
        return None;
    }
    session.controls().resolve(event.symbol())
}
