use std::sync::{atomic::Ordering, Arc};

use shared::protocol::PageContent;

use super::*;
use crate::test_support::{ChannelCall, IndexPages, RecordingChannel};

const OWNER: UserId = UserId(7);
const MESSAGE: MessageId = MessageId(500);
const WINDOW: Duration = Duration::from_secs(30);

fn session(pages: Arc<IndexPages>) -> Session<Arc<IndexPages>> {
    Session::new(MESSAGE, OWNER, pages, SymbolTable::buttons(), WINDOW)
}

async fn walk(
    session: &mut Session<Arc<IndexPages>>,
    channel: &RecordingChannel,
    actions: &[Action],
) -> Vec<usize> {
    let mut indices = Vec::new();
    for action in actions {
        session.apply(*action, channel).await.expect("apply");
        indices.push(session.current_index());
    }
    indices
}

#[tokio::test]
async fn next_wraps_after_last_page() {
    let channel = RecordingChannel::default();
    let mut session = session(Arc::new(IndexPages::new(3)));
    let indices = walk(&mut session, &channel, &[Action::Next, Action::Next, Action::Next]).await;
    assert_eq!(indices, [1, 2, 0]);
}

#[tokio::test]
async fn last_then_prev_walks_backwards() {
    let channel = RecordingChannel::default();
    let mut session = session(Arc::new(IndexPages::new(3)));
    let indices = walk(&mut session, &channel, &[Action::Last, Action::Prev]).await;
    assert_eq!(indices, [2, 1]);
}

#[tokio::test]
async fn prev_from_first_page_wraps_to_last() {
    let channel = RecordingChannel::default();
    let mut session = session(Arc::new(IndexPages::new(4)));
    let transition = session.apply(Action::Prev, &channel).await.expect("prev");
    assert_eq!(transition, Transition::Navigated { index: 3 });
}

#[tokio::test]
async fn repeated_first_is_idempotent_but_still_renders() {
    let channel = RecordingChannel::default();
    let mut session = session(Arc::new(IndexPages::new(5)));
    let indices = walk(
        &mut session,
        &channel,
        &[Action::Last, Action::First, Action::First],
    )
    .await;
    assert_eq!(indices, [4, 0, 0]);
    assert_eq!(channel.updates().len(), 3);
}

#[tokio::test]
async fn every_navigation_issues_exactly_one_update_with_target_page() {
    let channel = RecordingChannel::default();
    let mut session = session(Arc::new(IndexPages::new(3)));
    walk(&mut session, &channel, &[Action::Next, Action::Last]).await;
    assert_eq!(
        channel.calls(),
        vec![
            ChannelCall::Update {
                message_id: MESSAGE,
                content: PageContent::new("pages", "1"),
            },
            ChannelCall::Update {
                message_id: MESSAGE,
                content: PageContent::new("pages", "2"),
            },
        ]
    );
}

#[tokio::test]
async fn render_only_sees_in_range_indices() {
    let channel = RecordingChannel::default();
    let pages = Arc::new(IndexPages::new(3));
    let mut session = session(Arc::clone(&pages));
    let actions = [
        Action::Prev,
        Action::Prev,
        Action::Prev,
        Action::Prev,
        Action::Next,
        Action::Last,
        Action::Next,
        Action::Next,
        Action::First,
        Action::Prev,
    ];
    walk(&mut session, &channel, &actions).await;
    let rendered = pages.rendered();
    assert_eq!(rendered.len(), actions.len());
    assert!(rendered.iter().all(|index| *index < 3));
}

#[tokio::test]
async fn single_page_set_stays_on_page_zero() {
    let channel = RecordingChannel::default();
    let mut session = session(Arc::new(IndexPages::new(1)));
    let indices = walk(
        &mut session,
        &channel,
        &[Action::Next, Action::Prev, Action::Last],
    )
    .await;
    assert_eq!(indices, [0, 0, 0]);
}

#[tokio::test]
async fn save_detaches_controls_and_keeps_message() {
    let channel = RecordingChannel::default();
    let mut session = session(Arc::new(IndexPages::new(3)));
    session.apply(Action::Next, &channel).await.expect("next");

    let transition = session.apply(Action::Save, &channel).await.expect("save");

    assert_eq!(transition, Transition::Terminated(SessionState::Saved));
    assert_eq!(session.state(), SessionState::Saved);
    assert_eq!(session.current_index(), 1);
    assert_eq!(channel.detaches(), 1);
    assert_eq!(channel.deletes(), 0);
}

#[tokio::test]
async fn dismiss_deletes_message_once() {
    let channel = RecordingChannel::default();
    let mut session = session(Arc::new(IndexPages::new(3)));

    let transition = session
        .apply(Action::Dismiss, &channel)
        .await
        .expect("dismiss");

    assert_eq!(transition, Transition::Terminated(SessionState::Dismissed));
    assert_eq!(channel.calls(), vec![ChannelCall::Delete(MESSAGE)]);
}

#[tokio::test]
async fn terminal_state_absorbs_further_input() {
    let channel = RecordingChannel::default();
    let mut session = session(Arc::new(IndexPages::new(3)));
    session.apply(Action::Dismiss, &channel).await.expect("dismiss");

    for action in [Action::Next, Action::Last, Action::Save, Action::Dismiss] {
        let transition = session.apply(action, &channel).await.expect("apply");
        assert_eq!(transition, Transition::Ignored);
    }
    assert_eq!(
        session.expire(&channel).await.expect("expire"),
        Transition::Ignored
    );

    assert_eq!(session.state(), SessionState::Dismissed);
    assert_eq!(session.current_index(), 0);
    assert_eq!(channel.calls().len(), 1);
}

#[tokio::test]
async fn expire_deletes_message() {
    let channel = RecordingChannel::default();
    let mut session = session(Arc::new(IndexPages::new(2)));
    let transition = session.expire(&channel).await.expect("expire");
    assert_eq!(transition, Transition::Terminated(SessionState::Expired));
    assert_eq!(channel.deletes(), 1);
}

#[tokio::test(start_paused = true)]
async fn render_failure_rolls_back_and_refreshes_deadline() {
    let channel = RecordingChannel::default();
    let pages = Arc::new(IndexPages::new(3).with_broken(1));
    let mut session = session(pages);
    let initial_deadline = session.deadline();

    tokio::time::advance(Duration::from_secs(10)).await;
    let transition = session.apply(Action::Next, &channel).await.expect("next");

    assert_eq!(transition, Transition::RenderFailed { index: 0 });
    assert_eq!(session.current_index(), 0);
    assert_eq!(session.state(), SessionState::Browsing);
    assert_eq!(session.deadline(), initial_deadline + Duration::from_secs(10));
    assert!(channel.calls().is_empty());

    session.apply(Action::Last, &channel).await.expect("last");
    assert_eq!(session.current_index(), 2);
}

#[tokio::test(start_paused = true)]
async fn accepted_navigation_pushes_deadline_forward() {
    let channel = RecordingChannel::default();
    let mut session = session(Arc::new(IndexPages::new(3)));

    tokio::time::advance(Duration::from_secs(25)).await;
    session.apply(Action::Next, &channel).await.expect("next");

    assert_eq!(session.deadline(), tokio::time::Instant::now() + WINDOW);
}

#[tokio::test]
async fn failed_update_is_reported_and_index_is_kept() {
    let channel = RecordingChannel::default();
    channel.fail_update.store(true, Ordering::SeqCst);
    let mut session = session(Arc::new(IndexPages::new(3)));

    let err = session
        .apply(Action::Next, &channel)
        .await
        .expect_err("update should fail");

    assert!(matches!(
        err,
        SessionError::Channel {
            operation: "update",
            ..
        }
    ));
    assert_eq!(session.current_index(), 0);
}

#[test]
fn ownership_is_exact_identity_match() {
    let session = session(Arc::new(IndexPages::new(1)));
    assert!(session.is_owner(OWNER));
    assert!(!session.is_owner(UserId(8)));
    assert_eq!(session.owner(), OWNER);
}
