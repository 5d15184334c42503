use std::sync::{
    atomic::{AtomicBool, AtomicI64, Ordering},
    Mutex,
};

use async_trait::async_trait;
use shared::{
    domain::{ChannelId, MessageId, UserId},
    protocol::{MessageControls, PageContent},
};

use crate::{
    channel::{ChannelError, MessageChannel},
    page::{PageSource, RenderError},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelCall {
    Send {
        channel_id: ChannelId,
        content: PageContent,
        controls: MessageControls,
    },
    Update {
        message_id: MessageId,
        content: PageContent,
    },
    Delete(MessageId),
    DetachControls(MessageId),
    ReleaseInput {
        message_id: MessageId,
        actor_id: UserId,
        symbol: String,
    },
}

/// Message channel fake that records every call in order.
pub struct RecordingChannel {
    next_id: AtomicI64,
    calls: Mutex<Vec<ChannelCall>>,
    pub fail_send: AtomicBool,
    pub fail_update: AtomicBool,
    pub fail_release: AtomicBool,
    pub fail_delete: AtomicBool,
    pub fail_detach: AtomicBool,
    /// Hands out the same message id on every send.
    pub reuse_ids: AtomicBool,
}

impl Default for RecordingChannel {
    fn default() -> Self {
        Self {
            next_id: AtomicI64::new(100),
            calls: Mutex::new(Vec::new()),
            fail_send: AtomicBool::new(false),
            fail_update: AtomicBool::new(false),
            fail_release: AtomicBool::new(false),
            fail_delete: AtomicBool::new(false),
            fail_detach: AtomicBool::new(false),
            reuse_ids: AtomicBool::new(false),
        }
    }
}

impl RecordingChannel {
    pub fn calls(&self) -> Vec<ChannelCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn updates(&self) -> Vec<PageContent> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ChannelCall::Update { content, .. } => Some(content),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, predicate: impl Fn(&ChannelCall) -> bool) -> usize {
        self.calls().iter().filter(|call| predicate(call)).count()
    }

    pub fn deletes(&self) -> usize {
        self.count(|call| matches!(call, ChannelCall::Delete(_)))
    }

    pub fn detaches(&self) -> usize {
        self.count(|call| matches!(call, ChannelCall::DetachControls(_)))
    }

    fn record(&self, call: ChannelCall) {
        self.calls.lock().expect("calls lock").push(call);
    }
}

#[async_trait]
impl MessageChannel for RecordingChannel {
    async fn send(
        &self,
        channel_id: ChannelId,
        content: PageContent,
        controls: MessageControls,
    ) -> Result<MessageId, ChannelError> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(ChannelError::Unavailable("gateway down".into()));
        }
        self.record(ChannelCall::Send {
            channel_id,
            content,
            controls,
        });
        if self.reuse_ids.load(Ordering::SeqCst) {
            return Ok(MessageId(self.next_id.load(Ordering::SeqCst)));
        }
        Ok(MessageId(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn update(
        &self,
        message_id: MessageId,
        content: PageContent,
    ) -> Result<(), ChannelError> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(ChannelError::MessageGone(message_id.0));
        }
        self.record(ChannelCall::Update {
            message_id,
            content,
        });
        Ok(())
    }

    async fn delete(&self, message_id: MessageId) -> Result<(), ChannelError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(ChannelError::MessageGone(message_id.0));
        }
        self.record(ChannelCall::Delete(message_id));
        Ok(())
    }

    async fn detach_controls(&self, message_id: MessageId) -> Result<(), ChannelError> {
        if self.fail_detach.load(Ordering::SeqCst) {
            return Err(ChannelError::Rejected("missing permissions".into()));
        }
        self.record(ChannelCall::DetachControls(message_id));
        Ok(())
    }

    async fn release_input(
        &self,
        message_id: MessageId,
        actor_id: UserId,
        symbol: &str,
    ) -> Result<(), ChannelError> {
        if self.fail_release.load(Ordering::SeqCst) {
            return Err(ChannelError::Rejected("missing permissions".into()));
        }
        self.record(ChannelCall::ReleaseInput {
            message_id,
            actor_id,
            symbol: symbol.to_string(),
        });
        Ok(())
    }
}

/// Page set whose pages are their own index, with configurable broken pages.
/// Every index it is asked to render is recorded.
pub struct IndexPages {
    len: usize,
    broken: Vec<usize>,
    rendered: Mutex<Vec<usize>>,
}

impl IndexPages {
    pub fn new(len: usize) -> Self {
        Self {
            len,
            broken: Vec::new(),
            rendered: Mutex::new(Vec::new()),
        }
    }

    pub fn with_broken(mut self, index: usize) -> Self {
        self.broken.push(index);
        self
    }

    pub fn rendered(&self) -> Vec<usize> {
        self.rendered.lock().expect("rendered lock").clone()
    }
}

impl PageSource for IndexPages {
    fn len(&self) -> usize {
        self.len
    }

    fn render(&self, index: usize) -> Result<PageContent, RenderError> {
        self.rendered.lock().expect("rendered lock").push(index);
        if index >= self.len {
            return Err(RenderError::OutOfRange {
                index,
                len: self.len,
            });
        }
        if self.broken.contains(&index) {
            return Err(RenderError::Content {
                index,
                reason: "corrupt record".into(),
            });
        }
        Ok(PageContent::new("pages", index.to_string()))
    }
}
