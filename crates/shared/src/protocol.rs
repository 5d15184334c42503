use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{ChannelId, InputModality, MessageId, UserId};

/// Display-ready body of a bot message, the equivalent of a single embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContent {
    pub title: String,
    pub description: String,
}

impl PageContent {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlButton {
    pub custom_id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MessageControls {
    #[default]
    None,
    Reactions(Vec<String>),
    Buttons(Vec<ControlButton>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum InteractionKind {
    Reaction { emoji: String },
    Button { custom_id: String },
}

/// A raw input event as delivered by the platform gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionPayload {
    pub actor_id: UserId,
    pub message_id: MessageId,
    pub kind: InteractionKind,
}

impl InteractionPayload {
    pub fn reaction(actor_id: UserId, message_id: MessageId, emoji: impl Into<String>) -> Self {
        Self {
            actor_id,
            message_id,
            kind: InteractionKind::Reaction {
                emoji: emoji.into(),
            },
        }
    }

    pub fn button(actor_id: UserId, message_id: MessageId, custom_id: impl Into<String>) -> Self {
        Self {
            actor_id,
            message_id,
            kind: InteractionKind::Button {
                custom_id: custom_id.into(),
            },
        }
    }

    pub fn modality(&self) -> InputModality {
        match self.kind {
            InteractionKind::Reaction { .. } => InputModality::Reaction,
            InteractionKind::Button { .. } => InputModality::Button,
        }
    }

    pub fn symbol(&self) -> &str {
        match &self.kind {
            InteractionKind::Reaction { emoji } => emoji,
            InteractionKind::Button { custom_id } => custom_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub channel_id: ChannelId,
    pub owner_id: UserId,
    pub title: String,
    pub items: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_page: Option<usize>,
    #[serde(default)]
    pub modality: InputModality,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionResponse {
    pub message_id: MessageId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageView {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub content: PageContent,
    pub controls: MessageControls,
    pub sent_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum PlatformEvent {
    MessageSent {
        message: MessageView,
    },
    MessageUpdated {
        message_id: MessageId,
        content: PageContent,
    },
    MessageDeleted {
        message_id: MessageId,
    },
    ControlsDetached {
        message_id: MessageId,
    },
    InputReleased {
        message_id: MessageId,
        actor_id: UserId,
        symbol: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interaction_payload_uses_tagged_kind() {
        let payload = InteractionPayload::button(UserId(7), MessageId(3), "next_page");
        let json = serde_json::to_value(&payload).expect("json");
        assert_eq!(json["kind"]["type"], "button");
        assert_eq!(json["kind"]["payload"]["custom_id"], "next_page");
        assert_eq!(payload.modality(), InputModality::Button);
        assert_eq!(payload.symbol(), "next_page");
    }

    #[test]
    fn start_session_request_defaults_to_reactions() {
        let request: StartSessionRequest = serde_json::from_value(serde_json::json!({
            "channel_id": 1,
            "owner_id": 2,
            "title": "Warnings",
            "items": ["a", "b"],
        }))
        .expect("request");
        assert_eq!(request.modality, InputModality::Reaction);
        assert_eq!(request.per_page, None);
    }
}
