//! Client-facing shapes of conversations, messages, and notifications.
//!
//! These are the "populated" payloads: user references are expanded into
//! `UserSummary` values.

use serde::{Deserialize, Serialize};

use crate::domain::conversation::{Conversation, ConversationKind};
use crate::domain::foundation::{ConversationId, MessageId, NotificationId, UserId};
use crate::domain::message::Message;
use crate::domain::notification::{Notification, NotificationKind};

/// Public profile fields of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl UserSummary {
    /// Summary for a user with no known profile.
    pub fn bare(id: UserId) -> Self {
        Self {
            id,
            username: None,
            display_name: None,
            avatar_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: MessageId,
    pub conversation_id: ConversationId,
    pub sender: UserSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub read_by: Vec<UserId>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edited_at: Option<String>,
}

impl MessageView {
    pub fn from_message(message: &Message, sender: UserSummary) -> Self {
        Self {
            id: *message.id(),
            conversation_id: *message.conversation_id(),
            sender,
            text: message.content().body().map(str::to_string),
            image_url: message.content().image_url().map(str::to_string),
            read_by: message.read_by().iter().cloned().collect(),
            created_at: message.created_at().to_rfc3339(),
            edited_at: message.edited_at().map(|t| t.to_rfc3339()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationView {
    pub id: ConversationId,
    pub kind: ConversationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub participants: Vec<UserSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_message: Option<MessageView>,
    /// Present only when the view is shaped for a single viewer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<u64>,
    pub updated_at: String,
}

impl ConversationView {
    pub fn from_conversation(
        conversation: &Conversation,
        participants: Vec<UserSummary>,
        last_message: Option<MessageView>,
    ) -> Self {
        Self {
            id: *conversation.id(),
            kind: conversation.kind(),
            name: conversation.name().map(str::to_string),
            participants,
            last_message,
            unread_count: None,
            updated_at: conversation.updated_at().to_rfc3339(),
        }
    }

    pub fn with_unread_count(mut self, count: u64) -> Self {
        self.unread_count = Some(count);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    pub id: NotificationId,
    pub from: UserSummary,
    pub kind: NotificationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub read: bool,
    pub created_at: String,
}

impl NotificationView {
    pub fn from_notification(notification: &Notification, from: UserSummary) -> Self {
        Self {
            id: *notification.id(),
            from,
            kind: notification.kind(),
            target: notification.target().map(str::to_string),
            read: notification.is_read(),
            created_at: notification.created_at().to_rfc3339(),
        }
    }
}
