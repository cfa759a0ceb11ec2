//! Server → client events.
//!
//! Every event is framed as `{"event": "<name>", "data": {...}}`.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, MessageId, UserId};

use super::views::{ConversationView, MessageView, NotificationView};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    Welcome(WelcomeData),
    NewMessage(MessageView),
    UpdatedMessage(MessageView),
    DeletedMessage(DeletedMessageData),
    NewNotification(NotificationView),
    UpdatedNotificationCount(CountData),
    NewGroupConversation(ConversationView),
    UpdatedConversation(ConversationView),
    DeletedConversation(ConversationRef),
    UpdatedUnreadMessagesCount(UnreadCountData),
    JoinedConversationSuccess(ConversationRef),
    JoinedConversationError(JoinErrorData),
    LeftConversationSuccess(ConversationRef),
}

impl ServerEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Welcome(_) => "welcome",
            ServerEvent::NewMessage(_) => "newMessage",
            ServerEvent::UpdatedMessage(_) => "updatedMessage",
            ServerEvent::DeletedMessage(_) => "deletedMessage",
            ServerEvent::NewNotification(_) => "newNotification",
            ServerEvent::UpdatedNotificationCount(_) => "updatedNotificationCount",
            ServerEvent::NewGroupConversation(_) => "newGroupConversation",
            ServerEvent::UpdatedConversation(_) => "updatedConversation",
            ServerEvent::DeletedConversation(_) => "deletedConversation",
            ServerEvent::UpdatedUnreadMessagesCount(_) => "updatedUnreadMessagesCount",
            ServerEvent::JoinedConversationSuccess(_) => "joinedConversationSuccess",
            ServerEvent::JoinedConversationError(_) => "joinedConversationError",
            ServerEvent::LeftConversationSuccess(_) => "leftConversationSuccess",
        }
    }

    pub fn unread_count(conversation_id: ConversationId, count: u64) -> Self {
        ServerEvent::UpdatedUnreadMessagesCount(UnreadCountData {
            conversation_id,
            count,
        })
    }

    pub fn notification_count(count: u64) -> Self {
        ServerEvent::UpdatedNotificationCount(CountData { count })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeData {
    pub message: String,
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedMessageData {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountData {
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountData {
    pub conversation_id: ConversationId,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRef {
    pub conversation_id: ConversationId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinErrorData {
    pub conversation_id: String,
    pub error: String,
    pub code: String,
}
