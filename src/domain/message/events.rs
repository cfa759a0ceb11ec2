//! Message domain events.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    domain_event, ConversationId, EventId, EventType, MessageId, Timestamp, UserId,
};

use super::Message;

/// Published after a message is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageCreated {
    pub event_id: EventId,
    pub conversation_id: ConversationId,
    pub message: Message,
    pub created_at: Timestamp,
}

domain_event!(
    MessageCreated,
    event_type = EventType::MessageCreated,
    aggregate_id = conversation_id,
    aggregate_type = "Conversation",
    occurred_at = created_at,
    event_id = event_id
);

/// Published after the sender edits a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageUpdated {
    pub event_id: EventId,
    pub conversation_id: ConversationId,
    pub message: Message,
    pub updated_at: Timestamp,
}

domain_event!(
    MessageUpdated,
    event_type = EventType::MessageUpdated,
    aggregate_id = conversation_id,
    aggregate_type = "Conversation",
    occurred_at = updated_at,
    event_id = event_id
);

/// Published after the sender deletes a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDeleted {
    pub event_id: EventId,
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
    pub deleted_by: UserId,
    pub deleted_at: Timestamp,
}

domain_event!(
    MessageDeleted,
    event_type = EventType::MessageDeleted,
    aggregate_id = conversation_id,
    aggregate_type = "Conversation",
    occurred_at = deleted_at,
    event_id = event_id
);

/// Published when `reader` marked one or more messages read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagesRead {
    pub event_id: EventId,
    pub conversation_id: ConversationId,
    pub reader: UserId,
    pub read_at: Timestamp,
}

domain_event!(
    MessagesRead,
    event_type = EventType::MessagesRead,
    aggregate_id = conversation_id,
    aggregate_type = "Conversation",
    occurred_at = read_at,
    event_id = event_id
);
