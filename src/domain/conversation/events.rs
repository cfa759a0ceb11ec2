//! Conversation domain events.
//!
//! - `ConversationUpdated` - last message moved, membership changed
//! - `ConversationDeleted` - conversation removed for some audience
//! - `GroupConversationCreated` - new group

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    domain_event, ConversationId, EventId, EventType, Timestamp, UserId,
};

/// Why a conversation changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateReason {
    MessageSent,
    MessageDeleted,
    MemberLeft,
}

/// Published after a conversation's pointer or membership changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationUpdated {
    pub event_id: EventId,
    pub conversation_id: ConversationId,

    /// User whose action caused the change. Excluded from unread recomputation.
    pub actor: Option<UserId>,

    pub reason: UpdateReason,
    pub updated_at: Timestamp,
}

domain_event!(
    ConversationUpdated,
    event_type = EventType::ConversationUpdated,
    aggregate_id = conversation_id,
    aggregate_type = "Conversation",
    occurred_at = updated_at,
    event_id = event_id
);

/// Published when a conversation disappears for `audience`.
///
/// `hard_deleted` is true when the record itself was removed; otherwise the
/// audience only stopped seeing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationDeleted {
    pub event_id: EventId,
    pub conversation_id: ConversationId,
    pub audience: Vec<UserId>,
    pub hard_deleted: bool,
    pub deleted_at: Timestamp,
}

domain_event!(
    ConversationDeleted,
    event_type = EventType::ConversationDeleted,
    aggregate_id = conversation_id,
    aggregate_type = "Conversation",
    occurred_at = deleted_at,
    event_id = event_id
);

/// Published when a group conversation is created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConversationCreated {
    pub event_id: EventId,
    pub conversation_id: ConversationId,
    pub creator: UserId,
    pub members: Vec<UserId>,
    pub created_at: Timestamp,
}

domain_event!(
    GroupConversationCreated,
    event_type = EventType::GroupConversationCreated,
    aggregate_id = conversation_id,
    aggregate_type = "Conversation",
    occurred_at = created_at,
    event_id = event_id
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DomainEvent, EventEnvelope};

    #[test]
    fn conversation_updated_envelope_uses_conversation_as_aggregate() {
        let event = ConversationUpdated {
            event_id: EventId::new(),
            conversation_id: ConversationId::new(),
            actor: Some(UserId::new("alice").unwrap()),
            reason: UpdateReason::MessageSent,
            updated_at: Timestamp::now(),
        };

        let envelope = EventEnvelope::from_event(&event);

        assert_eq!(envelope.event_type, EventType::ConversationUpdated);
        assert_eq!(envelope.aggregate_id, event.conversation_id.to_string());
        assert_eq!(envelope.payload["reason"], "message_sent");
    }

    #[test]
    fn group_created_event_type() {
        assert_eq!(
            GroupConversationCreated::EVENT_TYPE.as_str(),
            "groupConversation:created"
        );
    }
}
