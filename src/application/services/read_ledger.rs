//! ReadLedger - per-user read state of messages.
//!
//! Unread counts are always recomputed from `read_by`; nothing here keeps a
//! counter.

use std::sync::Arc;

use crate::domain::foundation::{ConversationId, DomainError, MessageId, UserId};
use crate::ports::MessageRepository;

pub struct ReadLedger {
    messages: Arc<dyn MessageRepository>,
}

impl ReadLedger {
    pub fn new(messages: Arc<dyn MessageRepository>) -> Self {
        Self { messages }
    }

    /// Messages in the conversation `user` has not read. A sender's own
    /// messages are read by construction.
    pub async fn count_unread(
        &self,
        conversation_id: &ConversationId,
        user: &UserId,
    ) -> Result<u64, DomainError> {
        self.messages.count_unread(conversation_id, user).await
    }

    pub async fn mark_read(
        &self,
        conversation_id: &ConversationId,
        message_ids: &[MessageId],
        user: &UserId,
    ) -> Result<u64, DomainError> {
        let changed = self
            .messages
            .mark_read(conversation_id, message_ids, user)
            .await?;
        tracing::trace!(conversation_id = %conversation_id, user_id = %user, changed, "marked read");
        Ok(changed)
    }

    pub async fn mark_all_read(
        &self,
        conversation_id: &ConversationId,
        user: &UserId,
    ) -> Result<u64, DomainError> {
        self.messages.mark_all_read(conversation_id, user).await
    }
}
