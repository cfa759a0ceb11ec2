//! Message repository port.

use async_trait::async_trait;

use crate::domain::foundation::{ConversationId, DomainError, MessageId, UserId};
use crate::domain::message::Message;

/// Persistence for messages and their read state.
///
/// Read-state changes are set-unions on `read_by` performed by the store,
/// so concurrent readers never lose each other's marks.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persists a message. The store assigns `created_at` so that it strictly
    /// increases within the conversation, and returns the stored record.
    async fn insert(&self, message: Message) -> Result<Message, DomainError>;

    async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, DomainError>;

    /// All messages of a conversation, oldest first.
    async fn list_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, DomainError>;

    async fn latest_in_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<Message>, DomainError>;

    /// Messages in the conversation whose `read_by` lacks `user`.
    async fn count_unread(
        &self,
        conversation_id: &ConversationId,
        user: &UserId,
    ) -> Result<u64, DomainError>;

    /// Adds `user` to `read_by` of the given messages. Returns how many
    /// messages changed.
    async fn mark_read(
        &self,
        conversation_id: &ConversationId,
        message_ids: &[MessageId],
        user: &UserId,
    ) -> Result<u64, DomainError>;

    async fn mark_all_read(
        &self,
        conversation_id: &ConversationId,
        user: &UserId,
    ) -> Result<u64, DomainError>;

    /// Persists edited content.
    async fn update_content(&self, message: &Message) -> Result<(), DomainError>;

    /// Returns false when the message did not exist.
    async fn delete(&self, id: &MessageId) -> Result<bool, DomainError>;

    async fn delete_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<u64, DomainError>;
}
