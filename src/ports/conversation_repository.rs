//! Conversation repository port.
//!
//! Every mutating method is a single atomic store operation. Callers never
//! read a conversation, change it in memory, and write it back.

use async_trait::async_trait;

use crate::domain::conversation::{Conversation, DirectPairKey, LastMessageRef, RemovalOutcome};
use crate::domain::foundation::{ConversationId, DomainError, UserId};

/// Outcome of inserting a direct conversation under the pair-key constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectInsert {
    /// This call created the conversation.
    Created(Conversation),
    /// Another writer already holds the pair key; here is their record.
    Existing(Conversation),
}

impl DirectInsert {
    pub fn into_inner(self) -> Conversation {
        match self {
            DirectInsert::Created(c) | DirectInsert::Existing(c) => c,
        }
    }
}

#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn find_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, DomainError>;

    /// Membership query: the conversation only if `user` is a participant.
    async fn find_for_participant(
        &self,
        id: &ConversationId,
        user: &UserId,
    ) -> Result<Option<Conversation>, DomainError>;

    async fn exists(&self, id: &ConversationId) -> Result<bool, DomainError>;

    async fn find_direct(&self, key: &DirectPairKey) -> Result<Option<Conversation>, DomainError>;

    /// Inserts a direct conversation unless its pair key is taken.
    async fn insert_direct(&self, conversation: &Conversation) -> Result<DirectInsert, DomainError>;

    async fn insert_group(&self, conversation: &Conversation) -> Result<(), DomainError>;

    /// Set-union `user` into `visible_to`. Returns the updated record.
    async fn reveal_to(
        &self,
        id: &ConversationId,
        user: &UserId,
    ) -> Result<Option<Conversation>, DomainError>;

    /// Advances the last-message pointer (never backwards) and, for direct
    /// conversations, reveals the conversation to both participants.
    async fn record_message(
        &self,
        id: &ConversationId,
        latest: LastMessageRef,
    ) -> Result<Option<Conversation>, DomainError>;

    /// Replaces the pointer after the newest message was deleted.
    async fn repoint_last_message(
        &self,
        id: &ConversationId,
        latest: Option<LastMessageRef>,
    ) -> Result<Option<Conversation>, DomainError>;

    /// Applies the removal rules and deletes a group nobody sees any more.
    /// `None` when the conversation does not exist.
    async fn remove_participant(
        &self,
        id: &ConversationId,
        user: &UserId,
    ) -> Result<Option<RemovalOutcome>, DomainError>;

    /// Conversations visible to `user`, most recently active first.
    async fn list_visible_to(&self, user: &UserId) -> Result<Vec<Conversation>, DomainError>;
}
