//! In-memory conversation store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::conversation::{Conversation, DirectPairKey, LastMessageRef, RemovalOutcome};
use crate::domain::foundation::{ConversationId, DomainError, ErrorCode, UserId};
use crate::ports::{ConversationRepository, DirectInsert};

#[derive(Default)]
struct State {
    conversations: HashMap<ConversationId, Conversation>,
    direct_index: HashMap<DirectPairKey, ConversationId>,
}

/// Conversation store backed by a single mutex-guarded map.
///
/// The pair-key index plays the role of the unique constraint a database
/// would enforce on direct conversations.
#[derive(Default)]
pub struct InMemoryConversationStore {
    state: Mutex<State>,
}

impl InMemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Number of stored conversations.
    pub fn len(&self) -> usize {
        self.lock().conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn update<F>(&self, id: &ConversationId, apply: F) -> Option<Conversation>
    where
        F: FnOnce(&mut Conversation),
    {
        let mut state = self.lock();
        let conversation = state.conversations.get_mut(id)?;
        apply(conversation);
        Some(conversation.clone())
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationStore {
    async fn find_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, DomainError> {
        Ok(self.lock().conversations.get(id).cloned())
    }

    async fn find_for_participant(
        &self,
        id: &ConversationId,
        user: &UserId,
    ) -> Result<Option<Conversation>, DomainError> {
        Ok(self
            .lock()
            .conversations
            .get(id)
            .filter(|c| c.is_participant(user))
            .cloned())
    }

    async fn exists(&self, id: &ConversationId) -> Result<bool, DomainError> {
        Ok(self.lock().conversations.contains_key(id))
    }

    async fn find_direct(&self, key: &DirectPairKey) -> Result<Option<Conversation>, DomainError> {
        let state = self.lock();
        Ok(state
            .direct_index
            .get(key)
            .and_then(|id| state.conversations.get(id))
            .cloned())
    }

    async fn insert_direct(&self, conversation: &Conversation) -> Result<DirectInsert, DomainError> {
        let key = conversation.pair_key().ok_or_else(|| {
            DomainError::new(
                ErrorCode::InternalError,
                "insert_direct called with a group conversation",
            )
        })?;

        let mut state = self.lock();
        if let Some(existing) = state
            .direct_index
            .get(&key)
            .and_then(|id| state.conversations.get(id))
        {
            return Ok(DirectInsert::Existing(existing.clone()));
        }

        state.direct_index.insert(key, *conversation.id());
        state
            .conversations
            .insert(*conversation.id(), conversation.clone());
        Ok(DirectInsert::Created(conversation.clone()))
    }

    async fn insert_group(&self, conversation: &Conversation) -> Result<(), DomainError> {
        let mut state = self.lock();
        if state.conversations.contains_key(conversation.id()) {
            return Err(DomainError::new(
                ErrorCode::Conflict,
                format!("Conversation {} already exists", conversation.id()),
            ));
        }
        state
            .conversations
            .insert(*conversation.id(), conversation.clone());
        Ok(())
    }

    async fn reveal_to(
        &self,
        id: &ConversationId,
        user: &UserId,
    ) -> Result<Option<Conversation>, DomainError> {
        Ok(self.update(id, |c| {
            c.reveal_to(user);
        }))
    }

    async fn record_message(
        &self,
        id: &ConversationId,
        latest: LastMessageRef,
    ) -> Result<Option<Conversation>, DomainError> {
        Ok(self.update(id, |c| c.record_message(latest)))
    }

    async fn repoint_last_message(
        &self,
        id: &ConversationId,
        latest: Option<LastMessageRef>,
    ) -> Result<Option<Conversation>, DomainError> {
        Ok(self.update(id, |c| c.repoint_last_message(latest)))
    }

    async fn remove_participant(
        &self,
        id: &ConversationId,
        user: &UserId,
    ) -> Result<Option<RemovalOutcome>, DomainError> {
        let mut state = self.lock();
        let Some(conversation) = state.conversations.get_mut(id) else {
            return Ok(None);
        };

        let outcome = conversation.remove_participant(user);
        if outcome == RemovalOutcome::GroupDeleted {
            state.conversations.remove(id);
        }
        Ok(Some(outcome))
    }

    async fn list_visible_to(&self, user: &UserId) -> Result<Vec<Conversation>, DomainError> {
        let mut visible: Vec<Conversation> = self
            .lock()
            .conversations
            .values()
            .filter(|c| c.is_visible_to(user))
            .cloned()
            .collect();
        visible.sort_by(|a, b| b.updated_at().cmp(a.updated_at()));
        Ok(visible)
    }
}
