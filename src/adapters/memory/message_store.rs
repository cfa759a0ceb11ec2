//! In-memory message store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::foundation::{ConversationId, DomainError, MessageId, Timestamp, UserId};
use crate::domain::message::Message;
use crate::ports::MessageRepository;

#[derive(Default)]
struct State {
    messages: HashMap<MessageId, Message>,
    // Insertion order per conversation, which is also created_at order.
    timeline: HashMap<ConversationId, Vec<MessageId>>,
    last_stamp: HashMap<ConversationId, Timestamp>,
}

impl State {
    fn in_conversation<'a>(
        &'a self,
        conversation_id: &ConversationId,
    ) -> impl Iterator<Item = &'a Message> + 'a {
        self.timeline
            .get(conversation_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.messages.get(id))
    }
}

#[derive(Default)]
pub struct InMemoryMessageStore {
    state: Mutex<State>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageStore {
    async fn insert(&self, mut message: Message) -> Result<Message, DomainError> {
        let mut state = self.lock();
        let conversation_id = *message.conversation_id();

        let floor = state.last_stamp.get(&conversation_id).copied();
        let stamp = Timestamp::now().at_least_after(floor);
        message.stamp_created_at(stamp);

        state.last_stamp.insert(conversation_id, stamp);
        state
            .timeline
            .entry(conversation_id)
            .or_default()
            .push(*message.id());
        state.messages.insert(*message.id(), message.clone());
        Ok(message)
    }

    async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, DomainError> {
        Ok(self.lock().messages.get(id).cloned())
    }

    async fn list_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, DomainError> {
        Ok(self
            .lock()
            .in_conversation(conversation_id)
            .cloned()
            .collect())
    }

    async fn latest_in_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<Message>, DomainError> {
        Ok(self.lock().in_conversation(conversation_id).last().cloned())
    }

    async fn count_unread(
        &self,
        conversation_id: &ConversationId,
        user: &UserId,
    ) -> Result<u64, DomainError> {
        Ok(self
            .lock()
            .in_conversation(conversation_id)
            .filter(|m| !m.is_read_by(user))
            .count() as u64)
    }

    async fn mark_read(
        &self,
        conversation_id: &ConversationId,
        message_ids: &[MessageId],
        user: &UserId,
    ) -> Result<u64, DomainError> {
        let mut state = self.lock();
        let mut changed = 0;
        for id in message_ids {
            if let Some(message) = state.messages.get_mut(id) {
                if message.conversation_id() == conversation_id && message.mark_read_by(user) {
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    async fn mark_all_read(
        &self,
        conversation_id: &ConversationId,
        user: &UserId,
    ) -> Result<u64, DomainError> {
        let mut state = self.lock();
        let ids = state
            .timeline
            .get(conversation_id)
            .cloned()
            .unwrap_or_default();

        let mut changed = 0;
        for id in ids {
            if let Some(message) = state.messages.get_mut(&id) {
                if message.mark_read_by(user) {
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    async fn update_content(&self, message: &Message) -> Result<(), DomainError> {
        let mut state = self.lock();
        if let Some(stored) = state.messages.get_mut(message.id()) {
            // Read state may have moved on since `message` was loaded.
            let read_by = stored.read_by().clone();
            let mut updated = message.clone();
            for reader in &read_by {
                updated.mark_read_by(reader);
            }
            *stored = updated;
        }
        Ok(())
    }

    async fn delete(&self, id: &MessageId) -> Result<bool, DomainError> {
        let mut state = self.lock();
        let Some(message) = state.messages.remove(id) else {
            return Ok(false);
        };
        if let Some(timeline) = state.timeline.get_mut(message.conversation_id()) {
            timeline.retain(|m| m != id);
        }
        Ok(true)
    }

    async fn delete_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<u64, DomainError> {
        let mut state = self.lock();
        let ids = state.timeline.remove(conversation_id).unwrap_or_default();
        state.last_stamp.remove(conversation_id);
        let mut removed = 0;
        for id in ids {
            if state.messages.remove(&id).is_some() {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::message::MessageContent;
    use std::sync::Arc;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn message(conv: ConversationId, sender: &str, text: &str) -> Message {
        Message::new(conv, user(sender), MessageContent::text(text).unwrap())
    }

    #[tokio::test]
    async fn created_at_strictly_increases_within_conversation() {
        let store = InMemoryMessageStore::new();
        let conv = ConversationId::new();

        let mut previous: Option<Timestamp> = None;
        for i in 0..50 {
            let stored = store
                .insert(message(conv, "alice", &format!("m{}", i)))
                .await
                .unwrap();
            if let Some(prev) = previous {
                assert!(stored.created_at().is_after(&prev));
            }
            previous = Some(*stored.created_at());
        }
    }

    #[tokio::test]
    async fn sender_never_counts_as_unread() {
        let store = InMemoryMessageStore::new();
        let conv = ConversationId::new();
        store.insert(message(conv, "alice", "hi")).await.unwrap();
        store.insert(message(conv, "alice", "there")).await.unwrap();

        assert_eq!(store.count_unread(&conv, &user("alice")).await.unwrap(), 0);
        assert_eq!(store.count_unread(&conv, &user("bob")).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn mark_read_ignores_other_conversations() {
        let store = InMemoryMessageStore::new();
        let conv = ConversationId::new();
        let other = ConversationId::new();
        let here = store.insert(message(conv, "alice", "a")).await.unwrap();
        let there = store.insert(message(other, "alice", "b")).await.unwrap();

        let changed = store
            .mark_read(&conv, &[*here.id(), *there.id()], &user("bob"))
            .await
            .unwrap();

        assert_eq!(changed, 1);
        assert_eq!(store.count_unread(&other, &user("bob")).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn concurrent_readers_are_all_recorded() {
        let store = Arc::new(InMemoryMessageStore::new());
        let conv = ConversationId::new();
        let stored = store.insert(message(conv, "alice", "hi")).await.unwrap();

        let mut tasks = Vec::new();
        for reader in ["b", "c", "d", "e"] {
            let store = store.clone();
            let id = *stored.id();
            tasks.push(tokio::spawn(async move {
                store.mark_read(&conv, &[id], &user(reader)).await.unwrap()
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let read = store.find_by_id(stored.id()).await.unwrap().unwrap();
        assert_eq!(read.read_by().len(), 5);
    }

    #[tokio::test]
    async fn mark_all_read_is_idempotent() {
        let store = InMemoryMessageStore::new();
        let conv = ConversationId::new();
        store.insert(message(conv, "alice", "a")).await.unwrap();
        store.insert(message(conv, "alice", "b")).await.unwrap();

        assert_eq!(store.mark_all_read(&conv, &user("bob")).await.unwrap(), 2);
        assert_eq!(store.mark_all_read(&conv, &user("bob")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_content_keeps_newer_read_marks() {
        let store = InMemoryMessageStore::new();
        let conv = ConversationId::new();
        let stored = store.insert(message(conv, "alice", "a")).await.unwrap();

        let mut edited = stored.clone();
        store
            .mark_read(&conv, &[*stored.id()], &user("bob"))
            .await
            .unwrap();
        edited
            .edit(&user("alice"), MessageContent::text("b").unwrap())
            .unwrap();
        store.update_content(&edited).await.unwrap();

        let found = store.find_by_id(stored.id()).await.unwrap().unwrap();
        assert_eq!(found.content().body(), Some("b"));
        assert!(found.is_read_by(&user("bob")));
    }

    #[tokio::test]
    async fn latest_follows_deletes() {
        let store = InMemoryMessageStore::new();
        let conv = ConversationId::new();
        let first = store.insert(message(conv, "alice", "a")).await.unwrap();
        let second = store.insert(message(conv, "alice", "b")).await.unwrap();

        assert!(store.delete(second.id()).await.unwrap());
        assert!(!store.delete(second.id()).await.unwrap());

        let latest = store.latest_in_conversation(&conv).await.unwrap().unwrap();
        assert_eq!(latest.id(), first.id());

        assert_eq!(store.delete_for_conversation(&conv).await.unwrap(), 1);
        assert!(store.latest_in_conversation(&conv).await.unwrap().is_none());
    }
}
