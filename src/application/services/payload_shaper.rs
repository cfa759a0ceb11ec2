//! PayloadShaper - builds populated client payloads.
//!
//! User references are expanded through the `ProfileReader`. A profile
//! lookup failure degrades to id-only summaries rather than failing the
//! payload.

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::conversation::Conversation;
use crate::domain::foundation::{DomainError, UserId};
use crate::domain::message::Message;
use crate::domain::notification::Notification;
use crate::domain::realtime::{ConversationView, MessageView, NotificationView, UserSummary};
use crate::ports::{MessageRepository, ProfileReader};

pub struct PayloadShaper {
    profiles: Arc<dyn ProfileReader>,
    messages: Arc<dyn MessageRepository>,
}

impl PayloadShaper {
    pub fn new(profiles: Arc<dyn ProfileReader>, messages: Arc<dyn MessageRepository>) -> Self {
        Self { profiles, messages }
    }

    /// Summaries for `ids`, in the same order, never failing.
    pub async fn summaries(&self, ids: &[UserId]) -> Vec<UserSummary> {
        let mut found = self.lookup(ids).await;
        ids.iter()
            .map(|id| {
                found
                    .remove(id)
                    .unwrap_or_else(|| UserSummary::bare(id.clone()))
            })
            .collect()
    }

    pub async fn summary(&self, id: &UserId) -> UserSummary {
        self.summaries(std::slice::from_ref(id))
            .await
            .pop()
            .unwrap_or_else(|| UserSummary::bare(id.clone()))
    }

    async fn lookup(&self, ids: &[UserId]) -> HashMap<UserId, UserSummary> {
        match self.profiles.find_summaries(ids).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, "profile lookup failed; using bare summaries");
                HashMap::new()
            }
        }
    }

    pub async fn message_view(&self, message: &Message) -> MessageView {
        MessageView::from_message(message, self.summary(message.sender()).await)
    }

    /// Message views sharing one profile lookup.
    pub async fn message_views(&self, messages: &[Message]) -> Vec<MessageView> {
        let mut senders: Vec<UserId> = messages.iter().map(|m| m.sender().clone()).collect();
        senders.sort();
        senders.dedup();
        let profiles = self.lookup(&senders).await;

        messages
            .iter()
            .map(|m| {
                let sender = profiles
                    .get(m.sender())
                    .cloned()
                    .unwrap_or_else(|| UserSummary::bare(m.sender().clone()));
                MessageView::from_message(m, sender)
            })
            .collect()
    }

    /// Conversation with participant profiles and its last message.
    pub async fn conversation_view(
        &self,
        conversation: &Conversation,
    ) -> Result<ConversationView, DomainError> {
        let ids: Vec<UserId> = conversation.participants().iter().cloned().collect();
        let participants = self.summaries(&ids).await;

        let last_message = match conversation.last_message() {
            Some(pointer) => match self.messages.find_by_id(&pointer.message_id).await? {
                Some(message) => Some(self.message_view(&message).await),
                None => None,
            },
            None => None,
        };

        Ok(ConversationView::from_conversation(
            conversation,
            participants,
            last_message,
        ))
    }

    pub async fn notification_view(&self, notification: &Notification) -> NotificationView {
        NotificationView::from_notification(notification, self.summary(notification.sender()).await)
    }

    pub async fn notification_views(&self, notifications: &[Notification]) -> Vec<NotificationView> {
        let mut senders: Vec<UserId> = notifications.iter().map(|n| n.sender().clone()).collect();
        senders.sort();
        senders.dedup();
        let profiles = self.lookup(&senders).await;

        notifications
            .iter()
            .map(|n| {
                let from = profiles
                    .get(n.sender())
                    .cloned()
                    .unwrap_or_else(|| UserSummary::bare(n.sender().clone()));
                NotificationView::from_notification(n, from)
            })
            .collect()
    }
}
