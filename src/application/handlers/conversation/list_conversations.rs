//! ListConversationsHandler - the viewer's inbox.

use std::sync::Arc;

use crate::application::services::{ConversationManager, PayloadShaper, ReadLedger};
use crate::domain::conversation::ConversationError;
use crate::domain::foundation::UserId;
use crate::domain::realtime::ConversationView;

#[derive(Debug, Clone)]
pub struct ListConversationsQuery {
    pub viewer: UserId,
}

pub struct ListConversationsHandler {
    manager: Arc<ConversationManager>,
    ledger: Arc<ReadLedger>,
    shaper: Arc<PayloadShaper>,
}

impl ListConversationsHandler {
    pub fn new(
        manager: Arc<ConversationManager>,
        ledger: Arc<ReadLedger>,
        shaper: Arc<PayloadShaper>,
    ) -> Self {
        Self {
            manager,
            ledger,
            shaper,
        }
    }

    /// Visible conversations, most recent activity first, each with the
    /// viewer's unread count.
    pub async fn handle(
        &self,
        query: ListConversationsQuery,
    ) -> Result<Vec<ConversationView>, ConversationError> {
        let conversations = self.manager.list_visible_to(&query.viewer).await?;

        let mut views = Vec::with_capacity(conversations.len());
        for conversation in &conversations {
            let unread = self
                .ledger
                .count_unread(conversation.id(), &query.viewer)
                .await?;
            let view = self.shaper.conversation_view(conversation).await?;
            views.push(view.with_unread_count(unread));
        }
        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{user, Fixture};
    use crate::domain::message::{Message, MessageContent};
    use crate::ports::MessageRepository;

    #[tokio::test]
    async fn lists_only_visible_with_unread_counts() {
        let fx = Fixture::new();
        let conv = fx
            .manager
            .find_or_create_direct(&user("alice"), &user("bob"))
            .await
            .unwrap();
        let handler =
            ListConversationsHandler::new(fx.manager.clone(), fx.ledger.clone(), fx.shaper.clone());

        let before = handler
            .handle(ListConversationsQuery {
                viewer: user("bob"),
            })
            .await
            .unwrap();
        assert!(before.is_empty());

        let message = fx
            .messages
            .insert(Message::new(
                *conv.id(),
                user("alice"),
                MessageContent::text("hey").unwrap(),
            ))
            .await
            .unwrap();
        fx.manager
            .record_message_activity(conv.id(), &message)
            .await
            .unwrap();

        let after = handler
            .handle(ListConversationsQuery {
                viewer: user("bob"),
            })
            .await
            .unwrap();
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].unread_count, Some(1));
        assert!(after[0].last_message.is_some());

        let alice = handler
            .handle(ListConversationsQuery {
                viewer: user("alice"),
            })
            .await
            .unwrap();
        assert_eq!(alice[0].unread_count, Some(0));
    }
}
