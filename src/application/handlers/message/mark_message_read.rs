//! MarkMessageReadHandler - acknowledge a single message as read.

use std::sync::Arc;

use crate::application::handlers::publish_committed;
use crate::application::services::{ConversationManager, ReadLedger};
use crate::domain::foundation::{
    CommandMetadata, ConversationId, EventId, MessageId, SerializableDomainEvent, Timestamp,
};
use crate::domain::message::{MessageError, MessagesRead};
use crate::ports::{EventPublisher, MessageRepository};

#[derive(Debug, Clone)]
pub struct MarkMessageReadCommand {
    pub conversation_id: ConversationId,
    pub message_id: MessageId,
}

pub struct MarkMessageReadHandler {
    manager: Arc<ConversationManager>,
    ledger: Arc<ReadLedger>,
    messages: Arc<dyn MessageRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl MarkMessageReadHandler {
    pub fn new(
        manager: Arc<ConversationManager>,
        ledger: Arc<ReadLedger>,
        messages: Arc<dyn MessageRepository>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            manager,
            ledger,
            messages,
            event_publisher,
        }
    }

    /// Idempotent. `messages:read` is published even when the message was
    /// already read so that the reader's count is re-sent.
    pub async fn handle(
        &self,
        cmd: MarkMessageReadCommand,
        metadata: CommandMetadata,
    ) -> Result<(), MessageError> {
        let reader = &metadata.user_id;
        self.manager
            .authorize_access(&cmd.conversation_id, reader)
            .await?;

        let belongs = self
            .messages
            .find_by_id(&cmd.message_id)
            .await?
            .is_some_and(|m| m.conversation_id() == &cmd.conversation_id);
        if !belongs {
            return Err(MessageError::not_found(cmd.message_id));
        }

        self.ledger
            .mark_read(&cmd.conversation_id, &[cmd.message_id], reader)
            .await?;

        let event = MessagesRead {
            event_id: EventId::new(),
            conversation_id: cmd.conversation_id,
            reader: reader.clone(),
            read_at: Timestamp::now(),
        };
        publish_committed(
            self.event_publisher.as_ref(),
            event
                .to_envelope()
                .with_correlation_id(metadata.correlation_id())
                .with_user_id(reader.to_string()),
        )
        .await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{user, Fixture};
    use crate::domain::message::{Message, MessageContent};

    fn handler(fx: &Fixture) -> MarkMessageReadHandler {
        MarkMessageReadHandler::new(
            fx.manager.clone(),
            fx.ledger.clone(),
            fx.messages.clone(),
            fx.publisher.clone(),
        )
    }

    #[tokio::test]
    async fn marks_and_announces() {
        let fx = Fixture::new();
        let conv = fx
            .manager
            .find_or_create_direct(&user("alice"), &user("bob"))
            .await
            .unwrap();
        let message = fx
            .messages
            .insert(Message::new(*conv.id(), user("alice"), MessageContent::text("x").unwrap()))
            .await
            .unwrap();

        let cmd = MarkMessageReadCommand {
            conversation_id: *conv.id(),
            message_id: *message.id(),
        };
        handler(&fx)
            .handle(cmd.clone(), CommandMetadata::test_fixture("bob"))
            .await
            .unwrap();
        handler(&fx)
            .handle(cmd, CommandMetadata::test_fixture("bob"))
            .await
            .unwrap();

        assert_eq!(
            fx.ledger.count_unread(conv.id(), &user("bob")).await.unwrap(),
            0
        );
        assert_eq!(fx.publisher.published_events().len(), 2);
    }

    #[tokio::test]
    async fn message_from_another_conversation_is_not_found() {
        let fx = Fixture::new();
        let conv = fx
            .manager
            .find_or_create_direct(&user("alice"), &user("bob"))
            .await
            .unwrap();
        let elsewhere = fx
            .messages
            .insert(Message::new(
                ConversationId::new(),
                user("carol"),
                MessageContent::text("x").unwrap(),
            ))
            .await
            .unwrap();

        let err = handler(&fx)
            .handle(
                MarkMessageReadCommand {
                    conversation_id: *conv.id(),
                    message_id: *elsewhere.id(),
                },
                CommandMetadata::test_fixture("bob"),
            )
            .await
            .unwrap_err();

        assert_eq!(err, MessageError::NotFound(*elsewhere.id()));
        assert!(fx.publisher.published_events().is_empty());
    }
}
