//! DeleteMessageHandler - remove a message and repair the conversation pointer.

use std::sync::Arc;

use crate::application::handlers::publish_committed;
use crate::application::services::ConversationManager;
use crate::domain::conversation::{ConversationUpdated, UpdateReason};
use crate::domain::foundation::{
    CommandMetadata, EventId, MessageId, SerializableDomainEvent, Timestamp,
};
use crate::domain::message::{MessageDeleted, MessageError};
use crate::ports::{EventPublisher, MessageRepository};

#[derive(Debug, Clone)]
pub struct DeleteMessageCommand {
    pub message_id: MessageId,
}

pub struct DeleteMessageHandler {
    manager: Arc<ConversationManager>,
    messages: Arc<dyn MessageRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl DeleteMessageHandler {
    pub fn new(
        manager: Arc<ConversationManager>,
        messages: Arc<dyn MessageRepository>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            manager,
            messages,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        cmd: DeleteMessageCommand,
        metadata: CommandMetadata,
    ) -> Result<(), MessageError> {
        let actor = &metadata.user_id;
        let message = self
            .messages
            .find_by_id(&cmd.message_id)
            .await?
            .ok_or_else(|| MessageError::not_found(cmd.message_id))?;
        message.ensure_sender(actor)?;

        let conversation_id = *message.conversation_id();
        let conversation = self.manager.authorize_access(&conversation_id, actor).await?;

        if !self.messages.delete(&cmd.message_id).await? {
            return Err(MessageError::not_found(cmd.message_id));
        }

        let was_latest = conversation
            .last_message()
            .is_some_and(|last| last.message_id == cmd.message_id);
        if was_latest {
            self.manager.refresh_last_message(&conversation_id).await?;
        }

        let now = Timestamp::now();
        let deleted = MessageDeleted {
            event_id: EventId::new(),
            conversation_id,
            message_id: cmd.message_id,
            deleted_by: actor.clone(),
            deleted_at: now,
        };
        let updated = ConversationUpdated {
            event_id: EventId::new(),
            conversation_id,
            actor: Some(actor.clone()),
            reason: UpdateReason::MessageDeleted,
            updated_at: now,
        };
        for envelope in [deleted.to_envelope(), updated.to_envelope()] {
            publish_committed(
                self.event_publisher.as_ref(),
                envelope
                    .with_correlation_id(metadata.correlation_id())
                    .with_user_id(actor.to_string()),
            )
            .await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::message::{SendMessageCommand, SendMessageHandler};
    use crate::application::handlers::test_support::{user, Fixture};
    use crate::domain::foundation::EventType;
    use crate::domain::message::Message;
    use crate::ports::ConversationRepository;

    async fn send(fx: &Fixture, conversation: &crate::domain::conversation::Conversation, body: &str) -> Message {
        SendMessageHandler::new(fx.manager.clone(), fx.messages.clone(), fx.publisher.clone())
            .handle(
                SendMessageCommand {
                    conversation_id: *conversation.id(),
                    text: Some(body.into()),
                    image_url: None,
                },
                CommandMetadata::test_fixture("alice"),
            )
            .await
            .unwrap()
    }

    fn handler(fx: &Fixture) -> DeleteMessageHandler {
        DeleteMessageHandler::new(fx.manager.clone(), fx.messages.clone(), fx.publisher.clone())
    }

    #[tokio::test]
    async fn deleting_latest_repoints_conversation() {
        let fx = Fixture::new();
        let conv = fx
            .manager
            .find_or_create_direct(&user("alice"), &user("bob"))
            .await
            .unwrap();
        let first = send(&fx, &conv, "first").await;
        let second = send(&fx, &conv, "second").await;

        handler(&fx)
            .handle(
                DeleteMessageCommand {
                    message_id: *second.id(),
                },
                CommandMetadata::test_fixture("alice"),
            )
            .await
            .unwrap();

        let stored = fx.conversations.find_by_id(conv.id()).await.unwrap().unwrap();
        assert_eq!(stored.last_message().unwrap().message_id, *first.id());
        let types = fx.publisher.published_types();
        assert_eq!(
            &types[types.len() - 2..],
            &[EventType::MessageDeleted, EventType::ConversationUpdated]
        );
    }

    #[tokio::test]
    async fn only_sender_may_delete() {
        let fx = Fixture::new();
        let conv = fx
            .manager
            .find_or_create_direct(&user("alice"), &user("bob"))
            .await
            .unwrap();
        let message = send(&fx, &conv, "mine").await;

        let err = handler(&fx)
            .handle(
                DeleteMessageCommand {
                    message_id: *message.id(),
                },
                CommandMetadata::test_fixture("bob"),
            )
            .await
            .unwrap_err();

        assert_eq!(err, MessageError::Forbidden);
        assert!(fx.messages.find_by_id(message.id()).await.unwrap().is_some());
    }
}
