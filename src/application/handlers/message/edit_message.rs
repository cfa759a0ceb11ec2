//! EditMessageHandler - replace a message's content.

use std::sync::Arc;

use crate::application::handlers::publish_committed;
use crate::application::services::ConversationManager;
use crate::domain::foundation::{
    CommandMetadata, EventId, MessageId, SerializableDomainEvent, Timestamp,
};
use crate::domain::message::{Message, MessageContent, MessageError, MessageUpdated};
use crate::ports::{EventPublisher, MessageRepository};

#[derive(Debug, Clone)]
pub struct EditMessageCommand {
    pub message_id: MessageId,
    pub text: Option<String>,
    pub image_url: Option<String>,
}

pub struct EditMessageHandler {
    manager: Arc<ConversationManager>,
    messages: Arc<dyn MessageRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl EditMessageHandler {
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
        cmd: EditMessageCommand,
        metadata: CommandMetadata,
    ) -> Result<Message, MessageError> {
        let editor = &metadata.user_id;
        let mut message = self
            .messages
            .find_by_id(&cmd.message_id)
            .await?
            .ok_or_else(|| MessageError::not_found(cmd.message_id))?;

        message.ensure_sender(editor)?;
        self.manager
            .authorize_access(message.conversation_id(), editor)
            .await?;

        let content = MessageContent::new(cmd.text, cmd.image_url)?;
        message.edit(editor, content)?;
        self.messages.update_content(&message).await?;

        let event = MessageUpdated {
            event_id: EventId::new(),
            conversation_id: *message.conversation_id(),
            message: message.clone(),
            updated_at: Timestamp::now(),
        };
        publish_committed(
            self.event_publisher.as_ref(),
            event
                .to_envelope()
                .with_correlation_id(metadata.correlation_id())
                .with_user_id(editor.to_string()),
        )
        .await;

        Ok(message)
    }
}
