//! SendMessageHandler - post a message to a conversation.

use std::sync::Arc;

use crate::application::handlers::publish_committed;
use crate::application::services::ConversationManager;
use crate::domain::conversation::{ConversationUpdated, UpdateReason};
use crate::domain::foundation::{
    CommandMetadata, ConversationId, EventId, SerializableDomainEvent,
};
use crate::domain::message::{Message, MessageContent, MessageCreated, MessageError};
use crate::ports::{EventPublisher, MessageRepository};

#[derive(Debug, Clone)]
pub struct SendMessageCommand {
    pub conversation_id: ConversationId,
    pub text: Option<String>,
    pub image_url: Option<String>,
}

pub struct SendMessageHandler {
    manager: Arc<ConversationManager>,
    messages: Arc<dyn MessageRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl SendMessageHandler {
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

    /// Returns the stored message. Events are published after the commit;
    /// a publish failure does not undo the send.
    pub async fn handle(
        &self,
        cmd: SendMessageCommand,
        metadata: CommandMetadata,
    ) -> Result<Message, MessageError> {
        let sender = metadata.user_id.clone();

        // 1. Sender must be a participant
        self.manager
            .authorize_access(&cmd.conversation_id, &sender)
            .await?;

        // 2. Validate content
        let content = MessageContent::new(cmd.text, cmd.image_url)?;

        // 3. Persist; the store stamps created_at
        let message = self
            .messages
            .insert(Message::new(cmd.conversation_id, sender.clone(), content))
            .await?;

        // 4. Advance the conversation and reveal it to the recipient. The
        //    message is already committed, so a failure here is logged and
        //    the send still succeeds; a retry would duplicate it.
        let activity_recorded = match self
            .manager
            .record_message_activity(&cmd.conversation_id, &message)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(
                    conversation_id = %cmd.conversation_id,
                    message_id = %message.id(),
                    error = %e,
                    "failed to record message activity"
                );
                false
            }
        };

        // 5. Announce
        let created = MessageCreated {
            event_id: EventId::new(),
            conversation_id: cmd.conversation_id,
            message: message.clone(),
            created_at: *message.created_at(),
        };
        let updated = ConversationUpdated {
            event_id: EventId::new(),
            conversation_id: cmd.conversation_id,
            actor: Some(sender.clone()),
            reason: UpdateReason::MessageSent,
            updated_at: *message.created_at(),
        };
        let mut envelopes = vec![created.to_envelope()];
        if activity_recorded {
            envelopes.push(updated.to_envelope());
        }
        for envelope in envelopes {
            publish_committed(
                self.event_publisher.as_ref(),
                envelope
                    .with_correlation_id(metadata.correlation_id())
                    .with_user_id(sender.to_string()),
            )
            .await;
        }

        tracing::debug!(
            conversation_id = %cmd.conversation_id,
            message_id = %message.id(),
            "message sent"
        );
        Ok(message)
    }
}
