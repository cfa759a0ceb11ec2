//! CreateGroupConversationHandler - create a named multi-member conversation.

use std::sync::Arc;

use crate::application::handlers::publish_committed;
use crate::application::services::{ConversationManager, GroupCreation};
use crate::domain::conversation::{ConversationError, GroupConversationCreated};
use crate::domain::foundation::{CommandMetadata, EventId, SerializableDomainEvent, UserId};
use crate::ports::EventPublisher;

#[derive(Debug, Clone)]
pub struct CreateGroupConversationCommand {
    pub members: Vec<UserId>,
    pub name: Option<String>,
}

pub struct CreateGroupConversationHandler {
    manager: Arc<ConversationManager>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl CreateGroupConversationHandler {
    pub fn new(manager: Arc<ConversationManager>, event_publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            manager,
            event_publisher,
        }
    }

    /// A request naming only one other person yields their direct
    /// conversation and announces nothing.
    pub async fn handle(
        &self,
        cmd: CreateGroupConversationCommand,
        metadata: CommandMetadata,
    ) -> Result<GroupCreation, ConversationError> {
        let created = self
            .manager
            .create_group(&metadata.user_id, cmd.members, cmd.name)
            .await?;

        if let GroupCreation::Group(group) = &created {
            let event = GroupConversationCreated {
                event_id: EventId::new(),
                conversation_id: *group.id(),
                creator: metadata.user_id.clone(),
                members: group.participants().iter().cloned().collect(),
                created_at: *group.created_at(),
            };
            let envelope = event
                .to_envelope()
                .with_correlation_id(metadata.correlation_id())
                .with_user_id(metadata.user_id.to_string());
            publish_committed(self.event_publisher.as_ref(), envelope).await;
        }

        Ok(created)
    }
}
