//! LeaveConversationHandler - hide a direct conversation or leave a group.

use std::sync::Arc;

use crate::application::handlers::publish_committed;
use crate::application::services::ConversationManager;
use crate::domain::conversation::{
    ConversationDeleted, ConversationError, ConversationUpdated, RemovalOutcome, UpdateReason,
};
use crate::domain::foundation::{
    CommandMetadata, ConversationId, EventId, SerializableDomainEvent, Timestamp,
};
use crate::ports::EventPublisher;

#[derive(Debug, Clone)]
pub struct LeaveConversationCommand {
    pub conversation_id: ConversationId,
}

pub struct LeaveConversationHandler {
    manager: Arc<ConversationManager>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl LeaveConversationHandler {
    pub fn new(manager: Arc<ConversationManager>, event_publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            manager,
            event_publisher,
        }
    }

    /// The leaver always gets `conversation:deleted`. Remaining group
    /// members get `conversation:updated`.
    pub async fn handle(
        &self,
        cmd: LeaveConversationCommand,
        metadata: CommandMetadata,
    ) -> Result<RemovalOutcome, ConversationError> {
        let leaver = &metadata.user_id;
        self.manager
            .authorize_access(&cmd.conversation_id, leaver)
            .await?;

        let outcome = self
            .manager
            .remove_participant(&cmd.conversation_id, leaver)
            .await?;

        let now = Timestamp::now();
        let deleted = ConversationDeleted {
            event_id: EventId::new(),
            conversation_id: cmd.conversation_id,
            audience: vec![leaver.clone()],
            hard_deleted: outcome == RemovalOutcome::GroupDeleted,
            deleted_at: now,
        };
        publish_committed(
            self.event_publisher.as_ref(),
            deleted
                .to_envelope()
                .with_correlation_id(metadata.correlation_id())
                .with_user_id(leaver.to_string()),
        )
        .await;

        if let RemovalOutcome::GroupUpdated(_) = &outcome {
            let updated = ConversationUpdated {
                event_id: EventId::new(),
                conversation_id: cmd.conversation_id,
                actor: Some(leaver.clone()),
                reason: UpdateReason::MemberLeft,
                updated_at: now,
            };
            publish_committed(
                self.event_publisher.as_ref(),
                updated
                    .to_envelope()
                    .with_correlation_id(metadata.correlation_id())
                    .with_user_id(leaver.to_string()),
            )
            .await;
        }

        tracing::debug!(conversation_id = %cmd.conversation_id, user_id = %leaver, "left conversation");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::test_support::{user, Fixture};
    use crate::application::services::GroupCreation;
    use crate::domain::foundation::EventType;

    #[tokio::test]
    async fn leaving_direct_hides_it_for_self_only() {
        let fx = Fixture::new();
        let conv = fx
            .manager
            .find_or_create_direct(&user("alice"), &user("bob"))
            .await
            .unwrap();
        let handler = LeaveConversationHandler::new(fx.manager.clone(), fx.publisher.clone());

        let outcome = handler
            .handle(
                LeaveConversationCommand {
                    conversation_id: *conv.id(),
                },
                CommandMetadata::test_fixture("alice"),
            )
            .await
            .unwrap();

        assert_eq!(outcome, RemovalOutcome::HiddenForSelf);
        assert_eq!(
            fx.publisher.published_types(),
            vec![EventType::ConversationDeleted]
        );
        let payload: ConversationDeleted = fx.publisher.published_events()[0].decode().unwrap();
        assert!(!payload.hard_deleted);
        assert_eq!(payload.audience, vec![user("alice")]);
    }

    #[tokio::test]
    async fn leaving_group_notifies_remaining_members() {
        let fx = Fixture::new();
        let GroupCreation::Group(group) = fx
            .manager
            .create_group(&user("a"), vec![user("b"), user("c")], None)
            .await
            .unwrap()
        else {
            panic!("expected group");
        };
        let handler = LeaveConversationHandler::new(fx.manager.clone(), fx.publisher.clone());

        handler
            .handle(
                LeaveConversationCommand {
                    conversation_id: *group.id(),
                },
                CommandMetadata::test_fixture("a"),
            )
            .await
            .unwrap();

        assert_eq!(
            fx.publisher.published_types(),
            vec![EventType::ConversationDeleted, EventType::ConversationUpdated]
        );
    }

    #[tokio::test]
    async fn outsider_cannot_leave() {
        let fx = Fixture::new();
        let conv = fx
            .manager
            .find_or_create_direct(&user("alice"), &user("bob"))
            .await
            .unwrap();
        let handler = LeaveConversationHandler::new(fx.manager.clone(), fx.publisher.clone());

        let err = handler
            .handle(
                LeaveConversationCommand {
                    conversation_id: *conv.id(),
                },
                CommandMetadata::test_fixture("mallory"),
            )
            .await
            .unwrap_err();

        assert_eq!(err, ConversationError::Forbidden);
        assert!(fx.publisher.published_events().is_empty());
    }
}
