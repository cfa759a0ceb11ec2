//! CreateNotificationHandler - record that one user did something to another.

use std::sync::Arc;

use crate::application::handlers::publish_committed;
use crate::domain::foundation::{CommandMetadata, EventId, SerializableDomainEvent, UserId};
use crate::domain::notification::{
    Notification, NotificationCreated, NotificationError, NotificationKind,
};
use crate::ports::{EventPublisher, NotificationRepository};

#[derive(Debug, Clone)]
pub struct CreateNotificationCommand {
    pub recipient: UserId,
    pub kind: NotificationKind,
    pub target: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateNotificationOutcome {
    Created(Notification),
    /// Sender and recipient were the same user.
    Suppressed,
}

pub struct CreateNotificationHandler {
    notifications: Arc<dyn NotificationRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl CreateNotificationHandler {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            notifications,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateNotificationCommand,
        metadata: CommandMetadata,
    ) -> Result<CreateNotificationOutcome, NotificationError> {
        let Some(notification) = Notification::new(
            metadata.user_id.clone(),
            cmd.recipient,
            cmd.kind,
            cmd.target,
        ) else {
            tracing::debug!(user_id = %metadata.user_id, "self-notification suppressed");
            return Ok(CreateNotificationOutcome::Suppressed);
        };

        self.notifications.insert(&notification).await?;

        let event = NotificationCreated {
            event_id: EventId::new(),
            notification_id: *notification.id(),
            recipient: notification.recipient().clone(),
            created_at: *notification.created_at(),
        };
        publish_committed(
            self.event_publisher.as_ref(),
            event
                .to_envelope()
                .with_correlation_id(metadata.correlation_id())
                .with_user_id(metadata.user_id.to_string()),
        )
        .await;

        Ok(CreateNotificationOutcome::Created(notification))
    }
}
