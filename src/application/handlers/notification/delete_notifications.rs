//! DeleteNotificationsHandler - remove one notification or a whole inbox.

use std::sync::Arc;

use crate::application::handlers::publish_committed;
use crate::domain::foundation::{
    CommandMetadata, EventId, NotificationId, SerializableDomainEvent, Timestamp,
};
use crate::domain::notification::{NotificationError, NotificationsChanged};
use crate::ports::{EventPublisher, NotificationRepository};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteNotificationsCommand {
    One(NotificationId),
    All,
}

pub struct DeleteNotificationsHandler {
    notifications: Arc<dyn NotificationRepository>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl DeleteNotificationsHandler {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            notifications,
            event_publisher,
        }
    }

    /// Returns how many notifications were removed.
    pub async fn handle(
        &self,
        cmd: DeleteNotificationsCommand,
        metadata: CommandMetadata,
    ) -> Result<u64, NotificationError> {
        let recipient = &metadata.user_id;

        let removed = match cmd {
            DeleteNotificationsCommand::One(id) => {
                let notification = self
                    .notifications
                    .find_by_id(&id)
                    .await?
                    .ok_or(NotificationError::NotFound(id))?;
                if notification.recipient() != recipient {
                    return Err(NotificationError::Forbidden);
                }
                u64::from(self.notifications.delete(&id).await?)
            }
            DeleteNotificationsCommand::All => self.notifications.delete_all_for(recipient).await?,
        };

        let event = NotificationsChanged {
            event_id: EventId::new(),
            recipient: recipient.clone(),
            changed_at: Timestamp::now(),
        };
        publish_committed(
            self.event_publisher.as_ref(),
            event
                .to_envelope()
                .with_correlation_id(metadata.correlation_id())
                .with_user_id(recipient.to_string()),
        )
        .await;

        Ok(removed)
    }
}
