//! ListNotificationsHandler - fetch a recipient's inbox and mark it read.

use std::sync::Arc;

use crate::application::handlers::publish_committed;
use crate::application::services::PayloadShaper;
use crate::domain::foundation::{
    CommandMetadata, EventId, NotificationId, SerializableDomainEvent, Timestamp,
};
use crate::domain::notification::{NotificationError, NotificationsChanged};
use crate::domain::realtime::NotificationView;
use crate::ports::{EventPublisher, NotificationRepository};

pub struct ListNotificationsHandler {
    notifications: Arc<dyn NotificationRepository>,
    shaper: Arc<PayloadShaper>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl ListNotificationsHandler {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        shaper: Arc<PayloadShaper>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            notifications,
            shaper,
            event_publisher,
        }
    }

    /// Newest first. The returned `read` flags are those from before this
    /// call; afterwards every returned notification is read.
    pub async fn handle(
        &self,
        metadata: CommandMetadata,
    ) -> Result<Vec<NotificationView>, NotificationError> {
        let recipient = &metadata.user_id;
        let notifications = self.notifications.list_for_recipient(recipient).await?;
        let views = self.shaper.notification_views(&notifications).await;

        // Only what was returned; anything created since stays unread.
        let listed: Vec<NotificationId> = notifications.iter().map(|n| *n.id()).collect();
        let changed = self.notifications.mark_read(recipient, &listed).await?;
        if changed > 0 {
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
        }

        Ok(views)
    }
}
