//! NotificationFanout - inbox frames for the recipient.

use std::sync::Arc;

use async_trait::async_trait;

use crate::application::services::PayloadShaper;
use crate::domain::foundation::{DomainError, EventEnvelope, UserId};
use crate::domain::notification::{NotificationCreated, NotificationsChanged};
use crate::domain::realtime::{RoomName, ServerEvent};
use crate::ports::{DomainEventHandler, NotificationRepository, RealtimeFanout};

use super::{emit, settle};

pub struct NotificationFanout {
    notifications: Arc<dyn NotificationRepository>,
    shaper: Arc<PayloadShaper>,
    fanout: Arc<dyn RealtimeFanout>,
}

impl NotificationFanout {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        shaper: Arc<PayloadShaper>,
        fanout: Arc<dyn RealtimeFanout>,
    ) -> Self {
        Self {
            notifications,
            shaper,
            fanout,
        }
    }

    async fn on_created(&self, event: &NotificationCreated) -> Result<(), DomainError> {
        // Re-fetch: the notification may have been deleted or read since.
        let Some(notification) = self.notifications.find_by_id(&event.notification_id).await?
        else {
            return Ok(());
        };
        let view = self.shaper.notification_view(&notification).await;
        emit(
            self.fanout.as_ref(),
            &RoomName::user(&event.recipient),
            ServerEvent::NewNotification(view),
        )
        .await;
        self.send_count(&event.recipient).await
    }

    async fn send_count(&self, recipient: &UserId) -> Result<(), DomainError> {
        let count = self.notifications.count_unread(recipient).await?;
        emit(
            self.fanout.as_ref(),
            &RoomName::user(recipient),
            ServerEvent::notification_count(count),
        )
        .await;
        Ok(())
    }
}

#[async_trait]
impl DomainEventHandler<NotificationCreated> for NotificationFanout {
    async fn handle_event(
        &self,
        event: NotificationCreated,
        envelope: &EventEnvelope,
    ) -> Result<(), DomainError> {
        let result = self.on_created(&event).await;
        settle("NotificationFanout::created", envelope, result)
    }

    fn name(&self) -> &'static str {
        "NotificationFanout::created"
    }
}

#[async_trait]
impl DomainEventHandler<NotificationsChanged> for NotificationFanout {
    async fn handle_event(
        &self,
        event: NotificationsChanged,
        envelope: &EventEnvelope,
    ) -> Result<(), DomainError> {
        let result = self.send_count(&event.recipient).await;
        settle("NotificationFanout::changed", envelope, result)
    }

    fn name(&self) -> &'static str {
        "NotificationFanout::changed"
    }
}
