//! Notification domain events.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    domain_event, EventId, EventType, NotificationId, Timestamp, UserId,
};

/// Published after a notification is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationCreated {
    pub event_id: EventId,
    pub notification_id: NotificationId,
    pub recipient: UserId,
    pub created_at: Timestamp,
}

domain_event!(
    NotificationCreated,
    event_type = EventType::NotificationCreated,
    aggregate_id = notification_id,
    aggregate_type = "Notification",
    occurred_at = created_at,
    event_id = event_id
);

/// Published when a recipient's notification set changed in bulk
/// (read-all, delete). Triggers a count refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsChanged {
    pub event_id: EventId,
    pub recipient: UserId,
    pub changed_at: Timestamp,
}

domain_event!(
    NotificationsChanged,
    event_type = EventType::NotificationsChanged,
    aggregate_id = recipient,
    aggregate_type = "NotificationInbox",
    occurred_at = changed_at,
    event_id = event_id
);
