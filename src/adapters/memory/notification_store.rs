//! In-memory notification store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, NotificationId, UserId};
use crate::domain::notification::Notification;
use crate::ports::NotificationRepository;

#[derive(Default)]
pub struct InMemoryNotificationStore {
    notifications: Mutex<HashMap<NotificationId, Notification>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<NotificationId, Notification>> {
        self.notifications.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationStore {
    async fn insert(&self, notification: &Notification) -> Result<(), DomainError> {
        self.lock()
            .insert(*notification.id(), notification.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, DomainError> {
        Ok(self.lock().get(id).cloned())
    }

    async fn list_for_recipient(
        &self,
        recipient: &UserId,
    ) -> Result<Vec<Notification>, DomainError> {
        let mut found: Vec<Notification> = self
            .lock()
            .values()
            .filter(|n| n.recipient() == recipient)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at().cmp(a.created_at()));
        Ok(found)
    }

    async fn count_unread(&self, recipient: &UserId) -> Result<u64, DomainError> {
        Ok(self
            .lock()
            .values()
            .filter(|n| n.recipient() == recipient && !n.is_read())
            .count() as u64)
    }

    async fn mark_read(
        &self,
        recipient: &UserId,
        ids: &[NotificationId],
    ) -> Result<u64, DomainError> {
        let mut store = self.lock();
        let mut changed = 0;
        for id in ids {
            if let Some(notification) = store.get_mut(id) {
                if notification.recipient() == recipient && !notification.is_read() {
                    notification.mark_read();
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    async fn delete(&self, id: &NotificationId) -> Result<bool, DomainError> {
        Ok(self.lock().remove(id).is_some())
    }

    async fn delete_all_for(&self, recipient: &UserId) -> Result<u64, DomainError> {
        let mut notifications = self.lock();
        let before = notifications.len();
        notifications.retain(|_, n| n.recipient() != recipient);
        Ok((before - notifications.len()) as u64)
    }
}
