//! Notification repository port.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, NotificationId, UserId};
use crate::domain::notification::Notification;

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn insert(&self, notification: &Notification) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, DomainError>;

    /// Notifications addressed to `recipient`, newest first.
    async fn list_for_recipient(&self, recipient: &UserId)
        -> Result<Vec<Notification>, DomainError>;

    async fn count_unread(&self, recipient: &UserId) -> Result<u64, DomainError>;

    /// Marks the given notifications of `recipient` read. Ids belonging to
    /// someone else are ignored. Returns how many changed.
    async fn mark_read(
        &self,
        recipient: &UserId,
        ids: &[NotificationId],
    ) -> Result<u64, DomainError>;

    /// Returns false when the notification did not exist.
    async fn delete(&self, id: &NotificationId) -> Result<bool, DomainError>;

    async fn delete_all_for(&self, recipient: &UserId) -> Result<u64, DomainError>;
}
