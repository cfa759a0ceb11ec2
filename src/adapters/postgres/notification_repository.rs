//! PostgreSQL implementation of NotificationRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode, NotificationId, Timestamp, UserId};
use crate::domain::notification::{Notification, NotificationKind};
use crate::ports::NotificationRepository;

use super::{column, user_id};

#[derive(Clone)]
pub struct PostgresNotificationRepository {
    pool: PgPool,
}

impl PostgresNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for PostgresNotificationRepository {
    async fn insert(&self, notification: &Notification) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, sender_id, recipient_id, kind, target, read, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(notification.id().as_uuid())
        .bind(notification.sender().as_str())
        .bind(notification.recipient().as_str())
        .bind(notification.kind().as_str())
        .bind(notification.target())
        .bind(notification.is_read())
        .bind(notification.created_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to insert notification", e))?;

        Ok(())
    }

    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, DomainError> {
        let row = sqlx::query("SELECT * FROM notifications WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch notification", e))?;

        row.map(row_to_notification).transpose()
    }

    async fn list_for_recipient(
        &self,
        recipient: &UserId,
    ) -> Result<Vec<Notification>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM notifications
            WHERE recipient_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(recipient.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list notifications", e))?;

        rows.into_iter().map(row_to_notification).collect()
    }

    async fn count_unread(&self, recipient: &UserId) -> Result<u64, DomainError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE recipient_id = $1 AND NOT read",
        )
        .bind(recipient.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to count notifications", e))?;

        Ok(count.max(0) as u64)
    }

    async fn mark_read(
        &self,
        recipient: &UserId,
        ids: &[NotificationId],
    ) -> Result<u64, DomainError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE \
             WHERE recipient_id = $1 AND id = ANY($2) AND NOT read",
        )
        .bind(recipient.as_str())
        .bind(&ids)
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to mark notifications read", e))?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: &NotificationId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to delete notification", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_for(&self, recipient: &UserId) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM notifications WHERE recipient_id = $1")
            .bind(recipient.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to delete notifications", e))?;

        Ok(result.rows_affected())
    }
}

fn row_to_notification(row: PgRow) -> Result<Notification, DomainError> {
    let id: Uuid = column(&row, "id")?;
    let sender_id: String = column(&row, "sender_id")?;
    let recipient_id: String = column(&row, "recipient_id")?;
    let kind_str: String = column(&row, "kind")?;
    let kind = NotificationKind::parse(&kind_str).ok_or_else(|| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid notification kind: {}", kind_str),
        )
    })?;
    let target: Option<String> = column(&row, "target")?;
    let read: bool = column(&row, "read")?;
    let created_at: chrono::DateTime<chrono::Utc> = column(&row, "created_at")?;

    Ok(Notification::reconstitute(
        NotificationId::from_uuid(id),
        user_id(sender_id)?,
        user_id(recipient_id)?,
        kind,
        target,
        read,
        Timestamp::from_datetime(created_at),
    ))
}
