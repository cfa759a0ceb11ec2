//! PostgreSQL implementation of MessageRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{ConversationId, DomainError, MessageId, Timestamp, UserId};
use crate::domain::message::{Message, MessageContent};
use crate::ports::MessageRepository;

use super::{column, user_id, user_set, user_strings};

#[derive(Clone)]
pub struct PostgresMessageRepository {
    pool: PgPool,
}

impl PostgresMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PostgresMessageRepository {
    async fn insert(&self, mut message: Message) -> Result<Message, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database("Failed to start transaction", e))?;

        // Serializes inserts per conversation so created_at stays strictly
        // increasing within it.
        sqlx::query("SELECT id FROM conversations WHERE id = $1 FOR UPDATE")
            .bind(message.conversation_id().as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::database("Failed to lock conversation", e))?;

        let (floor,): (Option<chrono::DateTime<chrono::Utc>>,) =
            sqlx::query_as("SELECT MAX(created_at) FROM messages WHERE conversation_id = $1")
                .bind(message.conversation_id().as_uuid())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| DomainError::database("Failed to read message clock", e))?;

        let stamp = Timestamp::now().at_least_after(floor.map(Timestamp::from_datetime));
        message.stamp_created_at(stamp);

        sqlx::query(
            r#"
            INSERT INTO messages (
                id, conversation_id, sender_id, body, image_url, read_by, created_at, edited_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(message.id().as_uuid())
        .bind(message.conversation_id().as_uuid())
        .bind(message.sender().as_str())
        .bind(message.content().body())
        .bind(message.content().image_url())
        .bind(user_strings(message.read_by()))
        .bind(message.created_at().as_datetime())
        .bind(message.edited_at().map(|t| *t.as_datetime()))
        .execute(&mut *tx)
        .await
        .map_err(|e| DomainError::database("Failed to insert message", e))?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database("Failed to commit transaction", e))?;

        Ok(message)
    }

    async fn find_by_id(&self, id: &MessageId) -> Result<Option<Message>, DomainError> {
        let row = sqlx::query("SELECT * FROM messages WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch message", e))?;

        row.map(row_to_message).transpose()
    }

    async fn list_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<Message>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(conversation_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list messages", e))?;

        rows.into_iter().map(row_to_message).collect()
    }

    async fn latest_in_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Option<Message>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT * FROM messages
            WHERE conversation_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(conversation_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch latest message", e))?;

        row.map(row_to_message).transpose()
    }

    async fn count_unread(
        &self,
        conversation_id: &ConversationId,
        user: &UserId,
    ) -> Result<u64, DomainError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM messages
            WHERE conversation_id = $1 AND NOT ($2 = ANY(read_by))
            "#,
        )
        .bind(conversation_id.as_uuid())
        .bind(user.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to count unread messages", e))?;

        Ok(count.max(0) as u64)
    }

    async fn mark_read(
        &self,
        conversation_id: &ConversationId,
        message_ids: &[MessageId],
        user: &UserId,
    ) -> Result<u64, DomainError> {
        if message_ids.is_empty() {
            return Ok(0);
        }
        let ids: Vec<Uuid> = message_ids.iter().map(|id| *id.as_uuid()).collect();

        let result = sqlx::query(
            r#"
            UPDATE messages
            SET read_by = array_append(read_by, $3)
            WHERE conversation_id = $1
              AND id = ANY($2)
              AND NOT ($3 = ANY(read_by))
            "#,
        )
        .bind(conversation_id.as_uuid())
        .bind(ids)
        .bind(user.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to mark messages read", e))?;

        Ok(result.rows_affected())
    }

    async fn mark_all_read(
        &self,
        conversation_id: &ConversationId,
        user: &UserId,
    ) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET read_by = array_append(read_by, $2)
            WHERE conversation_id = $1
              AND NOT ($2 = ANY(read_by))
            "#,
        )
        .bind(conversation_id.as_uuid())
        .bind(user.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to mark conversation read", e))?;

        Ok(result.rows_affected())
    }

    async fn update_content(&self, message: &Message) -> Result<(), DomainError> {
        // read_by is left alone; readers may have been added meanwhile.
        sqlx::query(
            r#"
            UPDATE messages SET
                body = $2,
                image_url = $3,
                edited_at = $4
            WHERE id = $1
            "#,
        )
        .bind(message.id().as_uuid())
        .bind(message.content().body())
        .bind(message.content().image_url())
        .bind(message.edited_at().map(|t| *t.as_datetime()))
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to update message", e))?;

        Ok(())
    }

    async fn delete(&self, id: &MessageId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to delete message", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM messages WHERE conversation_id = $1")
            .bind(conversation_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to delete messages", e))?;

        Ok(result.rows_affected())
    }
}

fn row_to_message(row: PgRow) -> Result<Message, DomainError> {
    let id: Uuid = column(&row, "id")?;
    let conversation_id: Uuid = column(&row, "conversation_id")?;
    let sender_id: String = column(&row, "sender_id")?;
    let body: Option<String> = column(&row, "body")?;
    let image_url: Option<String> = column(&row, "image_url")?;
    let read_by: Vec<String> = column(&row, "read_by")?;
    let created_at: chrono::DateTime<chrono::Utc> = column(&row, "created_at")?;
    let edited_at: Option<chrono::DateTime<chrono::Utc>> = column(&row, "edited_at")?;

    Ok(Message::reconstitute(
        MessageId::from_uuid(id),
        ConversationId::from_uuid(conversation_id),
        user_id(sender_id)?,
        MessageContent::new(body, image_url)?,
        user_set(read_by)?,
        Timestamp::from_datetime(created_at),
        edited_at.map(Timestamp::from_datetime),
    ))
}
