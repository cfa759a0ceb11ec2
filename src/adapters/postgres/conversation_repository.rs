//! PostgreSQL implementation of ConversationRepository.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::conversation::{
    Conversation, ConversationKind, DirectPairKey, LastMessageRef, RemovalOutcome,
};
use crate::domain::foundation::{
    ConversationId, DomainError, ErrorCode, MessageId, Timestamp, UserId,
};
use crate::ports::{ConversationRepository, DirectInsert};

use super::{column, user_set, user_strings};

/// PostgreSQL implementation of ConversationRepository.
#[derive(Clone)]
pub struct PostgresConversationRepository {
    pool: PgPool,
}

impl PostgresConversationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        sql: &str,
        id: &ConversationId,
    ) -> Result<Option<Conversation>, DomainError> {
        let row = sqlx::query(sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch conversation", e))?;

        row.map(row_to_conversation).transpose()
    }
}

#[async_trait]
impl ConversationRepository for PostgresConversationRepository {
    async fn find_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, DomainError> {
        self.fetch_one_where("SELECT * FROM conversations WHERE id = $1", id)
            .await
    }

    async fn find_for_participant(
        &self,
        id: &ConversationId,
        user: &UserId,
    ) -> Result<Option<Conversation>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT * FROM conversations
            WHERE id = $1 AND $2 = ANY(participants)
            "#,
        )
        .bind(id.as_uuid())
        .bind(user.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch conversation", e))?;

        row.map(row_to_conversation).transpose()
    }

    async fn exists(&self, id: &ConversationId) -> Result<bool, DomainError> {
        let found: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM conversations WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to check conversation", e))?;

        Ok(found.is_some())
    }

    async fn find_direct(&self, key: &DirectPairKey) -> Result<Option<Conversation>, DomainError> {
        let row = sqlx::query("SELECT * FROM conversations WHERE pair_key = $1")
            .bind(key.encode())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| DomainError::database("Failed to fetch direct conversation", e))?;

        row.map(row_to_conversation).transpose()
    }

    async fn insert_direct(&self, conversation: &Conversation) -> Result<DirectInsert, DomainError> {
        let key = conversation.pair_key().ok_or_else(|| {
            DomainError::new(
                ErrorCode::InternalError,
                "insert_direct called with a group conversation",
            )
        })?;

        // The unique pair_key decides the race; the loser reads the winner.
        let inserted: Option<(Uuid,)> = sqlx::query_as(
            r#"
            INSERT INTO conversations (
                id, kind, name, participants, visible_to, pair_key,
                last_message_id, last_message_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, NULL, NULL, $7, $8)
            ON CONFLICT (pair_key) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(conversation.id().as_uuid())
        .bind(conversation.kind().as_str())
        .bind(conversation.name())
        .bind(user_strings(conversation.participants()))
        .bind(user_strings(conversation.visible_to()))
        .bind(key.encode())
        .bind(conversation.created_at().as_datetime())
        .bind(conversation.updated_at().as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to insert direct conversation", e))?;

        if inserted.is_some() {
            return Ok(DirectInsert::Created(conversation.clone()));
        }

        self.find_direct(&key)
            .await?
            .map(DirectInsert::Existing)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::Conflict,
                    "Direct conversation conflicted but could not be loaded",
                )
            })
    }

    async fn insert_group(&self, conversation: &Conversation) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (
                id, kind, name, participants, visible_to, pair_key,
                last_message_id, last_message_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, NULL, NULL, NULL, $6, $7)
            "#,
        )
        .bind(conversation.id().as_uuid())
        .bind(conversation.kind().as_str())
        .bind(conversation.name())
        .bind(user_strings(conversation.participants()))
        .bind(user_strings(conversation.visible_to()))
        .bind(conversation.created_at().as_datetime())
        .bind(conversation.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to insert group conversation", e))?;

        Ok(())
    }

    async fn reveal_to(
        &self,
        id: &ConversationId,
        user: &UserId,
    ) -> Result<Option<Conversation>, DomainError> {
        sqlx::query(
            r#"
            UPDATE conversations
            SET visible_to = array_append(visible_to, $2)
            WHERE id = $1
              AND $2 = ANY(participants)
              AND NOT ($2 = ANY(visible_to))
            "#,
        )
        .bind(id.as_uuid())
        .bind(user.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to reveal conversation", e))?;

        self.find_by_id(id).await
    }

    async fn record_message(
        &self,
        id: &ConversationId,
        latest: LastMessageRef,
    ) -> Result<Option<Conversation>, DomainError> {
        // The pointer only moves forward; a direct conversation becomes
        // visible to both parties either way.
        let row = sqlx::query(
            r#"
            UPDATE conversations SET
                last_message_id = CASE
                    WHEN last_message_at IS NULL OR $3 >= last_message_at THEN $2
                    ELSE last_message_id END,
                updated_at = CASE
                    WHEN (last_message_at IS NULL OR $3 >= last_message_at) AND $3 > updated_at
                    THEN $3
                    ELSE updated_at END,
                last_message_at = CASE
                    WHEN last_message_at IS NULL OR $3 >= last_message_at THEN $3
                    ELSE last_message_at END,
                visible_to = CASE
                    WHEN kind = 'direct' THEN participants
                    ELSE visible_to END
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(latest.message_id.as_uuid())
        .bind(latest.at.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to record last message", e))?;

        row.map(row_to_conversation).transpose()
    }

    async fn repoint_last_message(
        &self,
        id: &ConversationId,
        latest: Option<LastMessageRef>,
    ) -> Result<Option<Conversation>, DomainError> {
        let row = sqlx::query(
            r#"
            UPDATE conversations SET
                last_message_id = $2,
                last_message_at = $3,
                updated_at = $4
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id.as_uuid())
        .bind(latest.map(|l| *l.message_id.as_uuid()))
        .bind(latest.map(|l| *l.at.as_datetime()))
        .bind(Timestamp::now().as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to repoint last message", e))?;

        row.map(row_to_conversation).transpose()
    }

    async fn remove_participant(
        &self,
        id: &ConversationId,
        user: &UserId,
    ) -> Result<Option<RemovalOutcome>, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database("Failed to start transaction", e))?;

        let row = sqlx::query("SELECT * FROM conversations WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| DomainError::database("Failed to lock conversation", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut conversation = row_to_conversation(row)?;
        let outcome = conversation.remove_participant(user);

        if outcome == RemovalOutcome::GroupDeleted {
            // Messages go with it (ON DELETE CASCADE).
            sqlx::query("DELETE FROM conversations WHERE id = $1")
                .bind(id.as_uuid())
                .execute(&mut *tx)
                .await
                .map_err(|e| DomainError::database("Failed to delete conversation", e))?;
        } else {
            sqlx::query(
                r#"
                UPDATE conversations SET
                    participants = $2,
                    visible_to = $3,
                    updated_at = $4
                WHERE id = $1
                "#,
            )
            .bind(id.as_uuid())
            .bind(user_strings(conversation.participants()))
            .bind(user_strings(conversation.visible_to()))
            .bind(conversation.updated_at().as_datetime())
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::database("Failed to update conversation", e))?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::database("Failed to commit transaction", e))?;

        Ok(Some(outcome))
    }

    async fn list_visible_to(&self, user: &UserId) -> Result<Vec<Conversation>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM conversations
            WHERE $1 = ANY(visible_to)
            ORDER BY updated_at DESC
            "#,
        )
        .bind(user.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to list conversations", e))?;

        rows.into_iter().map(row_to_conversation).collect()
    }
}

fn row_to_conversation(row: PgRow) -> Result<Conversation, DomainError> {
    let id: Uuid = column(&row, "id")?;
    let kind_str: String = column(&row, "kind")?;
    let kind = ConversationKind::parse(&kind_str).ok_or_else(|| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid conversation kind: {}", kind_str),
        )
    })?;
    let name: Option<String> = column(&row, "name")?;
    let participants: Vec<String> = column(&row, "participants")?;
    let visible_to: Vec<String> = column(&row, "visible_to")?;
    let last_message_id: Option<Uuid> = column(&row, "last_message_id")?;
    let last_message_at: Option<chrono::DateTime<chrono::Utc>> =
        column(&row, "last_message_at")?;
    let created_at: chrono::DateTime<chrono::Utc> = column(&row, "created_at")?;
    let updated_at: chrono::DateTime<chrono::Utc> = column(&row, "updated_at")?;

    let last_message = match (last_message_id, last_message_at) {
        (Some(message_id), Some(at)) => Some(LastMessageRef {
            message_id: MessageId::from_uuid(message_id),
            at: Timestamp::from_datetime(at),
        }),
        _ => None,
    };

    Ok(Conversation::reconstitute(
        ConversationId::from_uuid(id),
        kind,
        name,
        user_set(participants)?,
        user_set(visible_to)?,
        last_message,
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    ))
}
