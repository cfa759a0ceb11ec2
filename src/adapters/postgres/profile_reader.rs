//! PostgreSQL implementation of ProfileReader.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, UserId};
use crate::domain::realtime::UserSummary;
use crate::ports::ProfileReader;

use super::{column, user_id, user_strings};

/// Reads the `profiles` projection owned by the profile service.
#[derive(Clone)]
pub struct PostgresProfileReader {
    pool: PgPool,
}

impl PostgresProfileReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileReader for PostgresProfileReader {
    async fn find_summaries(
        &self,
        ids: &[UserId],
    ) -> Result<HashMap<UserId, UserSummary>, DomainError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT user_id, username, display_name, avatar_url
            FROM profiles
            WHERE user_id = ANY($1)
            "#,
        )
        .bind(user_strings(ids))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::database("Failed to fetch profiles", e))?;

        let mut summaries = HashMap::with_capacity(rows.len());
        for row in rows {
            let id = user_id(column(&row, "user_id")?)?;
            summaries.insert(
                id.clone(),
                UserSummary {
                    id,
                    username: column(&row, "username")?,
                    display_name: column(&row, "display_name")?,
                    avatar_url: column(&row, "avatar_url")?,
                },
            );
        }
        Ok(summaries)
    }
}
