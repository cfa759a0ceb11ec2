//! PostgreSQL adapters - Database implementations for the store ports.
//!
//! - `PostgresConversationRepository` - conversations, with the direct-pair
//!   uniqueness enforced by a `UNIQUE (pair_key)` constraint
//! - `PostgresMessageRepository` - messages and their read sets
//! - `PostgresNotificationRepository` - per-recipient notifications
//! - `PostgresProfileReader` - read-only user summaries
//!
//! Set-valued columns (`participants`, `visible_to`, `read_by`) are `TEXT[]`
//! and are only ever changed with `array_append` / `array_remove` guarded by
//! `ANY(..)`, so concurrent writers cannot lose each other's updates.

mod conversation_repository;
mod message_repository;
mod notification_repository;
mod profile_reader;

pub use conversation_repository::PostgresConversationRepository;
pub use message_repository::PostgresMessageRepository;
pub use notification_repository::PostgresNotificationRepository;
pub use profile_reader::PostgresProfileReader;

use std::collections::BTreeSet;

use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row};

use crate::config::DatabaseConfig;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};

/// Opens a connection pool sized from configuration.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DomainError> {
    PgPoolOptions::new()
        .min_connections(config.min_connections)
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .idle_timeout(config.idle_timeout())
        .max_lifetime(config.max_lifetime())
        .connect(&config.url)
        .await
        .map_err(|e| DomainError::database("Failed to connect to database", e))
}

/// Applies the embedded migrations in `./migrations`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DomainError> {
    tracing::info!("Running database migrations");

    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DomainError::database("Failed to run migrations", e))?;

    tracing::info!("Database migrations completed");
    Ok(())
}

/// Reads one column, reporting the column name on failure.
fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name).map_err(|e| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Failed to get {}: {}", name, e),
        )
    })
}

fn user_id(raw: String) -> Result<UserId, DomainError> {
    UserId::new(raw).map_err(|e| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid user id in database: {}", e),
        )
    })
}

fn user_set(raw: Vec<String>) -> Result<BTreeSet<UserId>, DomainError> {
    raw.into_iter().map(user_id).collect()
}

fn user_strings<'a>(users: impl IntoIterator<Item = &'a UserId>) -> Vec<String> {
    users.into_iter().map(|u| u.as_str().to_string()).collect()
}
