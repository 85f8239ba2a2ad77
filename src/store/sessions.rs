//! Session queries

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

use crate::domain::Session;

use super::StoreError;

/// Insert a session and return its ID.
///
/// `token_hash` is UNIQUE; a collision surfaces as `StoreError::UniqueViolation`.
pub async fn create_session<'e, E>(
    executor: E,
    user_id: i64,
    token_hash: &str,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<i64, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let session_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO sessions (user_id, token_hash, created_at, expires_at)
        VALUES (?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(token_hash)
    .bind(created_at)
    .bind(expires_at)
    .fetch_one(executor)
    .await?;

    Ok(session_id)
}

pub async fn find_session_by_token_hash<'e, E>(
    executor: E,
    token_hash: &str,
) -> Result<Option<Session>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let session = sqlx::query_as::<_, Session>(
        r#"
        SELECT id, user_id, token_hash, created_at, expires_at
        FROM sessions
        WHERE token_hash = ?
        "#,
    )
    .bind(token_hash)
    .fetch_optional(executor)
    .await?;

    Ok(session)
}

pub async fn count_sessions_for_user<'e, E>(executor: E, user_id: i64) -> Result<i64, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(executor)
        .await?;

    Ok(count)
}

/// Delete sessions whose expiry is at or before `now`
pub async fn delete_expired_sessions<'e, E>(
    executor: E,
    now: DateTime<Utc>,
) -> Result<u64, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
        .bind(now)
        .execute(executor)
        .await?;

    Ok(result.rows_affected())
}
