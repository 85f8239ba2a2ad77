//! User queries

use chrono::Utc;
use sqlx::{Executor, Sqlite};

use crate::domain::User;

use super::StoreError;

/// Insert a user and return its ID.
///
/// A taken username surfaces as `StoreError::UniqueViolation`.
pub async fn create_user<'e, E>(
    executor: E,
    username: &str,
    password_hash: &str,
) -> Result<i64, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let user_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO users (username, password_hash, created_at)
        VALUES (?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(username)
    .bind(password_hash)
    .bind(Utc::now())
    .fetch_one(executor)
    .await?;

    Ok(user_id)
}

pub async fn find_user_by_username<'e, E>(
    executor: E,
    username: &str,
) -> Result<Option<User>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash, created_at FROM users WHERE username = ?",
    )
    .bind(username)
    .fetch_optional(executor)
    .await?;

    Ok(user)
}

pub async fn find_user_by_id<'e, E>(executor: E, user_id: i64) -> Result<Option<User>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash, created_at FROM users WHERE id = ?",
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    Ok(user)
}
