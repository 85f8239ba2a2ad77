//! Account queries
//!
//! Balances are stored as decimal TEXT and carry a `version` column used for
//! optimistic concurrency: every balance write must name the version it read.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite};

use crate::domain::{Account, Balance};

use super::StoreError;

const ACCOUNT_COLUMNS: &str = "id, user_id, account_type, balance, version, created_at";

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: i64,
    user_id: i64,
    account_type: String,
    balance: String,
    version: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let balance: Balance = row.balance.parse().map_err(|_| StoreError::CorruptValue {
            column: "accounts.balance",
            value: row.balance.clone(),
        })?;

        Ok(Account {
            id: row.id,
            user_id: row.user_id,
            account_type: row.account_type,
            balance,
            version: row.version,
            created_at: row.created_at,
        })
    }
}

/// Insert an account and return it as stored
pub async fn create_account<'e, E>(
    executor: E,
    user_id: i64,
    account_type: &str,
    balance: Balance,
) -> Result<Account, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "INSERT INTO accounts (user_id, account_type, balance, version, created_at) \
         VALUES (?, ?, ?, 0, ?) RETURNING {}",
        ACCOUNT_COLUMNS
    );

    let row: AccountRow = sqlx::query_as(&sql)
        .bind(user_id)
        .bind(account_type)
        .bind(balance.to_string())
        .bind(Utc::now())
        .fetch_one(executor)
        .await?;

    row.try_into()
}

/// All accounts owned by a user, oldest first
pub async fn list_accounts_for_user<'e, E>(
    executor: E,
    user_id: i64,
) -> Result<Vec<Account>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {} FROM accounts WHERE user_id = ? ORDER BY id",
        ACCOUNT_COLUMNS
    );

    let rows: Vec<AccountRow> = sqlx::query_as(&sql)
        .bind(user_id)
        .fetch_all(executor)
        .await?;

    rows.into_iter().map(Account::try_from).collect()
}

/// Find an account by ID, scoped to its owner
pub async fn find_account<'e, E>(
    executor: E,
    account_id: i64,
    user_id: i64,
) -> Result<Option<Account>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {} FROM accounts WHERE id = ? AND user_id = ?",
        ACCOUNT_COLUMNS
    );

    let row: Option<AccountRow> = sqlx::query_as(&sql)
        .bind(account_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

    row.map(Account::try_from).transpose()
}

/// First account of the given type owned by a user
pub async fn find_account_by_type<'e, E>(
    executor: E,
    user_id: i64,
    account_type: &str,
) -> Result<Option<Account>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        "SELECT {} FROM accounts WHERE user_id = ? AND account_type = ? ORDER BY id LIMIT 1",
        ACCOUNT_COLUMNS
    );

    let row: Option<AccountRow> = sqlx::query_as(&sql)
        .bind(user_id)
        .bind(account_type)
        .fetch_optional(executor)
        .await?;

    row.map(Account::try_from).transpose()
}

/// Write a new balance if the stored version still equals `expected_version`.
///
/// Returns `false` when another writer got there first; the caller decides
/// whether to retry.
pub async fn update_account_balance<'e, E>(
    executor: E,
    account_id: i64,
    expected_version: i64,
    new_balance: Balance,
) -> Result<bool, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows_affected = sqlx::query(
        r#"
        UPDATE accounts
        SET balance = ?, version = version + 1
        WHERE id = ? AND version = ?
        "#,
    )
    .bind(new_balance.to_string())
    .bind(account_id)
    .bind(expected_version)
    .execute(executor)
    .await?
    .rows_affected();

    Ok(rows_affected == 1)
}
