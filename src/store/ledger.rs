//! Ledger entry queries
//!
//! Every balance mutation leaves one row here, written in the same
//! transaction as the balance update.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, Sqlite};
use uuid::Uuid;

use crate::domain::{Amount, Balance, EntryType, LedgerEntry};

use super::StoreError;

/// Ledger entry to be inserted
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub account_id: i64,
    pub journal_id: Uuid,
    pub entry_type: EntryType,
    pub amount: Amount,
    pub balance_after: Balance,
    pub description: String,
}

#[derive(Debug, sqlx::FromRow)]
struct LedgerRow {
    id: i64,
    account_id: i64,
    journal_id: Uuid,
    entry_type: String,
    amount: String,
    balance_after: String,
    description: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<LedgerRow> for LedgerEntry {
    type Error = StoreError;

    fn try_from(row: LedgerRow) -> Result<Self, Self::Error> {
        let entry_type = row
            .entry_type
            .parse()
            .map_err(|_| StoreError::CorruptValue {
                column: "ledger_entries.entry_type",
                value: row.entry_type.clone(),
            })?;
        let amount: Decimal = row.amount.parse().map_err(|_| StoreError::CorruptValue {
            column: "ledger_entries.amount",
            value: row.amount.clone(),
        })?;
        let balance_after: Balance =
            row.balance_after
                .parse()
                .map_err(|_| StoreError::CorruptValue {
                    column: "ledger_entries.balance_after",
                    value: row.balance_after.clone(),
                })?;

        Ok(LedgerEntry {
            id: row.id,
            account_id: row.account_id,
            journal_id: row.journal_id,
            entry_type,
            amount,
            balance_after,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

pub async fn insert_ledger_entry<'e, E>(
    executor: E,
    entry: &NewLedgerEntry,
) -> Result<i64, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let entry_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO ledger_entries
            (account_id, journal_id, entry_type, amount, balance_after, description, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(entry.account_id)
    .bind(entry.journal_id)
    .bind(entry.entry_type.as_str())
    .bind(entry.amount.to_string())
    .bind(entry.balance_after.to_string())
    .bind(&entry.description)
    .bind(Utc::now())
    .fetch_one(executor)
    .await?;

    Ok(entry_id)
}

/// Most recent entries for an account, newest first
pub async fn list_ledger_entries<'e, E>(
    executor: E,
    account_id: i64,
    limit: i64,
) -> Result<Vec<LedgerEntry>, StoreError>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows: Vec<LedgerRow> = sqlx::query_as(
        r#"
        SELECT id, account_id, journal_id, entry_type, amount, balance_after, description, created_at
        FROM ledger_entries
        WHERE account_id = ?
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(account_id)
    .bind(limit)
    .fetch_all(executor)
    .await?;

    rows.into_iter().map(LedgerEntry::try_from).collect()
}
