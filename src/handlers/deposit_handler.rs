//! Deposit Handler
//!
//! Credits the caller's primary account.

use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::auth::SessionResolver;
use crate::domain::{Amount, DomainError, EntryType, OperationContext, PRIMARY_ACCOUNT_TYPE};
use crate::error::AppResult;
use crate::state::AppState;
use crate::store::{accounts, ledger, NewLedgerEntry, Store};

use super::retry::{version_conflict, with_conflict_retry};
use super::{DepositCommand, DepositResult};

/// Handler for deposits
pub struct DepositHandler {
    store: Store,
    sessions: SessionResolver,
}

impl DepositHandler {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            sessions: state.sessions.clone(),
        }
    }

    /// Execute the deposit command
    pub async fn execute(
        &self,
        command: DepositCommand,
        context: &OperationContext,
    ) -> AppResult<DepositResult> {
        let amount = Amount::new(command.amount)?;
        let user_id = self.sessions.resolve(&command.token).await?;

        let store = &self.store;
        let result = with_conflict_retry("deposit", move || {
            store.with_transaction(move |conn| Box::pin(deposit_tx(conn, user_id, amount)))
        })
        .await?;

        tracing::info!(
            user_id,
            account_id = result.account_id,
            journal_id = %result.journal_id,
            amount = %result.amount,
            new_balance = %result.new_balance,
            correlation_id = ?context.correlation_id,
            "Deposit completed"
        );

        Ok(result)
    }
}

async fn deposit_tx(
    conn: &mut SqliteConnection,
    user_id: i64,
    amount: Amount,
) -> AppResult<DepositResult> {
    let account = accounts::find_account_by_type(&mut *conn, user_id, PRIMARY_ACCOUNT_TYPE)
        .await?
        .ok_or_else(|| DomainError::AccountNotFound(PRIMARY_ACCOUNT_TYPE.to_string()))?;

    let new_balance = account.balance.credit(&amount)?;

    if !accounts::update_account_balance(&mut *conn, account.id, account.version, new_balance)
        .await?
    {
        return Err(version_conflict(account.id, account.version));
    }

    let journal_id = Uuid::new_v4();
    ledger::insert_ledger_entry(
        &mut *conn,
        &NewLedgerEntry {
            account_id: account.id,
            journal_id,
            entry_type: EntryType::Credit,
            amount,
            balance_after: new_balance,
            description: "Deposit".to_string(),
        },
    )
    .await?;

    Ok(DepositResult {
        account_id: account.id,
        journal_id,
        amount: amount.value(),
        new_balance,
    })
}
