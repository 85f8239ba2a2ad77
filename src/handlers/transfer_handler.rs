//! Transfer Handler
//!
//! Moves funds between two accounts owned by the caller.

use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::auth::SessionResolver;
use crate::domain::{Amount, DomainError, EntryType, OperationContext};
use crate::error::AppResult;
use crate::state::AppState;
use crate::store::{accounts, ledger, NewLedgerEntry, Store};

use super::retry::{version_conflict, with_conflict_retry};
use super::{TransferCommand, TransferResult};

/// Handler for transfers
pub struct TransferHandler {
    store: Store,
    sessions: SessionResolver,
}

impl TransferHandler {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            sessions: state.sessions.clone(),
        }
    }

    /// Execute the transfer command.
    ///
    /// Both legs commit together or the transaction is rolled back; a version
    /// conflict reruns the whole unit.
    pub async fn execute(
        &self,
        command: TransferCommand,
        context: &OperationContext,
    ) -> AppResult<TransferResult> {
        let amount = Amount::new(command.amount)?;

        if command.from_account_id == command.to_account_id {
            return Err(DomainError::SameAccountTransfer.into());
        }

        let user_id = self.sessions.resolve(&command.token).await?;
        let (from_account_id, to_account_id) = (command.from_account_id, command.to_account_id);

        let store = &self.store;
        let result = with_conflict_retry("transfer", move || {
            store.with_transaction(move |conn| {
                Box::pin(transfer_tx(
                    conn,
                    user_id,
                    from_account_id,
                    to_account_id,
                    amount,
                ))
            })
        })
        .await?;

        tracing::info!(
            user_id,
            journal_id = %result.journal_id,
            from_account_id,
            to_account_id,
            amount = %result.amount,
            correlation_id = ?context.correlation_id,
            "Transfer completed"
        );

        Ok(result)
    }
}

async fn transfer_tx(
    conn: &mut SqliteConnection,
    user_id: i64,
    from_account_id: i64,
    to_account_id: i64,
    amount: Amount,
) -> AppResult<TransferResult> {
    let from = accounts::find_account(&mut *conn, from_account_id, user_id)
        .await?
        .ok_or_else(|| DomainError::AccountNotFound(from_account_id.to_string()))?;
    let to = accounts::find_account(&mut *conn, to_account_id, user_id)
        .await?
        .ok_or_else(|| DomainError::AccountNotFound(to_account_id.to_string()))?;

    if !from.balance.is_sufficient_for(&amount) {
        return Err(DomainError::insufficient_funds(amount.value(), from.balance.value()).into());
    }

    let from_balance = from.balance.debit(&amount)?;
    let to_balance = to.balance.credit(&amount)?;

    if !accounts::update_account_balance(&mut *conn, from.id, from.version, from_balance).await? {
        return Err(version_conflict(from.id, from.version));
    }
    if !accounts::update_account_balance(&mut *conn, to.id, to.version, to_balance).await? {
        return Err(version_conflict(to.id, to.version));
    }

    let journal_id = Uuid::new_v4();
    let legs = [
        NewLedgerEntry {
            account_id: from.id,
            journal_id,
            entry_type: EntryType::Debit,
            amount,
            balance_after: from_balance,
            description: format!("Transfer to account {}", to.id),
        },
        NewLedgerEntry {
            account_id: to.id,
            journal_id,
            entry_type: EntryType::Credit,
            amount,
            balance_after: to_balance,
            description: format!("Transfer from account {}", from.id),
        },
    ];
    for leg in &legs {
        ledger::insert_ledger_entry(&mut *conn, leg).await?;
    }

    Ok(TransferResult {
        journal_id,
        from_account_id: from.id,
        to_account_id: to.id,
        amount: amount.value(),
        from_balance,
        to_balance,
    })
}
