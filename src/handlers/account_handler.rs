//! Account Handlers
//!
//! Listing, opening and ledger history of the caller's accounts.

use crate::auth::SessionResolver;
use crate::domain::{Account, Balance, DomainError, LedgerEntry, OperationContext};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::store::{accounts, ledger, Store};

use super::{AccountHistoryQuery, CreateAccountCommand};

/// Longest accepted account type label
pub const MAX_ACCOUNT_TYPE_LEN: usize = 64;

/// History page size when the caller gives none
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// Largest history page a caller may request
pub const MAX_HISTORY_LIMIT: i64 = 500;

/// Handler for listing the caller's accounts
pub struct ListAccountsHandler {
    store: Store,
    sessions: SessionResolver,
}

impl ListAccountsHandler {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            sessions: state.sessions.clone(),
        }
    }

    pub async fn execute(&self, token: &str, context: &OperationContext) -> AppResult<Vec<Account>> {
        let user_id = self.sessions.resolve(token).await?;
        let accounts = accounts::list_accounts_for_user(self.store.pool(), user_id).await?;

        tracing::debug!(
            user_id,
            count = accounts.len(),
            correlation_id = ?context.correlation_id,
            "Accounts listed"
        );

        Ok(accounts)
    }
}

/// Handler for opening an additional account
pub struct CreateAccountHandler {
    store: Store,
    sessions: SessionResolver,
}

impl CreateAccountHandler {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            sessions: state.sessions.clone(),
        }
    }

    /// Any non-empty type is accepted, duplicates included.
    pub async fn execute(
        &self,
        command: CreateAccountCommand,
        context: &OperationContext,
    ) -> AppResult<Account> {
        let account_type = command.account_type.trim();
        if account_type.is_empty() {
            return Err(AppError::InvalidRequest("account type must not be empty".to_string()));
        }
        if account_type.len() > MAX_ACCOUNT_TYPE_LEN {
            return Err(AppError::InvalidRequest(format!(
                "account type must be at most {} bytes",
                MAX_ACCOUNT_TYPE_LEN
            )));
        }

        let user_id = self.sessions.resolve(&command.token).await?;
        let account =
            accounts::create_account(self.store.pool(), user_id, account_type, Balance::zero())
                .await?;

        tracing::info!(
            user_id,
            account_id = account.id,
            account_type = %account.account_type,
            correlation_id = ?context.correlation_id,
            "Account created"
        );

        Ok(account)
    }
}

/// Handler for an account's ledger history
pub struct AccountHistoryHandler {
    store: Store,
    sessions: SessionResolver,
}

impl AccountHistoryHandler {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            sessions: state.sessions.clone(),
        }
    }

    pub async fn execute(
        &self,
        query: AccountHistoryQuery,
        context: &OperationContext,
    ) -> AppResult<Vec<LedgerEntry>> {
        let user_id = self.sessions.resolve(&query.token).await?;

        let account = accounts::find_account(self.store.pool(), query.account_id, user_id)
            .await?
            .ok_or_else(|| DomainError::AccountNotFound(query.account_id.to_string()))?;

        let limit = query
            .limit
            .unwrap_or(DEFAULT_HISTORY_LIMIT)
            .clamp(1, MAX_HISTORY_LIMIT);
        let entries = ledger::list_ledger_entries(self.store.pool(), account.id, limit).await?;

        tracing::debug!(
            user_id,
            account_id = account.id,
            count = entries.len(),
            correlation_id = ?context.correlation_id,
            "Account history fetched"
        );

        Ok(entries)
    }
}
