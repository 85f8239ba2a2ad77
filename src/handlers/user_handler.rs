//! User Handlers
//!
//! Registration (with the default account set) and profile lookup.

use sqlx::SqliteConnection;

use crate::auth::{hash_password, SessionResolver};
use crate::domain::{Balance, OperationContext, DEFAULT_ACCOUNT_TYPES};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::store::{accounts, users, Store};

use super::{ProfileResult, RegisterCommand, RegisterResult};

/// Longest accepted username
pub const MAX_USERNAME_LEN: usize = 64;

// =========================================================================
// RegisterUserHandler
// =========================================================================

/// Handler for user registration
pub struct RegisterUserHandler {
    store: Store,
}

impl RegisterUserHandler {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
        }
    }

    /// Execute the register command
    pub async fn execute(
        &self,
        command: RegisterCommand,
        context: &OperationContext,
    ) -> AppResult<RegisterResult> {
        if command.username.trim().is_empty() {
            return Err(AppError::InvalidRequest("username must not be empty".to_string()));
        }
        if command.username.len() > MAX_USERNAME_LEN {
            return Err(AppError::InvalidRequest(format!(
                "username must be at most {} bytes",
                MAX_USERNAME_LEN
            )));
        }
        if command.password.is_empty() {
            return Err(AppError::InvalidRequest("password must not be empty".to_string()));
        }

        let password_hash = hash_password(command.password).await?;
        let username = command.username;

        // User row and its default accounts land together or not at all
        let result = self
            .store
            .with_transaction(move |conn| Box::pin(register_tx(conn, username, password_hash)))
            .await?;

        tracing::info!(
            user_id = result.user_id,
            username = %result.username,
            accounts = ?result.account_ids,
            correlation_id = ?context.correlation_id,
            "User registered"
        );

        Ok(result)
    }
}

async fn register_tx(
    conn: &mut SqliteConnection,
    username: String,
    password_hash: String,
) -> AppResult<RegisterResult> {
    let user_id = match users::create_user(&mut *conn, &username, &password_hash).await {
        Ok(user_id) => user_id,
        Err(e) if e.is_unique_violation() => return Err(AppError::UsernameTaken(username)),
        Err(e) => return Err(e.into()),
    };

    let mut account_ids = Vec::with_capacity(DEFAULT_ACCOUNT_TYPES.len());
    for account_type in DEFAULT_ACCOUNT_TYPES {
        let account =
            accounts::create_account(&mut *conn, user_id, account_type, Balance::zero()).await?;
        account_ids.push(account.id);
    }

    Ok(RegisterResult {
        user_id,
        username,
        account_ids,
    })
}

// =========================================================================
// ProfileHandler
// =========================================================================

/// Handler for the authenticated user's profile
pub struct ProfileHandler {
    store: Store,
    sessions: SessionResolver,
}

impl ProfileHandler {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            sessions: state.sessions.clone(),
        }
    }

    pub async fn execute(&self, token: &str, context: &OperationContext) -> AppResult<ProfileResult> {
        let user_id = self.sessions.resolve(token).await?;

        let user = users::find_user_by_id(self.store.pool(), user_id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("session references missing user {}", user_id)))?;

        tracing::debug!(
            user_id,
            correlation_id = ?context.correlation_id,
            "Profile fetched"
        );

        Ok(ProfileResult {
            email: user.email(),
            username: user.username,
        })
    }
}
