//! Login Handler
//!
//! Verifies credentials and issues a session token.

use crate::auth::{verify_dummy_password, verify_password, SessionResolver};
use crate::domain::OperationContext;
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::store::{users, Store};

use super::{LoginCommand, LoginResult};

/// Handler for login
pub struct LoginHandler {
    store: Store,
    sessions: SessionResolver,
}

impl LoginHandler {
    pub fn new(state: &AppState) -> Self {
        Self {
            store: state.store.clone(),
            sessions: state.sessions.clone(),
        }
    }

    /// Execute the login command.
    ///
    /// Unknown users and wrong passwords are indistinguishable to the caller,
    /// in the response and in the Argon2 work done, and neither creates a
    /// session.
    pub async fn execute(
        &self,
        command: LoginCommand,
        context: &OperationContext,
    ) -> AppResult<LoginResult> {
        let user = users::find_user_by_username(self.store.pool(), &command.username).await?;

        let Some(user) = user else {
            verify_dummy_password(command.password).await?;
            tracing::info!(
                username = %command.username,
                correlation_id = ?context.correlation_id,
                "Login rejected: unknown user"
            );
            return Err(AppError::InvalidCredentials);
        };

        if !verify_password(command.password, user.password_hash.clone()).await? {
            tracing::info!(
                user_id = user.id,
                correlation_id = ?context.correlation_id,
                "Login rejected: wrong password"
            );
            return Err(AppError::InvalidCredentials);
        }

        let issued = self.sessions.issue(user.id).await?;

        tracing::info!(
            user_id = user.id,
            session_id = issued.session_id,
            expires_at = %issued.expires_at,
            correlation_id = ?context.correlation_id,
            "Session issued"
        );

        Ok(LoginResult {
            user_id: user.id,
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }
}
