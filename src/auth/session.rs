//! Session tokens
//!
//! Tokens are 32 bytes from the OS CSPRNG, hex encoded. The database only sees
//! their SHA-256 digest, which carries a UNIQUE constraint, so a token maps
//! to at most one session.

use chrono::{DateTime, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use std::time::Duration;

use crate::store::{sessions, Store, StoreError};

use super::AuthError;

/// Random bytes per token (hex doubles the length)
pub const TOKEN_BYTES: usize = 32;

const MAX_TOKEN_ATTEMPTS: u32 = 3;

/// Generate a fresh bearer token
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Digest stored in place of the token
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// A session just written to the store, with the cleartext token the caller
/// receives exactly once
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session_id: i64,
    pub user_id: i64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Issues session tokens and resolves them back to user IDs
#[derive(Debug, Clone)]
pub struct SessionResolver {
    store: Store,
    ttl: chrono::Duration,
}

impl SessionResolver {
    pub fn new(store: Store, ttl: Duration) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(365));
        Self { store, ttl }
    }

    /// Create a session for `user_id` expiring after the configured TTL
    pub async fn issue(&self, user_id: i64) -> Result<IssuedSession, AuthError> {
        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            let token = generate_token();
            let created_at = Utc::now();
            let expires_at = created_at
                .checked_add_signed(self.ttl)
                .ok_or(AuthError::ExpiryOutOfRange)?;

            match sessions::create_session(
                self.store.pool(),
                user_id,
                &hash_token(&token),
                created_at,
                expires_at,
            )
            .await
            {
                Ok(session_id) => {
                    return Ok(IssuedSession {
                        session_id,
                        user_id,
                        token,
                        expires_at,
                    })
                }
                Err(StoreError::UniqueViolation(_)) => {
                    tracing::warn!(user_id, attempt, "Session token collision, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(AuthError::TokenSpaceExhausted)
    }

    /// Resolve a caller-supplied token to the owning user ID
    pub async fn resolve(&self, token: &str) -> Result<i64, AuthError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        let session = sessions::find_session_by_token_hash(self.store.pool(), &hash_token(token))
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if session.is_expired(Utc::now()) {
            tracing::debug!(session_id = session.id, "Rejected expired session");
            return Err(AuthError::InvalidToken);
        }

        Ok(session.user_id)
    }
}
