//! Authentication
//!
//! Password hashing and session-token resolution.

pub mod password;
pub mod session;

pub use password::{hash_password, verify_dummy_password, verify_password};
pub use session::{generate_token, hash_token, IssuedSession, SessionResolver};

use crate::store::StoreError;

/// Authentication errors
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Token missing, unknown, or expired
    #[error("Invalid or expired session token")]
    InvalidToken,

    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Could not allocate a unique session token")]
    TokenSpaceExhausted,

    /// Session TTL pushes the expiry past the representable date range
    #[error("Session expiry out of range")]
    ExpiryOutOfRange,

    #[error(transparent)]
    Store(#[from] StoreError),
}
