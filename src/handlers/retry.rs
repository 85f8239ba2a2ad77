//! Optimistic-concurrency retry
//!
//! Balance writes fail with `DomainError::VersionConflict` when another
//! request changed the account between read and write, and SQLite reports
//! busy when a concurrent writer holds the lock. Either way the whole unit of
//! work was rolled back, so it is safe to run it again from scratch.

use std::future::Future;
use std::time::Duration;

use crate::domain::DomainError;
use crate::error::{AppError, AppResult};

/// Attempts before a conflict is reported to the caller
pub const MAX_ATTEMPTS: u32 = 3;

const BACKOFF_STEP: Duration = Duration::from_millis(20);

/// Run `attempt` until it succeeds, fails with a non-retryable error, or
/// `MAX_ATTEMPTS` is reached.
pub async fn with_conflict_retry<T, F, Fut>(operation: &'static str, mut attempt: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<T>>,
{
    let mut tries = 0;
    loop {
        tries += 1;
        match attempt().await {
            Err(ref err) if err.is_retryable() && tries < MAX_ATTEMPTS => {
                tracing::warn!(
                    operation,
                    attempt = tries,
                    max_attempts = MAX_ATTEMPTS,
                    error = %err,
                    "Concurrent balance update, retrying"
                );
                tokio::time::sleep(BACKOFF_STEP * tries).await;
            }
            outcome => return outcome,
        }
    }
}

/// Shorthand for the conflict raised when a versioned update touches no row
pub(crate) fn version_conflict(account_id: i64, expected: i64) -> AppError {
    AppError::Domain(DomainError::VersionConflict {
        account_id,
        expected,
    })
}
