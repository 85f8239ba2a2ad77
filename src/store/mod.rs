//! Storage layer
//!
//! All reads and writes against the SQLite database. Query functions are
//! generic over `sqlx::Executor`, so the same function runs on the pool or
//! on the connection handed out by [`Store::with_transaction`].

pub mod accounts;
mod error;
pub mod ledger;
pub mod sessions;
pub mod users;

use std::future::Future;
use std::pin::Pin;

use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool};

pub use error::StoreError;
pub use ledger::NewLedgerEntry;

/// Future returned by a unit of work passed to [`Store::with_transaction`]
pub type TxFuture<'t, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 't>>;

/// Owns the connection pool
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Create a new Store with a database pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run `work` inside one write transaction.
    ///
    /// The transaction is opened with `BEGIN IMMEDIATE`, so the write lock is
    /// taken before `work` reads anything and a concurrent writer makes us
    /// wait for the busy timeout instead of failing on a stale snapshot.
    /// Commits when `work` returns `Ok`, rolls back when it returns `Err`.
    pub async fn with_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: for<'t> FnOnce(&'t mut SqliteConnection) -> TxFuture<'t, T, E> + Send,
        T: Send,
        E: From<StoreError> + Send,
    {
        let mut tx = ImmediateTransaction::begin(&self.pool).await?;
        let result = work(tx.connection()).await;

        match result {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(err) => {
                tx.rollback().await;
                Err(err)
            }
        }
    }
}

/// Pooled connection inside `BEGIN IMMEDIATE`.
///
/// If dropped before `commit` or `rollback` (cancelled request, panic), the
/// connection is detached from the pool and closed, which makes SQLite roll
/// the transaction back; it never goes back to the pool mid-transaction.
struct ImmediateTransaction {
    conn: Option<PoolConnection<Sqlite>>,
}

impl ImmediateTransaction {
    async fn begin(pool: &SqlitePool) -> Result<Self, StoreError> {
        let mut conn = pool.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
        Ok(Self { conn: Some(conn) })
    }

    fn connection(&mut self) -> &mut SqliteConnection {
        // Only `commit`, `rollback` and `drop` empty the slot, and they consume the guard
        self.conn
            .as_deref_mut()
            .unwrap_or_else(|| unreachable!("transaction already finished"))
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        let Some(mut conn) = self.conn.take() else {
            return Ok(());
        };

        if let Err(commit_err) = sqlx::query("COMMIT").execute(&mut *conn).await {
            if let Err(rollback_err) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                tracing::error!(error = %rollback_err, "Rollback after failed commit failed");
                drop(conn.detach());
            }
            return Err(commit_err.into());
        }

        Ok(())
    }

    async fn rollback(mut self) {
        let Some(mut conn) = self.conn.take() else {
            return;
        };

        if let Err(rollback_err) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
            tracing::error!(error = %rollback_err, "Transaction rollback failed");
            drop(conn.detach());
        }
    }
}

impl Drop for ImmediateTransaction {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            tracing::warn!("Transaction abandoned before completion, closing its connection");
            drop(conn.detach());
        }
    }
}
