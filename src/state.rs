//! Shared router state

use std::time::Duration;

use sqlx::SqlitePool;

use crate::auth::SessionResolver;
use crate::store::Store;

/// State handed to every request handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Store,
    pub sessions: SessionResolver,
}

impl AppState {
    pub fn new(pool: SqlitePool, session_ttl: Duration) -> Self {
        let store = Store::new(pool);
        let sessions = SessionResolver::new(store.clone(), session_ttl);
        Self { store, sessions }
    }
}
