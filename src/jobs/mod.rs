//! Scheduled Jobs
//!
//! Background jobs for periodic maintenance tasks.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use crate::store::{sessions, StoreError};

// =========================================================================
// Expired Session Cleanup Job
// =========================================================================

/// Delete sessions whose expiry has passed.
///
/// Expired sessions are already rejected at resolve time; this only keeps the
/// table from growing without bound.
pub async fn delete_expired_sessions(pool: &SqlitePool) -> Result<u64, JobError> {
    let rows_deleted = sessions::delete_expired_sessions(pool, Utc::now()).await?;

    if rows_deleted > 0 {
        tracing::info!(rows_deleted, "Deleted expired sessions");
    }

    Ok(rows_deleted)
}

// =========================================================================
// Job Scheduler
// =========================================================================

/// Configuration for job scheduler
#[derive(Debug, Clone)]
pub struct JobSchedulerConfig {
    /// Interval for expired session cleanup (default: 5 minutes)
    pub session_cleanup_interval: Duration,
}

impl Default for JobSchedulerConfig {
    fn default() -> Self {
        Self {
            session_cleanup_interval: Duration::from_secs(300),
        }
    }
}

/// Job Scheduler - runs periodic maintenance tasks
pub struct JobScheduler {
    pool: SqlitePool,
    config: JobSchedulerConfig,
}

impl JobScheduler {
    /// Create a new job scheduler
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            config: JobSchedulerConfig::default(),
        }
    }

    /// Create with custom configuration
    pub fn with_config(pool: SqlitePool, config: JobSchedulerConfig) -> Self {
        Self { pool, config }
    }

    /// Start the job scheduler in the background.
    /// Returns a handle that can be used to abort the scheduler.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(&self) {
        tracing::info!(
            session_cleanup_interval_secs = self.config.session_cleanup_interval.as_secs(),
            "Job scheduler started"
        );

        let mut session_interval = interval(self.config.session_cleanup_interval);
        session_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            session_interval.tick().await;
            if let Err(e) = delete_expired_sessions(&self.pool).await {
                tracing::error!(error = %e, "Expired session cleanup failed");
            }
        }
    }

    /// Run all maintenance jobs once (for manual trigger or testing)
    pub async fn run_all_once(&self) -> MaintenanceReport {
        let mut report = MaintenanceReport::default();

        match delete_expired_sessions(&self.pool).await {
            Ok(count) => report.sessions_deleted = count,
            Err(e) => report.errors.push(format!("Session cleanup: {}", e)),
        }

        report.completed_at = Utc::now();
        report
    }
}

/// Report from running maintenance jobs
#[derive(Debug, Clone, Default)]
pub struct MaintenanceReport {
    pub sessions_deleted: u64,
    pub errors: Vec<String>,
    pub completed_at: DateTime<Utc>,
}

/// Job execution errors
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_scheduler_config_default() {
        let config = JobSchedulerConfig::default();
        assert_eq!(config.session_cleanup_interval, Duration::from_secs(300));
    }

    #[test]
    fn test_maintenance_report_default() {
        let report = MaintenanceReport::default();
        assert_eq!(report.sessions_deleted, 0);
        assert!(report.errors.is_empty());
    }
}
