//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Longest accepted session lifetime (ten years)
pub const MAX_SESSION_TTL_MINUTES: u64 = 10 * 365 * 24 * 60;

/// Longest accepted pause between expired-session sweeps (one week)
pub const MAX_SESSION_CLEANUP_INTERVAL_SECS: u64 = 7 * 24 * 60 * 60;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL (SQLite file)
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// How long an issued session token stays valid
    pub session_ttl: Duration,

    /// Interval between expired-session sweeps
    pub session_cleanup_interval: Duration,

    /// Log output format
    pub log_format: LogFormat,
}

/// Log output format for the tracing subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidValue("LOG_FORMAT")),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// `from_env` delegates here; tests pass a map instead of mutating the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url =
            lookup("DATABASE_URL").unwrap_or_else(|| "sqlite://bank.db".to_string());

        let database_max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?;

        let host = lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string());

        let port = parse_or(&lookup, "PORT", 3001)?;

        let environment = lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string());

        let ttl_minutes: u64 = parse_or(&lookup, "SESSION_TTL_MINUTES", 1440)?;
        if ttl_minutes == 0 || ttl_minutes > MAX_SESSION_TTL_MINUTES {
            return Err(ConfigError::InvalidValue("SESSION_TTL_MINUTES"));
        }
        let ttl_secs = ttl_minutes
            .checked_mul(60)
            .ok_or(ConfigError::InvalidValue("SESSION_TTL_MINUTES"))?;

        let cleanup_secs: u64 = parse_or(&lookup, "SESSION_CLEANUP_INTERVAL_SECS", 300)?;
        if cleanup_secs == 0 || cleanup_secs > MAX_SESSION_CLEANUP_INTERVAL_SECS {
            return Err(ConfigError::InvalidValue("SESSION_CLEANUP_INTERVAL_SECS"));
        }

        let log_format = match lookup("LOG_FORMAT") {
            Some(value) => value.parse()?,
            None => LogFormat::Pretty,
        };

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            session_ttl: Duration::from_secs(ttl_secs),
            session_cleanup_interval: Duration::from_secs(cleanup_secs),
            log_format,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue(key)),
        None => Ok(default),
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}
