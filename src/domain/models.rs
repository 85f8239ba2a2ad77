//! Domain entities
//!
//! Users own accounts and sessions; accounts own ledger entries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::Balance;

/// Account type used as the default deposit target
pub const PRIMARY_ACCOUNT_TYPE: &str = "primary";

/// Accounts opened for every new user
pub const DEFAULT_ACCOUNT_TYPES: [&str; 2] = [PRIMARY_ACCOUNT_TYPE, "savings"];

/// Registered user. The password is only ever held as an Argon2 PHC string.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Synthesized contact address shown on the profile
    pub fn email(&self) -> String {
        format!("{}@example.com", self.username)
    }
}

/// A named balance bucket owned by a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub account_type: String,
    pub balance: Balance,
    #[serde(skip)]
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

/// Login session. Only the SHA-256 digest of the bearer token is stored.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Direction of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryType {
    Credit,
    Debit,
}

impl EntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Credit => "credit",
            EntryType::Debit => "debit",
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit" => Ok(EntryType::Credit),
            "debit" => Ok(EntryType::Debit),
            other => Err(format!("unknown entry type '{}'", other)),
        }
    }
}

/// One balance mutation. A transfer writes a debit and a credit sharing a
/// journal ID; a deposit writes a single credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: i64,
    pub account_id: i64,
    pub journal_id: Uuid,
    pub entry_type: EntryType,
    pub amount: Decimal,
    pub balance_after: Balance,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
