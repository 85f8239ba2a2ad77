//! Command definitions
//!
//! Commands represent intentions to change (or read) the system state. Every
//! authenticated command carries the caller's session token.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;
use uuid::Uuid;

use crate::domain::Balance;

// =========================================================================
// Registration & login
// =========================================================================

/// Command to register a new user
#[derive(Clone)]
pub struct RegisterCommand {
    pub username: String,
    pub password: String,
}

impl RegisterCommand {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }
}

impl fmt::Debug for RegisterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterCommand")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Command to log in and obtain a session token
#[derive(Clone)]
pub struct LoginCommand {
    pub username: String,
    pub password: String,
}

impl LoginCommand {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }
}

impl fmt::Debug for LoginCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCommand")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

// =========================================================================
// Money movement
// =========================================================================

/// Command to deposit into the caller's primary account
#[derive(Debug, Clone)]
pub struct DepositCommand {
    pub token: String,
    /// Unvalidated; the handler turns it into an `Amount`
    pub amount: Decimal,
}

impl DepositCommand {
    pub fn new(token: String, amount: Decimal) -> Self {
        Self { token, amount }
    }
}

/// Command to move funds between two accounts owned by the caller
#[derive(Debug, Clone)]
pub struct TransferCommand {
    pub token: String,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Decimal,
}

impl TransferCommand {
    pub fn new(token: String, from_account_id: i64, to_account_id: i64, amount: Decimal) -> Self {
        Self {
            token,
            from_account_id,
            to_account_id,
            amount,
        }
    }
}

/// Command to open an additional account
#[derive(Debug, Clone)]
pub struct CreateAccountCommand {
    pub token: String,
    pub account_type: String,
}

impl CreateAccountCommand {
    pub fn new(token: String, account_type: String) -> Self {
        Self {
            token,
            account_type,
        }
    }
}

/// Query for the ledger of one account
#[derive(Debug, Clone)]
pub struct AccountHistoryQuery {
    pub token: String,
    pub account_id: i64,
    pub limit: Option<i64>,
}

impl AccountHistoryQuery {
    pub fn new(token: String, account_id: i64) -> Self {
        Self {
            token,
            account_id,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }
}

// =========================================================================
// Results
// =========================================================================

/// Result of a successful registration
#[derive(Debug, Clone)]
pub struct RegisterResult {
    pub user_id: i64,
    pub username: String,
    pub account_ids: Vec<i64>,
}

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user_id: i64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Profile of the authenticated user
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileResult {
    pub username: String,
    pub email: String,
}

/// Result of a successful deposit
#[derive(Debug, Clone)]
pub struct DepositResult {
    pub account_id: i64,
    pub journal_id: Uuid,
    pub amount: Decimal,
    pub new_balance: Balance,
}

/// Result of a successful transfer
#[derive(Debug, Clone)]
pub struct TransferResult {
    pub journal_id: Uuid,
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Decimal,
    pub from_balance: Balance,
    pub to_balance: Balance,
}
