//! Command Handlers module
//!
//! Handlers that orchestrate business operations. Each handler resolves the
//! caller's session, validates input and runs its storage work, inside one
//! transaction wherever balances change.

mod account_handler;
mod commands;
mod deposit_handler;
mod retry;
mod session_handler;
mod transfer_handler;
mod user_handler;

#[cfg(test)]
mod tests;

pub use account_handler::{
    AccountHistoryHandler, CreateAccountHandler, ListAccountsHandler, DEFAULT_HISTORY_LIMIT,
    MAX_ACCOUNT_TYPE_LEN, MAX_HISTORY_LIMIT,
};
pub use commands::*;
pub use deposit_handler::DepositHandler;
pub use retry::{with_conflict_retry, MAX_ATTEMPTS};
pub use session_handler::LoginHandler;
pub use transfer_handler::TransferHandler;
pub use user_handler::{ProfileHandler, RegisterUserHandler, MAX_USERNAME_LEN};
