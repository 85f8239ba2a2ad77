//! Domain module
//!
//! Core domain types and business logic.

pub mod amount;
pub mod context;
pub mod error;
pub mod models;

pub use amount::{Amount, AmountError, Balance};
pub use context::OperationContext;
pub use error::DomainError;
pub use models::{
    Account, EntryType, LedgerEntry, Session, User, DEFAULT_ACCOUNT_TYPES, PRIMARY_ACCOUNT_TYPE,
};
