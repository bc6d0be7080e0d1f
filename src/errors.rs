//! Unified error types for the ledger engine.
//!
//! Every processor operation returns a typed, recoverable failure from this
//! enum rather than panicking. Storage failures propagate opaquely through the
//! `Database` variant; callers log them and surface a generic message without
//! leaking internal detail.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// All failure modes of the core operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Referenced user does not exist
    #[error("User not found: {id}")]
    UserNotFound {
        /// The missing user id
        id: i64,
    },

    /// Referenced account does not exist
    #[error("Account not found: {id}")]
    AccountNotFound {
        /// The missing account id
        id: i64,
    },

    /// Referenced budget does not exist
    #[error("Budget not found: {id}")]
    BudgetNotFound {
        /// The missing budget id
        id: i64,
    },

    /// Referenced goal does not exist
    #[error("Goal not found: {id}")]
    GoalNotFound {
        /// The missing goal id
        id: i64,
    },

    /// Referenced subscription does not exist
    #[error("Subscription not found: {id}")]
    SubscriptionNotFound {
        /// The missing subscription id
        id: i64,
    },

    /// Referenced transaction does not exist
    #[error("Transaction not found: {id}")]
    TransactionNotFound {
        /// The missing transaction id
        id: i64,
    },

    /// A budget or goal window whose end does not come after its start
    #[error("Invalid period: end date {end} must be after start date {start}")]
    InvalidPeriod {
        /// Window start
        start: NaiveDate,
        /// Window end
        end: NaiveDate,
    },

    /// A debit larger than the account balance on a path that requires cover
    #[error("Insufficient funds: balance is {current}, required {required}")]
    InsufficientFunds {
        /// Current account balance
        current: Decimal,
        /// Amount the operation needed
        required: Decimal,
    },

    /// A monetary amount outside its allowed range
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The offending amount
        amount: Decimal,
    },

    /// Malformed input that reached the core, e.g. an unparseable time-of-day
    #[error("Validation error: {message}")]
    Validation {
        /// Human-readable description of what was malformed
        message: String,
    },

    /// Opaque storage failure from the persistence layer
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

/// Convenience `Result` type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
