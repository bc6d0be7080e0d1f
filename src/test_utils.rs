//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{account, transaction::NewTransaction, user},
    entities::{self, TransactionKind},
    errors::Result,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::str::FromStr;

/// Installs a test-writer tracing subscriber so `RUST_LOG` works in tests.
/// Safe to call repeatedly; only the first call installs.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    init_test_tracing();
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Parses a decimal literal, panicking on malformed test input.
pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).expect("valid decimal literal")
}

/// Builds a calendar date, panicking on malformed test input.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

/// Sets up a test environment with one registered user.
/// Returns (db, user) for user-scoped tests.
pub async fn setup_with_user() -> Result<(DatabaseConnection, entities::user::Model)> {
    let db = setup_test_db().await?;
    let user = user::create_user(
        &db,
        "testuser".to_string(),
        "test@example.com".to_string(),
        "hashed-password".to_string(),
    )
    .await?;
    Ok((db, user))
}

/// Sets up a test environment with one user owning a zero-balance account.
/// Returns (db, user, account) for ledger tests.
pub async fn setup_with_account() -> Result<(
    DatabaseConnection,
    entities::user::Model,
    entities::account::Model,
)> {
    let (db, user) = setup_with_user().await?;
    let account = account::create_account(
        &db,
        user.id,
        "Checking".to_string(),
        Decimal::ZERO,
        "TRY".to_string(),
    )
    .await?;
    Ok((db, user, account))
}

/// Builds a transaction input with sensible defaults.
///
/// # Defaults
/// * `title`: `"Test transaction"`
/// * `category`: `"General"`
/// * `note`: None
/// * `date`: 2024-01-15
/// * `time`: None (caller-side fallback to the current time-of-day)
pub fn new_test_transaction(
    user_id: i64,
    account_id: i64,
    kind: TransactionKind,
    amount: Decimal,
) -> NewTransaction {
    NewTransaction {
        user_id,
        account_id,
        kind,
        title: "Test transaction".to_string(),
        category: "General".to_string(),
        amount,
        note: None,
        date: date(2024, 1, 15),
        time: None,
    }
}
