//! Account business logic and the balance mutator.
//!
//! The balance mutator applies a signed delta to an account balance as a single
//! atomic SQL column update. Instead of reading the current balance, modifying
//! it, and writing it back (which can lose updates under concurrent postings),
//! it issues `UPDATE accounts SET balance = balance + delta WHERE id = ?`, so
//! two operations hitting the same account serialize at the storage layer.

use crate::{
    entities::{Account, TransactionKind, account},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{Set, prelude::*};
use tracing::info;

/// Maps a transaction to the signed delta it applies to an account balance:
/// positive for income, negative for expense.
#[must_use]
pub fn signed_amount(kind: TransactionKind, amount: Decimal) -> Decimal {
    match kind {
        TransactionKind::Income => amount,
        TransactionKind::Expense => -amount,
    }
}

/// Applies a signed delta to an account balance atomically.
///
/// Negative resulting balances are permitted; ordinary postings carry no
/// overdraft check. Paths that require cover (goal contributions, subscription
/// payments) check sufficiency before calling this.
///
/// # Arguments
/// * `db` - Database connection or transaction
/// * `account_id` - ID of the account to update
/// * `delta` - Signed amount to add to the balance
///
/// # Returns
/// The updated account model
pub async fn apply_balance_delta<C>(
    db: &C,
    account_id: i64,
    delta: Decimal,
) -> Result<account::Model>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    // First verify the account exists
    let _account = Account::find_by_id(account_id)
        .one(db)
        .await?
        .ok_or(Error::AccountNotFound { id: account_id })?;

    // Perform atomic update: balance = balance + delta
    Account::update_many()
        .col_expr(
            account::Column::Balance,
            Expr::col(account::Column::Balance).add(delta),
        )
        .filter(account::Column::Id.eq(account_id))
        .exec(db)
        .await?;

    Account::find_by_id(account_id)
        .one(db)
        .await?
        .ok_or(Error::AccountNotFound { id: account_id })
}

/// Retrieves all accounts belonging to a user.
pub async fn get_accounts_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<account::Model>> {
    Account::find()
        .filter(account::Column::UserId.eq(user_id))
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds an account by its unique ID, returning None if absent.
pub async fn get_account_by_id(
    db: &DatabaseConnection,
    account_id: i64,
) -> Result<Option<account::Model>> {
    Account::find_by_id(account_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new account for a user, validating that the user exists.
///
/// The opening balance is taken as given; it is the only balance that does not
/// come from a transaction.
pub async fn create_account(
    db: &DatabaseConnection,
    user_id: i64,
    name: String,
    balance: Decimal,
    currency: String,
) -> Result<account::Model> {
    if name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Account name cannot be empty".to_string(),
        });
    }

    let _user = crate::core::user::get_user_by_id(db, user_id)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    let account = account::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.trim().to_string()),
        balance: Set(balance),
        currency: Set(currency),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = account.insert(db).await?;
    info!("Created account {} for user {}", result.id, user_id);
    Ok(result)
}

/// Overwrites an account's name, balance, and currency.
///
/// This is the sanctioned direct balance correction: it does not reconcile
/// transaction history, it simply sets the stored balance.
pub async fn update_account(
    db: &DatabaseConnection,
    account_id: i64,
    name: String,
    balance: Decimal,
    currency: String,
) -> Result<account::Model> {
    let account = Account::find_by_id(account_id)
        .one(db)
        .await?
        .ok_or(Error::AccountNotFound { id: account_id })?;

    let mut active: account::ActiveModel = account.into();
    active.name = Set(name);
    active.balance = Set(balance);
    active.currency = Set(currency);

    let result = active.update(db).await?;
    info!("Updated account {}", account_id);
    Ok(result)
}

/// Removes an account along with its transactions, which the schema's
/// cascade rule deletes in the same statement.
pub async fn delete_account(db: &DatabaseConnection, account_id: i64) -> Result<()> {
    let account = Account::find_by_id(account_id)
        .one(db)
        .await?
        .ok_or(Error::AccountNotFound { id: account_id })?;

    account.delete(db).await?;
    info!("Deleted account {}", account_id);
    Ok(())
}
