//! Home dashboard aggregation.
//!
//! Read-only assembly of the dashboard view: accounts with net worth, the five
//! most recently started budgets, the thirty most recent transactions, and
//! income/expense totals across the user's whole history (not windowed by any
//! budget period). The only mutation is the renewal side effect inherited from
//! the budget renewal engine on expired budgets.

use crate::{
    core::budget::renew_budget_if_expired,
    entities::{
        Budget, Transaction, TransactionKind, User, account, budget, transaction,
    },
    errors::{Error, Result},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, QuerySelect, prelude::*};

/// How many budgets the dashboard shows.
const BUDGET_LIMIT: u64 = 5;
/// How many recent transactions the dashboard shows.
const TRANSACTION_LIMIT: u64 = 30;

/// Aggregated dashboard view for one user.
#[derive(Debug, Clone)]
pub struct HomeSummary {
    /// The user the summary belongs to
    pub user_id: i64,
    /// Display name
    pub username: String,
    /// All of the user's accounts
    pub accounts: Vec<account::Model>,
    /// Sum of all account balances
    pub net_worth: Decimal,
    /// Up to five most recently started budgets, renewed if expired
    pub budgets: Vec<budget::Model>,
    /// Up to thirty most recent transactions, newest first
    pub recent_transactions: Vec<transaction::Model>,
    /// Sum of all income transaction amounts, all time
    pub income_total: Decimal,
    /// Sum of all expense transaction amounts, all time
    pub expense_total: Decimal,
    /// `income_total - expense_total`
    pub net_flow: Decimal,
}

/// Assembles the dashboard for a user.
///
/// `today` drives the budget renewal side effect; callers pass
/// `Utc::now().date_naive()`.
pub async fn assemble_home_summary(
    db: &DatabaseConnection,
    user_id: i64,
    today: NaiveDate,
) -> Result<HomeSummary> {
    let user = User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(Error::UserNotFound { id: user_id })?;

    let accounts = crate::core::account::get_accounts_for_user(db, user_id).await?;
    let net_worth: Decimal = accounts.iter().map(|a| a.balance).sum();

    let raw_budgets = Budget::find()
        .filter(budget::Column::UserId.eq(user_id))
        .order_by_desc(budget::Column::StartDate)
        .limit(BUDGET_LIMIT)
        .all(db)
        .await?;
    let mut budgets = Vec::with_capacity(raw_budgets.len());
    for b in raw_budgets {
        budgets.push(renew_budget_if_expired(db, b, today).await?);
    }

    let recent_transactions = Transaction::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::Time)
        .limit(TRANSACTION_LIMIT)
        .all(db)
        .await?;

    // Totals span the entire history, not just the thirty shown above
    let all_transactions = crate::core::transaction::list_transactions_for_user(db, user_id).await?;
    let mut income_total = Decimal::ZERO;
    let mut expense_total = Decimal::ZERO;
    for t in &all_transactions {
        match t.kind {
            TransactionKind::Income => income_total += t.amount,
            TransactionKind::Expense => expense_total += t.amount,
        }
    }

    Ok(HomeSummary {
        user_id,
        username: user.username,
        accounts,
        net_worth,
        budgets,
        recent_transactions,
        income_total,
        expense_total,
        net_flow: income_total - expense_total,
    })
}
