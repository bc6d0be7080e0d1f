//! Goal business logic and contribution processing.
//!
//! A contribution moves funds from an account into a goal's progress as a
//! paired account debit + goal credit, recording an expense transaction as the
//! audit trail. Progress is one-way: editing or deleting the recorded
//! transaction later does not roll the goal back. Contributions require
//! sufficient funds, unlike ordinary expense postings.
//!
//! Contributions do not charge any budget's spent total even though they
//! record an expense. This mirrors the upstream product behavior; see
//! DESIGN.md for the flagged inconsistency.

use crate::{
    core::account::apply_balance_delta,
    entities::{Account, Goal, GoalKind, TransactionKind, goal, transaction},
    errors::{Error, Result},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// Outcome of a goal contribution: the updated goal, the balance left on the
/// debited account, and the transaction that recorded the movement.
#[derive(Debug, Clone)]
pub struct GoalContribution {
    /// Goal with its increased progress
    pub goal: goal::Model,
    /// Account balance after the debit
    pub new_account_balance: Decimal,
    /// The expense transaction recorded for the contribution
    pub transaction: transaction::Model,
}

/// Moves `amount` from an account into a goal's progress.
///
/// Requires the account to cover the amount (`InsufficientFunds` otherwise);
/// the check happens before any mutation, so a rejected contribution leaves
/// goal, account, and transaction state untouched. The debit, the progress
/// credit, and the recorded transaction commit as one unit. The transaction is
/// categorized "Savings" and titled after the goal, dated `now`.
pub async fn contribute_to_goal(
    db: &DatabaseConnection,
    goal_id: i64,
    account_id: i64,
    amount: Decimal,
    note: Option<String>,
    now: DateTime<Utc>,
) -> Result<GoalContribution> {
    if amount <= Decimal::ZERO {
        return Err(Error::InvalidAmount { amount });
    }

    let txn = db.begin().await?;

    let goal = Goal::find_by_id(goal_id)
        .one(&txn)
        .await?
        .ok_or(Error::GoalNotFound { id: goal_id })?;
    let account = Account::find_by_id(account_id)
        .one(&txn)
        .await?
        .ok_or(Error::AccountNotFound { id: account_id })?;

    if account.balance < amount {
        return Err(Error::InsufficientFunds {
            current: account.balance,
            required: amount,
        });
    }

    let updated_account = apply_balance_delta(&txn, account_id, -amount).await?;

    let goal_name = goal.name.clone();
    let goal_user_id = goal.user_id;
    let new_progress = goal.current_amount + amount;
    let mut active: goal::ActiveModel = goal.into();
    active.current_amount = Set(new_progress);
    let updated_goal = active.update(&txn).await?;

    let record = transaction::ActiveModel {
        user_id: Set(goal_user_id),
        account_id: Set(account_id),
        kind: Set(TransactionKind::Expense),
        title: Set(format!("Contribution to {goal_name}")),
        category: Set("Savings".to_string()),
        amount: Set(amount),
        note: Set(note),
        date: Set(now.date_naive()),
        time: Set(now.time()),
        ..Default::default()
    };
    let recorded = record.insert(&txn).await?;

    txn.commit().await?;

    info!(
        "Contributed {} from account {} to goal {}",
        amount, account_id, goal_id
    );
    Ok(GoalContribution {
        goal: updated_goal,
        new_account_balance: updated_account.balance,
        transaction: recorded,
    })
}

/// Retrieves a user's goals, most recently started first.
pub async fn list_goals_for_user(db: &DatabaseConnection, user_id: i64) -> Result<Vec<goal::Model>> {
    Goal::find()
        .filter(goal::Column::UserId.eq(user_id))
        .order_by_desc(goal::Column::StartDate)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a goal by its unique ID, returning None if absent.
pub async fn get_goal_by_id(db: &DatabaseConnection, goal_id: i64) -> Result<Option<goal::Model>> {
    Goal::find_by_id(goal_id).one(db).await.map_err(Into::into)
}

/// Creates a new goal with zero progress.
pub async fn create_goal(
    db: &DatabaseConnection,
    user_id: i64,
    kind: GoalKind,
    name: String,
    target_amount: Decimal,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<goal::Model> {
    if name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Goal name cannot be empty".to_string(),
        });
    }
    if end_date <= start_date {
        return Err(Error::InvalidPeriod {
            start: start_date,
            end: end_date,
        });
    }

    let goal = goal::ActiveModel {
        user_id: Set(user_id),
        kind: Set(kind),
        name: Set(name.trim().to_string()),
        target_amount: Set(target_amount),
        current_amount: Set(Decimal::ZERO),
        start_date: Set(start_date),
        end_date: Set(end_date),
        ..Default::default()
    };

    let result = goal.insert(db).await?;
    debug!("Created goal {} for user {}", result.id, user_id);
    Ok(result)
}

/// Overwrites a goal's fields, including its progress (administrative edit).
#[allow(clippy::too_many_arguments)]
pub async fn update_goal(
    db: &DatabaseConnection,
    goal_id: i64,
    kind: GoalKind,
    name: String,
    target_amount: Decimal,
    current_amount: Decimal,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<goal::Model> {
    if end_date <= start_date {
        return Err(Error::InvalidPeriod {
            start: start_date,
            end: end_date,
        });
    }

    let goal = Goal::find_by_id(goal_id)
        .one(db)
        .await?
        .ok_or(Error::GoalNotFound { id: goal_id })?;

    let mut active: goal::ActiveModel = goal.into();
    active.kind = Set(kind);
    active.name = Set(name);
    active.target_amount = Set(target_amount);
    active.current_amount = Set(current_amount);
    active.start_date = Set(start_date);
    active.end_date = Set(end_date);

    active.update(db).await.map_err(Into::into)
}

/// Removes a goal. Transactions recorded by past contributions stay.
pub async fn delete_goal(db: &DatabaseConnection, goal_id: i64) -> Result<()> {
    let goal = Goal::find_by_id(goal_id)
        .one(db)
        .await?
        .ok_or(Error::GoalNotFound { id: goal_id })?;

    goal.delete(db).await?;
    info!("Deleted goal {}", goal_id);
    Ok(())
}
