//! Subscription business logic and billing.
//!
//! Paying a subscription debits the account by the monthly fee, records an
//! expense transaction, and advances the next payment date by exactly one
//! calendar month. Skipping a cycle advances the date without touching any
//! account. Both clear the overdue flag; the flag is raised lazily on the list
//! path when a due date has passed, in the same read-path-maintenance spirit
//! as budget renewal.

use crate::{
    core::account::apply_balance_delta,
    entities::{Account, Subscription, TransactionKind, subscription, transaction},
    errors::{Error, Result},
};
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// Outcome of a subscription payment.
#[derive(Debug, Clone)]
pub struct PaymentOutcome {
    /// Subscription with its advanced due date and cleared overdue flag
    pub subscription: subscription::Model,
    /// Account balance after the debit
    pub new_account_balance: Decimal,
    /// The expense transaction recorded for the payment
    pub transaction: transaction::Model,
}

/// Builds a date on `payment_day` of the given month, clamping to the last
/// day when the month is shorter (e.g. day 31 in February).
fn date_on_payment_day(year: i32, month: u32, payment_day: u32) -> Result<NaiveDate> {
    if let Some(date) = NaiveDate::from_ymd_opt(year, month, payment_day) {
        return Ok(date);
    }
    NaiveDate::from_ymd_opt(year, month, 1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .and_then(|next_first| next_first.checked_sub_days(Days::new(1)))
        .ok_or_else(|| Error::Validation {
            message: format!("No valid payment date for {year}-{month:02} day {payment_day}"),
        })
}

fn advance_one_month(date: NaiveDate) -> Result<NaiveDate> {
    date.checked_add_months(Months::new(1))
        .ok_or_else(|| Error::Validation {
            message: format!("Payment date advance out of range from {date}"),
        })
}

/// Creates a subscription, deriving the first due date from the payment day:
/// this month's occurrence, or next month's if it has already passed `today`.
pub async fn create_subscription(
    db: &DatabaseConnection,
    user_id: i64,
    name: String,
    category: String,
    monthly_fee: Decimal,
    payment_day: i32,
    today: NaiveDate,
) -> Result<subscription::Model> {
    if name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Subscription name cannot be empty".to_string(),
        });
    }
    if !(1..=31).contains(&payment_day) {
        return Err(Error::Validation {
            message: format!("Payment day must be between 1 and 31, got {payment_day}"),
        });
    }
    if monthly_fee < Decimal::ZERO {
        return Err(Error::InvalidAmount {
            amount: monthly_fee,
        });
    }

    let mut next_payment = date_on_payment_day(today.year(), today.month(), payment_day.unsigned_abs())?;
    if next_payment < today {
        next_payment = advance_one_month(next_payment)?;
    }

    let sub = subscription::ActiveModel {
        user_id: Set(user_id),
        name: Set(name.trim().to_string()),
        category: Set(category),
        monthly_fee: Set(monthly_fee),
        payment_day: Set(payment_day),
        next_payment_date: Set(next_payment),
        is_overdue: Set(false),
        ..Default::default()
    };

    let result = sub.insert(db).await?;
    debug!("Created subscription {} for user {}", result.id, user_id);
    Ok(result)
}

/// Charges one billing cycle against an account.
///
/// Requires the account to cover the monthly fee (`InsufficientFunds`
/// otherwise; the rejection leaves all state untouched). The debit, the
/// recorded transaction, and the due-date advance commit as one unit.
pub async fn pay_subscription(
    db: &DatabaseConnection,
    subscription_id: i64,
    account_id: i64,
    note: Option<String>,
    now: DateTime<Utc>,
) -> Result<PaymentOutcome> {
    let txn = db.begin().await?;

    let sub = Subscription::find_by_id(subscription_id)
        .one(&txn)
        .await?
        .ok_or(Error::SubscriptionNotFound {
            id: subscription_id,
        })?;
    let account = Account::find_by_id(account_id)
        .one(&txn)
        .await?
        .ok_or(Error::AccountNotFound { id: account_id })?;

    if account.balance < sub.monthly_fee {
        return Err(Error::InsufficientFunds {
            current: account.balance,
            required: sub.monthly_fee,
        });
    }

    let updated_account = apply_balance_delta(&txn, account_id, -sub.monthly_fee).await?;

    let record = transaction::ActiveModel {
        user_id: Set(sub.user_id),
        account_id: Set(account_id),
        kind: Set(TransactionKind::Expense),
        title: Set(format!("{} subscription payment", sub.name)),
        category: Set(sub.category.clone()),
        amount: Set(sub.monthly_fee),
        note: Set(note),
        date: Set(now.date_naive()),
        time: Set(now.time()),
        ..Default::default()
    };
    let recorded = record.insert(&txn).await?;

    let next = advance_one_month(sub.next_payment_date)?;
    let sub_id = sub.id;
    let mut active: subscription::ActiveModel = sub.into();
    active.next_payment_date = Set(next);
    active.is_overdue = Set(false);
    let updated_sub = active.update(&txn).await?;

    txn.commit().await?;

    info!(
        "Paid subscription {} from account {}, next due {}",
        sub_id, account_id, updated_sub.next_payment_date
    );
    Ok(PaymentOutcome {
        subscription: updated_sub,
        new_account_balance: updated_account.balance,
        transaction: recorded,
    })
}

/// Skips one billing cycle: advances the due date by a month and clears the
/// overdue flag without charging any account or recording a transaction.
pub async fn skip_subscription(
    db: &DatabaseConnection,
    subscription_id: i64,
) -> Result<subscription::Model> {
    let sub = Subscription::find_by_id(subscription_id)
        .one(db)
        .await?
        .ok_or(Error::SubscriptionNotFound {
            id: subscription_id,
        })?;

    let next = advance_one_month(sub.next_payment_date)?;
    let mut active: subscription::ActiveModel = sub.into();
    active.next_payment_date = Set(next);
    active.is_overdue = Set(false);
    let updated = active.update(db).await?;

    info!(
        "Skipped subscription {} cycle, next due {}",
        subscription_id, updated.next_payment_date
    );
    Ok(updated)
}

/// Retrieves a user's subscriptions ordered by payment day, flagging and
/// persisting `is_overdue` for any whose due date has passed.
pub async fn list_subscriptions_for_user(
    db: &DatabaseConnection,
    user_id: i64,
    today: NaiveDate,
) -> Result<Vec<subscription::Model>> {
    let subs = Subscription::find()
        .filter(subscription::Column::UserId.eq(user_id))
        .order_by_asc(subscription::Column::PaymentDay)
        .all(db)
        .await?;

    let mut current = Vec::with_capacity(subs.len());
    for sub in subs {
        if sub.next_payment_date < today && !sub.is_overdue {
            let mut active: subscription::ActiveModel = sub.into();
            active.is_overdue = Set(true);
            current.push(active.update(db).await?);
        } else {
            current.push(sub);
        }
    }
    Ok(current)
}

/// Finds a subscription by its unique ID, returning None if absent.
pub async fn get_subscription_by_id(
    db: &DatabaseConnection,
    subscription_id: i64,
) -> Result<Option<subscription::Model>> {
    Subscription::find_by_id(subscription_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Overwrites a subscription's name, category, fee, and payment day.
/// The already-scheduled next payment date is left alone.
pub async fn update_subscription(
    db: &DatabaseConnection,
    subscription_id: i64,
    name: String,
    category: String,
    monthly_fee: Decimal,
    payment_day: i32,
) -> Result<subscription::Model> {
    if !(1..=31).contains(&payment_day) {
        return Err(Error::Validation {
            message: format!("Payment day must be between 1 and 31, got {payment_day}"),
        });
    }
    if monthly_fee < Decimal::ZERO {
        return Err(Error::InvalidAmount {
            amount: monthly_fee,
        });
    }

    let sub = Subscription::find_by_id(subscription_id)
        .one(db)
        .await?
        .ok_or(Error::SubscriptionNotFound {
            id: subscription_id,
        })?;

    let mut active: subscription::ActiveModel = sub.into();
    active.name = Set(name);
    active.category = Set(category);
    active.monthly_fee = Set(monthly_fee);
    active.payment_day = Set(payment_day);

    active.update(db).await.map_err(Into::into)
}

/// Removes a subscription.
pub async fn delete_subscription(db: &DatabaseConnection, subscription_id: i64) -> Result<()> {
    let sub = Subscription::find_by_id(subscription_id)
        .one(db)
        .await?
        .ok_or(Error::SubscriptionNotFound {
            id: subscription_id,
        })?;

    sub.delete(db).await?;
    info!("Deleted subscription {}", subscription_id);
    Ok(())
}
