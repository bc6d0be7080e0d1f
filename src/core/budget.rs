//! Budget business logic: period resolution, renewal, and spent tracking.
//!
//! A budget's `spent_amount` is a materialized running total maintained by the
//! transaction processor; this module owns the two pieces of temporal logic
//! around it. The *resolver* locates the budget whose window covers a
//! transaction date. The *renewal engine* advances an expired window forward,
//! one period at a time, until it covers the present day, resetting the spent
//! total for each new period. Renewal happens lazily on read paths; no renewal
//! history is kept.

use crate::{
    entities::{Budget, BudgetPeriod, budget},
    errors::{Error, Result},
};
use chrono::{Days, Months, NaiveDate};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, info};

/// Advances a date by one budget period.
///
/// Monthly periods keep the day-of-month (clamped by `chrono` at month ends,
/// e.g. Jan 31 -> Feb 28/29). The only failure is a date outside chrono's
/// representable range.
fn advance_period(period: BudgetPeriod, date: NaiveDate) -> Result<NaiveDate> {
    let next = match period {
        BudgetPeriod::Weekly => date.checked_add_days(Days::new(7)),
        BudgetPeriod::Monthly => date.checked_add_months(Months::new(1)),
        BudgetPeriod::Yearly => date.checked_add_months(Months::new(12)),
    };
    next.ok_or_else(|| Error::Validation {
        message: format!("Budget period advance out of range from {date}"),
    })
}

/// Finds the budget whose `[start_date, end_date]` window covers `date`, if any.
///
/// Both window ends are inclusive. When windows overlap, the budget with the
/// most recent `start_date` wins; this is a deterministic tie-break rather than
/// incidental scan order. No match is not an error - the caller treats it as
/// "no budget tracks this transaction."
pub async fn find_covering_budget<C>(
    db: &C,
    user_id: i64,
    date: NaiveDate,
) -> Result<Option<budget::Model>>
where
    C: ConnectionTrait,
{
    Budget::find()
        .filter(budget::Column::UserId.eq(user_id))
        .filter(budget::Column::StartDate.lte(date))
        .filter(budget::Column::EndDate.gte(date))
        .order_by_desc(budget::Column::StartDate)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Adds a signed delta to a budget's spent total atomically.
///
/// Like the account balance mutator, this is a single SQL column add so that
/// concurrent expense postings against the same budget cannot lose updates.
pub async fn add_to_spent<C>(db: &C, budget_id: i64, delta: Decimal) -> Result<()>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    Budget::update_many()
        .col_expr(
            budget::Column::SpentAmount,
            Expr::col(budget::Column::SpentAmount).add(delta),
        )
        .filter(budget::Column::Id.eq(budget_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Renews a budget whose window has expired relative to `today`.
///
/// Each renewal step sets `start_date` to the old `end_date` and advances
/// `end_date` by one period, resetting `spent_amount` to zero. The step repeats
/// until the window is no longer expired, so a budget several periods behind
/// never lands on an already-expired window. The updated budget is persisted
/// once, after the loop. A budget that is still active is returned unchanged.
///
/// `today` is injected by the caller (normally `Utc::now().date_naive()`) so
/// renewal is deterministic under test.
pub async fn renew_budget_if_expired(
    db: &DatabaseConnection,
    budget: budget::Model,
    today: NaiveDate,
) -> Result<budget::Model> {
    if budget.end_date >= today {
        return Ok(budget);
    }

    let old_start = budget.start_date;
    let mut start = budget.start_date;
    let mut end = budget.end_date;
    while end < today {
        start = end;
        end = advance_period(budget.period, end)?;
    }

    let budget_id = budget.id;
    let mut active: budget::ActiveModel = budget.into();
    active.start_date = Set(start);
    active.end_date = Set(end);
    active.spent_amount = Set(Decimal::ZERO);
    let renewed = active.update(db).await?;

    info!(
        "Auto-renewed budget {}: {} -> {}",
        budget_id, old_start, renewed.start_date
    );
    Ok(renewed)
}

/// Retrieves a user's budgets, most recently started first, transitioning any
/// expired window through the renewal engine before returning it.
pub async fn list_budgets_for_user(
    db: &DatabaseConnection,
    user_id: i64,
    today: NaiveDate,
) -> Result<Vec<budget::Model>> {
    let budgets = Budget::find()
        .filter(budget::Column::UserId.eq(user_id))
        .order_by_desc(budget::Column::StartDate)
        .all(db)
        .await?;

    let mut current = Vec::with_capacity(budgets.len());
    for budget in budgets {
        current.push(renew_budget_if_expired(db, budget, today).await?);
    }
    Ok(current)
}

/// Finds a budget by its unique ID, returning None if absent.
pub async fn get_budget_by_id(
    db: &DatabaseConnection,
    budget_id: i64,
) -> Result<Option<budget::Model>> {
    Budget::find_by_id(budget_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new budget with a zero spent total.
pub async fn create_budget(
    db: &DatabaseConnection,
    user_id: i64,
    period: BudgetPeriod,
    start_date: NaiveDate,
    end_date: NaiveDate,
    amount_limit: Decimal,
) -> Result<budget::Model> {
    if end_date <= start_date {
        return Err(Error::InvalidPeriod {
            start: start_date,
            end: end_date,
        });
    }

    let budget = budget::ActiveModel {
        user_id: Set(user_id),
        period: Set(period),
        start_date: Set(start_date),
        end_date: Set(end_date),
        amount_limit: Set(amount_limit),
        spent_amount: Set(Decimal::ZERO),
        ..Default::default()
    };

    let result = budget.insert(db).await?;
    debug!("Created budget {} for user {}", result.id, user_id);
    Ok(result)
}

/// Overwrites a budget's period, window, limit, and spent total.
///
/// The spent total may be set directly here; this is the administrative edit
/// path, not the incremental tracking path.
#[allow(clippy::too_many_arguments)]
pub async fn update_budget(
    db: &DatabaseConnection,
    budget_id: i64,
    period: BudgetPeriod,
    start_date: NaiveDate,
    end_date: NaiveDate,
    amount_limit: Decimal,
    spent_amount: Decimal,
) -> Result<budget::Model> {
    if end_date <= start_date {
        return Err(Error::InvalidPeriod {
            start: start_date,
            end: end_date,
        });
    }

    let budget = Budget::find_by_id(budget_id)
        .one(db)
        .await?
        .ok_or(Error::BudgetNotFound { id: budget_id })?;

    let mut active: budget::ActiveModel = budget.into();
    active.period = Set(period);
    active.start_date = Set(start_date);
    active.end_date = Set(end_date);
    active.amount_limit = Set(amount_limit);
    active.spent_amount = Set(spent_amount);

    active.update(db).await.map_err(Into::into)
}

/// Removes a budget.
pub async fn delete_budget(db: &DatabaseConnection, budget_id: i64) -> Result<()> {
    let budget = Budget::find_by_id(budget_id)
        .one(db)
        .await?
        .ok_or(Error::BudgetNotFound { id: budget_id })?;

    budget.delete(db).await?;
    info!("Deleted budget {}", budget_id);
    Ok(())
}
