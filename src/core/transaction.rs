//! Transaction processing - the consistency-critical path of the ledger.
//!
//! Every transaction mutation keeps two derived totals correct without a
//! ledger history: the owning account's balance and, for expenses, the spent
//! total of the budget whose window covers the transaction date. Creation
//! applies the effect; deletion reverses it; an edit reverses the old effect
//! and applies the new one, resolving the covering budget independently for
//! the old and new dates so a transaction moving across period boundaries
//! credits one budget back and charges the other. Each operation runs inside
//! one database transaction so no partial application survives a failure.

use crate::{
    core::{
        account::{apply_balance_delta, signed_amount},
        budget::{add_to_spent, find_covering_budget},
    },
    entities::{Account, Transaction, TransactionKind, User, transaction},
    errors::{Error, Result},
};
use chrono::{NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use tracing::{debug, info};

/// Input record for creating a transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    /// Owning user
    pub user_id: i64,
    /// Account the movement applies to
    pub account_id: i64,
    /// Income or expense
    pub kind: TransactionKind,
    /// Short title
    pub title: String,
    /// Spending category
    pub category: String,
    /// Non-negative magnitude
    pub amount: Decimal,
    /// Optional note
    pub note: Option<String>,
    /// UTC calendar date of the movement
    pub date: NaiveDate,
    /// Raw time-of-day ("HH:MM" or "HH:MM:SS"); falls back to the current
    /// UTC time-of-day when absent or unparseable
    pub time: Option<String>,
}

/// Replacement field set for editing a transaction.
#[derive(Debug, Clone)]
pub struct TransactionChanges {
    /// New direction
    pub kind: TransactionKind,
    /// New title
    pub title: String,
    /// New category
    pub category: String,
    /// New non-negative magnitude
    pub amount: Decimal,
    /// New note
    pub note: Option<String>,
    /// New UTC calendar date
    pub date: NaiveDate,
    /// New time-of-day ("HH:MM" or "HH:MM:SS"); rejected as a validation
    /// error when unparseable
    pub time: String,
}

fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

/// Creates a transaction and applies its effect to the account balance and,
/// for expenses, to the covering budget's spent total.
///
/// Validates that the user and account exist and that the amount is a
/// non-negative magnitude. An expense dated outside every budget window simply
/// goes untracked by any budget. The new row, the balance change, and the
/// budget charge commit as one unit.
pub async fn create_transaction(
    db: &DatabaseConnection,
    new: NewTransaction,
) -> Result<transaction::Model> {
    if new.amount < Decimal::ZERO {
        return Err(Error::InvalidAmount { amount: new.amount });
    }

    let txn = db.begin().await?;

    User::find_by_id(new.user_id)
        .one(&txn)
        .await?
        .ok_or(Error::UserNotFound { id: new.user_id })?;
    Account::find_by_id(new.account_id)
        .one(&txn)
        .await?
        .ok_or(Error::AccountNotFound { id: new.account_id })?;

    let time = new
        .time
        .as_deref()
        .and_then(parse_time_of_day)
        .unwrap_or_else(|| Utc::now().time());

    let model = transaction::ActiveModel {
        user_id: Set(new.user_id),
        account_id: Set(new.account_id),
        kind: Set(new.kind),
        title: Set(new.title),
        category: Set(new.category),
        amount: Set(new.amount),
        note: Set(new.note),
        date: Set(new.date),
        time: Set(time),
        ..Default::default()
    };
    let created = model.insert(&txn).await?;

    apply_balance_delta(&txn, new.account_id, signed_amount(new.kind, new.amount)).await?;

    if new.kind == TransactionKind::Expense {
        if let Some(budget) = find_covering_budget(&txn, new.user_id, new.date).await? {
            add_to_spent(&txn, budget.id, new.amount).await?;
        }
    }

    txn.commit().await?;

    info!(
        "Created transaction {} ({:?} {}) on account {}",
        created.id, created.kind, created.amount, created.account_id
    );
    Ok(created)
}

/// Edits a transaction, reversing its old effect and applying the new one.
///
/// The old balance delta is undone and the old budget (resolved against the
/// *old* date) is credited back before the new fields take effect against the
/// account and the budget covering the *new* date. When the edit moves the
/// transaction across a period boundary the two resolutions hit different
/// budgets; when it stays put they hit the same budget once each way.
pub async fn update_transaction(
    db: &DatabaseConnection,
    transaction_id: i64,
    changes: TransactionChanges,
) -> Result<transaction::Model> {
    if changes.amount < Decimal::ZERO {
        return Err(Error::InvalidAmount {
            amount: changes.amount,
        });
    }
    let new_time = parse_time_of_day(&changes.time).ok_or_else(|| Error::Validation {
        message: format!("Unparseable time of day: {:?}", changes.time),
    })?;

    let txn = db.begin().await?;

    let existing = Transaction::find_by_id(transaction_id)
        .one(&txn)
        .await?
        .ok_or(Error::TransactionNotFound { id: transaction_id })?;
    Account::find_by_id(existing.account_id)
        .one(&txn)
        .await?
        .ok_or(Error::AccountNotFound {
            id: existing.account_id,
        })?;

    // Reverse the old effect
    apply_balance_delta(
        &txn,
        existing.account_id,
        -signed_amount(existing.kind, existing.amount),
    )
    .await?;
    if existing.kind == TransactionKind::Expense {
        if let Some(budget) = find_covering_budget(&txn, existing.user_id, existing.date).await? {
            add_to_spent(&txn, budget.id, -existing.amount).await?;
        }
    }

    let user_id = existing.user_id;
    let account_id = existing.account_id;

    let mut active: transaction::ActiveModel = existing.into();
    active.kind = Set(changes.kind);
    active.title = Set(changes.title);
    active.category = Set(changes.category);
    active.amount = Set(changes.amount);
    active.note = Set(changes.note);
    active.date = Set(changes.date);
    active.time = Set(new_time);
    let updated = active.update(&txn).await?;

    // Apply the new effect
    apply_balance_delta(&txn, account_id, signed_amount(changes.kind, changes.amount)).await?;
    if changes.kind == TransactionKind::Expense {
        if let Some(budget) = find_covering_budget(&txn, user_id, changes.date).await? {
            add_to_spent(&txn, budget.id, changes.amount).await?;
        }
    }

    txn.commit().await?;

    debug!("Updated transaction {}", transaction_id);
    Ok(updated)
}

/// Deletes a transaction, reversing its balance and budget effects.
///
/// A missing account is tolerated: the balance reversal is skipped and the
/// deletion proceeds. Ordinary flows never produce such orphans (account
/// deletion cascades), but imported or pre-enforcement rows may carry one.
pub async fn delete_transaction(db: &DatabaseConnection, transaction_id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let existing = Transaction::find_by_id(transaction_id)
        .one(&txn)
        .await?
        .ok_or(Error::TransactionNotFound { id: transaction_id })?;

    let account = Account::find_by_id(existing.account_id).one(&txn).await?;
    if account.is_some() {
        apply_balance_delta(
            &txn,
            existing.account_id,
            -signed_amount(existing.kind, existing.amount),
        )
        .await?;
    }

    if existing.kind == TransactionKind::Expense {
        if let Some(budget) = find_covering_budget(&txn, existing.user_id, existing.date).await? {
            add_to_spent(&txn, budget.id, -existing.amount).await?;
        }
    }

    let id = existing.id;
    existing.delete(&txn).await?;
    txn.commit().await?;

    info!("Deleted transaction {}", id);
    Ok(())
}

/// Finds a transaction by its unique ID, returning None if absent.
pub async fn get_transaction_by_id(
    db: &DatabaseConnection,
    transaction_id: i64,
) -> Result<Option<transaction::Model>> {
    Transaction::find_by_id(transaction_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Retrieves all transactions for a user, newest first.
pub async fn list_transactions_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<transaction::Model>> {
    Transaction::find()
        .filter(transaction::Column::UserId.eq(user_id))
        .order_by_desc(transaction::Column::Date)
        .order_by_desc(transaction::Column::Time)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{account, budget};
    use crate::entities::BudgetPeriod;
    use crate::test_utils::{date, dec, new_test_transaction, setup_test_db, setup_with_account};

    #[tokio::test]
    async fn test_create_transaction_requires_user_and_account() -> Result<()> {
        let (db, user, acct) = setup_with_account().await?;

        let mut missing_user = new_test_transaction(999, acct.id, TransactionKind::Income, dec("10"));
        missing_user.date = date(2024, 1, 1);
        let result = create_transaction(&db, missing_user).await;
        assert!(matches!(result.unwrap_err(), Error::UserNotFound { id: 999 }));

        let missing_account =
            new_test_transaction(user.id, 999, TransactionKind::Income, dec("10"));
        let result = create_transaction(&db, missing_account).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::AccountNotFound { id: 999 }
        ));

        // Nothing was applied to the account
        let acct = account::get_account_by_id(&db, acct.id).await?.unwrap();
        assert_eq!(acct.balance, Decimal::ZERO);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_transaction_rejects_negative_amount() -> Result<()> {
        let (db, user, acct) = setup_with_account().await?;

        let tx = new_test_transaction(user.id, acct.id, TransactionKind::Expense, dec("-5"));
        let result = create_transaction(&db, tx).await;
        assert!(matches!(result.unwrap_err(), Error::InvalidAmount { amount: _ }));

        Ok(())
    }

    #[tokio::test]
    async fn test_balance_equals_sum_of_live_transactions() -> Result<()> {
        let (db, user, acct) = setup_with_account().await?;

        let income =
            create_transaction(&db, new_test_transaction(user.id, acct.id, TransactionKind::Income, dec("300.00")))
                .await?;
        let expense =
            create_transaction(&db, new_test_transaction(user.id, acct.id, TransactionKind::Expense, dec("120.50")))
                .await?;

        let acct_now = account::get_account_by_id(&db, acct.id).await?.unwrap();
        assert_eq!(acct_now.balance, dec("179.50"));

        // Shrink the expense via update
        update_transaction(
            &db,
            expense.id,
            TransactionChanges {
                kind: TransactionKind::Expense,
                title: "groceries".to_string(),
                category: "Food".to_string(),
                amount: dec("20.50"),
                note: None,
                date: expense.date,
                time: "12:00:00".to_string(),
            },
        )
        .await?;
        let acct_now = account::get_account_by_id(&db, acct.id).await?.unwrap();
        assert_eq!(acct_now.balance, dec("279.50"));

        // Delete the income
        delete_transaction(&db, income.id).await?;
        let acct_now = account::get_account_by_id(&db, acct.id).await?.unwrap();
        assert_eq!(acct_now.balance, dec("-20.50"));

        Ok(())
    }

    #[tokio::test]
    async fn test_expense_budget_round_trip() -> Result<()> {
        let (db, user, acct) = setup_with_account().await?;
        let b = budget::create_budget(
            &db,
            user.id,
            BudgetPeriod::Monthly,
            date(2024, 1, 1),
            date(2024, 2, 1),
            dec("500"),
        )
        .await?;

        let mut tx = new_test_transaction(user.id, acct.id, TransactionKind::Expense, dec("100.00"));
        tx.date = date(2024, 1, 10);
        let created = create_transaction(&db, tx).await?;

        let b_now = budget::get_budget_by_id(&db, b.id).await?.unwrap();
        assert_eq!(b_now.spent_amount, dec("100.00"));

        delete_transaction(&db, created.id).await?;
        let b_now = budget::get_budget_by_id(&db, b.id).await?.unwrap();
        assert_eq!(b_now.spent_amount, dec("0.00"));

        Ok(())
    }

    #[tokio::test]
    async fn test_income_does_not_touch_budget() -> Result<()> {
        let (db, user, acct) = setup_with_account().await?;
        let b = budget::create_budget(
            &db,
            user.id,
            BudgetPeriod::Monthly,
            date(2024, 1, 1),
            date(2024, 2, 1),
            dec("500"),
        )
        .await?;

        let mut tx = new_test_transaction(user.id, acct.id, TransactionKind::Income, dec("100"));
        tx.date = date(2024, 1, 10);
        create_transaction(&db, tx).await?;

        let b_now = budget::get_budget_by_id(&db, b.id).await?.unwrap();
        assert_eq!(b_now.spent_amount, Decimal::ZERO);

        Ok(())
    }

    #[tokio::test]
    async fn test_expense_outside_any_budget_window() -> Result<()> {
        let (db, user, acct) = setup_with_account().await?;
        let b = budget::create_budget(
            &db,
            user.id,
            BudgetPeriod::Monthly,
            date(2024, 1, 1),
            date(2024, 2, 1),
            dec("500"),
        )
        .await?;

        let mut tx = new_test_transaction(user.id, acct.id, TransactionKind::Expense, dec("60"));
        tx.date = date(2024, 6, 1);
        create_transaction(&db, tx).await?;

        // Untracked: balance moves, budget does not
        let acct_now = account::get_account_by_id(&db, acct.id).await?.unwrap();
        assert_eq!(acct_now.balance, dec("-60"));
        let b_now = budget::get_budget_by_id(&db, b.id).await?.unwrap();
        assert_eq!(b_now.spent_amount, Decimal::ZERO);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_moves_charge_between_budgets() -> Result<()> {
        let (db, user, acct) = setup_with_account().await?;
        let budget_a = budget::create_budget(
            &db,
            user.id,
            BudgetPeriod::Monthly,
            date(2024, 1, 1),
            date(2024, 2, 1),
            dec("500"),
        )
        .await?;
        let budget_b = budget::create_budget(
            &db,
            user.id,
            BudgetPeriod::Monthly,
            date(2024, 3, 1),
            date(2024, 4, 1),
            dec("500"),
        )
        .await?;
        let budget_c = budget::create_budget(
            &db,
            user.id,
            BudgetPeriod::Monthly,
            date(2024, 5, 1),
            date(2024, 6, 1),
            dec("500"),
        )
        .await?;

        let mut tx = new_test_transaction(user.id, acct.id, TransactionKind::Expense, dec("80"));
        tx.date = date(2024, 1, 15);
        let created = create_transaction(&db, tx).await?;

        update_transaction(
            &db,
            created.id,
            TransactionChanges {
                kind: TransactionKind::Expense,
                title: "moved".to_string(),
                category: "Misc".to_string(),
                amount: dec("95"),
                note: None,
                date: date(2024, 3, 15),
                time: "09:30".to_string(),
            },
        )
        .await?;

        let a = budget::get_budget_by_id(&db, budget_a.id).await?.unwrap();
        let b = budget::get_budget_by_id(&db, budget_b.id).await?.unwrap();
        let c = budget::get_budget_by_id(&db, budget_c.id).await?.unwrap();
        assert_eq!(a.spent_amount, Decimal::ZERO);
        assert_eq!(b.spent_amount, dec("95"));
        assert_eq!(c.spent_amount, Decimal::ZERO);

        Ok(())
    }

    #[tokio::test]
    async fn test_update_kind_flip_reverses_budget_charge() -> Result<()> {
        let (db, user, acct) = setup_with_account().await?;
        let b = budget::create_budget(
            &db,
            user.id,
            BudgetPeriod::Monthly,
            date(2024, 1, 1),
            date(2024, 2, 1),
            dec("500"),
        )
        .await?;

        let mut tx = new_test_transaction(user.id, acct.id, TransactionKind::Expense, dec("50"));
        tx.date = date(2024, 1, 10);
        let created = create_transaction(&db, tx).await?;

        // Flip to income on the same date: budget charge is credited back,
        // balance swings by twice the amount.
        update_transaction(
            &db,
            created.id,
            TransactionChanges {
                kind: TransactionKind::Income,
                title: "refund".to_string(),
                category: "Misc".to_string(),
                amount: dec("50"),
                note: None,
                date: date(2024, 1, 10),
                time: "10:00:00".to_string(),
            },
        )
        .await?;

        let b_now = budget::get_budget_by_id(&db, b.id).await?.unwrap();
        assert_eq!(b_now.spent_amount, Decimal::ZERO);
        let acct_now = account::get_account_by_id(&db, acct.id).await?.unwrap();
        assert_eq!(acct_now.balance, dec("50"));

        Ok(())
    }

    #[tokio::test]
    async fn test_update_rejects_unparseable_time() -> Result<()> {
        let (db, user, acct) = setup_with_account().await?;
        let created = create_transaction(
            &db,
            new_test_transaction(user.id, acct.id, TransactionKind::Income, dec("10")),
        )
        .await?;

        let result = update_transaction(
            &db,
            created.id,
            TransactionChanges {
                kind: TransactionKind::Income,
                title: "t".to_string(),
                category: "c".to_string(),
                amount: dec("10"),
                note: None,
                date: created.date,
                time: "not-a-time".to_string(),
            },
        )
        .await;
        assert!(matches!(
            result.unwrap_err(),
            Error::Validation { message: _ }
        ));

        // Balance untouched by the failed edit
        let acct_now = account::get_account_by_id(&db, acct.id).await?.unwrap();
        assert_eq!(acct_now.balance, dec("10"));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_parses_time_with_fallback() -> Result<()> {
        let (db, user, acct) = setup_with_account().await?;

        let mut tx = new_test_transaction(user.id, acct.id, TransactionKind::Income, dec("10"));
        tx.time = Some("14:45:30".to_string());
        let created = create_transaction(&db, tx).await?;
        assert_eq!(created.time, NaiveTime::from_hms_opt(14, 45, 30).unwrap());

        // Unparseable input falls back to the current time instead of failing
        let mut tx = new_test_transaction(user.id, acct.id, TransactionKind::Income, dec("10"));
        tx.time = Some("garbage".to_string());
        let created = create_transaction(&db, tx).await?;
        let _ = created.time;

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_account_with_history_cascades() -> Result<()> {
        let (db, user, acct) = setup_with_account().await?;
        let created = create_transaction(
            &db,
            new_test_transaction(user.id, acct.id, TransactionKind::Expense, dec("30")),
        )
        .await?;

        // Account deletion must not be blocked by its transactions; the
        // cascade removes them along with the account.
        account::delete_account(&db, acct.id).await?;
        assert!(get_transaction_by_id(&db, created.id).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_tolerates_missing_account() -> Result<()> {
        let (db, user, acct) = setup_with_account().await?;

        // An orphan row such as data imported before referential enforcement;
        // it cannot be produced through the normal paths, so it is written with
        // constraint checking suspended.
        db.execute_unprepared("PRAGMA foreign_keys = OFF").await?;
        let orphan = transaction::ActiveModel {
            user_id: Set(user.id),
            account_id: Set(acct.id + 100),
            kind: Set(TransactionKind::Expense),
            title: Set("Imported".to_string()),
            category: Set("General".to_string()),
            amount: Set(dec("30")),
            note: Set(None),
            date: Set(date(2024, 1, 10)),
            time: Set(NaiveTime::from_hms_opt(12, 0, 0).unwrap()),
            ..Default::default()
        }
        .insert(&db)
        .await?;
        db.execute_unprepared("PRAGMA foreign_keys = ON").await?;

        // Deletion proceeds with the balance update skipped
        delete_transaction(&db, orphan.id).await?;
        assert!(get_transaction_by_id(&db, orphan.id).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_missing_transaction() -> Result<()> {
        let db = setup_test_db().await?;

        let result = delete_transaction(&db, 123).await;
        assert!(matches!(
            result.unwrap_err(),
            Error::TransactionNotFound { id: 123 }
        ));

        Ok(())
    }

    #[tokio::test]
    async fn test_list_transactions_newest_first() -> Result<()> {
        let (db, user, acct) = setup_with_account().await?;

        let mut older = new_test_transaction(user.id, acct.id, TransactionKind::Income, dec("1"));
        older.date = date(2024, 1, 1);
        let older = create_transaction(&db, older).await?;
        let mut newer = new_test_transaction(user.id, acct.id, TransactionKind::Income, dec("2"));
        newer.date = date(2024, 2, 1);
        let newer = create_transaction(&db, newer).await?;

        let all = list_transactions_for_user(&db, user.id).await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, newer.id);
        assert_eq!(all[1].id, older.id);

        Ok(())
    }
}
