//! Budget entity - A time-boxed spending limit.
//!
//! A budget tracks expense transactions whose date falls inside its
//! `[start_date, end_date]` window. `spent_amount` is a running total that is
//! maintained incrementally by the transaction processor; it is never
//! recomputed from history. Expired windows are advanced by the renewal engine
//! in [`crate::core::budget`] whenever a read path surfaces them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// How long one budget period lasts before it renews.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum BudgetPeriod {
    /// Seven-day window
    #[sea_orm(string_value = "Weekly")]
    Weekly,
    /// One calendar month window (matching day-of-month)
    #[sea_orm(string_value = "Monthly")]
    Monthly,
    /// One calendar year window
    #[sea_orm(string_value = "Yearly")]
    Yearly,
}

/// Budget database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    /// Unique identifier for the budget
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Renewal cadence of the window
    pub period: BudgetPeriod,
    /// First day of the current window (inclusive)
    pub start_date: Date,
    /// Last day of the current window (inclusive); always after `start_date`
    pub end_date: Date,
    /// Spending limit for one window
    pub amount_limit: Decimal,
    /// Running total of expense amounts dated inside the current window
    pub spent_amount: Decimal,
}

/// Defines relationships between Budget and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each budget belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
