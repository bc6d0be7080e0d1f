//! Subscription entity - A recurring monthly charge.
//!
//! `next_payment_date` advances by exactly one calendar month on every
//! successful payment or skip, handled by [`crate::core::subscription`].

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscription database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    /// Unique identifier for the subscription
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Service name (e.g. "Netflix")
    pub name: String,
    /// Spending category the payments are tagged with
    pub category: String,
    /// Amount charged each month
    pub monthly_fee: Decimal,
    /// Day of the month the payment is due (1-31)
    pub payment_day: i32,
    /// Next date a payment is expected
    pub next_payment_date: Date,
    /// Set when the next payment date has passed without a payment or skip
    pub is_overdue: bool,
}

/// Defines relationships between Subscription and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each subscription belongs to one user
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
