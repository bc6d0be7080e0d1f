//! Transaction entity - The single record of every money movement.
//!
//! There is no separate ledger log. A transaction's `amount` is a non-negative
//! magnitude; its direction comes from `kind`. Three paths create transactions:
//! direct user entry, goal contributions, and subscription payments, and all
//! three run through the same balance and budget update rules.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Direction of a money movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum TransactionKind {
    /// Money entering the account
    #[sea_orm(string_value = "Income")]
    Income,
    /// Money leaving the account
    #[sea_orm(string_value = "Expense")]
    Expense,
}

/// Transaction database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    /// Unique identifier for the transaction
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Account the movement was applied to
    pub account_id: i64,
    /// Income or expense
    pub kind: TransactionKind,
    /// Short human-readable title
    pub title: String,
    /// Spending category
    pub category: String,
    /// Non-negative magnitude; sign is implied by `kind`
    pub amount: Decimal,
    /// Optional free-form note
    pub note: Option<String>,
    /// Calendar date of the movement (UTC)
    pub date: Date,
    /// Time of day of the movement (UTC)
    pub time: Time,
}

/// Defines relationships between Transaction and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each transaction belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    /// Each transaction belongs to one account
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id",
        on_delete = "Cascade"
    )]
    Account,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
