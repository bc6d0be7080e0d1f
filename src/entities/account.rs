//! Account entity - A user's money container (checking, cash, card, ...).
//!
//! The balance is a materialized aggregate: it equals the sum of signed amounts
//! of every transaction ever applied to the account. It is only mutated through
//! the balance mutator in [`crate::core::account`], with one sanctioned
//! exception: a direct user-initiated correction via account update.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    /// Unique identifier for the account
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Human-readable account name (e.g. "Checking", "Wallet")
    pub name: String,
    /// Current balance; negative balances are permitted for ordinary postings
    pub balance: Decimal,
    /// ISO currency code
    pub currency: String,
    /// When the account was created
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Account and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each account belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    /// One account has many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
