//! User entity - Account owner records.
//!
//! Users exist so that money-moving operations can validate ownership before
//! mutating anything. Registration, credential hashing, and token issuance
//! happen in the service layer; the `password_hash` column is opaque here.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display / login name
    pub username: String,
    /// Email address used for login
    pub email: String,
    /// Opaque credential hash produced by the auth layer
    pub password_hash: String,
    /// When the user registered
    pub created_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user owns many accounts
    #[sea_orm(has_many = "super::account::Entity")]
    Accounts,
    /// One user owns many budgets
    #[sea_orm(has_many = "super::budget::Entity")]
    Budgets,
    /// One user owns many goals
    #[sea_orm(has_many = "super::goal::Entity")]
    Goals,
    /// One user owns many subscriptions
    #[sea_orm(has_many = "super::subscription::Entity")]
    Subscriptions,
    /// One user owns many transactions
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budgets.def()
    }
}

impl Related<super::goal::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Goals.def()
    }
}

impl Related<super::subscription::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscriptions.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
