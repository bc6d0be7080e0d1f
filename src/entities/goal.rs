//! Goal entity - A savings or expense target with one-way progress.
//!
//! `current_amount` only ever increases, through contributions processed by
//! [`crate::core::goal`]. Editing or deleting the transaction that a
//! contribution recorded does not roll progress back.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Whether a goal accumulates savings or caps an expense.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum GoalKind {
    /// Save up towards a target amount
    #[sea_orm(string_value = "savings_goal")]
    Savings,
    /// Keep an expense under a target amount
    #[sea_orm(string_value = "expense_goal")]
    Expense,
}

/// Goal database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "goals")]
pub struct Model {
    /// Unique identifier for the goal
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Savings or expense goal
    pub kind: GoalKind,
    /// Human-readable goal name (e.g. "Vacation fund")
    pub name: String,
    /// Amount the user is aiming for
    pub target_amount: Decimal,
    /// Accumulated progress; starts at zero and only increases
    pub current_amount: Decimal,
    /// First day of the goal window
    pub start_date: Date,
    /// Last day of the goal window; always after `start_date`
    pub end_date: Date,
}

/// Defines relationships between Goal and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each goal belongs to one user
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
