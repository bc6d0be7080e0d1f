//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod account;
pub mod budget;
pub mod goal;
pub mod subscription;
pub mod transaction;
pub mod user;

// Re-export specific types to avoid conflicts
pub use account::{Column as AccountColumn, Entity as Account, Model as AccountModel};
pub use budget::{
    BudgetPeriod, Column as BudgetColumn, Entity as Budget, Model as BudgetModel,
};
pub use goal::{Column as GoalColumn, Entity as Goal, GoalKind, Model as GoalModel};
pub use subscription::{
    Column as SubscriptionColumn, Entity as Subscription, Model as SubscriptionModel,
};
pub use transaction::{
    Column as TransactionColumn, Entity as Transaction, Model as TransactionModel,
    TransactionKind,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
