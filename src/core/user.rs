//! User record operations.
//!
//! Credential hashing and token issuance belong to the auth layer; this module
//! only keeps the user rows that every money-moving operation validates
//! ownership against.

use crate::{
    entities::{User, user},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use tracing::info;

/// Creates a new user record. The password hash is produced by the caller.
pub async fn create_user(
    db: &DatabaseConnection,
    username: String,
    email: String,
    password_hash: String,
) -> Result<user::Model> {
    if username.trim().is_empty() {
        return Err(Error::Validation {
            message: "Username cannot be empty".to_string(),
        });
    }
    if email.trim().is_empty() {
        return Err(Error::Validation {
            message: "Email cannot be empty".to_string(),
        });
    }

    let user = user::ActiveModel {
        username: Set(username.trim().to_string()),
        email: Set(email.trim().to_string()),
        password_hash: Set(password_hash),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let result = user.insert(db).await?;
    info!("Created user {} ({})", result.id, result.username);
    Ok(result)
}

/// Finds a user by id, returning None if absent.
pub async fn get_user_by_id(db: &DatabaseConnection, user_id: i64) -> Result<Option<user::Model>> {
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Finds a user by email, used by the auth layer's login path.
pub async fn get_user_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<user::Model>> {
    User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
        .map_err(Into::into)
}
