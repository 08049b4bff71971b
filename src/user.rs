//! User lookups shared by the components.
//!
//! Accounts are owned by the account collaborator. The core only needs to
//! resolve ids, check roles and, for the default admin, create a row.

use crate::error::{CoreError, CoreResult};
use crate::orm::users::{self, Role};
use chrono::Utc;
use sea_orm::{entity::*, query::*, ConnectionTrait, DbErr};

/// Usernames and emails are compared case-insensitively by storing them folded.
pub fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

pub async fn get_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find_by_id(id).one(db).await
}

pub async fn get_by_username<C: ConnectionTrait>(
    db: &C,
    username: &str,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Username.eq(normalize(username)))
        .one(db)
        .await
}

pub async fn get_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<users::Model>, DbErr> {
    users::Entity::find()
        .filter(users::Column::Email.eq(normalize(email)))
        .one(db)
        .await
}

/// Resolve a user id or fail with `NotFound`.
pub async fn require_user<C: ConnectionTrait>(db: &C, id: i32) -> CoreResult<users::Model> {
    get_by_id(db, id)
        .await?
        .ok_or_else(|| CoreError::not_found("user", id))
}

/// Resolve a user id and require the ADMIN role.
///
/// A missing user is reported as `Unauthorized` as well: an unknown id
/// cannot hold admin rights.
pub async fn require_admin<C: ConnectionTrait>(db: &C, id: i32) -> CoreResult<users::Model> {
    match get_by_id(db, id).await? {
        Some(user) if user.is_admin() => Ok(user),
        Some(_) => Err(CoreError::Unauthorized(format!("user {} is not an admin", id))),
        None => Err(CoreError::Unauthorized(format!("user {} does not exist", id))),
    }
}

/// Insert a new account. Username and email are folded to lower case.
pub async fn insert_user<C: ConnectionTrait>(
    db: &C,
    username: &str,
    email: &str,
    password_hash: &str,
    role: Role,
) -> CoreResult<users::Model> {
    let username = normalize(username);
    let email = normalize(email);

    if username.is_empty() || email.is_empty() {
        return Err(CoreError::InvalidArgument(
            "username and email are required".to_string(),
        ));
    }
    if get_by_username(db, &username).await?.is_some() {
        return Err(CoreError::InvalidArgument(format!(
            "username {} is taken",
            username
        )));
    }
    if get_by_email(db, &email).await?.is_some() {
        return Err(CoreError::InvalidArgument(format!("email {} is taken", email)));
    }

    let user = users::ActiveModel {
        username: Set(username),
        email: Set(email),
        password_hash: Set(password_hash.to_owned()),
        role: Set(role),
        active: Set(true),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };

    Ok(user.insert(db).await?)
}
