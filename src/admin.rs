//! Admin credentials: default-admin seeding, login and token checks
//!
//! Admin tokens live in the `SessionRegistry`. Every token check re-reads the
//! user so a demoted admin loses access immediately.

use crate::app_config::AdminConfig;
use crate::error::{CoreError, CoreResult};
use crate::orm::users::{self, Role};
use crate::session::SessionRegistry;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use sea_orm::{entity::*, query::*, DatabaseConnection};
use serde::Serialize;

/// Shortest username accepted by `register_admin`.
pub const MIN_USERNAME_LEN: usize = 3;

/// Result of a successful admin login.
#[derive(Clone, Debug, Serialize)]
pub struct AdminLogin {
    pub user: users::Model,
    pub token: String,
}

/// Hash a password into a PHC string.
pub fn hash_password(password: &str) -> CoreResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            log::error!("Failed to hash password: {}", e);
            CoreError::InvalidArgument("password could not be hashed".to_string())
        })
}

fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::warn!("Stored password hash is unreadable: {}", e);
            false
        }
    }
}

/// True when a domain is configured and the (normalized) email does not end with it.
fn outside_required_domain(email: &str, config: &AdminConfig) -> bool {
    let required_domain = crate::user::normalize(&config.required_domain);
    !required_domain.is_empty() && !email.ends_with(&required_domain)
}

/// Make sure the configured admin account exists and holds the ADMIN role.
///
/// An existing user with the configured username is promoted. Otherwise the
/// account is created, which needs a configured password. Returns the admin,
/// or `None` when seeding was skipped.
pub async fn ensure_default_admin(
    db: &DatabaseConnection,
    config: &AdminConfig,
) -> CoreResult<Option<users::Model>> {
    let username = crate::user::normalize(&config.username);
    let email = crate::user::normalize(&config.email);

    if username.is_empty() || email.is_empty() {
        log::info!("Default admin not configured, skipping");
        return Ok(None);
    }
    if outside_required_domain(&email, config) {
        log::warn!(
            "Default admin email {} is outside {}, skipping",
            email,
            config.required_domain
        );
        return Ok(None);
    }

    if let Some(existing) = crate::user::get_by_username(db, &username).await? {
        if existing.is_admin() {
            return Ok(Some(existing));
        }
        let mut active: users::ActiveModel = existing.into();
        active.role = Set(Role::Admin);
        let promoted = active.update(db).await?;
        log::info!("Promoted user {} ({}) to admin", promoted.id, promoted.username);
        return Ok(Some(promoted));
    }

    if config.password.is_empty() {
        log::warn!("Default admin {} has no password configured, skipping", username);
        return Ok(None);
    }

    let password_hash = hash_password(&config.password)?;
    let admin = crate::user::insert_user(db, &username, &email, &password_hash, Role::Admin).await?;
    log::info!("Created default admin {} ({})", admin.id, admin.username);
    Ok(Some(admin))
}

/// Create a new admin account.
///
/// The email must sit in the configured admin domain. Taken usernames and
/// emails are rejected by `insert_user`.
pub async fn register_admin(
    db: &DatabaseConnection,
    config: &AdminConfig,
    username: &str,
    email: &str,
    password: &str,
) -> CoreResult<users::Model> {
    let username = crate::user::normalize(username);
    let email = crate::user::normalize(email);

    if outside_required_domain(&email, config) {
        return Err(CoreError::Unauthorized(format!(
            "{} is not an admin email address",
            email
        )));
    }
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(CoreError::InvalidArgument(format!(
            "username must be at least {} characters",
            MIN_USERNAME_LEN
        )));
    }
    if password.trim().is_empty() {
        return Err(CoreError::InvalidArgument("password is required".to_string()));
    }

    let password_hash = hash_password(password)?;
    let admin = crate::user::insert_user(db, &username, &email, &password_hash, Role::Admin).await?;
    log::info!("Registered admin {} ({})", admin.id, admin.username);
    Ok(admin)
}

/// Check admin credentials and issue a session token.
pub async fn login_admin(
    db: &DatabaseConnection,
    config: &AdminConfig,
    email: &str,
    password: &str,
    sessions: &SessionRegistry,
) -> CoreResult<AdminLogin> {
    let rejected = || CoreError::Unauthorized("invalid admin credentials".to_string());

    let email = crate::user::normalize(email);
    if outside_required_domain(&email, config) {
        return Err(CoreError::Unauthorized(format!(
            "{} is not an admin email address",
            email
        )));
    }

    let user = match crate::user::get_by_email(db, &email).await? {
        Some(user) if user.is_admin() && user.active => user,
        _ => return Err(rejected()),
    };

    if !verify_password(password, &user.password_hash) {
        log::info!("Failed admin login for user {}", user.id);
        return Err(rejected());
    }

    let token = sessions.create_session(user.id);
    log::info!("Admin {} logged in", user.id);
    Ok(AdminLogin { user, token })
}

/// Resolve an admin token to a user who still holds the ADMIN role.
pub async fn require_admin(
    db: &DatabaseConnection,
    token: &str,
    sessions: &SessionRegistry,
) -> CoreResult<users::Model> {
    let admin_id = sessions
        .resolve(token)
        .ok_or_else(|| CoreError::Unauthorized("unknown admin session".to_string()))?;

    match crate::user::get_by_id(db, admin_id).await? {
        Some(user) if user.is_admin() => Ok(user),
        _ => Err(CoreError::Unauthorized(format!(
            "user {} is no longer an admin",
            admin_id
        ))),
    }
}

/// Every account, newest first. Needs a live admin token.
pub async fn list_users(
    db: &DatabaseConnection,
    token: &str,
    sessions: &SessionRegistry,
) -> CoreResult<Vec<users::Model>> {
    require_admin(db, token, sessions).await?;

    Ok(users::Entity::find()
        .order_by_desc(users::Column::CreatedAt)
        .order_by_desc(users::Column::Id)
        .all(db)
        .await?)
}

pub fn logout_admin(token: &str, sessions: &SessionRegistry) {
    sessions.revoke(token);
}
