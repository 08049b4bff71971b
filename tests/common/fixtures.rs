//! Test fixtures for creating test data
#![allow(dead_code)]

use agora::notifications::{NotificationData, PushChannel, PushError};
use agora::orm::users::Role;
use agora::orm::{posts, users};
use sea_orm::DatabaseConnection;
use std::sync::Mutex;

/// Password given to every fixture user.
pub const TEST_PASSWORD: &str = "password123";

async fn create_user_with_role(db: &DatabaseConnection, username: &str, role: Role) -> users::Model {
    let password_hash =
        agora::admin::hash_password(TEST_PASSWORD).expect("Password hashing failed");

    agora::user::insert_user(
        db,
        username,
        &format!("{}@test.com", username),
        &password_hash,
        role,
    )
    .await
    .expect("Failed to create test user")
}

/// Create a regular user with known credentials
pub async fn create_test_user(db: &DatabaseConnection, username: &str) -> users::Model {
    create_user_with_role(db, username, Role::User).await
}

/// Create an admin with known credentials
pub async fn create_test_admin(db: &DatabaseConnection, username: &str) -> users::Model {
    create_user_with_role(db, username, Role::Admin).await
}

/// Create a post owned by `owner_id`
pub async fn create_test_post(db: &DatabaseConnection, owner_id: i32) -> posts::Model {
    agora::post::insert_post(db, owner_id, "Test post content", None)
        .await
        .expect("Failed to create test post")
}

/// Push channel that remembers everything published to it.
#[derive(Default)]
pub struct RecordingChannel {
    pub published: Mutex<Vec<(i32, NotificationData)>>,
}

impl RecordingChannel {
    pub fn published(&self) -> Vec<(i32, NotificationData)> {
        self.published.lock().unwrap().clone()
    }
}

impl PushChannel for RecordingChannel {
    fn publish(&self, recipient_user_id: i32, payload: NotificationData) -> Result<(), PushError> {
        self.published
            .lock()
            .unwrap()
            .push((recipient_user_id, payload));
        Ok(())
    }
}

/// Push channel whose transport is always down.
pub struct FailingChannel;

impl PushChannel for FailingChannel {
    fn publish(&self, _: i32, _: NotificationData) -> Result<(), PushError> {
        Err(PushError::Transport("connection refused".to_string()))
    }
}
