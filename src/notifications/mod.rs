//! Notification fan-out for social and moderation events
//!
//! Every notification row is created here. After the row is stored it is
//! handed to the configured `PushChannel`; a push failure is logged and never
//! undoes the stored row.

pub mod dispatcher;
pub mod push;
pub mod types;

use crate::error::{CoreError, CoreResult};
use crate::orm::{notifications, users};
use chrono::Utc;
use sea_orm::{entity::*, query::*, sea_query::Expr, DatabaseConnection};
use std::sync::Arc;

pub use push::{Discard, NotificationData, PushChannel, PushError};
pub use types::NotificationType;

/// Event to be recorded for a recipient.
#[derive(Clone, Debug)]
pub struct NewNotification {
    pub recipient_user_id: i32,
    pub notification_type: NotificationType,
    pub actor_user_id: Option<i32>,
    pub post_id: Option<i32>,
    pub comment_text: Option<String>,
    pub message: Option<String>,
}

impl NewNotification {
    pub fn new(recipient_user_id: i32, notification_type: NotificationType) -> Self {
        Self {
            recipient_user_id,
            notification_type,
            actor_user_id: None,
            post_id: None,
            comment_text: None,
            message: None,
        }
    }

    pub fn actor(mut self, actor_user_id: i32) -> Self {
        self.actor_user_id = Some(actor_user_id);
        self
    }

    pub fn post(mut self, post_id: i32) -> Self {
        self.post_id = Some(post_id);
        self
    }

    pub fn comment_text(mut self, text: impl Into<String>) -> Self {
        self.comment_text = Some(text.into());
        self
    }

    pub fn message(mut self, text: impl Into<String>) -> Self {
        self.message = Some(text.into());
        self
    }

    /// Self-directed social events produce no notification.
    pub fn is_suppressed(&self) -> bool {
        self.notification_type.suppressed_for_self()
            && self.actor_user_id == Some(self.recipient_user_id)
    }
}

/// Display name recorded for notifications without a user actor.
fn system_actor_name(notification_type: NotificationType) -> Option<&'static str> {
    match notification_type {
        NotificationType::FlagCreated => Some("Moderation"),
        NotificationType::FlagApproved | NotificationType::FlagRejected => Some("Admin"),
        _ => None,
    }
}

/// Creates notification records and forwards them to the push channel.
#[derive(Clone)]
pub struct NotificationHub {
    db: DatabaseConnection,
    push: Arc<dyn PushChannel>,
}

impl NotificationHub {
    pub fn new(db: DatabaseConnection, push: Arc<dyn PushChannel>) -> Self {
        Self { db, push }
    }

    /// Hub that stores notifications without real-time delivery.
    pub fn without_push(db: DatabaseConnection) -> Self {
        Self::new(db, Arc::new(Discard))
    }

    /// Store a notification and push it to the recipient.
    ///
    /// Returns `None` when the event was self-directed and suppressed.
    pub async fn emit(&self, event: NewNotification) -> CoreResult<Option<notifications::Model>> {
        if event.is_suppressed() {
            log::debug!(
                "Skipping self-directed {} notification for user {}",
                event.notification_type.as_str(),
                event.recipient_user_id
            );
            return Ok(None);
        }

        users::Entity::find_by_id(event.recipient_user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("user", event.recipient_user_id))?;

        let actor_username = match event.actor_user_id {
            Some(actor_id) => users::Entity::find_by_id(actor_id)
                .one(&self.db)
                .await?
                .map(|u| u.username),
            None => system_actor_name(event.notification_type).map(str::to_string),
        };

        let notification = notifications::ActiveModel {
            user_id: Set(event.recipient_user_id),
            type_: Set(event.notification_type),
            actor_id: Set(event.actor_user_id),
            actor_username: Set(actor_username),
            post_id: Set(event.post_id),
            comment_text: Set(event.comment_text),
            message: Set(event.message),
            is_read: Set(false),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        };

        let model = notification.insert(&self.db).await?;
        log::debug!(
            "Created {} notification {} for user {}",
            model.type_.as_str(),
            model.id,
            model.user_id
        );

        self.publish(&model);
        Ok(Some(model))
    }

    fn publish(&self, notification: &notifications::Model) {
        if let Err(e) = self
            .push
            .publish(notification.user_id, NotificationData::from(notification))
        {
            log::warn!(
                "Failed to push notification {} to user {}: {}",
                notification.id,
                notification.user_id,
                e
            );
        }
    }

    /// All notifications for a user, newest first.
    pub async fn list_notifications(&self, user_id: i32) -> CoreResult<Vec<notifications::Model>> {
        Ok(notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .order_by_desc(notifications::Column::CreatedAt)
            .order_by_desc(notifications::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Unread notifications for a user, newest first.
    pub async fn list_unread(&self, user_id: i32) -> CoreResult<Vec<notifications::Model>> {
        Ok(notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .order_by_desc(notifications::Column::CreatedAt)
            .order_by_desc(notifications::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn unread_count(&self, user_id: i32) -> CoreResult<u64> {
        let count = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .count(&self.db)
            .await?;

        Ok(count as u64)
    }

    /// Mark one notification read. False if it does not exist.
    pub async fn mark_read(&self, notification_id: i32) -> CoreResult<bool> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::Id.eq(notification_id))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    /// Mark every unread notification of a user read. Returns how many changed.
    pub async fn mark_all_read(&self, user_id: i32) -> CoreResult<u64> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }

    /// Delete a notification. False if it does not exist.
    pub async fn delete(&self, notification_id: i32) -> CoreResult<bool> {
        let result = notifications::Entity::delete_by_id(notification_id)
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_like_is_suppressed() {
        let event = NewNotification::new(7, NotificationType::Like).actor(7).post(1);
        assert!(event.is_suppressed());
    }

    #[test]
    fn test_self_warning_is_not_suppressed() {
        let event = NewNotification::new(7, NotificationType::Warning).actor(7);
        assert!(!event.is_suppressed());
    }

    #[test]
    fn test_system_actor_names() {
        assert_eq!(system_actor_name(NotificationType::FlagCreated), Some("Moderation"));
        assert_eq!(system_actor_name(NotificationType::FlagRejected), Some("Admin"));
        assert_eq!(system_actor_name(NotificationType::Like), None);
    }
}
