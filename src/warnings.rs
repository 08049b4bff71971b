//! Moderation warnings sent by admins to regular users

use crate::error::{CoreError, CoreResult};
use crate::notifications::NotificationHub;
use crate::orm::user_warnings;
use chrono::Utc;
use sea_orm::{entity::*, query::*, DatabaseConnection, PaginatorTrait};

#[derive(Clone)]
pub struct WarningLog {
    db: DatabaseConnection,
    hub: NotificationHub,
}

impl WarningLog {
    pub fn new(db: DatabaseConnection, hub: NotificationHub) -> Self {
        Self { db, hub }
    }

    /// Record a warning and notify its target.
    ///
    /// Checks run in order: the sender must be an admin, the target must
    /// exist and must not be an admin, and the message must not be blank.
    /// Nothing is stored when any check fails.
    pub async fn send_warning(
        &self,
        admin_id: i32,
        target_user_id: i32,
        message: &str,
    ) -> CoreResult<user_warnings::Model> {
        crate::user::require_admin(&self.db, admin_id).await?;

        let target = crate::user::require_user(&self.db, target_user_id).await?;
        if target.is_admin() {
            return Err(CoreError::InvalidTarget(format!(
                "user {} is an admin and cannot be warned",
                target_user_id
            )));
        }

        let message = message.trim();
        if message.is_empty() {
            return Err(CoreError::InvalidArgument(
                "warning message cannot be empty".to_string(),
            ));
        }

        let warning = user_warnings::ActiveModel {
            user_id: Set(target_user_id),
            admin_id: Set(admin_id),
            message: Set(message.to_owned()),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        log::info!(
            "Admin {} warned user {} (warning {})",
            admin_id,
            target_user_id,
            warning.id
        );

        self.hub
            .notify_warning(target_user_id, admin_id, &warning.message)
            .await?;

        Ok(warning)
    }

    /// Warnings received by a user, newest first.
    pub async fn list_warnings_for_user(&self, user_id: i32) -> CoreResult<Vec<user_warnings::Model>> {
        Ok(user_warnings::Entity::find()
            .filter(user_warnings::Column::UserId.eq(user_id))
            .order_by_desc(user_warnings::Column::CreatedAt)
            .order_by_desc(user_warnings::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Warnings issued by an admin, newest first.
    pub async fn list_warnings_by_admin(&self, admin_id: i32) -> CoreResult<Vec<user_warnings::Model>> {
        Ok(user_warnings::Entity::find()
            .filter(user_warnings::Column::AdminId.eq(admin_id))
            .order_by_desc(user_warnings::Column::CreatedAt)
            .order_by_desc(user_warnings::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn warning_count(&self, user_id: i32) -> CoreResult<u64> {
        let count = user_warnings::Entity::find()
            .filter(user_warnings::Column::UserId.eq(user_id))
            .count(&self.db)
            .await?;

        Ok(count as u64)
    }

    pub async fn get_warning(&self, warning_id: i32) -> CoreResult<user_warnings::Model> {
        user_warnings::Entity::find_by_id(warning_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("warning", warning_id))
    }

    /// Delete a warning. False if it does not exist.
    pub async fn delete_warning(&self, warning_id: i32) -> CoreResult<bool> {
        let result = user_warnings::Entity::delete_by_id(warning_id)
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
