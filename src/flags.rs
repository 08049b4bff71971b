//! Post flagging and admin review
//!
//! A flag is raised PENDING and reviewed exactly once. The PENDING check and
//! the status write happen in one conditional UPDATE, so of two racing
//! reviews only one can match the row.

use crate::error::{CoreError, CoreResult};
use crate::notifications::NotificationHub;
use crate::orm::post_flags::{self, FlagStatus};
use crate::orm::posts;
use chrono::Utc;
use sea_orm::{entity::*, query::*, sea_query::Expr, DatabaseConnection, PaginatorTrait};

#[derive(Clone)]
pub struct FlagWorkflow {
    db: DatabaseConnection,
    hub: NotificationHub,
}

impl FlagWorkflow {
    pub fn new(db: DatabaseConnection, hub: NotificationHub) -> Self {
        Self { db, hub }
    }

    /// Raise a new PENDING flag on a post. A post may carry any number of flags.
    pub async fn flag_post(
        &self,
        post_id: i32,
        flagger_user_id: i32,
        reason: &str,
    ) -> CoreResult<post_flags::Model> {
        let post = crate::post::require_post(&self.db, post_id).await?;
        crate::user::require_user(&self.db, flagger_user_id).await?;

        let flag = post_flags::ActiveModel {
            post_id: Set(post_id),
            flagged_by_user_id: Set(flagger_user_id),
            reason: Set(reason.to_owned()),
            status: Set(FlagStatus::Pending),
            created_at: Set(Utc::now().naive_utc()),
            reviewed_at: Set(None),
            reviewed_by_user_id: Set(None),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        log::info!(
            "Post {} flagged by user {} (flag {})",
            post_id,
            flagger_user_id,
            flag.id
        );

        if post.user_id != flagger_user_id {
            self.hub.notify_flag_created(&post).await?;
        }

        Ok(flag)
    }

    /// Move a PENDING flag to APPROVED or REJECTED and tell the post owner.
    pub async fn review_flag(
        &self,
        flag_id: i32,
        new_status: FlagStatus,
        reviewer_user_id: i32,
    ) -> CoreResult<post_flags::Model> {
        if !FlagStatus::Pending.can_transition_to(new_status) {
            return Err(CoreError::InvalidArgument(format!(
                "{} is not a review outcome",
                new_status.as_str()
            )));
        }

        let reviewer = crate::user::require_user(&self.db, reviewer_user_id).await?;
        if !reviewer.is_admin() {
            return Err(CoreError::Unauthorized(format!(
                "user {} cannot review flags",
                reviewer_user_id
            )));
        }

        let result = post_flags::Entity::update_many()
            .col_expr(post_flags::Column::Status, Expr::value(new_status.into_value()))
            .col_expr(
                post_flags::Column::ReviewedAt,
                Expr::value(Utc::now().naive_utc()),
            )
            .col_expr(
                post_flags::Column::ReviewedByUserId,
                Expr::value(reviewer_user_id),
            )
            .filter(post_flags::Column::Id.eq(flag_id))
            .filter(post_flags::Column::Status.eq(FlagStatus::Pending.into_value()))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return match self.find_flag(flag_id).await? {
                None => Err(CoreError::not_found("flag", flag_id)),
                Some(flag) => Err(CoreError::InvalidState(format!(
                    "flag {} is already {}",
                    flag_id,
                    flag.status.as_str()
                ))),
            };
        }

        let flag = self.get_flag(flag_id).await?;
        log::info!(
            "Flag {} on post {} {} by admin {}",
            flag.id,
            flag.post_id,
            flag.status.as_str(),
            reviewer_user_id
        );

        match posts::Entity::find_by_id(flag.post_id).one(&self.db).await? {
            Some(post) => {
                self.hub.notify_flag_reviewed(&post, flag.status).await?;
            }
            None => log::warn!(
                "Post {} vanished before review of flag {} could be announced",
                flag.post_id,
                flag.id
            ),
        }

        Ok(flag)
    }

    async fn find_flag(&self, flag_id: i32) -> CoreResult<Option<post_flags::Model>> {
        Ok(post_flags::Entity::find_by_id(flag_id).one(&self.db).await?)
    }

    pub async fn get_flag(&self, flag_id: i32) -> CoreResult<post_flags::Model> {
        self.find_flag(flag_id)
            .await?
            .ok_or_else(|| CoreError::not_found("flag", flag_id))
    }

    /// Flags newest first, optionally restricted to one status.
    pub async fn list_flags(
        &self,
        status: Option<FlagStatus>,
    ) -> CoreResult<Vec<post_flags::Model>> {
        let mut query = post_flags::Entity::find();
        if let Some(status) = status {
            query = query.filter(post_flags::Column::Status.eq(status.into_value()));
        }

        Ok(query
            .order_by_desc(post_flags::Column::CreatedAt)
            .order_by_desc(post_flags::Column::Id)
            .all(&self.db)
            .await?)
    }

    /// Every flag raised on one post, newest first.
    pub async fn flags_for_post(&self, post_id: i32) -> CoreResult<Vec<post_flags::Model>> {
        Ok(post_flags::Entity::find()
            .filter(post_flags::Column::PostId.eq(post_id))
            .order_by_desc(post_flags::Column::CreatedAt)
            .order_by_desc(post_flags::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn is_post_flagged(&self, post_id: i32) -> CoreResult<bool> {
        let count = post_flags::Entity::find()
            .filter(post_flags::Column::PostId.eq(post_id))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    pub async fn delete_flag(&self, flag_id: i32) -> CoreResult<()> {
        let result = post_flags::Entity::delete_by_id(flag_id)
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(CoreError::not_found("flag", flag_id));
        }

        log::info!("Flag {} deleted", flag_id);
        Ok(())
    }
}

/// Parse a free-text status as sent by a client.
pub fn parse_status(value: &str) -> CoreResult<FlagStatus> {
    FlagStatus::parse(value)
        .ok_or_else(|| CoreError::InvalidArgument(format!("unknown flag status {:?}", value)))
}
