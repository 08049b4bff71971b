//! Comments on posts

use crate::error::{CoreError, CoreResult};
use crate::notifications::NotificationHub;
use crate::orm::post_comments;
use chrono::Utc;
use sea_orm::{entity::*, query::*, DatabaseConnection, PaginatorTrait};

#[derive(Clone)]
pub struct CommentBoard {
    db: DatabaseConnection,
    hub: NotificationHub,
}

impl CommentBoard {
    pub fn new(db: DatabaseConnection, hub: NotificationHub) -> Self {
        Self { db, hub }
    }

    /// Store a comment and tell the post owner, unless they wrote it.
    pub async fn add_comment(
        &self,
        post_id: i32,
        user_id: i32,
        text: &str,
    ) -> CoreResult<post_comments::Model> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::InvalidArgument(
                "comment text cannot be empty".to_string(),
            ));
        }

        let post = crate::post::require_post(&self.db, post_id).await?;
        crate::user::require_user(&self.db, user_id).await?;

        let now = Utc::now().naive_utc();
        let comment = post_comments::ActiveModel {
            post_id: Set(post_id),
            user_id: Set(user_id),
            comment_text: Set(text.to_owned()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&self.db)
        .await?;

        log::debug!("User {} commented on post {}", user_id, post_id);

        self.hub
            .notify_comment(&post, user_id, &comment.comment_text)
            .await?;

        Ok(comment)
    }

    /// Comments on a post, newest first.
    pub async fn list_comments(&self, post_id: i32) -> CoreResult<Vec<post_comments::Model>> {
        Ok(post_comments::Entity::find()
            .filter(post_comments::Column::PostId.eq(post_id))
            .order_by_desc(post_comments::Column::CreatedAt)
            .order_by_desc(post_comments::Column::Id)
            .all(&self.db)
            .await?)
    }

    pub async fn comment_count(&self, post_id: i32) -> CoreResult<u64> {
        let count = post_comments::Entity::find()
            .filter(post_comments::Column::PostId.eq(post_id))
            .count(&self.db)
            .await?;

        Ok(count as u64)
    }

    /// Delete a comment. Its author and admins may do so.
    pub async fn delete_comment(&self, comment_id: i32, requester_id: i32) -> CoreResult<()> {
        let comment = post_comments::Entity::find_by_id(comment_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::not_found("comment", comment_id))?;
        let requester = crate::user::require_user(&self.db, requester_id).await?;

        let is_owner = comment.user_id == requester_id;
        if !is_owner && !requester.is_admin() {
            return Err(CoreError::Unauthorized(format!(
                "user {} cannot delete comment {}",
                requester_id, comment_id
            )));
        }

        post_comments::Entity::delete_by_id(comment_id)
            .exec(&self.db)
            .await?;

        log::info!(
            "Comment {} deleted by user {} (owner: {})",
            comment_id,
            requester_id,
            is_owner
        );
        Ok(())
    }
}
