//! Typed event helpers used by the components to raise notifications

use super::{NewNotification, NotificationHub, NotificationType};
use crate::error::CoreResult;
use crate::orm::{notifications, post_flags::FlagStatus, posts};

impl NotificationHub {
    /// Tell a user they gained a follower.
    pub async fn notify_follow(
        &self,
        followed_user_id: i32,
        follower_user_id: i32,
    ) -> CoreResult<Option<notifications::Model>> {
        self.emit(NewNotification::new(followed_user_id, NotificationType::Follow).actor(follower_user_id))
            .await
    }

    /// Tell a post owner their post was liked.
    pub async fn notify_like(
        &self,
        post: &posts::Model,
        liker_user_id: i32,
    ) -> CoreResult<Option<notifications::Model>> {
        self.emit(
            NewNotification::new(post.user_id, NotificationType::Like)
                .actor(liker_user_id)
                .post(post.id),
        )
        .await
    }

    /// Tell a post owner someone commented, carrying the comment text.
    pub async fn notify_comment(
        &self,
        post: &posts::Model,
        commenter_user_id: i32,
        comment_text: &str,
    ) -> CoreResult<Option<notifications::Model>> {
        self.emit(
            NewNotification::new(post.user_id, NotificationType::Comment)
                .actor(commenter_user_id)
                .post(post.id)
                .comment_text(comment_text),
        )
        .await
    }

    /// Tell a post owner their post was flagged. The flagger stays anonymous.
    pub async fn notify_flag_created(
        &self,
        post: &posts::Model,
    ) -> CoreResult<Option<notifications::Model>> {
        self.emit(NewNotification::new(post.user_id, NotificationType::FlagCreated).post(post.id))
            .await
    }

    /// Tell a post owner how a flag on their post was resolved.
    ///
    /// Nothing is sent for `Pending`, which is not a review outcome.
    pub async fn notify_flag_reviewed(
        &self,
        post: &posts::Model,
        status: FlagStatus,
    ) -> CoreResult<Option<notifications::Model>> {
        let notification_type = match status {
            FlagStatus::Approved => NotificationType::FlagApproved,
            FlagStatus::Rejected => NotificationType::FlagRejected,
            FlagStatus::Pending => return Ok(None),
        };

        self.emit(NewNotification::new(post.user_id, notification_type).post(post.id))
            .await
    }

    /// Deliver an admin warning to its target.
    pub async fn notify_warning(
        &self,
        target_user_id: i32,
        admin_user_id: i32,
        message: &str,
    ) -> CoreResult<Option<notifications::Model>> {
        self.emit(
            NewNotification::new(target_user_id, NotificationType::Warning)
                .actor(admin_user_id)
                .message(message),
        )
        .await
    }
}
