//! Like/dislike ledger for posts
//!
//! A (post, user) pair holds at most one vote row, enforced by the
//! UNIQUE(post_id, user_id) constraint. A toggle is a short chain of
//! conditional writes (remove same kind, flip opposite kind, insert) so each
//! step is atomic on its own and no read lock is ever upgraded.

use crate::error::{CoreError, CoreResult};
use crate::notifications::NotificationHub;
use crate::orm::post_votes::{self, VoteKind};
use crate::orm::post_comments;
use chrono::Utc;
use sea_orm::{entity::*, query::*, sea_query::Expr, DatabaseConnection, PaginatorTrait};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Vote a user currently holds on a post.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum VoteState {
    None,
    Liked,
    Disliked,
}

impl From<Option<VoteKind>> for VoteState {
    fn from(kind: Option<VoteKind>) -> Self {
        match kind {
            Some(VoteKind::Like) => VoteState::Liked,
            Some(VoteKind::Dislike) => VoteState::Disliked,
            None => VoteState::None,
        }
    }
}

/// Aggregate interaction counts for one post.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PostStats {
    pub post_id: i32,
    pub like_count: u64,
    pub dislike_count: u64,
    pub comment_count: u64,
    /// Viewer's vote; always false when no viewer was given
    pub liked_by_viewer: bool,
    pub disliked_by_viewer: bool,
}

#[derive(Clone)]
pub struct InteractionLedger {
    db: DatabaseConnection,
    hub: NotificationHub,
    /// Inserts that lost the unique-pair race and adopted the winner's row
    conflicts: Arc<AtomicU64>,
}

impl InteractionLedger {
    pub fn new(db: DatabaseConnection, hub: NotificationHub) -> Self {
        Self {
            db,
            hub,
            conflicts: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Add a like, or remove it if present. A dislike is replaced.
    pub async fn toggle_like(&self, post_id: i32, user_id: i32) -> CoreResult<VoteState> {
        self.toggle(post_id, user_id, VoteKind::Like).await
    }

    /// Add a dislike, or remove it if present. A like is replaced.
    pub async fn toggle_dislike(&self, post_id: i32, user_id: i32) -> CoreResult<VoteState> {
        self.toggle(post_id, user_id, VoteKind::Dislike).await
    }

    /// Number of toggles so far that lost an insert race and converged on
    /// the concurrent winner's vote.
    pub fn conflicts_resolved(&self) -> u64 {
        self.conflicts.load(Ordering::Relaxed)
    }

    async fn toggle(&self, post_id: i32, user_id: i32, kind: VoteKind) -> CoreResult<VoteState> {
        let post = crate::post::require_post(&self.db, post_id).await?;
        crate::user::require_user(&self.db, user_id).await?;

        let (before, after) = self.apply_toggle(post_id, user_id, kind).await?;

        log::debug!(
            "Vote on post {} by user {}: {:?} -> {:?}",
            post_id,
            user_id,
            before,
            after
        );

        if after == VoteState::Liked && before != VoteState::Liked {
            self.hub.notify_like(&post, user_id).await?;
        }

        Ok(after)
    }

    /// Returns the pair's state before and after the toggle.
    async fn apply_toggle(
        &self,
        post_id: i32,
        user_id: i32,
        kind: VoteKind,
    ) -> CoreResult<(VoteState, VoteState)> {
        let requested = VoteState::from(Some(kind));

        let removed = post_votes::Entity::delete_many()
            .filter(post_votes::Column::PostId.eq(post_id))
            .filter(post_votes::Column::UserId.eq(user_id))
            .filter(post_votes::Column::Kind.eq(kind.into_value()))
            .exec(&self.db)
            .await?;
        if removed.rows_affected > 0 {
            return Ok((requested, VoteState::None));
        }

        let flipped = post_votes::Entity::update_many()
            .col_expr(post_votes::Column::Kind, Expr::value(kind.into_value()))
            .col_expr(
                post_votes::Column::CreatedAt,
                Expr::value(Utc::now().naive_utc()),
            )
            .filter(post_votes::Column::PostId.eq(post_id))
            .filter(post_votes::Column::UserId.eq(user_id))
            .filter(post_votes::Column::Kind.ne(kind.into_value()))
            .exec(&self.db)
            .await?;
        if flipped.rows_affected > 0 {
            return Ok((VoteState::from(Some(kind.opposite())), requested));
        }

        let vote = post_votes::ActiveModel {
            post_id: Set(post_id),
            user_id: Set(user_id),
            kind: Set(kind),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        };

        match vote.insert(&self.db).await {
            Ok(_) => Ok((VoteState::None, requested)),
            Err(e) => {
                // Only a row for this pair can have rejected the insert;
                // without one the failure is real.
                let current = self.current_state(post_id, user_id).await?;
                if current == VoteState::None {
                    log::error!(
                        "Vote insert on post {} by user {} failed: {}",
                        post_id,
                        user_id,
                        e
                    );
                    return Err(e.into());
                }

                self.conflicts.fetch_add(1, Ordering::Relaxed);
                log::debug!(
                    "Vote on post {} by user {} lost an insert race, adopting {:?}: {}",
                    post_id,
                    user_id,
                    current,
                    e
                );
                Ok((current, current))
            }
        }
    }

    async fn current_state(&self, post_id: i32, user_id: i32) -> CoreResult<VoteState> {
        let vote = post_votes::Entity::find()
            .filter(post_votes::Column::PostId.eq(post_id))
            .filter(post_votes::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;

        Ok(VoteState::from(vote.map(|v| v.kind)))
    }

    async fn count(&self, post_id: i32, kind: VoteKind) -> CoreResult<u64> {
        let count = post_votes::Entity::find()
            .filter(post_votes::Column::PostId.eq(post_id))
            .filter(post_votes::Column::Kind.eq(kind.into_value()))
            .count(&self.db)
            .await?;

        Ok(count as u64)
    }

    pub async fn like_count(&self, post_id: i32) -> CoreResult<u64> {
        self.count(post_id, VoteKind::Like).await
    }

    pub async fn dislike_count(&self, post_id: i32) -> CoreResult<u64> {
        self.count(post_id, VoteKind::Dislike).await
    }

    pub async fn has_user_liked(&self, post_id: i32, user_id: i32) -> CoreResult<bool> {
        Ok(self.current_state(post_id, user_id).await? == VoteState::Liked)
    }

    pub async fn has_user_disliked(&self, post_id: i32, user_id: i32) -> CoreResult<bool> {
        Ok(self.current_state(post_id, user_id).await? == VoteState::Disliked)
    }

    /// Counts for a post plus, when a viewer is given, that viewer's vote.
    pub async fn post_stats(&self, post_id: i32, viewer_id: Option<i32>) -> CoreResult<PostStats> {
        crate::post::require_post(&self.db, post_id).await?;

        let comment_count = async {
            let count = post_comments::Entity::find()
                .filter(post_comments::Column::PostId.eq(post_id))
                .count(&self.db)
                .await?;
            Ok::<u64, CoreError>(count as u64)
        };
        let viewer_state = async {
            match viewer_id {
                Some(user_id) => self.current_state(post_id, user_id).await,
                None => Ok(VoteState::None),
            }
        };

        let (like_count, dislike_count, comment_count, viewer_state) = futures::try_join!(
            self.like_count(post_id),
            self.dislike_count(post_id),
            comment_count,
            viewer_state
        )?;

        Ok(PostStats {
            post_id,
            like_count,
            dislike_count,
            comment_count,
            liked_by_viewer: viewer_state == VoteState::Liked,
            disliked_by_viewer: viewer_state == VoteState::Disliked,
        })
    }
}
