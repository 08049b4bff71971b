//! Directed follow graph between users

use crate::error::CoreResult;
use crate::orm::{user_follows, users};
use chrono::Utc;
use sea_orm::{entity::*, query::*, DatabaseConnection, PaginatorTrait};
use std::collections::HashMap;

/// Follow edges. Raising the FOLLOW notification after a successful
/// `follow` is up to the caller, via `NotificationHub::notify_follow`.
#[derive(Clone)]
pub struct FollowGraph {
    db: DatabaseConnection,
}

impl FollowGraph {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create an edge. False for a self-follow or an edge that already exists.
    pub async fn follow(&self, follower_id: i32, followed_id: i32) -> CoreResult<bool> {
        if follower_id == followed_id {
            return Ok(false);
        }

        crate::user::require_user(&self.db, follower_id).await?;
        crate::user::require_user(&self.db, followed_id).await?;

        if self.is_following(follower_id, followed_id).await? {
            return Ok(false);
        }

        let edge = user_follows::ActiveModel {
            follower_id: Set(follower_id),
            followed_id: Set(followed_id),
            created_at: Set(Utc::now().naive_utc()),
            ..Default::default()
        };

        match edge.insert(&self.db).await {
            Ok(_) => {
                log::debug!("User {} now follows user {}", follower_id, followed_id);
                Ok(true)
            }
            Err(e) => {
                // A concurrent follow of the same pair won the unique constraint.
                if self.is_following(follower_id, followed_id).await? {
                    log::debug!(
                        "Follow {} -> {} already created concurrently: {}",
                        follower_id,
                        followed_id,
                        e
                    );
                    Ok(false)
                } else {
                    Err(e.into())
                }
            }
        }
    }

    /// Remove an edge. False if there was none.
    pub async fn unfollow(&self, follower_id: i32, followed_id: i32) -> CoreResult<bool> {
        let result = user_follows::Entity::delete_many()
            .filter(user_follows::Column::FollowerId.eq(follower_id))
            .filter(user_follows::Column::FollowedId.eq(followed_id))
            .exec(&self.db)
            .await?;

        if result.rows_affected > 0 {
            log::debug!("User {} unfollowed user {}", follower_id, followed_id);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub async fn is_following(&self, follower_id: i32, followed_id: i32) -> CoreResult<bool> {
        let count = user_follows::Entity::find()
            .filter(user_follows::Column::FollowerId.eq(follower_id))
            .filter(user_follows::Column::FollowedId.eq(followed_id))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }

    /// Number of users following `user_id`.
    pub async fn follower_count(&self, user_id: i32) -> CoreResult<u64> {
        let count = user_follows::Entity::find()
            .filter(user_follows::Column::FollowedId.eq(user_id))
            .count(&self.db)
            .await?;

        Ok(count as u64)
    }

    /// Number of users `user_id` follows.
    pub async fn following_count(&self, user_id: i32) -> CoreResult<u64> {
        let count = user_follows::Entity::find()
            .filter(user_follows::Column::FollowerId.eq(user_id))
            .count(&self.db)
            .await?;

        Ok(count as u64)
    }

    /// Users following `user_id`, oldest edge first.
    pub async fn list_followers(&self, user_id: i32) -> CoreResult<Vec<users::Model>> {
        let edges = user_follows::Entity::find()
            .filter(user_follows::Column::FollowedId.eq(user_id))
            .order_by_asc(user_follows::Column::Id)
            .all(&self.db)
            .await?;

        self.users_in_order(edges.iter().map(|e| e.follower_id).collect())
            .await
    }

    /// Users `user_id` follows, oldest edge first.
    pub async fn list_following(&self, user_id: i32) -> CoreResult<Vec<users::Model>> {
        let edges = user_follows::Entity::find()
            .filter(user_follows::Column::FollowerId.eq(user_id))
            .order_by_asc(user_follows::Column::Id)
            .all(&self.db)
            .await?;

        self.users_in_order(edges.iter().map(|e| e.followed_id).collect())
            .await
    }

    /// Load users by id, keeping the order of `ids`.
    async fn users_in_order(&self, ids: Vec<i32>) -> CoreResult<Vec<users::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut by_id: HashMap<i32, users::Model> = users::Entity::find()
            .filter(users::Column::Id.is_in(ids.clone()))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|u| (u.id, u))
            .collect();

        Ok(ids.into_iter().filter_map(|id| by_id.remove(&id)).collect())
    }
}
