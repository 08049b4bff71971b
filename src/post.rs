//! Post lookups shared by the components.

use crate::error::{CoreError, CoreResult};
use crate::orm::posts;
use chrono::Utc;
use sea_orm::{entity::*, ConnectionTrait};

/// Resolve a post id or fail with `NotFound`.
pub async fn require_post<C: ConnectionTrait>(db: &C, id: i32) -> CoreResult<posts::Model> {
    posts::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| CoreError::not_found("post", id))
}

/// Insert a post for an existing user.
pub async fn insert_post<C: ConnectionTrait>(
    db: &C,
    owner_user_id: i32,
    content: &str,
    image_url: Option<String>,
) -> CoreResult<posts::Model> {
    crate::user::require_user(db, owner_user_id).await?;

    let now = Utc::now().naive_utc();
    let post = posts::ActiveModel {
        user_id: Set(owner_user_id),
        content: Set(content.to_owned()),
        image_url: Set(image_url),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    Ok(post.insert(db).await?)
}
