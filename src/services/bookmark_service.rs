use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::dto::{Page, PageQuery};
use crate::entities::{bookmark, post};
use crate::error::AppError;
use crate::repositories::{post_repo, reaction_repo};
use crate::services::post_service;

/// # Errors
///
/// `NotFound` for unknown or invisible posts, `Conflict` if already bookmarked.
pub async fn add(db: &DatabaseConnection, post_id: Uuid, user_id: Uuid) -> Result<bookmark::Model, AppError> {
    post_service::visible_post(db, post_id, Some(user_id)).await?;
    if reaction_repo::find_bookmark(db, post_id, user_id).await?.is_some() {
        return Err(AppError::Conflict("Post is already bookmarked.".to_string()));
    }
    Ok(reaction_repo::insert_bookmark(db, post_id, user_id).await?)
}

/// # Errors
///
/// `Conflict` if the post is not bookmarked.
pub async fn remove(db: &DatabaseConnection, post_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    let bookmark = reaction_repo::find_bookmark(db, post_id, user_id)
        .await?
        .ok_or_else(|| AppError::Conflict("Post is not bookmarked.".to_string()))?;
    reaction_repo::delete_bookmark(db, bookmark.id).await?;
    Ok(())
}

/// # Errors
///
/// Database failures.
pub async fn list(
    db: &DatabaseConnection,
    user_id: Uuid,
    page: PageQuery,
) -> Result<Page<post::Model>, AppError> {
    let (items, total) = post_repo::bookmarked_by(db, user_id, page.offset(), page.limit).await?;
    Ok(page.into_page(items, total))
}
