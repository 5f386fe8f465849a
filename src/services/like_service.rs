//! Post and comment likes. Each like row and its counter move together.

use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Serialize;
use uuid::Uuid;

use super::{finish, post_service};
use crate::dto::{Page, PageQuery};
use crate::entities::post;
use crate::error::AppError;
use crate::repositories::{comment_repo, post_repo, reaction_repo};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    pub liked: bool,
    pub like_count: i32,
}

/// # Errors
///
/// `NotFound` for unknown or invisible posts, `Conflict` if already liked.
pub async fn like_post(db: &DatabaseConnection, post_id: Uuid, user_id: Uuid) -> Result<LikeStatus, AppError> {
    post_service::visible_post(db, post_id, Some(user_id)).await?;

    let txn = db.begin().await?;
    let result = async {
        if reaction_repo::find_post_like(&txn, post_id, user_id).await?.is_some() {
            return Err(AppError::Conflict("You already liked this post.".to_string()));
        }
        reaction_repo::insert_post_like(&txn, post_id, user_id).await?;
        post_repo::adjust_likes(&txn, post_id, 1).await?;
        Ok::<_, AppError>(())
    }
    .await;
    finish(txn, result, "like post").await?;

    post_status(db, post_id, true).await
}

/// # Errors
///
/// `NotFound` for unknown or invisible posts, `Conflict` if not liked.
pub async fn unlike_post(db: &DatabaseConnection, post_id: Uuid, user_id: Uuid) -> Result<LikeStatus, AppError> {
    post_service::visible_post(db, post_id, Some(user_id)).await?;

    let txn = db.begin().await?;
    let result = async {
        let like = reaction_repo::find_post_like(&txn, post_id, user_id)
            .await?
            .ok_or_else(|| AppError::Conflict("You have not liked this post.".to_string()))?;
        reaction_repo::delete_post_like(&txn, like.id).await?;
        post_repo::adjust_likes(&txn, post_id, -1).await?;
        Ok::<_, AppError>(())
    }
    .await;
    finish(txn, result, "unlike post").await?;

    post_status(db, post_id, false).await
}

async fn post_status(db: &DatabaseConnection, post_id: Uuid, liked: bool) -> Result<LikeStatus, AppError> {
    let like_count = post_repo::find_by_id(db, post_id)
        .await?
        .map_or(0, |p| p.like_count);
    Ok(LikeStatus { liked, like_count })
}

/// # Errors
///
/// `NotFound` for unknown comments or ones under an invisible post, `Conflict` if already liked.
pub async fn like_comment(
    db: &DatabaseConnection,
    comment_id: Uuid,
    user_id: Uuid,
) -> Result<LikeStatus, AppError> {
    visible_comment(db, comment_id, user_id).await?;

    let txn = db.begin().await?;
    let result = async {
        if reaction_repo::find_comment_like(&txn, comment_id, user_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "You already liked this comment.".to_string(),
            ));
        }
        reaction_repo::insert_comment_like(&txn, comment_id, user_id).await?;
        comment_repo::adjust_likes(&txn, comment_id, 1).await?;
        Ok::<_, AppError>(())
    }
    .await;
    finish(txn, result, "like comment").await?;

    comment_status(db, comment_id, true).await
}

/// # Errors
///
/// `NotFound` for unknown comments or ones under an invisible post, `Conflict` if not liked.
pub async fn unlike_comment(
    db: &DatabaseConnection,
    comment_id: Uuid,
    user_id: Uuid,
) -> Result<LikeStatus, AppError> {
    visible_comment(db, comment_id, user_id).await?;

    let txn = db.begin().await?;
    let result = async {
        let like = reaction_repo::find_comment_like(&txn, comment_id, user_id)
            .await?
            .ok_or_else(|| AppError::Conflict("You have not liked this comment.".to_string()))?;
        reaction_repo::delete_comment_like(&txn, like.id).await?;
        comment_repo::adjust_likes(&txn, comment_id, -1).await?;
        Ok::<_, AppError>(())
    }
    .await;
    finish(txn, result, "unlike comment").await?;

    comment_status(db, comment_id, false).await
}

async fn visible_comment(db: &DatabaseConnection, comment_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    let comment = comment_repo::find_by_id(db, comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found.".to_string()))?;
    post_service::visible_post(db, comment.post_id, Some(user_id)).await?;
    Ok(())
}

async fn comment_status(
    db: &DatabaseConnection,
    comment_id: Uuid,
    liked: bool,
) -> Result<LikeStatus, AppError> {
    let like_count = comment_repo::find_by_id(db, comment_id)
        .await?
        .map_or(0, |c| c.like_count);
    Ok(LikeStatus { liked, like_count })
}

/// # Errors
///
/// Database failures.
pub async fn liked_posts(
    db: &DatabaseConnection,
    user_id: Uuid,
    page: PageQuery,
) -> Result<Page<post::Model>, AppError> {
    let (items, total) = post_repo::liked_by(db, user_id, page.offset(), page.limit).await?;
    Ok(page.into_page(items, total))
}
