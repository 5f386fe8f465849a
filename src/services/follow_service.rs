use sea_orm::DatabaseConnection;
use uuid::Uuid;

use super::notice_service;
use crate::dto::user::AuthorSummary;
use crate::dto::{Page, PageQuery};
use crate::entities::{NoticeType, follow, user};
use crate::error::AppError;
use crate::repositories::notice_repo::NewNotice;
use crate::repositories::{relation_repo, user_repo};

/// Follow another user and notify them.
///
/// # Errors
///
/// `BadRequest` for self-follow, `NotFound` for unknown users, `Forbidden` if either side
/// blocks the other, `Conflict` if already following.
pub async fn follow(
    db: &DatabaseConnection,
    follower: &user::Model,
    target_id: Uuid,
) -> Result<follow::Model, AppError> {
    if follower.id == target_id {
        return Err(AppError::BadRequest("You cannot follow yourself.".to_string()));
    }
    user_repo::find_live(db, target_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;
    if relation_repo::blocked_either_way(db, follower.id, target_id).await? {
        return Err(AppError::Forbidden("You cannot follow this user.".to_string()));
    }
    if relation_repo::find_follow(db, follower.id, target_id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("You already follow this user.".to_string()));
    }

    let follow = relation_repo::insert_follow(db, follower.id, target_id).await?;

    notice_service::notify_best_effort(
        db,
        NewNotice {
            user_id: target_id,
            notice_type: NoticeType::Follow,
            title: "New follower".to_string(),
            content: format!("{} started following you.", follower.nickname),
            related_id: Some(follower.id),
            metadata: None,
        },
    )
    .await;

    Ok(follow)
}

/// # Errors
///
/// `Conflict` if not following.
pub async fn unfollow(db: &DatabaseConnection, follower_id: Uuid, target_id: Uuid) -> Result<(), AppError> {
    let follow = relation_repo::find_follow(db, follower_id, target_id)
        .await?
        .ok_or_else(|| AppError::Conflict("You do not follow this user.".to_string()))?;
    relation_repo::delete_follow(db, follow.id).await?;
    Ok(())
}

/// # Errors
///
/// `NotFound` for unknown users.
pub async fn followers(
    db: &DatabaseConnection,
    user_id: Uuid,
    page: PageQuery,
) -> Result<Page<AuthorSummary>, AppError> {
    user_repo::find_live(db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;
    let (items, total) = relation_repo::followers(db, user_id, page.offset(), page.limit).await?;
    Ok(page.into_page(items, total).map(|u| AuthorSummary::from(&u)))
}

/// # Errors
///
/// `NotFound` for unknown users.
pub async fn following(
    db: &DatabaseConnection,
    user_id: Uuid,
    page: PageQuery,
) -> Result<Page<AuthorSummary>, AppError> {
    user_repo::find_live(db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;
    let (items, total) = relation_repo::following(db, user_id, page.offset(), page.limit).await?;
    Ok(page.into_page(items, total).map(|u| AuthorSummary::from(&u)))
}
