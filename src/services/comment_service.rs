use sea_orm::{DatabaseConnection, TransactionTrait};
use uuid::Uuid;

use super::{finish, notice_service, post_service};
use crate::dto::comment::{CommentView, CreateCommentRequest};
use crate::dto::user::AuthorSummary;
use crate::entities::{NoticeType, comment, user};
use crate::error::AppError;
use crate::repositories::notice_repo::NewNotice;
use crate::repositories::{comment_repo, post_repo};

/// Comment on a post the author can see.
///
/// # Errors
///
/// `NotFound` for invisible posts, `BadRequest` when the parent is missing or belongs to
/// another post.
pub async fn create_comment(
    db: &DatabaseConnection,
    post_id: Uuid,
    author: &user::Model,
    dto: CreateCommentRequest,
) -> Result<CommentView, AppError> {
    let post = post_service::visible_post(db, post_id, Some(author.id)).await?;

    if let Some(parent_id) = dto.parent_id {
        let parent_ok = comment_repo::find_by_id(db, parent_id)
            .await?
            .is_some_and(|parent| parent.post_id == post_id);
        if !parent_ok {
            return Err(AppError::BadRequest(
                "Parent comment does not exist on this post.".to_string(),
            ));
        }
    }

    let txn = db.begin().await?;
    let result = async {
        let comment =
            comment_repo::insert(&txn, post_id, author.id, dto.parent_id, dto.content).await?;
        post_repo::adjust_comments(&txn, post_id, 1).await?;
        Ok::<_, AppError>(comment)
    }
    .await;
    let comment = finish(txn, result, "create comment").await?;

    if let Some(owner) = post_repo::find_owner(db, post_id).await? {
        if owner.user_id != author.id {
            notice_service::notify_best_effort(
                db,
                NewNotice {
                    user_id: owner.user_id,
                    notice_type: NoticeType::Comment,
                    title: "New comment".to_string(),
                    content: format!("{} commented on \"{}\".", author.nickname, post.title),
                    related_id: Some(post_id),
                    metadata: Some(serde_json::json!({
                        "commentId": comment.id,
                        "authorId": author.id,
                    })),
                },
            )
            .await;
        }
    }

    Ok(CommentView {
        comment,
        author: Some(AuthorSummary::from(author)),
    })
}

/// Live comments of a visible post, oldest first.
///
/// # Errors
///
/// `NotFound` for invisible posts.
pub async fn list_comments(
    db: &DatabaseConnection,
    post_id: Uuid,
    viewer: Option<Uuid>,
) -> Result<Vec<CommentView>, AppError> {
    post_service::visible_post(db, post_id, viewer).await?;
    Ok(comment_repo::list_by_post(db, post_id)
        .await?
        .into_iter()
        .map(|(comment, author)| CommentView {
            comment,
            author: author.as_ref().map(AuthorSummary::from),
        })
        .collect())
}

async fn find_own(
    db: &DatabaseConnection,
    comment_id: Uuid,
    user_id: Uuid,
) -> Result<comment::Model, AppError> {
    let comment = comment_repo::find_by_id(db, comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found.".to_string()))?;
    if comment.user_id != user_id {
        return Err(AppError::Forbidden(
            "You can only modify your own comments.".to_string(),
        ));
    }
    Ok(comment)
}

/// # Errors
///
/// `NotFound` for unknown comments, `Forbidden` for other users' comments.
pub async fn update_comment(
    db: &DatabaseConnection,
    comment_id: Uuid,
    user_id: Uuid,
    content: String,
) -> Result<comment::Model, AppError> {
    let comment = find_own(db, comment_id, user_id).await?;
    Ok(comment_repo::update_content(db, comment, content).await?)
}

/// Soft delete and decrement the post's comment count.
///
/// # Errors
///
/// `NotFound` for unknown comments, `Forbidden` for other users' comments.
pub async fn delete_comment(
    db: &DatabaseConnection,
    comment_id: Uuid,
    user_id: Uuid,
) -> Result<(), AppError> {
    let comment = find_own(db, comment_id, user_id).await?;
    let post_id = comment.post_id;

    let txn = db.begin().await?;
    let result = async {
        comment_repo::soft_delete(&txn, comment).await?;
        post_repo::adjust_comments(&txn, post_id, -1).await?;
        Ok::<_, AppError>(())
    }
    .await;
    finish(txn, result, "delete comment").await
}
