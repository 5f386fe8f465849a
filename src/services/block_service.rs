use sea_orm::{DatabaseConnection, TransactionTrait};
use uuid::Uuid;

use super::finish;
use crate::dto::user::AuthorSummary;
use crate::entities::user_block;
use crate::error::AppError;
use crate::repositories::{relation_repo, user_repo};

/// Block a user. Follows in both directions are removed in the same transaction.
///
/// # Errors
///
/// `BadRequest` for self-block, `NotFound` for unknown users, `Conflict` if already blocked.
pub async fn block(
    db: &DatabaseConnection,
    blocker_id: Uuid,
    target_id: Uuid,
) -> Result<user_block::Model, AppError> {
    if blocker_id == target_id {
        return Err(AppError::BadRequest("You cannot block yourself.".to_string()));
    }
    user_repo::find_by_id(db, target_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    let txn = db.begin().await?;
    let result = async {
        if relation_repo::find_block(&txn, blocker_id, target_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("You already block this user.".to_string()));
        }
        let block = relation_repo::insert_block(&txn, blocker_id, target_id).await?;
        let removed = relation_repo::delete_follows_between(&txn, blocker_id, target_id).await?;
        Ok::<_, AppError>((block, removed))
    }
    .await;
    let (block, removed_follows) = finish(txn, result, "block user").await?;

    tracing::info!(%blocker_id, %target_id, removed_follows, "User blocked");
    Ok(block)
}

/// # Errors
///
/// `Conflict` if the user is not blocked.
pub async fn unblock(db: &DatabaseConnection, blocker_id: Uuid, target_id: Uuid) -> Result<(), AppError> {
    let block = relation_repo::find_block(db, blocker_id, target_id)
        .await?
        .ok_or_else(|| AppError::Conflict("You do not block this user.".to_string()))?;
    relation_repo::delete_block(db, block.id).await?;
    Ok(())
}

/// # Errors
///
/// Database failures.
pub async fn list_blocked(db: &DatabaseConnection, blocker_id: Uuid) -> Result<Vec<AuthorSummary>, AppError> {
    Ok(relation_repo::blocked_users(db, blocker_id)
        .await?
        .iter()
        .map(AuthorSummary::from)
        .collect())
}
