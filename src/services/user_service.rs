use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DatabaseConnection, TransactionTrait};
use uuid::Uuid;

use crate::dto::user::{AuthorSummary, PublicProfile, UpdateMeRequest};
use crate::dto::{Page, PageQuery};
use crate::entities::{Role, user};
use crate::error::AppError;
use super::finish;
use crate::repositories::{now, post_repo, relation_repo, user_repo};

/// # Errors
///
/// `Conflict` if the new nickname is taken.
pub async fn update_me(
    db: &DatabaseConnection,
    user: user::Model,
    dto: UpdateMeRequest,
) -> Result<user::Model, AppError> {
    let user_id = user.id;
    let mut active: user::ActiveModel = user.into();

    if let Some(nickname) = dto.nickname {
        if user_repo::nickname_taken(db, &nickname, Some(user_id)).await? {
            return Err(AppError::Conflict("Nickname is already taken.".to_string()));
        }
        active.nickname = Set(nickname);
    }
    if let Some(name) = dto.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(bio) = dto.bio {
        active.bio = Set(Some(bio).filter(|b| !b.trim().is_empty()));
    }
    if let Some(profile_image) = dto.profile_image {
        active.profile_image = Set(profile_image);
    }
    active.updated_at = Set(now());
    Ok(active.update(db).await?)
}

/// Soft-delete the caller's account, freeing its e-mail, nickname and Google identity.
///
/// # Errors
///
/// Database failures.
pub async fn delete_me(db: &DatabaseConnection, user: user::Model) -> Result<(), AppError> {
    let user_id = user.id;
    let txn = db.begin().await?;
    let result = async {
        user_repo::soft_delete(&txn, user).await?;
        user_repo::delete_auth_by_user(&txn, user_id).await?;
        Ok::<_, AppError>(())
    }
    .await;
    finish(txn, result, "delete account").await?;
    tracing::info!(%user_id, "Account deleted");
    Ok(())
}

/// # Errors
///
/// `NotFound` for unknown or deleted users.
pub async fn public_profile(db: &DatabaseConnection, user_id: Uuid) -> Result<PublicProfile, AppError> {
    let user = user_repo::find_live(db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))?;

    Ok(PublicProfile {
        user: AuthorSummary::from(&user),
        bio: user.bio.clone(),
        created_at: user.created_at.to_rfc3339(),
        follower_count: relation_repo::count_followers(db, user_id).await?,
        following_count: relation_repo::count_following(db, user_id).await?,
        post_count: post_repo::count_public_owned(db, user_id).await?,
    })
}

/// # Errors
///
/// Database failures.
pub async fn nickname_available(db: &DatabaseConnection, nickname: &str) -> Result<bool, AppError> {
    Ok(!user_repo::nickname_taken(db, nickname.trim(), None).await?)
}

/// # Errors
///
/// Database failures.
pub async fn search_users(
    db: &DatabaseConnection,
    term: &str,
    page: PageQuery,
) -> Result<Page<AuthorSummary>, AppError> {
    let (items, total) = user_repo::search(db, term, page.offset(), page.limit).await?;
    Ok(page.into_page(items, total).map(|u| AuthorSummary::from(&u)))
}

// ── admin ───────────────────────────────────────────────────────────────────

/// # Errors
///
/// Database failures.
pub async fn list_users(
    db: &DatabaseConnection,
    keyword: Option<&str>,
    page: PageQuery,
) -> Result<Page<user::Model>, AppError> {
    let (items, total) = user_repo::list(db, keyword, page.offset(), page.limit).await?;
    Ok(page.into_page(items, total))
}

async fn find_user(db: &DatabaseConnection, user_id: Uuid) -> Result<user::Model, AppError> {
    user_repo::find_by_id(db, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found.".to_string()))
}

/// # Errors
///
/// `NotFound`, `Forbidden` when targeting a super-admin.
pub async fn set_active(
    db: &DatabaseConnection,
    user_id: Uuid,
    is_active: bool,
) -> Result<user::Model, AppError> {
    let user = find_user(db, user_id).await?;
    if user.role == Role::SuperAdmin {
        return Err(AppError::Forbidden(
            "A super admin cannot be deactivated.".to_string(),
        ));
    }
    let mut active: user::ActiveModel = user.into();
    active.is_active = Set(is_active);
    active.updated_at = Set(now());
    let user = active.update(db).await?;
    tracing::info!(%user_id, is_active, "User active flag changed");
    Ok(user)
}

/// # Errors
///
/// `NotFound`, `Forbidden` when targeting a super-admin.
pub async fn hard_delete(db: &DatabaseConnection, user_id: Uuid) -> Result<(), AppError> {
    let user = find_user(db, user_id).await?;
    if user.role == Role::SuperAdmin {
        return Err(AppError::Forbidden(
            "A super admin cannot be deleted.".to_string(),
        ));
    }
    user_repo::hard_delete(db, user_id).await?;
    tracing::warn!(%user_id, "User permanently deleted");
    Ok(())
}

/// # Errors
///
/// `NotFound`, `BadRequest` when changing one's own role.
pub async fn set_role(
    db: &DatabaseConnection,
    acting_id: Uuid,
    user_id: Uuid,
    role: Role,
) -> Result<user::Model, AppError> {
    if acting_id == user_id {
        return Err(AppError::BadRequest(
            "You cannot change your own role.".to_string(),
        ));
    }
    let user = find_user(db, user_id).await?;
    let mut active: user::ActiveModel = user.into();
    active.role = Set(role);
    active.updated_at = Set(now());
    let user = active.update(db).await?;
    tracing::info!(%user_id, %role, "User role changed");
    Ok(user)
}
