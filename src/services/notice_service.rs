use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::dto::{Page, PageQuery};
use crate::entities::notice;
use crate::error::AppError;
use crate::repositories::notice_repo::{self, NewNotice};

/// Write a notice. Kinds that upsert while unread refresh the existing unread notice about
/// the same entity instead of adding another.
///
/// # Errors
///
/// Database failures.
pub async fn notify(db: &DatabaseConnection, new: NewNotice) -> Result<notice::Model, AppError> {
    if new.notice_type.upserts_while_unread() {
        if let Some(existing) =
            notice_repo::find_unread_match(db, new.user_id, new.notice_type, new.related_id).await?
        {
            return Ok(notice_repo::refresh(db, existing, new).await?);
        }
    }
    Ok(notice_repo::insert(db, new).await?)
}

/// [`notify`] for side effects: failures are logged and dropped.
pub async fn notify_best_effort(db: &DatabaseConnection, new: NewNotice) {
    let user_id = new.user_id;
    let notice_type = new.notice_type;
    if let Err(err) = notify(db, new).await {
        tracing::warn!(%user_id, ?notice_type, "Failed to create notice: {err:?}");
    }
}

pub async fn list(
    db: &DatabaseConnection,
    user_id: Uuid,
    unread_only: bool,
    page: PageQuery,
) -> Result<Page<notice::Model>, AppError> {
    let (items, total) =
        notice_repo::list(db, user_id, unread_only, page.offset(), page.limit).await?;
    Ok(page.into_page(items, total))
}

pub async fn unread_count(db: &DatabaseConnection, user_id: Uuid) -> Result<u64, AppError> {
    Ok(notice_repo::count_unread(db, user_id).await?)
}

async fn find_own(
    db: &DatabaseConnection,
    user_id: Uuid,
    notice_id: Uuid,
) -> Result<notice::Model, AppError> {
    let notice = notice_repo::find_by_id(db, notice_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Notice not found.".to_string()))?;
    if notice.user_id != user_id {
        return Err(AppError::Forbidden(
            "You can only manage your own notices.".to_string(),
        ));
    }
    Ok(notice)
}

/// Mark one notice read. An already-read notice is returned as is.
///
/// # Errors
///
/// `NotFound` for unknown ids, `Forbidden` for other users' notices.
pub async fn mark_read(
    db: &DatabaseConnection,
    user_id: Uuid,
    notice_id: Uuid,
) -> Result<notice::Model, AppError> {
    let notice = find_own(db, user_id, notice_id).await?;
    if notice.is_read {
        return Ok(notice);
    }
    Ok(notice_repo::mark_read(db, notice).await?)
}

pub async fn mark_all_read(db: &DatabaseConnection, user_id: Uuid) -> Result<u64, AppError> {
    Ok(notice_repo::mark_all_read(db, user_id).await?)
}

pub async fn delete(db: &DatabaseConnection, user_id: Uuid, notice_id: Uuid) -> Result<(), AppError> {
    let notice = find_own(db, user_id, notice_id).await?;
    notice_repo::delete(db, notice.id).await?;
    Ok(())
}
