use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use serde_json::Value;
use uuid::Uuid;

use super::now;
use crate::entities::{NoticeType, notice};

/// Content of a notice about to be written.
#[derive(Debug, Clone)]
pub struct NewNotice {
    pub user_id: Uuid,
    pub notice_type: NoticeType,
    pub title: String,
    pub content: String,
    pub related_id: Option<Uuid>,
    pub metadata: Option<Value>,
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<notice::Model>, DbErr> {
    notice::Entity::find_by_id(id).one(db).await
}

/// An unread notice of the same kind about the same entity for the same recipient.
pub async fn find_unread_match<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    notice_type: NoticeType,
    related_id: Option<Uuid>,
) -> Result<Option<notice::Model>, DbErr> {
    let mut query = notice::Entity::find()
        .filter(notice::Column::UserId.eq(user_id))
        .filter(notice::Column::NoticeType.eq(notice_type))
        .filter(notice::Column::IsRead.eq(false));
    query = match related_id {
        Some(id) => query.filter(notice::Column::RelatedId.eq(id)),
        None => query.filter(notice::Column::RelatedId.is_null()),
    };
    query.one(db).await
}

pub async fn insert<C: ConnectionTrait>(db: &C, new: NewNotice) -> Result<notice::Model, DbErr> {
    let now = now();
    notice::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(new.user_id),
        notice_type: Set(new.notice_type),
        title: Set(new.title),
        content: Set(new.content),
        is_read: Set(false),
        related_id: Set(new.related_id),
        metadata: Set(new.metadata),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
}

/// Replace title, content and metadata and mark unread again.
pub async fn refresh<C: ConnectionTrait>(
    db: &C,
    existing: notice::Model,
    new: NewNotice,
) -> Result<notice::Model, DbErr> {
    let mut active: notice::ActiveModel = existing.into();
    active.title = Set(new.title);
    active.content = Set(new.content);
    active.metadata = Set(new.metadata);
    active.is_read = Set(false);
    active.updated_at = Set(now());
    active.update(db).await
}

pub async fn mark_read<C: ConnectionTrait>(db: &C, existing: notice::Model) -> Result<notice::Model, DbErr> {
    let mut active: notice::ActiveModel = existing.into();
    active.is_read = Set(true);
    active.updated_at = Set(now());
    active.update(db).await
}

pub async fn mark_all_read<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<u64, DbErr> {
    Ok(notice::Entity::update_many()
        .col_expr(notice::Column::IsRead, Expr::value(true))
        .col_expr(notice::Column::UpdatedAt, Expr::value(now()))
        .filter(notice::Column::UserId.eq(user_id))
        .filter(notice::Column::IsRead.eq(false))
        .exec(db)
        .await?
        .rows_affected)
}

pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
    Ok(notice::Entity::delete_by_id(id).exec(db).await?.rows_affected)
}

pub async fn list<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    unread_only: bool,
    offset: u64,
    limit: u64,
) -> Result<(Vec<notice::Model>, u64), DbErr> {
    let mut query = notice::Entity::find().filter(notice::Column::UserId.eq(user_id));
    if unread_only {
        query = query.filter(notice::Column::IsRead.eq(false));
    }
    let total = query.clone().count(db).await?;
    let items = query
        .order_by_desc(notice::Column::UpdatedAt)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;
    Ok((items, total))
}

pub async fn count_unread<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<u64, DbErr> {
    notice::Entity::find()
        .filter(notice::Column::UserId.eq(user_id))
        .filter(notice::Column::IsRead.eq(false))
        .count(db)
        .await
}
