use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use super::now;
use crate::entities::{comment, user};

/// Non-deleted comment by id.
pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<comment::Model>, DbErr> {
    comment::Entity::find_by_id(id)
        .filter(comment::Column::DeletedAt.is_null())
        .one(db)
        .await
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    post_id: Uuid,
    user_id: Uuid,
    parent_id: Option<Uuid>,
    content: String,
) -> Result<comment::Model, DbErr> {
    let now = now();
    comment::ActiveModel {
        id: Set(Uuid::new_v4()),
        post_id: Set(post_id),
        user_id: Set(user_id),
        parent_id: Set(parent_id),
        content: Set(content),
        like_count: Set(0),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    }
    .insert(db)
    .await
}

pub async fn update_content<C: ConnectionTrait>(
    db: &C,
    comment: comment::Model,
    content: String,
) -> Result<comment::Model, DbErr> {
    let mut active: comment::ActiveModel = comment.into();
    active.content = Set(content);
    active.updated_at = Set(now());
    active.update(db).await
}

pub async fn soft_delete<C: ConnectionTrait>(db: &C, comment: comment::Model) -> Result<comment::Model, DbErr> {
    let now = now();
    let mut active: comment::ActiveModel = comment.into();
    active.deleted_at = Set(Some(now));
    active.updated_at = Set(now);
    active.update(db).await
}

/// Live comments of a post with their authors, oldest first.
pub async fn list_by_post<C: ConnectionTrait>(
    db: &C,
    post_id: Uuid,
) -> Result<Vec<(comment::Model, Option<user::Model>)>, DbErr> {
    comment::Entity::find()
        .filter(comment::Column::PostId.eq(post_id))
        .filter(comment::Column::DeletedAt.is_null())
        .order_by_asc(comment::Column::CreatedAt)
        .find_also_related(user::Entity)
        .all(db)
        .await
}

pub async fn adjust_likes<C: ConnectionTrait>(db: &C, id: Uuid, delta: i32) -> Result<(), DbErr> {
    comment::Entity::update_many()
        .col_expr(
            comment::Column::LikeCount,
            Expr::col(comment::Column::LikeCount).add(delta),
        )
        .filter(comment::Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(())
}
