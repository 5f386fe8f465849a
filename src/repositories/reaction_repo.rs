//! Likes and bookmarks: one row per (user, target) pair.

use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter};
use uuid::Uuid;

use super::now;
use crate::entities::{bookmark, comment_like, post_like};

pub async fn find_post_like<C: ConnectionTrait>(
    db: &C,
    post_id: Uuid,
    user_id: Uuid,
) -> Result<Option<post_like::Model>, DbErr> {
    post_like::Entity::find()
        .filter(post_like::Column::PostId.eq(post_id))
        .filter(post_like::Column::UserId.eq(user_id))
        .one(db)
        .await
}

pub async fn insert_post_like<C: ConnectionTrait>(
    db: &C,
    post_id: Uuid,
    user_id: Uuid,
) -> Result<post_like::Model, DbErr> {
    post_like::ActiveModel {
        id: Set(Uuid::new_v4()),
        post_id: Set(post_id),
        user_id: Set(user_id),
        created_at: Set(now()),
    }
    .insert(db)
    .await
}

pub async fn delete_post_like<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
    Ok(post_like::Entity::delete_by_id(id).exec(db).await?.rows_affected)
}

pub async fn find_comment_like<C: ConnectionTrait>(
    db: &C,
    comment_id: Uuid,
    user_id: Uuid,
) -> Result<Option<comment_like::Model>, DbErr> {
    comment_like::Entity::find()
        .filter(comment_like::Column::CommentId.eq(comment_id))
        .filter(comment_like::Column::UserId.eq(user_id))
        .one(db)
        .await
}

pub async fn insert_comment_like<C: ConnectionTrait>(
    db: &C,
    comment_id: Uuid,
    user_id: Uuid,
) -> Result<comment_like::Model, DbErr> {
    comment_like::ActiveModel {
        id: Set(Uuid::new_v4()),
        comment_id: Set(comment_id),
        user_id: Set(user_id),
        created_at: Set(now()),
    }
    .insert(db)
    .await
}

pub async fn delete_comment_like<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
    Ok(comment_like::Entity::delete_by_id(id).exec(db).await?.rows_affected)
}

pub async fn find_bookmark<C: ConnectionTrait>(
    db: &C,
    post_id: Uuid,
    user_id: Uuid,
) -> Result<Option<bookmark::Model>, DbErr> {
    bookmark::Entity::find()
        .filter(bookmark::Column::PostId.eq(post_id))
        .filter(bookmark::Column::UserId.eq(user_id))
        .one(db)
        .await
}

pub async fn insert_bookmark<C: ConnectionTrait>(
    db: &C,
    post_id: Uuid,
    user_id: Uuid,
) -> Result<bookmark::Model, DbErr> {
    bookmark::ActiveModel {
        id: Set(Uuid::new_v4()),
        post_id: Set(post_id),
        user_id: Set(user_id),
        created_at: Set(now()),
    }
    .insert(db)
    .await
}

pub async fn delete_bookmark<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
    Ok(bookmark::Entity::delete_by_id(id).exec(db).await?.rows_affected)
}
