//! Follow and block edges between users.

use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Condition;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use uuid::Uuid;

use super::now;
use crate::entities::{follow, user, user_block};

pub async fn find_follow<C: ConnectionTrait>(
    db: &C,
    follower_id: Uuid,
    following_id: Uuid,
) -> Result<Option<follow::Model>, DbErr> {
    follow::Entity::find()
        .filter(follow::Column::FollowerId.eq(follower_id))
        .filter(follow::Column::FollowingId.eq(following_id))
        .one(db)
        .await
}

pub async fn insert_follow<C: ConnectionTrait>(
    db: &C,
    follower_id: Uuid,
    following_id: Uuid,
) -> Result<follow::Model, DbErr> {
    follow::ActiveModel {
        id: Set(Uuid::new_v4()),
        follower_id: Set(follower_id),
        following_id: Set(following_id),
        created_at: Set(now()),
    }
    .insert(db)
    .await
}

pub async fn delete_follow<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
    Ok(follow::Entity::delete_by_id(id).exec(db).await?.rows_affected)
}

/// Remove follow rows in both directions between `a` and `b`.
pub async fn delete_follows_between<C: ConnectionTrait>(db: &C, a: Uuid, b: Uuid) -> Result<u64, DbErr> {
    Ok(follow::Entity::delete_many()
        .filter(
            Condition::any()
                .add(
                    Condition::all()
                        .add(follow::Column::FollowerId.eq(a))
                        .add(follow::Column::FollowingId.eq(b)),
                )
                .add(
                    Condition::all()
                        .add(follow::Column::FollowerId.eq(b))
                        .add(follow::Column::FollowingId.eq(a)),
                ),
        )
        .exec(db)
        .await?
        .rows_affected)
}

pub async fn count_followers<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<u64, DbErr> {
    follow::Entity::find()
        .filter(follow::Column::FollowingId.eq(user_id))
        .count(db)
        .await
}

pub async fn count_following<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<u64, DbErr> {
    follow::Entity::find()
        .filter(follow::Column::FollowerId.eq(user_id))
        .count(db)
        .await
}

/// Users following `user_id`, most recent first.
pub async fn followers<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    offset: u64,
    limit: u64,
) -> Result<(Vec<user::Model>, u64), DbErr> {
    let query = user::Entity::find()
        .join_rev(JoinType::InnerJoin, follow::Relation::Follower.def())
        .filter(follow::Column::FollowingId.eq(user_id))
        .filter(user::Column::DeletedAt.is_null());
    let total = query.clone().count(db).await?;
    let items = query
        .order_by_desc(follow::Column::CreatedAt)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;
    Ok((items, total))
}

/// Users `user_id` follows, most recent first.
pub async fn following<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    offset: u64,
    limit: u64,
) -> Result<(Vec<user::Model>, u64), DbErr> {
    let query = user::Entity::find()
        .join_rev(JoinType::InnerJoin, follow::Relation::Following.def())
        .filter(follow::Column::FollowerId.eq(user_id))
        .filter(user::Column::DeletedAt.is_null());
    let total = query.clone().count(db).await?;
    let items = query
        .order_by_desc(follow::Column::CreatedAt)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;
    Ok((items, total))
}

// ── blocks ──────────────────────────────────────────────────────────────────

pub async fn find_block<C: ConnectionTrait>(
    db: &C,
    blocker_id: Uuid,
    blocked_id: Uuid,
) -> Result<Option<user_block::Model>, DbErr> {
    user_block::Entity::find()
        .filter(user_block::Column::BlockerId.eq(blocker_id))
        .filter(user_block::Column::BlockedId.eq(blocked_id))
        .one(db)
        .await
}

/// Whether either user blocks the other.
pub async fn blocked_either_way<C: ConnectionTrait>(db: &C, a: Uuid, b: Uuid) -> Result<bool, DbErr> {
    let count = user_block::Entity::find()
        .filter(
            Condition::any()
                .add(
                    Condition::all()
                        .add(user_block::Column::BlockerId.eq(a))
                        .add(user_block::Column::BlockedId.eq(b)),
                )
                .add(
                    Condition::all()
                        .add(user_block::Column::BlockerId.eq(b))
                        .add(user_block::Column::BlockedId.eq(a)),
                ),
        )
        .count(db)
        .await?;
    Ok(count > 0)
}

pub async fn insert_block<C: ConnectionTrait>(
    db: &C,
    blocker_id: Uuid,
    blocked_id: Uuid,
) -> Result<user_block::Model, DbErr> {
    user_block::ActiveModel {
        id: Set(Uuid::new_v4()),
        blocker_id: Set(blocker_id),
        blocked_id: Set(blocked_id),
        created_at: Set(now()),
    }
    .insert(db)
    .await
}

pub async fn delete_block<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
    Ok(user_block::Entity::delete_by_id(id).exec(db).await?.rows_affected)
}

/// Users blocked by `blocker_id`, most recent first.
pub async fn blocked_users<C: ConnectionTrait>(
    db: &C,
    blocker_id: Uuid,
) -> Result<Vec<user::Model>, DbErr> {
    user::Entity::find()
        .join_rev(JoinType::InnerJoin, user_block::Relation::Blocked.def())
        .filter(user_block::Column::BlockerId.eq(blocker_id))
        .order_by_desc(user_block::Column::CreatedAt)
        .all(db)
        .await
}
