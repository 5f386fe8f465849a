use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::{Condition, Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use uuid::Uuid;

use super::{contains_pattern, now};
use crate::entities::{
    EditorRole, PostStatus, bookmark, editor, post, post_like, post_tag, tag, user,
};

/// Column values for a new post row.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub excerpt: Option<String>,
    pub thumbnail: String,
    pub status: PostStatus,
    pub team_id: Option<Uuid>,
}

/// Which public posts to list.
#[derive(Debug, Clone, Default)]
pub struct PublicFilter {
    pub tag_id: Option<Uuid>,
    pub owner_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
}

/// Non-deleted post by id.
pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<post::Model>, DbErr> {
    post::Entity::find_by_id(id)
        .filter(post::Column::DeletedAt.is_null())
        .one(db)
        .await
}

/// Post by id including soft-deleted rows.
pub async fn find_any<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<post::Model>, DbErr> {
    post::Entity::find_by_id(id).one(db).await
}

pub async fn insert<C: ConnectionTrait>(db: &C, new: NewPost) -> Result<post::Model, DbErr> {
    let now = now();
    post::ActiveModel {
        id: Set(Uuid::new_v4()),
        title: Set(new.title),
        content: Set(new.content),
        excerpt: Set(new.excerpt),
        thumbnail: Set(new.thumbnail),
        status: Set(new.status),
        view_count: Set(0),
        like_count: Set(0),
        comment_count: Set(0),
        team_id: Set(new.team_id),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    }
    .insert(db)
    .await
}

pub async fn soft_delete<C: ConnectionTrait>(db: &C, post: post::Model) -> Result<post::Model, DbErr> {
    let now = now();
    let mut active: post::ActiveModel = post.into();
    active.deleted_at = Set(Some(now));
    active.updated_at = Set(now);
    active.update(db).await
}

pub async fn hard_delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
    Ok(post::Entity::delete_by_id(id).exec(db).await?.rows_affected)
}

async fn bump<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
    column: post::Column,
    delta: i32,
) -> Result<(), DbErr> {
    post::Entity::update_many()
        .col_expr(column, Expr::col(column).add(delta))
        .filter(post::Column::Id.eq(id))
        .exec(db)
        .await?;
    Ok(())
}

pub async fn increment_views<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), DbErr> {
    bump(db, id, post::Column::ViewCount, 1).await
}

pub async fn adjust_likes<C: ConnectionTrait>(db: &C, id: Uuid, delta: i32) -> Result<(), DbErr> {
    bump(db, id, post::Column::LikeCount, delta).await
}

pub async fn adjust_comments<C: ConnectionTrait>(db: &C, id: Uuid, delta: i32) -> Result<(), DbErr> {
    bump(db, id, post::Column::CommentCount, delta).await
}

fn owned_by(user_id: Uuid) -> sea_orm::sea_query::SelectStatement {
    Query::select()
        .column(editor::Column::PostId)
        .from(editor::Entity)
        .and_where(editor::Column::UserId.eq(user_id))
        .and_where(editor::Column::Role.eq(EditorRole::Owner))
        .to_owned()
}

fn edited_by(user_id: Uuid) -> sea_orm::sea_query::SelectStatement {
    Query::select()
        .column(editor::Column::PostId)
        .from(editor::Entity)
        .and_where(editor::Column::UserId.eq(user_id))
        .to_owned()
}

/// Public posts plus the ones `user_id` edits.
fn visible_to(user_id: Uuid) -> Condition {
    Condition::any()
        .add(post::Column::Status.eq(PostStatus::Public))
        .add(post::Column::Id.in_subquery(edited_by(user_id)))
}

pub async fn list_public<C: ConnectionTrait>(
    db: &C,
    filter: &PublicFilter,
    offset: u64,
    limit: u64,
) -> Result<(Vec<post::Model>, u64), DbErr> {
    let mut query = post::Entity::find()
        .filter(post::Column::Status.eq(PostStatus::Public))
        .filter(post::Column::DeletedAt.is_null());

    if let Some(tag_id) = filter.tag_id {
        query = query.filter(
            post::Column::Id.in_subquery(
                Query::select()
                    .column(post_tag::Column::PostId)
                    .from(post_tag::Entity)
                    .and_where(post_tag::Column::TagId.eq(tag_id))
                    .to_owned(),
            ),
        );
    }
    if let Some(owner_id) = filter.owner_id {
        query = query.filter(post::Column::Id.in_subquery(owned_by(owner_id)));
    }
    if let Some(team_id) = filter.team_id {
        query = query.filter(post::Column::TeamId.eq(team_id));
    }

    let total = query.clone().count(db).await?;
    let items = query
        .order_by_desc(post::Column::CreatedAt)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;
    Ok((items, total))
}

/// Posts the user holds any editor role on, newest first.
pub async fn list_for_editor<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    status: Option<PostStatus>,
    offset: u64,
    limit: u64,
) -> Result<(Vec<post::Model>, u64), DbErr> {
    let mut query = post::Entity::find()
        .join(JoinType::InnerJoin, post::Relation::Editors.def())
        .filter(editor::Column::UserId.eq(user_id))
        .filter(post::Column::DeletedAt.is_null());
    if let Some(status) = status {
        query = query.filter(post::Column::Status.eq(status));
    }

    let total = query.clone().count(db).await?;
    let items = query
        .order_by_desc(post::Column::CreatedAt)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;
    Ok((items, total))
}

/// Public posts owned by `user_id`.
pub async fn count_public_owned<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<u64, DbErr> {
    post::Entity::find()
        .filter(post::Column::Status.eq(PostStatus::Public))
        .filter(post::Column::DeletedAt.is_null())
        .filter(post::Column::Id.in_subquery(owned_by(user_id)))
        .count(db)
        .await
}

/// Public posts whose title or content contains `term`.
pub async fn search_public<C: ConnectionTrait>(
    db: &C,
    term: &str,
    offset: u64,
    limit: u64,
) -> Result<(Vec<post::Model>, u64), DbErr> {
    let pattern = contains_pattern(term);
    let query = post::Entity::find()
        .filter(post::Column::Status.eq(PostStatus::Public))
        .filter(post::Column::DeletedAt.is_null())
        .filter(
            Condition::any()
                .add(post::Column::Title.like(pattern.clone()))
                .add(post::Column::Content.like(pattern)),
        );
    let total = query.clone().count(db).await?;
    let items = query
        .order_by_desc(post::Column::CreatedAt)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;
    Ok((items, total))
}

/// Posts liked by the user that they can still see, most recent like first.
pub async fn liked_by<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    offset: u64,
    limit: u64,
) -> Result<(Vec<post::Model>, u64), DbErr> {
    let query = post::Entity::find()
        .join(JoinType::InnerJoin, post::Relation::Likes.def())
        .filter(post_like::Column::UserId.eq(user_id))
        .filter(post::Column::DeletedAt.is_null())
        .filter(visible_to(user_id));
    let total = query.clone().count(db).await?;
    let items = query
        .order_by_desc(post_like::Column::CreatedAt)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;
    Ok((items, total))
}

/// Posts bookmarked by the user that they can still see, most recent bookmark first.
pub async fn bookmarked_by<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    offset: u64,
    limit: u64,
) -> Result<(Vec<post::Model>, u64), DbErr> {
    let query = post::Entity::find()
        .join(JoinType::InnerJoin, post::Relation::Bookmarks.def())
        .filter(bookmark::Column::UserId.eq(user_id))
        .filter(post::Column::DeletedAt.is_null())
        .filter(visible_to(user_id));
    let total = query.clone().count(db).await?;
    let items = query
        .order_by_desc(bookmark::Column::CreatedAt)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;
    Ok((items, total))
}

// ── editors ─────────────────────────────────────────────────────────────────

pub async fn insert_editor<C: ConnectionTrait>(
    db: &C,
    post_id: Uuid,
    user_id: Uuid,
    role: EditorRole,
) -> Result<editor::Model, DbErr> {
    editor::ActiveModel {
        id: Set(Uuid::new_v4()),
        post_id: Set(post_id),
        user_id: Set(user_id),
        role: Set(role),
        created_at: Set(now()),
    }
    .insert(db)
    .await
}

pub async fn delete_editors<C: ConnectionTrait>(db: &C, post_id: Uuid) -> Result<u64, DbErr> {
    Ok(editor::Entity::delete_many()
        .filter(editor::Column::PostId.eq(post_id))
        .exec(db)
        .await?
        .rows_affected)
}

/// Editors of a post with their users, owner first.
pub async fn editors_with_users<C: ConnectionTrait>(
    db: &C,
    post_id: Uuid,
) -> Result<Vec<(editor::Model, Option<user::Model>)>, DbErr> {
    editor::Entity::find()
        .filter(editor::Column::PostId.eq(post_id))
        .order_by_asc(editor::Column::CreatedAt)
        .find_also_related(user::Entity)
        .all(db)
        .await
}

pub async fn find_editor<C: ConnectionTrait>(
    db: &C,
    post_id: Uuid,
    user_id: Uuid,
) -> Result<Option<editor::Model>, DbErr> {
    editor::Entity::find()
        .filter(editor::Column::PostId.eq(post_id))
        .filter(editor::Column::UserId.eq(user_id))
        .one(db)
        .await
}

pub async fn find_owner<C: ConnectionTrait>(db: &C, post_id: Uuid) -> Result<Option<editor::Model>, DbErr> {
    editor::Entity::find()
        .filter(editor::Column::PostId.eq(post_id))
        .filter(editor::Column::Role.eq(EditorRole::Owner))
        .one(db)
        .await
}

// ── tags ────────────────────────────────────────────────────────────────────

pub async fn insert_post_tag<C: ConnectionTrait>(
    db: &C,
    post_id: Uuid,
    tag_id: Uuid,
) -> Result<post_tag::Model, DbErr> {
    post_tag::ActiveModel {
        id: Set(Uuid::new_v4()),
        post_id: Set(post_id),
        tag_id: Set(tag_id),
        created_at: Set(now()),
    }
    .insert(db)
    .await
}

pub async fn delete_post_tags<C: ConnectionTrait>(db: &C, post_id: Uuid) -> Result<u64, DbErr> {
    Ok(post_tag::Entity::delete_many()
        .filter(post_tag::Column::PostId.eq(post_id))
        .exec(db)
        .await?
        .rows_affected)
}

pub async fn tags_of<C: ConnectionTrait>(db: &C, post_id: Uuid) -> Result<Vec<tag::Model>, DbErr> {
    tag::Entity::find()
        .join(JoinType::InnerJoin, tag::Relation::PostTag.def())
        .filter(post_tag::Column::PostId.eq(post_id))
        .order_by_asc(post_tag::Column::CreatedAt)
        .all(db)
        .await
}
