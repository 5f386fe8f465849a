use sea_orm::ActiveValue::Set;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{Expr, Order};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, FromQueryResult,
    JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use serde::Serialize;
use uuid::Uuid;

use super::{now, prefix_pattern};
use crate::entities::{post_tag, tag};

/// A tag with the number of posts tagged in the requested period.
#[derive(Debug, Clone, Serialize, FromQueryResult)]
#[serde(rename_all = "camelCase")]
pub struct TagCount {
    pub id: Uuid,
    pub name: String,
    pub post_count: i64,
}

pub async fn find_by_name<C: ConnectionTrait>(db: &C, name: &str) -> Result<Option<tag::Model>, DbErr> {
    tag::Entity::find()
        .filter(tag::Column::Name.eq(name))
        .one(db)
        .await
}

pub async fn find_or_create<C: ConnectionTrait>(db: &C, name: &str) -> Result<tag::Model, DbErr> {
    if let Some(existing) = find_by_name(db, name).await? {
        return Ok(existing);
    }
    tag::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        created_at: Set(now()),
    }
    .insert(db)
    .await
}

pub async fn search_prefix<C: ConnectionTrait>(
    db: &C,
    prefix: &str,
    limit: u64,
) -> Result<Vec<tag::Model>, DbErr> {
    tag::Entity::find()
        .filter(tag::Column::Name.like(prefix_pattern(prefix)))
        .order_by_asc(tag::Column::Name)
        .limit(limit)
        .all(db)
        .await
}

/// Tags ranked by how many `post_tag` rows were created since `since`.
pub async fn popular_since<C: ConnectionTrait>(
    db: &C,
    since: DateTimeWithTimeZone,
    limit: u64,
) -> Result<Vec<TagCount>, DbErr> {
    post_tag::Entity::find()
        .select_only()
        .column_as(tag::Column::Id, "id")
        .column_as(tag::Column::Name, "name")
        .column_as(Expr::col((post_tag::Entity, post_tag::Column::Id)).count(), "post_count")
        .join(JoinType::InnerJoin, post_tag::Relation::Tag.def())
        .filter(post_tag::Column::CreatedAt.gte(since))
        .group_by(tag::Column::Id)
        .group_by(tag::Column::Name)
        .order_by(Expr::cust("post_count"), Order::Desc)
        .order_by_asc(tag::Column::Name)
        .limit(limit)
        .into_model::<TagCount>()
        .all(db)
        .await
}
