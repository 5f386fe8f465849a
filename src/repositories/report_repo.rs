use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use super::now;
use crate::entities::{ReportStatus, ReportTargetType, report};

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<report::Model>, DbErr> {
    report::Entity::find_by_id(id).one(db).await
}

pub async fn find_pending<C: ConnectionTrait>(
    db: &C,
    reporter_id: Uuid,
    target_type: ReportTargetType,
    target_id: Uuid,
) -> Result<Option<report::Model>, DbErr> {
    report::Entity::find()
        .filter(report::Column::ReporterId.eq(reporter_id))
        .filter(report::Column::TargetType.eq(target_type))
        .filter(report::Column::TargetId.eq(target_id))
        .filter(report::Column::Status.eq(ReportStatus::Pending))
        .one(db)
        .await
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    reporter_id: Uuid,
    target_type: ReportTargetType,
    target_id: Uuid,
    reason: String,
) -> Result<report::Model, DbErr> {
    let now = now();
    report::ActiveModel {
        id: Set(Uuid::new_v4()),
        reporter_id: Set(reporter_id),
        target_type: Set(target_type),
        target_id: Set(target_id),
        reason: Set(reason),
        status: Set(ReportStatus::Pending),
        handled_by: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
}

pub async fn set_status<C: ConnectionTrait>(
    db: &C,
    existing: report::Model,
    status: ReportStatus,
    handled_by: Uuid,
) -> Result<report::Model, DbErr> {
    let mut active: report::ActiveModel = existing.into();
    active.status = Set(status);
    active.handled_by = Set(Some(handled_by));
    active.updated_at = Set(now());
    active.update(db).await
}

pub async fn list<C: ConnectionTrait>(
    db: &C,
    status: Option<ReportStatus>,
    offset: u64,
    limit: u64,
) -> Result<(Vec<report::Model>, u64), DbErr> {
    let mut query = report::Entity::find();
    if let Some(status) = status {
        query = query.filter(report::Column::Status.eq(status));
    }
    let total = query.clone().count(db).await?;
    let items = query
        .order_by_desc(report::Column::CreatedAt)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;
    Ok((items, total))
}
