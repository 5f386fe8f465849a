use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use uuid::Uuid;

use super::now;
use crate::entities::{TeamMemberStatus, team, team_follow, team_member, user};

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<team::Model>, DbErr> {
    team::Entity::find_by_id(id).one(db).await
}

pub async fn name_taken<C: ConnectionTrait>(
    db: &C,
    name: &str,
    except: Option<Uuid>,
) -> Result<bool, DbErr> {
    let mut query = team::Entity::find().filter(team::Column::Name.eq(name));
    if let Some(id) = except {
        query = query.filter(team::Column::Id.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

pub async fn insert<C: ConnectionTrait>(
    db: &C,
    name: String,
    description: Option<String>,
    profile_image: Option<String>,
    leader_id: Uuid,
    is_invite_only: bool,
) -> Result<team::Model, DbErr> {
    let now = now();
    team::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        description: Set(description),
        profile_image: Set(profile_image),
        leader_id: Set(leader_id),
        is_invite_only: Set(is_invite_only),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
}

pub async fn delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
    Ok(team::Entity::delete_by_id(id).exec(db).await?.rows_affected)
}

// ── members ─────────────────────────────────────────────────────────────────

pub async fn find_member<C: ConnectionTrait>(
    db: &C,
    team_id: Uuid,
    user_id: Uuid,
) -> Result<Option<team_member::Model>, DbErr> {
    team_member::Entity::find()
        .filter(team_member::Column::TeamId.eq(team_id))
        .filter(team_member::Column::UserId.eq(user_id))
        .one(db)
        .await
}

pub async fn insert_member<C: ConnectionTrait>(
    db: &C,
    team_id: Uuid,
    user_id: Uuid,
    status: TeamMemberStatus,
) -> Result<team_member::Model, DbErr> {
    let now = now();
    team_member::ActiveModel {
        id: Set(Uuid::new_v4()),
        team_id: Set(team_id),
        user_id: Set(user_id),
        status: Set(status),
        joined_at: Set((status == TeamMemberStatus::Joined).then_some(now)),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
}

/// Promote an invitation to a joined membership.
pub async fn mark_joined<C: ConnectionTrait>(
    db: &C,
    member: team_member::Model,
) -> Result<team_member::Model, DbErr> {
    let now = now();
    let mut active: team_member::ActiveModel = member.into();
    active.status = Set(TeamMemberStatus::Joined);
    active.joined_at = Set(Some(now));
    active.updated_at = Set(now);
    active.update(db).await
}

pub async fn delete_member<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
    Ok(team_member::Entity::delete_by_id(id).exec(db).await?.rows_affected)
}

/// User ids of every JOINED member.
pub async fn joined_member_ids<C: ConnectionTrait>(db: &C, team_id: Uuid) -> Result<Vec<Uuid>, DbErr> {
    team_member::Entity::find()
        .select_only()
        .column(team_member::Column::UserId)
        .filter(team_member::Column::TeamId.eq(team_id))
        .filter(team_member::Column::Status.eq(TeamMemberStatus::Joined))
        .order_by_asc(team_member::Column::CreatedAt)
        .into_tuple::<Uuid>()
        .all(db)
        .await
}

pub async fn members_with_users<C: ConnectionTrait>(
    db: &C,
    team_id: Uuid,
) -> Result<Vec<(team_member::Model, Option<user::Model>)>, DbErr> {
    team_member::Entity::find()
        .filter(team_member::Column::TeamId.eq(team_id))
        .order_by_asc(team_member::Column::CreatedAt)
        .find_also_related(user::Entity)
        .all(db)
        .await
}

/// Teams the user has joined.
pub async fn teams_of<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<Vec<team::Model>, DbErr> {
    team::Entity::find()
        .join(JoinType::InnerJoin, team::Relation::Members.def())
        .filter(team_member::Column::UserId.eq(user_id))
        .filter(team_member::Column::Status.eq(TeamMemberStatus::Joined))
        .order_by_asc(team::Column::Name)
        .all(db)
        .await
}

// ── followers ───────────────────────────────────────────────────────────────

pub async fn find_follow<C: ConnectionTrait>(
    db: &C,
    team_id: Uuid,
    user_id: Uuid,
) -> Result<Option<team_follow::Model>, DbErr> {
    team_follow::Entity::find()
        .filter(team_follow::Column::TeamId.eq(team_id))
        .filter(team_follow::Column::UserId.eq(user_id))
        .one(db)
        .await
}

pub async fn insert_follow<C: ConnectionTrait>(
    db: &C,
    team_id: Uuid,
    user_id: Uuid,
) -> Result<team_follow::Model, DbErr> {
    team_follow::ActiveModel {
        id: Set(Uuid::new_v4()),
        team_id: Set(team_id),
        user_id: Set(user_id),
        created_at: Set(now()),
    }
    .insert(db)
    .await
}

pub async fn delete_follow<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
    Ok(team_follow::Entity::delete_by_id(id).exec(db).await?.rows_affected)
}

pub async fn count_followers<C: ConnectionTrait>(db: &C, team_id: Uuid) -> Result<u64, DbErr> {
    team_follow::Entity::find()
        .filter(team_follow::Column::TeamId.eq(team_id))
        .count(db)
        .await
}

pub async fn followed_by<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<Vec<team::Model>, DbErr> {
    team::Entity::find()
        .join(JoinType::InnerJoin, team::Relation::Followers.def())
        .filter(team_follow::Column::UserId.eq(user_id))
        .order_by_desc(team_follow::Column::CreatedAt)
        .all(db)
        .await
}
