use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Condition;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use super::{contains_pattern, now};
use crate::entities::{AuthProvider, Role, auth, user};

/// Fields needed to create a user row.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub nickname: String,
    pub password_hash: Option<String>,
    pub profile_image: String,
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find_by_id(id).one(db).await
}

/// Non-deleted user by id.
pub async fn find_live<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find_by_id(id)
        .filter(user::Column::DeletedAt.is_null())
        .one(db)
        .await
}

pub async fn find_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .filter(user::Column::DeletedAt.is_null())
        .one(db)
        .await
}

/// Whether a non-deleted user other than `except` holds `nickname`.
pub async fn nickname_taken<C: ConnectionTrait>(
    db: &C,
    nickname: &str,
    except: Option<Uuid>,
) -> Result<bool, DbErr> {
    let mut query = user::Entity::find()
        .filter(user::Column::Nickname.eq(nickname))
        .filter(user::Column::DeletedAt.is_null());
    if let Some(id) = except {
        query = query.filter(user::Column::Id.ne(id));
    }
    Ok(query.count(db).await? > 0)
}

/// Whether a non-deleted user holds `email`.
pub async fn email_exists<C: ConnectionTrait>(db: &C, email: &str) -> Result<bool, DbErr> {
    Ok(user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .filter(user::Column::DeletedAt.is_null())
        .count(db)
        .await?
        > 0)
}

pub async fn insert<C: ConnectionTrait>(db: &C, new: NewUser) -> Result<user::Model, DbErr> {
    let now = now();
    user::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(new.email),
        name: Set(new.name),
        nickname: Set(new.nickname),
        password_hash: Set(new.password_hash),
        role: Set(Role::User),
        profile_image: Set(new.profile_image),
        bio: Set(None),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        deleted_at: Set(None),
    }
    .insert(db)
    .await
}

pub async fn soft_delete<C: ConnectionTrait>(db: &C, user: user::Model) -> Result<user::Model, DbErr> {
    let now = now();
    let mut active: user::ActiveModel = user.into();
    active.deleted_at = Set(Some(now));
    active.is_active = Set(false);
    active.updated_at = Set(now);
    active.update(db).await
}

pub async fn hard_delete<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<u64, DbErr> {
    Ok(user::Entity::delete_by_id(id).exec(db).await?.rows_affected)
}

/// Admin listing; `keyword` matches e-mail, name or nickname.
pub async fn list<C: ConnectionTrait>(
    db: &C,
    keyword: Option<&str>,
    offset: u64,
    limit: u64,
) -> Result<(Vec<user::Model>, u64), DbErr> {
    let mut query = user::Entity::find();
    if let Some(keyword) = keyword.filter(|k| !k.trim().is_empty()) {
        let pattern = contains_pattern(keyword);
        query = query.filter(
            Condition::any()
                .add(user::Column::Email.like(pattern.clone()))
                .add(user::Column::Name.like(pattern.clone()))
                .add(user::Column::Nickname.like(pattern)),
        );
    }
    let total = query.clone().count(db).await?;
    let items = query
        .order_by_desc(user::Column::CreatedAt)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;
    Ok((items, total))
}

/// Non-deleted users whose nickname or name contains `term`.
pub async fn search<C: ConnectionTrait>(
    db: &C,
    term: &str,
    offset: u64,
    limit: u64,
) -> Result<(Vec<user::Model>, u64), DbErr> {
    let pattern = contains_pattern(term);
    let query = user::Entity::find()
        .filter(user::Column::DeletedAt.is_null())
        .filter(
            Condition::any()
                .add(user::Column::Nickname.like(pattern.clone()))
                .add(user::Column::Name.like(pattern)),
        );
    let total = query.clone().count(db).await?;
    let items = query
        .order_by_asc(user::Column::Nickname)
        .offset(offset)
        .limit(limit)
        .all(db)
        .await?;
    Ok((items, total))
}

// ── auth rows ───────────────────────────────────────────────────────────────

pub async fn find_auth<C: ConnectionTrait>(
    db: &C,
    provider: AuthProvider,
    provider_id: &str,
) -> Result<Option<auth::Model>, DbErr> {
    auth::Entity::find()
        .filter(auth::Column::Provider.eq(provider))
        .filter(auth::Column::ProviderId.eq(provider_id))
        .one(db)
        .await
}

pub async fn find_auth_by_user<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
) -> Result<Option<auth::Model>, DbErr> {
    auth::Entity::find()
        .filter(auth::Column::UserId.eq(user_id))
        .one(db)
        .await
}

pub async fn insert_auth<C: ConnectionTrait>(
    db: &C,
    user_id: Uuid,
    provider: AuthProvider,
    provider_id: String,
) -> Result<auth::Model, DbErr> {
    auth::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        provider: Set(provider),
        provider_id: Set(provider_id),
        created_at: Set(now()),
    }
    .insert(db)
    .await
}

/// Drop the user's login-provider row so the identity can sign up afresh.
pub async fn delete_auth_by_user<C: ConnectionTrait>(db: &C, user_id: Uuid) -> Result<u64, DbErr> {
    Ok(auth::Entity::delete_many()
        .filter(auth::Column::UserId.eq(user_id))
        .exec(db)
        .await?
        .rows_affected)
}

/// Point an existing auth row at another provider identity.
pub async fn relink_auth<C: ConnectionTrait>(
    db: &C,
    auth: auth::Model,
    provider: AuthProvider,
    provider_id: String,
) -> Result<auth::Model, DbErr> {
    let mut active: auth::ActiveModel = auth.into();
    active.provider = Set(provider);
    active.provider_id = Set(provider_id);
    active.update(db).await
}
