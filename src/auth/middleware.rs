//! Request guards as axum extractors.
//!
//! Each extractor is a pipeline of small predicates: [`authenticate`] resolves the caller
//! from the `access_token` cookie (or an `Authorization: Bearer` header), [`require_active`]
//! rejects deactivated accounts and [`require_role`] rejects non-admins.
//!
//! ```ignore
//! async fn handler(ActiveUser(user): ActiveUser) -> impl IntoResponse { ... }
//! ```

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::header;
use axum_extra::extract::CookieJar;

use crate::auth::cookies::ACCESS_COOKIE;
use crate::auth::jwt;
use crate::entities::{Role, user};
use crate::error::AppError;
use crate::repositories::user_repo;
use crate::state::AppState;

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
}

fn access_token(parts: &Parts) -> Option<String> {
    let jar = CookieJar::from_headers(&parts.headers);
    jar.get(ACCESS_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .or_else(|| bearer_token(parts))
}

/// Resolve the calling user. Every failure is reported as Unauthorized.
///
/// # Errors
///
/// `Unauthorized` when the token is missing, invalid or points to a deleted user.
pub async fn authenticate(parts: &Parts, state: &AppState) -> Result<user::Model, AppError> {
    let token = access_token(parts)
        .ok_or_else(|| AppError::Unauthorized("Authentication required.".to_string()))?;

    let user_id = jwt::validate_access_token(&token, &state.config)
        .and_then(|claims| claims.user_id())
        .map_err(|_| AppError::Unauthorized("Invalid or expired token.".to_string()))?;

    user_repo::find_by_id(&state.db, user_id)
        .await?
        .filter(|u| !u.is_deleted())
        .ok_or_else(|| AppError::Unauthorized("User not found.".to_string()))
}

/// # Errors
///
/// `Forbidden` when the account has been deactivated.
pub fn require_active(user: user::Model) -> Result<user::Model, AppError> {
    if user.is_active {
        Ok(user)
    } else {
        Err(AppError::Forbidden("Account is deactivated.".to_string()))
    }
}

/// # Errors
///
/// `Forbidden` when the user's role is below `minimum`.
pub fn require_role(user: user::Model, minimum: Role) -> Result<user::Model, AppError> {
    let allowed = match minimum {
        Role::User => true,
        Role::Admin => user.role.is_admin(),
        Role::SuperAdmin => user.role == Role::SuperAdmin,
    };
    if allowed {
        Ok(user)
    } else {
        Err(AppError::Forbidden(format!("{minimum} role required.")))
    }
}

/// Any signed-in user, active or not.
#[derive(Debug, Clone)]
pub struct AuthUser(pub user::Model);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        authenticate(parts, state).await.map(Self)
    }
}

/// Signed-in user whose account is active.
#[derive(Debug, Clone)]
pub struct ActiveUser(pub user::Model);

impl FromRequestParts<AppState> for ActiveUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state).await?;
        require_active(user).map(Self)
    }
}

/// Active admin or super-admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub user::Model);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = require_active(authenticate(parts, state).await?)?;
        require_role(user, Role::Admin).map(Self)
    }
}

/// Active super-admin.
#[derive(Debug, Clone)]
pub struct SuperAdminUser(pub user::Model);

impl FromRequestParts<AppState> for SuperAdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = require_active(authenticate(parts, state).await?)?;
        require_role(user, Role::SuperAdmin).map(Self)
    }
}

/// The caller if a valid session is present, `None` otherwise. Never rejects.
#[derive(Debug, Clone)]
pub struct OptionalUser(pub Option<user::Model>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(authenticate(parts, state).await.ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(role: Role, is_active: bool) -> user::Model {
        let now = Utc::now().fixed_offset();
        user::Model {
            id: Uuid::new_v4(),
            email: "u@example.com".to_string(),
            name: "U".to_string(),
            nickname: "u".to_string(),
            password_hash: None,
            role,
            profile_image: String::new(),
            bio: None,
            is_active,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn inactive_users_are_forbidden() {
        assert!(require_active(user(Role::User, true)).is_ok());
        assert!(matches!(
            require_active(user(Role::User, false)),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn role_hierarchy() {
        assert!(require_role(user(Role::User, true), Role::Admin).is_err());
        assert!(require_role(user(Role::Admin, true), Role::Admin).is_ok());
        assert!(require_role(user(Role::Admin, true), Role::SuperAdmin).is_err());
        assert!(require_role(user(Role::SuperAdmin, true), Role::Admin).is_ok());
    }
}
