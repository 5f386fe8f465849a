use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{delete, get, patch};
use axum::Router;
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::dto::notice::{MarkedCount, NoticeFilter, UnreadCount};
use crate::dto::{MessageResponse, PageQuery, ValidQuery};
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::services::notice_service;
use crate::state::AppState;

/// Build the notices route group: `/notices/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/unread-count", get(unread_count))
        .route("/read-all", patch(mark_all_read))
        .route("/{id}/read", patch(mark_read))
        .route("/{id}", delete(remove))
}

/// `GET /api/v1/notices?unreadOnly=&page=&limit=`
async fn list(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(filter): Query<NoticeFilter>,
    ValidQuery(page): ValidQuery<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        notice_service::list(&state.db, user.id, filter.unread_only, page).await?,
    ))
}

async fn unread_count(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let count = notice_service::unread_count(&state.db, user.id).await?;
    Ok(ApiResponse::ok(UnreadCount { count }))
}

/// `PATCH /api/v1/notices/:id/read`, idempotent.
async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        notice_service::mark_read(&state.db, user.id, id).await?,
    ))
}

async fn mark_all_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    let updated = notice_service::mark_all_read(&state.db, user.id).await?;
    Ok(ApiResponse::ok(MarkedCount { updated }))
}

async fn remove(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    notice_service::delete(&state.db, user.id, id).await?;
    Ok(ApiResponse::ok(MessageResponse::new("Notice deleted.")))
}
