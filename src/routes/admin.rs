use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{delete, get, patch};
use axum::{Json, Router};
use uuid::Uuid;

use crate::auth::middleware::{AdminUser, SuperAdminUser};
use crate::dto::report::{HandleReportRequest, ReportFilter};
use crate::dto::user::{SetActiveRequest, SetRoleRequest, UserSearchFilter};
use crate::dto::{MessageResponse, PageQuery, ValidQuery};
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::services::{post_service, report_service, user_service};
use crate::state::AppState;

/// Build the admin route group: `/admin/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}", delete(delete_user))
        .route("/users/{id}/active", patch(set_active))
        .route("/users/{id}/role", patch(set_role))
        .route("/posts/{id}", delete(delete_post))
        .route("/reports", get(list_reports))
        .route("/reports/{id}", patch(handle_report))
}

/// `GET /api/v1/admin/users?keyword=&page=&limit=`
async fn list_users(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(filter): Query<UserSearchFilter>,
    ValidQuery(page): ValidQuery<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    let users = user_service::list_users(&state.db, filter.keyword.as_deref(), page).await?;
    Ok(ApiResponse::ok(users))
}

/// `PATCH /api/v1/admin/users/:id/active`
async fn set_active(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<SetActiveRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = user_service::set_active(&state.db, id, body.is_active).await?;
    tracing::info!(admin_id = %admin.id, user_id = %id, is_active = body.is_active, "User activity changed");
    Ok(ApiResponse::ok(user))
}

/// `DELETE /api/v1/admin/users/:id` (permanent)
async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    user_service::hard_delete(&state.db, id).await?;
    tracing::warn!(admin_id = %admin.id, user_id = %id, "User permanently deleted");
    Ok(ApiResponse::ok(MessageResponse::new("User deleted.")))
}

/// `PATCH /api/v1/admin/users/:id/role` (super-admin only)
async fn set_role(
    State(state): State<AppState>,
    SuperAdminUser(admin): SuperAdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<SetRoleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = user_service::set_role(&state.db, admin.id, id, body.role).await?;
    Ok(ApiResponse::ok(user))
}

/// `DELETE /api/v1/admin/posts/:id` is permanent and cascades to editors, tags and comments.
async fn delete_post(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    post_service::hard_delete_post(&state.db, id).await?;
    Ok(ApiResponse::ok(MessageResponse::new("Post permanently deleted.")))
}

/// `GET /api/v1/admin/reports?status=`
async fn list_reports(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(filter): Query<ReportFilter>,
    ValidQuery(page): ValidQuery<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        report_service::list_reports(&state.db, filter, page).await?,
    ))
}

/// `PATCH /api/v1/admin/reports/:id`
async fn handle_report(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(body): Json<HandleReportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let report = report_service::handle_report(&state.db, admin.id, id, body.status).await?;
    Ok(ApiResponse::ok(report))
}
