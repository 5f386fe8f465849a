use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{patch, post};
use axum::Router;
use uuid::Uuid;

use crate::auth::middleware::ActiveUser;
use crate::dto::comment::UpdateCommentRequest;
use crate::dto::{MessageResponse, ValidJson};
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::services::{comment_service, like_service};
use crate::state::AppState;

/// Build the comments route group: `/comments/...`
///
/// Creating and listing comments lives under `/posts/:id/comments`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}", patch(update_comment).delete(delete_comment))
        .route("/{id}/like", post(like).delete(unlike))
}

/// `PATCH /api/v1/comments/:id`
async fn update_comment(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
    ValidJson(body): ValidJson<UpdateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let comment = comment_service::update_comment(&state.db, id, user.id, body.content).await?;
    Ok(ApiResponse::ok(comment))
}

/// `DELETE /api/v1/comments/:id`
async fn delete_comment(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    comment_service::delete_comment(&state.db, id, user.id).await?;
    Ok(ApiResponse::ok(MessageResponse::new("Comment deleted.")))
}

async fn like(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        like_service::like_comment(&state.db, id, user.id).await?,
    ))
}

async fn unlike(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        like_service::unlike_comment(&state.db, id, user.id).await?,
    ))
}
