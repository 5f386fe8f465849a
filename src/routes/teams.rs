use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use uuid::Uuid;

use crate::auth::middleware::ActiveUser;
use crate::dto::team::{CreateTeamRequest, InviteRequest, UpdateTeamRequest};
use crate::dto::{MessageResponse, ValidJson};
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::services::team_service;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the teams route group: `/teams/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_team))
        .route(
            "/{id}",
            get(get_team).patch(update_team).delete(delete_team),
        )
        .route("/{id}/members", get(list_members))
        .route("/{id}/members/{user_id}", delete(kick))
        .route("/{id}/invite", post(invite))
        .route("/{id}/join", post(join))
        .route("/{id}/leave", post(leave))
        .route("/{id}/follow", post(follow).delete(unfollow))
}

// ─────────────────────────────────────────────────────────────────────────────
// Teams
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/v1/teams`
async fn create_team(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    ValidJson(body): ValidJson<CreateTeamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let team = team_service::create_team(&state.db, &user, body).await?;
    Ok(ApiResponse::created(team))
}

/// `GET /api/v1/teams/:id`
async fn get_team(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(team_service::get_team(&state.db, id).await?))
}

/// `PATCH /api/v1/teams/:id`
async fn update_team(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
    ValidJson(body): ValidJson<UpdateTeamRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        team_service::update_team(&state.db, id, user.id, body).await?,
    ))
}

/// `DELETE /api/v1/teams/:id`
async fn delete_team(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    team_service::delete_team(&state.db, id, user.id).await?;
    Ok(ApiResponse::ok(MessageResponse::new("Team deleted.")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Membership
// ─────────────────────────────────────────────────────────────────────────────

async fn list_members(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(team_service::list_members(&state.db, id).await?))
}

/// `POST /api/v1/teams/:id/invite`
async fn invite(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
    Json(body): Json<InviteRequest>,
) -> Result<impl IntoResponse, AppError> {
    let member = team_service::invite(&state.db, &user, id, body.user_id).await?;
    Ok(ApiResponse::created(member))
}

/// `POST /api/v1/teams/:id/join`
async fn join(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(team_service::join(&state.db, &user, id).await?))
}

/// `POST /api/v1/teams/:id/leave`
async fn leave(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    team_service::leave(&state.db, &user, id).await?;
    Ok(ApiResponse::ok(MessageResponse::new("Left the team.")))
}

/// `DELETE /api/v1/teams/:id/members/:user_id`
async fn kick(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path((id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, AppError> {
    team_service::kick(&state.db, &user, id, member_id).await?;
    Ok(ApiResponse::ok(MessageResponse::new("Member removed.")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Following
// ─────────────────────────────────────────────────────────────────────────────

async fn follow(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::created(
        team_service::follow_team(&state.db, &user, id).await?,
    ))
}

async fn unfollow(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    team_service::unfollow_team(&state.db, user.id, id).await?;
    Ok(ApiResponse::ok(MessageResponse::new("Unfollowed the team.")))
}
