use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::auth::cookies;
use crate::auth::middleware::{ActiveUser, AuthUser};
use crate::dto::user::{NicknameAvailability, NicknameQuery, UpdateMeRequest};
use crate::dto::{MessageResponse, PageQuery, ValidJson, ValidQuery};
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::services::{
    block_service, bookmark_service, follow_service, like_service, team_service, user_service,
};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the users route group: `/users/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me).patch(update_me).delete(delete_me))
        .route("/me/likes", get(my_likes))
        .route("/me/bookmarks", get(my_bookmarks))
        .route("/me/blocks", get(my_blocks))
        .route("/me/teams", get(my_teams))
        .route("/me/followed-teams", get(my_followed_teams))
        .route("/check-nickname", get(check_nickname))
        .route("/{id}", get(get_profile))
        .route("/{id}/followers", get(followers))
        .route("/{id}/following", get(following))
        .route("/{id}/follow", post(follow).delete(unfollow))
        .route("/{id}/block", post(block).delete(unblock))
}

// ─────────────────────────────────────────────────────────────────────────────
// Own account
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/users/me`
async fn get_me(AuthUser(user): AuthUser) -> impl IntoResponse {
    ApiResponse::ok(user)
}

/// `PATCH /api/v1/users/me`
async fn update_me(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    ValidJson(body): ValidJson<UpdateMeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let updated = user_service::update_me(&state.db, user, body).await?;
    Ok(ApiResponse::ok(updated))
}

/// `DELETE /api/v1/users/me`: soft delete and sign out.
async fn delete_me(
    State(state): State<AppState>,
    jar: CookieJar,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    user_service::delete_me(&state.db, user).await?;
    Ok((
        cookies::clear_session(jar),
        ApiResponse::ok(MessageResponse::new("Account deleted.")),
    ))
}

async fn my_likes(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidQuery(page): ValidQuery<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        like_service::liked_posts(&state.db, user.id, page).await?,
    ))
}

async fn my_bookmarks(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    ValidQuery(page): ValidQuery<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        bookmark_service::list(&state.db, user.id, page).await?,
    ))
}

async fn my_blocks(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        block_service::list_blocked(&state.db, user.id).await?,
    ))
}

async fn my_teams(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(team_service::my_teams(&state.db, user.id).await?))
}

async fn my_followed_teams(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        team_service::followed_teams(&state.db, user.id).await?,
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Public profiles
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/users/check-nickname?nickname=`
async fn check_nickname(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<NicknameQuery>,
) -> Result<impl IntoResponse, AppError> {
    let available = user_service::nickname_available(&state.db, &query.nickname).await?;
    Ok(ApiResponse::ok(NicknameAvailability {
        nickname: query.nickname,
        available,
    }))
}

/// `GET /api/v1/users/:id`
async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(user_service::public_profile(&state.db, id).await?))
}

async fn followers(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidQuery(page): ValidQuery<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        follow_service::followers(&state.db, id, page).await?,
    ))
}

async fn following(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ValidQuery(page): ValidQuery<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        follow_service::following(&state.db, id, page).await?,
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Relations
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /api/v1/users/:id/follow`
async fn follow(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let follow = follow_service::follow(&state.db, &user, id).await?;
    Ok(ApiResponse::created(follow))
}

/// `DELETE /api/v1/users/:id/follow`
async fn unfollow(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    follow_service::unfollow(&state.db, user.id, id).await?;
    Ok(ApiResponse::ok(MessageResponse::new("Unfollowed.")))
}

/// `POST /api/v1/users/:id/block`
async fn block(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let block = block_service::block(&state.db, user.id, id).await?;
    Ok(ApiResponse::created(block))
}

/// `DELETE /api/v1/users/:id/block`
async fn unblock(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    block_service::unblock(&state.db, user.id, id).await?;
    Ok(ApiResponse::ok(MessageResponse::new("Unblocked.")))
}
