use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::Router;
use uuid::Uuid;

use crate::auth::middleware::{ActiveUser, AuthUser, OptionalUser};
use crate::dto::comment::CreateCommentRequest;
use crate::dto::post::{CreatePostRequest, MyPostsFilter, PostFilter, UpdatePostRequest};
use crate::dto::{MessageResponse, PageQuery, ValidJson, ValidQuery};
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::services::{bookmark_service, comment_service, like_service, post_service};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the posts route group: `/posts/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_posts).post(create_post))
        .route("/draft", post(draft_post))
        .route("/my", get(my_posts))
        .route(
            "/{id}",
            get(get_post).patch(update_post).delete(delete_post),
        )
        .route("/{id}/comments", get(list_comments).post(create_comment))
        .route("/{id}/like", post(like).delete(unlike))
        .route("/{id}/bookmark", post(bookmark).delete(remove_bookmark))
}

// ─────────────────────────────────────────────────────────────────────────────
// Posts
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/posts?tag=&authorId=&teamId=&page=&limit=`
async fn list_posts(
    State(state): State<AppState>,
    Query(filter): Query<PostFilter>,
    ValidQuery(page): ValidQuery<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        post_service::list_posts(&state.db, filter, page).await?,
    ))
}

/// `POST /api/v1/posts`
async fn create_post(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    ValidJson(body): ValidJson<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    let detail = post_service::create_post(&state.db, &state.config, body, user.id).await?;
    Ok(ApiResponse::created(detail))
}

/// `POST /api/v1/posts/draft`
async fn draft_post(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    ValidJson(body): ValidJson<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    let detail = post_service::draft_post(&state.db, &state.config, body, user.id).await?;
    Ok(ApiResponse::created(detail))
}

/// `GET /api/v1/posts/my?status=`
async fn my_posts(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(filter): Query<MyPostsFilter>,
    ValidQuery(page): ValidQuery<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        post_service::list_my_posts(&state.db, user.id, filter, page).await?,
    ))
}

/// `GET /api/v1/posts/:id`
async fn get_post(
    State(state): State<AppState>,
    OptionalUser(viewer): OptionalUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        post_service::view_post(&state.db, id, viewer.as_ref()).await?,
    ))
}

/// `PATCH /api/v1/posts/:id`
async fn update_post(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
    ValidJson(body): ValidJson<UpdatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        post_service::update_post(&state.db, id, body, user.id).await?,
    ))
}

/// `DELETE /api/v1/posts/:id`
async fn delete_post(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    post_service::delete_post(&state.db, id, user.id).await?;
    Ok(ApiResponse::ok(MessageResponse::new("Post deleted.")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Comments, likes and bookmarks
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/posts/:id/comments`
async fn list_comments(
    State(state): State<AppState>,
    OptionalUser(viewer): OptionalUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let viewer_id = viewer.map(|u| u.id);
    Ok(ApiResponse::ok(
        comment_service::list_comments(&state.db, id, viewer_id).await?,
    ))
}

/// `POST /api/v1/posts/:id/comments`
async fn create_comment(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
    ValidJson(body): ValidJson<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    let comment = comment_service::create_comment(&state.db, id, &user, body).await?;
    Ok(ApiResponse::created(comment))
}

async fn like(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        like_service::like_post(&state.db, id, user.id).await?,
    ))
}

async fn unlike(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        like_service::unlike_post(&state.db, id, user.id).await?,
    ))
}

async fn bookmark(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::created(
        bookmark_service::add(&state.db, id, user.id).await?,
    ))
}

async fn remove_bookmark(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    bookmark_service::remove(&state.db, id, user.id).await?;
    Ok(ApiResponse::ok(MessageResponse::new("Bookmark removed.")))
}
