use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;

use crate::dto::search::{PopularTagsQuery, SearchQuery};
use crate::dto::{PageQuery, ValidQuery};
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::services::{tag_service, user_service};
use crate::state::AppState;

/// Tag lookup: `/tags/...`
pub fn tags_router() -> Router<AppState> {
    Router::new()
        .route("/", get(search_tags))
        .route("/popular", get(popular_tags))
}

/// Full-text style lookup: `/search/...`
pub fn search_router() -> Router<AppState> {
    Router::new()
        .route("/posts", get(search_posts))
        .route("/users", get(search_users))
}

/// `GET /api/v1/tags?q=`
async fn search_tags(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        tag_service::search_tags(&state.db, &query.q).await?,
    ))
}

/// `GET /api/v1/tags/popular?days=7&limit=10`
async fn popular_tags(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<PopularTagsQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        tag_service::popular(&state.db, query.days, query.limit).await?,
    ))
}

/// `GET /api/v1/search/posts?q=`
async fn search_posts(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<SearchQuery>,
    ValidQuery(page): ValidQuery<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        tag_service::search_posts(&state.db, &query.q, page).await?,
    ))
}

/// `GET /api/v1/search/users?q=`
async fn search_users(
    State(state): State<AppState>,
    ValidQuery(query): ValidQuery<SearchQuery>,
    ValidQuery(page): ValidQuery<PageQuery>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ApiResponse::ok(
        user_service::search_users(&state.db, &query.q, page).await?,
    ))
}
