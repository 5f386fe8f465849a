mod admin;
mod auth;
mod comments;
mod health;
mod notices;
mod posts;
mod reports;
mod search;
mod teams;
mod uploads;
mod users;

use std::any::Any;

use axum::http::{Method, Uri};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::catch_panic::CatchPanicLayer;

use crate::error::AppError;
use crate::rate_limit;
use crate::response;
use crate::state::AppState;

/// Build the route tree.
///
/// Structure:
/// - `GET /health`: plain liveness probe
/// - `/api/v1/...`: JSON API, including `GET /api/v1/health` with a database ping
pub fn router() -> Router<AppState> {
    let api_v1 = Router::new()
        .merge(health::api_router())
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/admin", admin::router())
        .nest("/posts", posts::router())
        .nest("/comments", comments::router())
        .nest("/teams", teams::router())
        .nest("/notices", notices::router())
        .nest("/reports", reports::router())
        .nest("/tags", search::tags_router())
        .nest("/search", search::search_router())
        .nest("/upload", uploads::router());

    Router::new()
        .merge(health::root_router())
        .nest("/api/v1", api_v1)
        .fallback(not_found)
}

/// The application with its per-request middleware, ready to serve.
///
/// Request order: envelope → panic catcher → rate limit → handler. CORS and tracing are
/// added by the binary.
pub fn app(state: AppState) -> Router {
    router()
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(response::envelope))
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(middleware::from_fn_with_state(
                    state.clone(),
                    rate_limit::rate_limit,
                )),
        )
        .with_state(state)
}

async fn not_found(method: Method, uri: Uri) -> AppError {
    AppError::NotFound(format!("Cannot {method} {}", uri.path()))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| err.downcast_ref::<&str>().map(ToString::to_string))
        .unwrap_or_else(|| "unknown panic".to_string());
    AppError::Internal(anyhow::anyhow!("Handler panicked: {detail}")).into_response()
}
