use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde::Serialize;

use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    database: &'static str,
}

/// `GET /health`, plain text for load balancers.
async fn liveness() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// `GET /api/v1/health`, reports database connectivity.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database = match crate::db::ping(&state.db).await {
        Ok(()) => "connected",
        Err(err) => {
            tracing::warn!("Health check database ping failed: {err}");
            "disconnected"
        }
    };

    ApiResponse::ok(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        database,
    })
}

pub fn root_router() -> Router<AppState> {
    Router::new().route("/health", get(liveness))
}

pub fn api_router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
