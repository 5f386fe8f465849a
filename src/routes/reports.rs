use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;

use crate::auth::middleware::ActiveUser;
use crate::dto::report::CreateReportRequest;
use crate::dto::ValidJson;
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::services::report_service;
use crate::state::AppState;

/// Build the reports route group: `/reports`. Review lives under `/admin/reports`.
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(create_report))
}

/// `POST /api/v1/reports`
async fn create_report(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    ValidJson(body): ValidJson<CreateReportRequest>,
) -> Result<impl IntoResponse, AppError> {
    let report = report_service::create_report(&state.db, user.id, body).await?;
    Ok(ApiResponse::created(report))
}
