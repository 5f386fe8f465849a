use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use serde::Deserialize;

use crate::auth::middleware::ActiveUser;
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::services::upload_service::{self, MAX_UPLOAD_BYTES, UploadKind};
use crate::state::AppState;

/// Multipart overhead allowed on top of the file itself.
const FORM_OVERHEAD: usize = 64 * 1024;

/// Build the upload route group: `/upload`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(upload))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + FORM_OVERHEAD))
}

#[derive(Debug, Deserialize)]
struct UploadQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
}

/// `POST /api/v1/upload?type=profile|post|team` with a multipart `file` field.
async fn upload(
    State(state): State<AppState>,
    ActiveUser(user): ActiveUser,
    Query(query): Query<UploadQuery>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let kind = UploadKind::parse(query.kind.as_deref().unwrap_or_default())?;

    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart data: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload.bin").to_string();
        let data = field.bytes().await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                AppError::PayloadTooLarge("File exceeds the 5 MB size limit.".to_string())
            } else {
                AppError::BadRequest(format!("Failed to read file data: {e}"))
            }
        })?;
        file = Some((file_name, data.to_vec()));
    }

    let (file_name, data) =
        file.ok_or_else(|| AppError::BadRequest("No file field provided.".to_string()))?;
    let uploaded = upload_service::store(&state.config, kind, &file_name, &data).await?;
    tracing::info!(user_id = %user.id, kind = kind.folder(), url = %uploaded.url, "Upload stored");
    Ok(ApiResponse::created(uploaded))
}
