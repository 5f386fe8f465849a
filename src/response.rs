//! Uniform JSON envelope for every API response.
//!
//! Success: `{ "success": true, "data", "timestamp", "path" }`
//! Failure: `{ "success": false, "statusCode", "message": [..], "error", "timestamp", "path" }`
//!
//! Handlers return [`ApiResponse`] or [`AppError`](crate::error::AppError); both stash their
//! payload in the response extensions, and [`envelope`] rewrites the body once the request
//! path is known. Responses produced outside our handlers (extractor rejections, unknown
//! routes, caught panics) are converted to the error shape as well.

use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderValue, StatusCode, header, response::Parts};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::AppError;

/// Largest framework-generated error body we will read back to build a message.
const MAX_REJECTION_BODY: usize = 16 * 1024;

/// Successful payload waiting for its envelope.
#[derive(Debug, Clone)]
pub struct SuccessData(pub Value);

/// Error payload waiting for its envelope.
#[derive(Debug, Clone)]
pub struct ErrorData {
    pub status: StatusCode,
    pub messages: Vec<String>,
}

/// Handler return type for enveloped JSON data.
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    data: T,
}

impl<T> ApiResponse<T> {
    pub const fn ok(data: T) -> Self {
        Self {
            status: StatusCode::OK,
            data,
        }
    }

    pub const fn created(data: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        match serde_json::to_value(&self.data) {
            Ok(data) => {
                let mut response = (self.status, Json(success_envelope(&data, ""))).into_response();
                response.extensions_mut().insert(SuccessData(data));
                response
            }
            Err(err) => AppError::Internal(err.into()).into_response(),
        }
    }
}

pub fn success_envelope(data: &Value, path: &str) -> Value {
    json!({
        "success": true,
        "data": data,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "path": path,
    })
}

pub fn error_envelope(error: &ErrorData, path: &str) -> Value {
    json!({
        "success": false,
        "statusCode": error.status.as_u16(),
        "message": error.messages,
        "error": error.status.canonical_reason().unwrap_or("Error"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "path": path,
    })
}

/// Middleware that finalizes the envelope with the request path.
pub async fn envelope(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let response = next.run(req).await;
    let (mut parts, body) = response.into_parts();

    if let Some(SuccessData(data)) = parts.extensions.remove::<SuccessData>() {
        return rebuild(parts, &success_envelope(&data, &path));
    }

    if let Some(error) = parts.extensions.remove::<ErrorData>() {
        return rebuild(parts, &error_envelope(&error, &path));
    }

    let status = parts.status;
    if status.is_client_error() || status.is_server_error() {
        let message = if status.is_server_error() {
            "An internal error occurred".to_string()
        } else {
            let bytes = axum::body::to_bytes(body, MAX_REJECTION_BODY)
                .await
                .unwrap_or_default();
            let text = String::from_utf8_lossy(&bytes).trim().to_string();
            if text.is_empty() {
                status.canonical_reason().unwrap_or("Error").to_string()
            } else {
                text
            }
        };
        let error = ErrorData {
            status,
            messages: vec![message],
        };
        return rebuild(parts, &error_envelope(&error, &path));
    }

    Response::from_parts(parts, body)
}

fn rebuild(mut parts: Parts, value: &Value) -> Response {
    let bytes = match serde_json::to_vec(value) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!("Failed to encode response envelope: {err}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    parts.headers.remove(header::CONTENT_LENGTH);
    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Response::from_parts(parts, Body::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_envelope_has_expected_fields() {
        let error = ErrorData {
            status: StatusCode::NOT_FOUND,
            messages: vec!["Post not found".to_string()],
        };
        let value = error_envelope(&error, "/api/v1/posts/x");
        assert_eq!(value["success"], false);
        assert_eq!(value["statusCode"], 404);
        assert_eq!(value["error"], "Not Found");
        assert_eq!(value["message"][0], "Post not found");
        assert_eq!(value["path"], "/api/v1/posts/x");
        assert!(value["timestamp"].is_string());
    }

    #[test]
    fn success_envelope_wraps_data() {
        let value = success_envelope(&json!({"id": 1}), "/health");
        assert_eq!(value["success"], true);
        assert_eq!(value["data"]["id"], 1);
        assert_eq!(value["path"], "/health");
    }
}
