use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::response::{ErrorData, error_envelope};

/// Unified application error type that maps to the JSON error envelope.
///
/// Rendered as `{ "success": false, "statusCode", "message": [..], "error", "timestamp", "path" }`.
/// The `path` is filled in by [`crate::response::envelope`].
#[derive(Debug)]
pub enum AppError {
    /// 400 Bad Request
    BadRequest(String),
    /// 400 Bad Request carrying one message per rejected field
    Validation(Vec<String>),
    /// 401 Unauthorized
    Unauthorized(String),
    /// 403 Forbidden
    Forbidden(String),
    /// 404 Not Found
    NotFound(String),
    /// 409 Conflict
    Conflict(String),
    /// 413 Payload Too Large
    PayloadTooLarge(String),
    /// 429 Too Many Requests
    TooManyRequests { retry_after: u64 },
    /// 500 Internal Server Error (wraps any error, logs details, returns generic message)
    Internal(anyhow::Error),
}

impl AppError {
    /// Collapse `validator` output into one readable message per violated rule.
    pub fn from_validation(errors: &validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| {
                    e.message.as_ref().map_or_else(
                        || format!("{field} is invalid ({})", e.code),
                        std::string::ToString::to_string,
                    )
                })
            })
            .collect();
        messages.sort();
        Self::Validation(messages)
    }

    /// Used when a transaction has been rolled back: client-facing kinds pass through
    /// unchanged, anything unexpected becomes a generic failure for `action`.
    #[must_use]
    pub fn after_rollback(self, action: &str) -> Self {
        match self {
            Self::Internal(err) => Self::Internal(err.context(format!("Failed to {action}"))),
            other => other,
        }
    }

    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut retry_after = None;

        let messages = match self {
            Self::BadRequest(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg)
            | Self::PayloadTooLarge(msg) => vec![msg],
            Self::Validation(msgs) => msgs,
            Self::TooManyRequests { retry_after: secs } => {
                retry_after = Some(secs);
                vec!["Too many requests, please try again later.".to_string()]
            }
            Self::Internal(err) => {
                tracing::error!("Internal server error: {err:?}");
                vec!["An internal error occurred".to_string()]
            }
        };

        let data = ErrorData { status, messages };
        let mut response = (status, Json(error_envelope(&data, ""))).into_response();
        if let Some(value) = retry_after.and_then(|secs| HeaderValue::from_str(&secs.to_string()).ok()) {
            response.headers_mut().insert(header::RETRY_AFTER, value);
        }
        response.extensions_mut().insert(data);
        response
    }
}

/// Allow `?` to automatically convert any `anyhow::Error`-compatible error into `AppError::Internal`.
impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rollback_keeps_domain_errors() {
        let err = AppError::Forbidden("nope".to_string()).after_rollback("update post");
        assert!(matches!(err, AppError::Forbidden(msg) if msg == "nope"));

        let err = AppError::NotFound("missing".to_string()).after_rollback("update post");
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn rollback_wraps_internal_errors() {
        let err = AppError::Internal(anyhow::anyhow!("db down")).after_rollback("create post");
        match err {
            AppError::Internal(inner) => {
                assert_eq!(inner.to_string(), "Failed to create post");
            }
            other => unreachable!("unexpected error kind: {other:?}"),
        }
    }

    #[test]
    fn too_many_requests_sets_retry_after() {
        let response = AppError::TooManyRequests { retry_after: 42 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok()),
            Some("42")
        );
    }
}
