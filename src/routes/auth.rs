use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use axum_extra::extract::CookieJar;

use crate::auth::cookies::{self, REFRESH_COOKIE};
use crate::auth::middleware::AuthUser;
use crate::dto::auth::{
    GoogleLoginQuery, LoginRequest, OAuthCallbackQuery, RefreshRequest, SessionResponse,
    SignupRequest,
};
use crate::dto::{MessageResponse, ValidJson};
use crate::error::AppError;
use crate::response::ApiResponse;
use crate::services::auth_service::{self, Session};
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the auth route group: `/auth/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/google", get(google_initiate))
        .route("/google/callback", get(google_callback))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn with_cookies(
    state: &AppState,
    jar: CookieJar,
    session: &Session,
) -> Result<CookieJar, AppError> {
    Ok(cookies::set_session(jar, &session.tokens, &session.user, &state.config)?)
}

fn session_body(session: Session) -> SessionResponse {
    SessionResponse {
        user: session.user,
        access_token: session.tokens.access_token,
    }
}

/// Only same-site relative paths are honoured as post-login targets.
fn safe_redirect_path(redirect_to: Option<&str>) -> &str {
    match redirect_to {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/",
    }
}

fn frontend_error(state: &AppState, message: &str) -> Response {
    let url = format!(
        "{}/login?error={}",
        state.config.frontend_url.trim_end_matches('/'),
        urlencoding::encode(message)
    );
    Redirect::to(&url).into_response()
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /api/v1/auth/google`
async fn google_initiate(
    State(state): State<AppState>,
    Query(query): Query<GoogleLoginQuery>,
) -> Result<Response, AppError> {
    let url = auth_service::google_authorize_url(&state.config, query.redirect_to.as_deref())?;
    Ok(Redirect::to(&url).into_response())
}

/// `GET /api/v1/auth/google/callback`
///
/// Always answers with a redirect to the frontend: on success with the session cookies
/// set, on failure to the login page with an `error` parameter.
async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<OAuthCallbackQuery>,
) -> Response {
    if let Some(error) = query.error.as_deref() {
        tracing::info!(%error, "Google sign-in cancelled");
        return frontend_error(&state, error);
    }
    let (Some(code), Some(oauth_state)) = (query.code, query.state.as_deref()) else {
        return frontend_error(&state, "missing_code");
    };

    let result = async {
        let (session, redirect_to) =
            auth_service::google_callback(&state.db, &state.config, code, oauth_state).await?;
        let jar = with_cookies(&state, jar, &session)?;
        Ok::<_, AppError>((jar, redirect_to))
    }
    .await;

    match result {
        Ok((jar, redirect_to)) => {
            let url = format!(
                "{}{}",
                state.config.frontend_url.trim_end_matches('/'),
                safe_redirect_path(redirect_to.as_deref())
            );
            (jar, Redirect::to(&url)).into_response()
        }
        Err(err) => {
            tracing::warn!("Google sign-in failed: {err:?}");
            let reason = match err {
                AppError::Forbidden(msg) | AppError::BadRequest(msg) => msg,
                _ => "login_failed".to_string(),
            };
            frontend_error(&state, &reason)
        }
    }
}

/// `POST /api/v1/auth/signup`
async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidJson(body): ValidJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = auth_service::signup(&state.db, &state.config, body).await?;
    let jar = with_cookies(&state, jar, &session)?;
    Ok((jar, ApiResponse::created(session_body(session))))
}

/// `POST /api/v1/auth/login`
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidJson(body): ValidJson<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = auth_service::login(&state.db, &state.config, body).await?;
    let jar = with_cookies(&state, jar, &session)?;
    Ok((jar, ApiResponse::ok(session_body(session))))
}

/// `POST /api/v1/auth/refresh`
///
/// Reads the `refresh_token` cookie, falling back to a `{ "refreshToken": ".." }` body.
async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let from_body = || {
        serde_json::from_slice::<RefreshRequest>(&body)
            .ok()
            .and_then(|b| b.refresh_token)
    };
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
        .or_else(from_body)
        .ok_or_else(|| AppError::Unauthorized("Refresh token is required.".to_string()))?;

    match auth_service::refresh(&state.db, &state.config, &token).await {
        Ok(session) => {
            let jar = with_cookies(&state, jar, &session)?;
            Ok((jar, ApiResponse::ok(session_body(session))).into_response())
        }
        Err(err) => Ok((cookies::clear_session(jar), err).into_response()),
    }
}

/// `POST /api/v1/auth/logout`
async fn logout(jar: CookieJar) -> impl IntoResponse {
    (
        cookies::clear_session(jar),
        ApiResponse::ok(MessageResponse::new("Logged out.")),
    )
}

/// `GET /api/v1/auth/me`
async fn me(AuthUser(user): AuthUser) -> impl IntoResponse {
    ApiResponse::ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_targets_stay_on_site() {
        assert_eq!(safe_redirect_path(Some("/posts/1")), "/posts/1");
        assert_eq!(safe_redirect_path(Some("//evil.example")), "/");
        assert_eq!(safe_redirect_path(Some("https://evil.example")), "/");
        assert_eq!(safe_redirect_path(None), "/");
    }
}
