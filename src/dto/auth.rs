use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::entities::user;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(custom(function = "crate::auth::password::validate_password"))]
    pub password: String,
    #[validate(length(min = 1, max = 50, message = "name must be between 1 and 50 characters"))]
    pub name: String,
    #[validate(custom(function = "crate::auth::password::validate_nickname"))]
    pub nickname: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// Body fallback for clients that cannot send the refresh cookie.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoogleLoginQuery {
    /// Frontend path to land on after sign-in.
    pub redirect_to: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Returned by signup, login and refresh. The tokens are also set as cookies.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub user: user::Model,
    pub access_token: String,
}
