//! Sign-up, sign-in and token rotation for local and Google accounts.

use oauth2::{AuthorizationCode, CsrfToken, Scope, TokenResponse};
use rand::Rng;
use sea_orm::{DatabaseConnection, TransactionTrait};

use super::finish;
use crate::auth::jwt::{self, TokenPair};
use crate::auth::oauth::{self, GoogleProfile};
use crate::auth::password;
use crate::config::Config;
use crate::dto::auth::{LoginRequest, SignupRequest};
use crate::entities::{AuthProvider, user};
use crate::error::AppError;
use crate::repositories::user_repo::{self, NewUser};

/// A signed-in user with a fresh token pair.
#[derive(Debug)]
pub struct Session {
    pub user: user::Model,
    pub tokens: TokenPair,
}

fn session(user: user::Model, config: &Config) -> Result<Session, AppError> {
    let tokens = jwt::generate_token_pair(user.id, Some(&user.email), config)?;
    Ok(Session { user, tokens })
}

fn ensure_usable(user: user::Model) -> Result<user::Model, AppError> {
    if user.is_deleted() {
        return Err(AppError::Forbidden("This account has been deleted.".to_string()));
    }
    if !user.is_active {
        return Err(AppError::Forbidden("Account is deactivated.".to_string()));
    }
    Ok(user)
}

/// Register a local e-mail/password account.
///
/// # Errors
///
/// `Conflict` for a taken e-mail or nickname.
pub async fn signup(
    db: &DatabaseConnection,
    config: &Config,
    dto: SignupRequest,
) -> Result<Session, AppError> {
    let email = dto.email.trim().to_lowercase();
    if user_repo::email_exists(db, &email).await? {
        return Err(AppError::Conflict("Email is already registered.".to_string()));
    }
    if user_repo::nickname_taken(db, &dto.nickname, None).await? {
        return Err(AppError::Conflict("Nickname is already taken.".to_string()));
    }
    let password_hash = password::hash_password(&dto.password)?;

    let new = NewUser {
        email: email.clone(),
        name: dto.name.trim().to_string(),
        nickname: dto.nickname,
        password_hash: Some(password_hash),
        profile_image: config.default_profile_image_url.clone(),
    };
    let txn = db.begin().await?;
    let result = async {
        let user = user_repo::insert(&txn, new).await?;
        user_repo::insert_auth(&txn, user.id, AuthProvider::Local, email).await?;
        Ok::<_, AppError>(user)
    }
    .await;
    let user = finish(txn, result, "create account").await?;

    tracing::info!(user_id = %user.id, "Local account created");
    session(user, config)
}

/// # Errors
///
/// `Unauthorized` for unknown e-mails or wrong passwords, `Forbidden` for deactivated accounts.
pub async fn login(
    db: &DatabaseConnection,
    config: &Config,
    dto: LoginRequest,
) -> Result<Session, AppError> {
    let invalid = || AppError::Unauthorized("Invalid email or password.".to_string());

    let user = user_repo::find_by_email(db, &dto.email.trim().to_lowercase())
        .await?
        .ok_or_else(invalid)?;
    let hash = user.password_hash.as_deref().ok_or_else(invalid)?;
    if !password::verify_password(&dto.password, hash)? {
        return Err(invalid());
    }

    let user = ensure_usable(user)?;
    tracing::info!(user_id = %user.id, "User signed in");
    session(user, config)
}

/// Exchange a refresh token for a new pair.
///
/// # Errors
///
/// `Unauthorized` for invalid, expired or access-typed tokens and unknown users.
pub async fn refresh(db: &DatabaseConnection, config: &Config, token: &str) -> Result<Session, AppError> {
    let user_id = jwt::validate_refresh_token(token, config)
        .and_then(|claims| claims.user_id())
        .map_err(|_| AppError::Unauthorized("Invalid or expired refresh token.".to_string()))?;

    let user = user_repo::find_live(db, user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found.".to_string()))?;
    session(ensure_usable(user)?, config)
}

/// Google consent URL carrying a signed CSRF state.
///
/// # Errors
///
/// `BadRequest` when Google sign-in is not configured.
pub fn google_authorize_url(config: &Config, redirect_to: Option<&str>) -> Result<String, AppError> {
    if config.google_client_id.is_empty() {
        return Err(AppError::BadRequest(
            "Google OAuth is not configured.".to_string(),
        ));
    }

    let client = oauth::google_client(config)?;
    let state_token = jwt::generate_oauth_state(&config.jwt_access_secret, redirect_to)?;
    let (auth_url, _csrf) = client
        .authorize_url(|| CsrfToken::new(state_token))
        .add_scope(Scope::new("openid".to_string()))
        .add_scope(Scope::new("email".to_string()))
        .add_scope(Scope::new("profile".to_string()))
        .url();
    Ok(auth_url.to_string())
}

/// Complete the Google flow. Returns the session and the frontend path to land on.
///
/// # Errors
///
/// `BadRequest` for a bad state or code; see [`sign_in_with_google`].
pub async fn google_callback(
    db: &DatabaseConnection,
    config: &Config,
    code: String,
    state: &str,
) -> Result<(Session, Option<String>), AppError> {
    let state_claims = jwt::validate_oauth_state(state, &config.jwt_access_secret)
        .map_err(|_| AppError::BadRequest("Invalid or expired OAuth state.".to_string()))?;

    let client = oauth::google_client(config)?;
    // Token endpoints must not be followed through redirects.
    let http = reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()?;
    let token_result = client
        .exchange_code(AuthorizationCode::new(code))
        .request_async(&http)
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to exchange authorization code: {e}")))?;

    let access_token = token_result.access_token().secret().clone();
    let profile = oauth::fetch_google_profile(&http, &access_token).await?;

    let user = sign_in_with_google(db, config, profile).await?;
    Ok((session(user, config)?, state_claims.redirect_to))
}

/// Map a Google profile onto a user.
///
/// Known Google identity signs in; an existing account with the same e-mail gets its auth
/// row pointed at Google; otherwise a new user and auth row are created together.
///
/// # Errors
///
/// `Forbidden` for deleted or deactivated accounts.
pub async fn sign_in_with_google(
    db: &DatabaseConnection,
    config: &Config,
    profile: GoogleProfile,
) -> Result<user::Model, AppError> {
    if let Some(auth) = user_repo::find_auth(db, AuthProvider::Google, &profile.sub).await? {
        let user = user_repo::find_by_id(db, auth.user_id)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found.".to_string()))?;
        return ensure_usable(user);
    }

    let email = profile.email.trim().to_lowercase();
    if let Some(existing) = user_repo::find_by_email(db, &email).await? {
        let user = ensure_usable(existing)?;
        match user_repo::find_auth_by_user(db, user.id).await? {
            Some(auth) => {
                user_repo::relink_auth(db, auth, AuthProvider::Google, profile.sub.clone()).await?;
            }
            None => {
                user_repo::insert_auth(db, user.id, AuthProvider::Google, profile.sub.clone())
                    .await?;
            }
        }
        tracing::info!(user_id = %user.id, "Google identity linked to existing account");
        return Ok(user);
    }

    let nickname = unique_nickname(db, &email).await?;
    let new = NewUser {
        email,
        name: profile.display_name(),
        nickname,
        password_hash: None,
        profile_image: profile
            .picture
            .clone()
            .unwrap_or_else(|| config.default_profile_image_url.clone()),
    };

    let txn = db.begin().await?;
    let result = async {
        let user = user_repo::insert(&txn, new).await?;
        user_repo::insert_auth(&txn, user.id, AuthProvider::Google, profile.sub).await?;
        Ok::<_, AppError>(user)
    }
    .await;
    let user = finish(txn, result, "create account").await?;

    tracing::info!(user_id = %user.id, "Account created from Google profile");
    Ok(user)
}

/// Nickname seed from the e-mail local part, limited to nickname characters.
fn nickname_base(email: &str) -> String {
    let base: String = email
        .split('@')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '.')
        .take(14)
        .collect();
    if base.chars().count() < 2 {
        format!("user{base}")
    } else {
        base
    }
}

async fn unique_nickname(db: &DatabaseConnection, email: &str) -> Result<String, AppError> {
    let base = nickname_base(email);
    if !user_repo::nickname_taken(db, &base, None).await? {
        return Ok(base);
    }
    for _ in 0..10 {
        let candidate = format!("{base}{}", rand::thread_rng().gen_range(1000..10000));
        if !user_repo::nickname_taken(db, &candidate, None).await? {
            return Ok(candidate);
        }
    }
    Err(AppError::Conflict(
        "Could not generate a unique nickname.".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nickname_base_from_email() {
        assert_eq!(nickname_base("jane.doe+blog@example.com"), "jane.doeblog");
        assert_eq!(nickname_base("x@example.com"), "userx");
        assert_eq!(nickname_base("averyveryverylongname@example.com").len(), 14);
    }
}
