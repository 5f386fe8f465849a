use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;

/// Which of the two session tokens a JWT is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

/// JWT claims embedded in both access and refresh tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user ID as a UUID string.
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Checked on every verification so one token kind never stands in for the other.
    #[serde(rename = "type")]
    pub token_type: TokenType,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
    /// Issued-at time (Unix timestamp).
    pub iat: i64,
}

impl Claims {
    /// Parse the subject back into a user id.
    ///
    /// # Errors
    ///
    /// Returns an error if `sub` is not a UUID.
    pub fn user_id(&self) -> anyhow::Result<Uuid> {
        self.sub
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid token subject"))
    }
}

/// A pair of access and refresh tokens returned on sign-in/sign-up.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Generate a new access + refresh token pair for the given user.
///
/// # Errors
///
/// Returns an error if JWT encoding fails.
pub fn generate_token_pair(
    user_id: Uuid,
    email: Option<&str>,
    config: &Config,
) -> anyhow::Result<TokenPair> {
    let access_token = sign(
        user_id,
        email,
        TokenType::Access,
        config.jwt_access_expiration_secs,
        &config.jwt_access_secret,
    )?;
    let refresh_token = sign(
        user_id,
        email,
        TokenType::Refresh,
        config.jwt_refresh_expiration_secs,
        &config.jwt_refresh_secret,
    )?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

fn sign(
    user_id: Uuid,
    email: Option<&str>,
    token_type: TokenType,
    ttl_secs: u64,
    secret: &str,
) -> anyhow::Result<String> {
    let now = Utc::now().timestamp();

    #[allow(clippy::cast_possible_wrap)]
    let claims = Claims {
        sub: user_id.to_string(),
        email: email.map(String::from),
        token_type,
        exp: now + ttl_secs as i64,
        iat: now,
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key)
        .map_err(|e| anyhow::anyhow!("Failed to encode {token_type:?} token: {e}"))
}

fn verify(token: &str, secret: &str, expected: TokenType) -> anyhow::Result<Claims> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    let token_data = decode::<Claims>(token, &key, &validation)
        .map_err(|e| anyhow::anyhow!("Invalid {expected:?} token: {e}"))?;

    if token_data.claims.token_type != expected {
        return Err(anyhow::anyhow!("Token is not a {expected:?} token"));
    }

    Ok(token_data.claims)
}

/// Validate an access token and return its claims.
///
/// # Errors
///
/// Returns an error if the token is invalid, expired, or not an access token.
pub fn validate_access_token(token: &str, config: &Config) -> anyhow::Result<Claims> {
    verify(token, &config.jwt_access_secret, TokenType::Access)
}

/// Validate a refresh token and return its claims.
///
/// # Errors
///
/// Returns an error if the token is invalid, expired, or not a refresh token.
pub fn validate_refresh_token(token: &str, config: &Config) -> anyhow::Result<Claims> {
    verify(token, &config.jwt_refresh_secret, TokenType::Refresh)
}

/// Generate a short-lived JWT for OAuth CSRF state (10 minutes).
///
/// # Errors
///
/// Returns an error if JWT encoding fails.
pub fn generate_oauth_state(secret: &str, redirect_to: Option<&str>) -> anyhow::Result<String> {
    let now = Utc::now();

    let claims = OAuthStateClaims {
        csrf: Uuid::new_v4().to_string(),
        redirect_to: redirect_to.map(String::from),
        exp: now.timestamp() + 600,
        iat: now.timestamp(),
    };

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key)
        .map_err(|e| anyhow::anyhow!("Failed to encode OAuth state: {e}"))
}

/// Validate an OAuth CSRF state token.
///
/// # Errors
///
/// Returns an error if the state token is invalid or expired.
pub fn validate_oauth_state(state: &str, secret: &str) -> anyhow::Result<OAuthStateClaims> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<OAuthStateClaims>(state, &key, &Validation::default())
        .map_err(|e| anyhow::anyhow!("Invalid OAuth state: {e}"))?;
    Ok(token_data.claims)
}

/// Claims for OAuth CSRF state tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct OAuthStateClaims {
    pub csrf: String,
    /// Frontend path to return to after sign-in.
    pub redirect_to: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    fn config() -> Config {
        Config {
            database_url: String::new(),
            server_host: std::net::IpAddr::from([127, 0, 0, 1]),
            server_port: 3000,
            environment: Environment::Development,
            log_level: "info".to_string(),
            jwt_access_secret: "access-secret".to_string(),
            jwt_refresh_secret: "refresh-secret".to_string(),
            jwt_access_expiration_secs: 900,
            jwt_refresh_expiration_secs: 2_592_000,
            google_client_id: String::new(),
            google_client_secret: String::new(),
            google_redirect_uri: String::new(),
            frontend_url: String::new(),
            public_url: String::new(),
            upload_dir: String::new(),
            default_thumbnail_url: String::new(),
            default_profile_image_url: String::new(),
            redis_url: None,
            rate_limit_max_requests: 100,
            rate_limit_window_secs: 60,
            trust_proxy: false,
        }
    }

    #[test]
    fn access_token_round_trip() {
        let config = config();
        let id = Uuid::new_v4();
        let pair = generate_token_pair(id, Some("a@b.c"), &config).unwrap_or_else(|_| TokenPair {
            access_token: String::new(),
            refresh_token: String::new(),
        });
        let claims = validate_access_token(&pair.access_token, &config);
        assert!(claims.is_ok());
        let claims = claims.unwrap_or_else(|_| unreachable!());
        assert_eq!(claims.sub, id.to_string());
        assert_eq!(claims.email.as_deref(), Some("a@b.c"));
        assert_eq!(claims.token_type, TokenType::Access);
    }

    #[test]
    fn refresh_rejects_access_token() {
        let mut config = config();
        // Same secret for both, so only the type claim can tell them apart.
        config.jwt_refresh_secret = config.jwt_access_secret.clone();
        let pair = generate_token_pair(Uuid::new_v4(), None, &config);
        assert!(pair.is_ok());
        let pair = pair.unwrap_or_else(|_| unreachable!());

        assert!(validate_refresh_token(&pair.access_token, &config).is_err());
        assert!(validate_access_token(&pair.refresh_token, &config).is_err());
        assert!(validate_refresh_token(&pair.refresh_token, &config).is_ok());
    }

    #[test]
    fn oauth_state_round_trip() {
        let state = generate_oauth_state("s", Some("/posts")).unwrap_or_default();
        let claims = validate_oauth_state(&state, "s");
        assert!(claims.is_ok());
        assert!(validate_oauth_state(&state, "other").is_err());
    }
}
