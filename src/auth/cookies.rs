use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::jwt::TokenPair;
use crate::config::Config;
use crate::entities::{Role, user};

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";
/// Readable by frontend scripts; holds no secrets.
pub const USER_COOKIE: &str = "user";

/// Public fields mirrored into the `user` cookie.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserSnapshot<'a> {
    id: Uuid,
    email: &'a str,
    name: &'a str,
    nickname: &'a str,
    profile_image: &'a str,
    role: Role,
}

fn session_cookie(
    name: &'static str,
    value: String,
    http_only: bool,
    max_age_secs: u64,
    config: &Config,
) -> Cookie<'static> {
    #[allow(clippy::cast_possible_wrap)]
    let max_age = time::Duration::seconds(max_age_secs as i64);
    Cookie::build((name, value))
        .path("/")
        .http_only(http_only)
        .secure(config.secure_cookies())
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

/// Add the access, refresh and user cookies to `jar`.
///
/// # Errors
///
/// Returns an error if the user snapshot cannot be serialized.
pub fn set_session(
    jar: CookieJar,
    tokens: &TokenPair,
    user: &user::Model,
    config: &Config,
) -> anyhow::Result<CookieJar> {
    let snapshot = serde_json::to_string(&UserSnapshot {
        id: user.id,
        email: &user.email,
        name: &user.name,
        nickname: &user.nickname,
        profile_image: &user.profile_image,
        role: user.role,
    })?;

    Ok(jar
        .add(session_cookie(
            ACCESS_COOKIE,
            tokens.access_token.clone(),
            true,
            config.jwt_access_expiration_secs,
            config,
        ))
        .add(session_cookie(
            REFRESH_COOKIE,
            tokens.refresh_token.clone(),
            true,
            config.jwt_refresh_expiration_secs,
            config,
        ))
        .add(session_cookie(
            USER_COOKIE,
            snapshot,
            false,
            config.jwt_refresh_expiration_secs,
            config,
        )))
}

/// Expire all three session cookies, whether or not the request carried them.
#[must_use]
pub fn clear_session(jar: CookieJar) -> CookieJar {
    [ACCESS_COOKIE, REFRESH_COOKIE, USER_COOKIE]
        .into_iter()
        .fold(jar, |jar, name| {
            let mut removal = Cookie::build((name, "")).path("/").build();
            removal.make_removal();
            jar.add(removal)
        })
}
