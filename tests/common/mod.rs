#![allow(dead_code)]

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use migration::{Migrator, MigratorTrait};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait};
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use scribe_api::config::{Config, Environment};
use scribe_api::entities::{Role, user};
use scribe_api::rate_limit::RateLimiter;
use scribe_api::state::AppState;

pub const PASSWORD: &str = "Password123";

/// Router plus a handle on its database for direct assertions.
pub struct TestApp {
    pub router: Router,
    pub db: DatabaseConnection,
}

/// A signed-up user and the access token to act as them.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
    pub refresh_token: String,
}

pub fn test_config() -> Config {
    Config {
        database_url: String::new(),
        server_host: std::net::IpAddr::from([127, 0, 0, 1]),
        server_port: 0,
        environment: Environment::Development,
        log_level: "warn".to_string(),
        jwt_access_secret: "test-access-secret-for-testing-only".to_string(),
        jwt_refresh_secret: "test-refresh-secret-for-testing-only".to_string(),
        jwt_access_expiration_secs: 900,
        jwt_refresh_expiration_secs: 2_592_000,
        google_client_id: String::new(),
        google_client_secret: String::new(),
        google_redirect_uri: String::new(),
        frontend_url: "http://localhost:3001".to_string(),
        public_url: "http://localhost:3000".to_string(),
        upload_dir: "test_uploads".to_string(),
        default_thumbnail_url: "http://localhost:3000/uploads/default-thumbnail.png".to_string(),
        default_profile_image_url: "http://localhost:3000/uploads/default-profile.png".to_string(),
        redis_url: None,
        rate_limit_max_requests: 10_000,
        rate_limit_window_secs: 60,
        trust_proxy: false,
    }
}

async fn migrated_db() -> DatabaseConnection {
    let db = sea_orm::Database::connect("sqlite::memory:")
        .await
        .unwrap_or_default();
    Migrator::up(&db, None).await.unwrap_or_default();
    db
}

/// App backed by an in-memory `SQLite` database with migrations applied.
pub async fn test_app() -> TestApp {
    let db = migrated_db().await;
    let state = AppState::new(db.clone(), test_config());
    TestApp {
        router: scribe_api::routes::app(state),
        db,
    }
}

/// Same as [`test_app`] with a tight rate limit.
pub async fn test_app_with_limit(max_requests: u64) -> TestApp {
    let db = migrated_db().await;
    let state = AppState::new(db.clone(), test_config())
        .with_rate_limiter(RateLimiter::in_memory(max_requests, 60));
    TestApp {
        router: scribe_api::routes::app(state),
        db,
    }
}

/// Send a request and return (status, headers, parsed JSON body or `Null`).
pub async fn send_raw(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> (StatusCode, HeaderMap, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .unwrap_or_default();

    let response = app.clone().oneshot(request).await.unwrap_or_default();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response
        .into_body()
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .unwrap_or_default();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    (status, headers, value)
}

pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> (StatusCode, Value) {
    let (status, _, value) = send_raw(app, method, uri, token, body).await;
    (status, value)
}

/// Test helper: send a GET request to the app and return (status, body).
pub async fn get(app: &Router, uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap_or_default();

    let response = app.clone().oneshot(request).await.unwrap_or_default();

    let status = response.status();
    let body = response
        .into_body()
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .unwrap_or_default();
    let body_str = String::from_utf8(body.to_vec()).unwrap_or_default();

    (status, body_str)
}

/// Sign up a local account; `nickname` doubles as the e-mail local part.
pub async fn signup(app: &Router, nickname: &str) -> TestUser {
    let (status, headers, body) = send_raw(
        app,
        Method::POST,
        "/api/v1/auth/signup",
        None,
        Some(&json!({
            "email": format!("{nickname}@example.com"),
            "password": PASSWORD,
            "name": nickname,
            "nickname": nickname,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");

    TestUser {
        id: body["data"]["user"]["id"]
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .unwrap_or_default(),
        token: body["data"]["accessToken"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        refresh_token: cookie_value(&headers, "refresh_token").unwrap_or_default(),
    }
}

/// Change a user's role directly in the database.
pub async fn set_role(db: &DatabaseConnection, user_id: Uuid, role: Role) {
    if let Ok(Some(found)) = user::Entity::find_by_id(user_id).one(db).await {
        let mut active: user::ActiveModel = found.into();
        active.role = Set(role);
        let _ = active.update(db).await;
    }
}

/// Create a public post as `author` and return its id.
pub async fn create_post(app: &Router, author: &TestUser, body: Value) -> Uuid {
    let (status, response) = send(
        app,
        Method::POST,
        "/api/v1/posts",
        Some(&author.token),
        Some(&body),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create post failed: {response}");
    uuid_at(&response["data"]["id"])
}

pub fn uuid_at(value: &Value) -> Uuid {
    value
        .as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_default()
}

/// Value of the `name` cookie among the `Set-Cookie` headers, if any.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find_map(|raw| {
            let pair = raw.split(';').next()?;
            let (key, value) = pair.split_once('=')?;
            (key.trim() == name).then(|| value.trim().to_string())
        })
}
