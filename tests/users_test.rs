mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

#[tokio::test]
async fn profile_update_checks_nickname() {
    let app = common::test_app().await;
    let me = common::signup(&app.router, "renamer").await;
    common::signup(&app.router, "occupied").await;

    let (status, _) = common::send(
        &app.router,
        Method::PATCH,
        "/api/v1/users/me",
        Some(&me.token),
        Some(&json!({ "nickname": "occupied" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = common::send(
        &app.router,
        Method::PATCH,
        "/api/v1/users/me",
        Some(&me.token),
        Some(&json!({ "nickname": "renamed", "bio": "Writes things." })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nickname"], "renamed");
    assert_eq!(body["data"]["bio"], "Writes things.");

    let (_, body) = common::send(
        &app.router,
        Method::GET,
        "/api/v1/users/check-nickname?nickname=renamer",
        None,
        None,
    )
    .await;
    assert_eq!(body["data"]["available"], true);
}

#[tokio::test]
async fn public_profile_counts_posts_and_followers() {
    let app = common::test_app().await;
    let author = common::signup(&app.router, "profiled").await;
    let fan = common::signup(&app.router, "admirer").await;
    common::create_post(
        &app.router,
        &author,
        json!({ "title": "Public", "content": "Body", "status": "PUBLIC" }),
    )
    .await;
    common::create_post(
        &app.router,
        &author,
        json!({ "title": "Private", "content": "Body" }),
    )
    .await;
    common::send(
        &app.router,
        Method::POST,
        &format!("/api/v1/users/{}/follow", author.id),
        Some(&fan.token),
        None,
    )
    .await;

    let (status, body) = common::send(
        &app.router,
        Method::GET,
        &format!("/api/v1/users/{}", author.id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["nickname"], "profiled");
    assert_eq!(body["data"]["followerCount"], 1);
    assert_eq!(body["data"]["followingCount"], 0);
    assert_eq!(body["data"]["postCount"], 1);
    assert!(body["data"].get("email").is_none());
}

#[tokio::test]
async fn deleted_account_disappears() {
    let app = common::test_app().await;
    let me = common::signup(&app.router, "leaving").await;

    let (status, headers, _) =
        common::send_raw(&app.router, Method::DELETE, "/api/v1/users/me", Some(&me.token), None)
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(common::cookie_value(&headers, "access_token").as_deref(), Some(""));

    let (status, _) = common::send(
        &app.router,
        Method::GET,
        &format!("/api/v1/users/{}", me.id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) =
        common::send(&app.router, Method::GET, "/api/v1/auth/me", Some(&me.token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn search_finds_posts_users_and_tags() {
    let app = common::test_app().await;
    let author = common::signup(&app.router, "searchable").await;
    common::create_post(
        &app.router,
        &author,
        json!({
            "title": "Ownership in practice",
            "content": "Borrowing explained",
            "status": "PUBLIC",
            "tags": ["rust", "rustacean", "memory"],
        }),
    )
    .await;

    let (status, body) =
        common::send(&app.router, Method::GET, "/api/v1/search/posts?q=Borrow", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);

    let (_, body) =
        common::send(&app.router, Method::GET, "/api/v1/search/users?q=search", None, None).await;
    assert_eq!(body["data"]["items"][0]["nickname"], "searchable");

    let (_, body) = common::send(&app.router, Method::GET, "/api/v1/tags?q=rust", None, None).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(2));

    let (status, body) =
        common::send(&app.router, Method::GET, "/api/v1/tags/popular", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().map(Vec::len), Some(3));

    let (status, _) = common::send(&app.router, Method::GET, "/api/v1/search/posts", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleted_account_frees_email_and_nickname() {
    let app = common::test_app().await;
    let first = common::signup(&app.router, "comeback").await;

    let (status, _) =
        common::send(&app.router, Method::DELETE, "/api/v1/users/me", Some(&first.token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = common::send(
        &app.router,
        Method::GET,
        "/api/v1/users/check-nickname?nickname=comeback",
        None,
        None,
    )
    .await;
    assert_eq!(body["data"]["available"], true);

    let second = common::signup(&app.router, "comeback").await;
    assert_ne!(second.id, first.id);

    let (status, body) =
        common::send(&app.router, Method::GET, "/api/v1/auth/me", Some(&second.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["email"], "comeback@example.com");
}
