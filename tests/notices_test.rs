mod common;

use axum::http::{Method, StatusCode};
use serde_json::Value;

async fn follow(app: &common::TestApp, actor: &common::TestUser, target: &common::TestUser) {
    let (status, _) = common::send(
        &app.router,
        Method::POST,
        &format!("/api/v1/users/{}/follow", target.id),
        Some(&actor.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

async fn first_notice(app: &common::TestApp, user: &common::TestUser) -> Value {
    let (_, body) =
        common::send(&app.router, Method::GET, "/api/v1/notices", Some(&user.token), None).await;
    body["data"]["items"][0].clone()
}

#[tokio::test]
async fn mark_read_is_idempotent() {
    let app = common::test_app().await;
    let target = common::signup(&app.router, "listener").await;
    let actor = common::signup(&app.router, "talker").await;
    follow(&app, &actor, &target).await;

    let notice = first_notice(&app, &target).await;
    assert_eq!(notice["isRead"], false);
    let uri = format!("/api/v1/notices/{}/read", notice["id"].as_str().unwrap_or_default());

    let (status, first) =
        common::send(&app.router, Method::PATCH, &uri, Some(&target.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"]["isRead"], true);

    let (status, second) =
        common::send(&app.router, Method::PATCH, &uri, Some(&target.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["data"], second["data"]);
}

#[tokio::test]
async fn other_users_cannot_touch_a_notice() {
    let app = common::test_app().await;
    let target = common::signup(&app.router, "owner_of_notice").await;
    let actor = common::signup(&app.router, "snoop").await;
    follow(&app, &actor, &target).await;

    let notice = first_notice(&app, &target).await;
    let id = notice["id"].as_str().unwrap_or_default().to_string();

    let (status, _) = common::send(
        &app.router,
        Method::PATCH,
        &format!("/api/v1/notices/{id}/read"),
        Some(&actor.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = common::send(
        &app.router,
        Method::DELETE,
        &format!("/api/v1/notices/{id}"),
        Some(&actor.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = common::send(
        &app.router,
        Method::DELETE,
        &format!("/api/v1/notices/{id}"),
        Some(&target.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn read_all_clears_unread_count() {
    let app = common::test_app().await;
    let target = common::signup(&app.router, "famous").await;
    for name in ["follower_a", "follower_b", "follower_c"] {
        let actor = common::signup(&app.router, name).await;
        follow(&app, &actor, &target).await;
    }

    let (_, body) = common::send(
        &app.router,
        Method::GET,
        "/api/v1/notices/unread-count",
        Some(&target.token),
        None,
    )
    .await;
    assert_eq!(body["data"]["count"], 3);

    let (status, body) = common::send(
        &app.router,
        Method::PATCH,
        "/api/v1/notices/read-all",
        Some(&target.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["updated"], 3);

    let (_, body) = common::send(
        &app.router,
        Method::GET,
        "/api/v1/notices?unreadOnly=true",
        Some(&target.token),
        None,
    )
    .await;
    assert_eq!(body["data"]["total"], 0);

    let (_, body) =
        common::send(&app.router, Method::GET, "/api/v1/notices", Some(&target.token), None).await;
    assert_eq!(body["data"]["total"], 3);
}
