mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use scribe_api::entities::Role;

async fn report(
    app: &common::TestApp,
    reporter: &common::TestUser,
    target_type: &str,
    target_id: uuid::Uuid,
) -> (StatusCode, serde_json::Value) {
    common::send(
        &app.router,
        Method::POST,
        "/api/v1/reports",
        Some(&reporter.token),
        Some(&json!({
            "targetType": target_type,
            "targetId": target_id,
            "reason": "spam",
        })),
    )
    .await
}

#[tokio::test]
async fn reports_reject_self_and_duplicates() {
    let app = common::test_app().await;
    let author = common::signup(&app.router, "spammer").await;
    let reporter = common::signup(&app.router, "watchdog").await;
    let post_id = common::create_post(
        &app.router,
        &author,
        json!({ "title": "Buy now", "content": "Cheap", "status": "PUBLIC" }),
    )
    .await;

    let (status, _) = report(&app, &reporter, "USER", reporter.id).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = report(&app, &reporter, "POST", uuid::Uuid::new_v4()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = report(&app, &reporter, "POST", post_id).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "PENDING");

    let (status, _) = report(&app, &reporter, "POST", post_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn admin_handles_reports() {
    let app = common::test_app().await;
    let admin = common::signup(&app.router, "moderator").await;
    let reporter = common::signup(&app.router, "tipster").await;
    let target = common::signup(&app.router, "troll").await;
    common::set_role(&app.db, admin.id, Role::Admin).await;

    let (_, body) = report(&app, &reporter, "USER", target.id).await;
    let report_id = common::uuid_at(&body["data"]["id"]);
    let uri = format!("/api/v1/admin/reports/{report_id}");

    let (status, _) = common::send(
        &app.router,
        Method::GET,
        "/api/v1/admin/reports",
        Some(&reporter.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = common::send(
        &app.router,
        Method::GET,
        "/api/v1/admin/reports?status=PENDING",
        Some(&admin.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);

    let (status, _) = common::send(
        &app.router,
        Method::PATCH,
        &uri,
        Some(&admin.token),
        Some(&json!({ "status": "PENDING" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = common::send(
        &app.router,
        Method::PATCH,
        &uri,
        Some(&admin.token),
        Some(&json!({ "status": "RESOLVED" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "RESOLVED");

    let (_, body) = common::send(
        &app.router,
        Method::GET,
        "/api/v1/admin/reports?status=PENDING",
        Some(&admin.token),
        None,
    )
    .await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn admin_hard_deletes_posts() {
    let app = common::test_app().await;
    let admin = common::signup(&app.router, "janitor").await;
    let author = common::signup(&app.router, "messy").await;
    common::set_role(&app.db, admin.id, Role::Admin).await;
    let post_id = common::create_post(
        &app.router,
        &author,
        json!({ "title": "Trash", "content": "Body", "status": "PUBLIC" }),
    )
    .await;
    let uri = format!("/api/v1/admin/posts/{post_id}");

    let (status, _) =
        common::send(&app.router, Method::DELETE, &uri, Some(&author.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = common::send(&app.router, Method::DELETE, &uri, Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = common::send(&app.router, Method::DELETE, &uri, Some(&admin.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_super_admin_changes_roles() {
    let app = common::test_app().await;
    let admin = common::signup(&app.router, "plain_admin").await;
    let root = common::signup(&app.router, "root").await;
    let user = common::signup(&app.router, "promotee").await;
    common::set_role(&app.db, admin.id, Role::Admin).await;
    common::set_role(&app.db, root.id, Role::SuperAdmin).await;
    let uri = format!("/api/v1/admin/users/{}/role", user.id);

    let (status, _) = common::send(
        &app.router,
        Method::PATCH,
        &uri,
        Some(&admin.token),
        Some(&json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = common::send(
        &app.router,
        Method::PATCH,
        &uri,
        Some(&root.token),
        Some(&json!({ "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["role"], "admin");

    let (status, _) = common::send(
        &app.router,
        Method::PATCH,
        &format!("/api/v1/admin/users/{}/role", root.id),
        Some(&root.token),
        Some(&json!({ "role": "user" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
