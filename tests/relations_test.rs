mod common;

use axum::http::{Method, StatusCode};
use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait};

use scribe_api::entities::{follow, user_block};

#[tokio::test]
async fn follow_notifies_and_lists_followers() {
    let app = common::test_app().await;
    let alice = common::signup(&app.router, "alice").await;
    let bob = common::signup(&app.router, "bob").await;

    let (status, _) = common::send(
        &app.router,
        Method::POST,
        &format!("/api/v1/users/{}/follow", bob.id),
        Some(&alice.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = common::send(
        &app.router,
        Method::POST,
        &format!("/api/v1/users/{}/follow", bob.id),
        Some(&alice.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = common::send(
        &app.router,
        Method::GET,
        &format!("/api/v1/users/{}/followers", bob.id),
        None,
        None,
    )
    .await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["nickname"], "alice");

    let (_, body) =
        common::send(&app.router, Method::GET, "/api/v1/notices", Some(&bob.token), None).await;
    assert_eq!(body["data"]["items"][0]["type"], "FOLLOW");
    assert_eq!(body["data"]["items"][0]["relatedId"], alice.id.to_string());
}

#[tokio::test]
async fn cannot_follow_yourself() {
    let app = common::test_app().await;
    let me = common::signup(&app.router, "narcissus").await;

    let (status, _) = common::send(
        &app.router,
        Method::POST,
        &format!("/api/v1/users/{}/follow", me.id),
        Some(&me.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn block_removes_follows_both_ways() {
    let app = common::test_app().await;
    let alice = common::signup(&app.router, "blocker").await;
    let bob = common::signup(&app.router, "blocked").await;

    for (actor, target) in [(&alice, &bob), (&bob, &alice)] {
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
    assert_eq!(follow::Entity::find().count(&app.db).await.unwrap_or_default(), 2);

    let block_uri = format!("/api/v1/users/{}/block", bob.id);
    let (status, _) =
        common::send(&app.router, Method::POST, &block_uri, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(follow::Entity::find().count(&app.db).await.unwrap_or_default(), 0);

    let (status, _) =
        common::send(&app.router, Method::POST, &block_uri, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = common::send(
        &app.router,
        Method::POST,
        &format!("/api/v1/users/{}/follow", alice.id),
        Some(&bob.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = common::send(
        &app.router,
        Method::GET,
        "/api/v1/users/me/blocks",
        Some(&alice.token),
        None,
    )
    .await;
    assert_eq!(body["data"][0]["nickname"], "blocked");
}

#[tokio::test]
async fn block_edge_cases() {
    let app = common::test_app().await;
    let alice = common::signup(&app.router, "edgy").await;
    let bob = common::signup(&app.router, "other_edge").await;

    let (status, _) = common::send(
        &app.router,
        Method::POST,
        &format!("/api/v1/users/{}/block", alice.id),
        Some(&alice.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let unblock_uri = format!("/api/v1/users/{}/block", bob.id);
    let (status, _) =
        common::send(&app.router, Method::DELETE, &unblock_uri, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) =
        common::send(&app.router, Method::POST, &unblock_uri, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) =
        common::send(&app.router, Method::DELETE, &unblock_uri, Some(&alice.token), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn failed_block_keeps_follows_and_leaves_no_block() {
    let app = common::test_app().await;
    let alice = common::signup(&app.router, "steady").await;
    let bob = common::signup(&app.router, "sticky").await;

    for (actor, target) in [(&alice, &bob), (&bob, &alice)] {
        common::send(
            &app.router,
            Method::POST,
            &format!("/api/v1/users/{}/follow", target.id),
            Some(&actor.token),
            None,
        )
        .await;
    }
    assert_eq!(follow::Entity::find().count(&app.db).await.unwrap_or_default(), 2);

    // Fails the follow cleanup after the block row is already written.
    let created = app
        .db
        .execute_unprepared(
            "CREATE TRIGGER reject_follow_delete BEFORE DELETE ON follow \
             BEGIN SELECT RAISE(ABORT, 'follow delete rejected'); END;",
        )
        .await;
    assert!(created.is_ok());

    let (status, _) = common::send(
        &app.router,
        Method::POST,
        &format!("/api/v1/users/{}/block", bob.id),
        Some(&alice.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(user_block::Entity::find().count(&app.db).await.unwrap_or_default(), 0);
    assert_eq!(follow::Entity::find().count(&app.db).await.unwrap_or_default(), 2);
}
