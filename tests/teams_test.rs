mod common;

use axum::http::{Method, StatusCode};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::{Value, json};
use uuid::Uuid;

use scribe_api::entities::{NoticeType, notice};

async fn create_team(app: &common::TestApp, leader: &common::TestUser, body: Value) -> Uuid {
    let (status, response) = common::send(
        &app.router,
        Method::POST,
        "/api/v1/teams",
        Some(&leader.token),
        Some(&body),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create team failed: {response}");
    common::uuid_at(&response["data"]["id"])
}

#[tokio::test]
async fn creator_leads_and_is_first_member() {
    let app = common::test_app().await;
    let leader = common::signup(&app.router, "founder").await;
    let team_id = create_team(&app, &leader, json!({ "name": "Founders" })).await;

    let (status, body) = common::send(
        &app.router,
        Method::GET,
        &format!("/api/v1/teams/{team_id}"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["leaderId"], leader.id.to_string());
    assert_eq!(body["data"]["members"][0]["status"], "JOINED");
    assert_eq!(body["data"]["followerCount"], 0);

    let (status, _) = common::send(
        &app.router,
        Method::POST,
        "/api/v1/teams",
        Some(&leader.token),
        Some(&json!({ "name": "Founders" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn invite_only_team_requires_invitation() {
    let app = common::test_app().await;
    let leader = common::signup(&app.router, "gatekeeper").await;
    let guest = common::signup(&app.router, "guest").await;
    let team_id =
        create_team(&app, &leader, json!({ "name": "Private Club", "isInviteOnly": true })).await;
    let join_uri = format!("/api/v1/teams/{team_id}/join");

    let (status, _) =
        common::send(&app.router, Method::POST, &join_uri, Some(&guest.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = common::send(
        &app.router,
        Method::POST,
        &format!("/api/v1/teams/{team_id}/invite"),
        Some(&leader.token),
        Some(&json!({ "userId": guest.id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "INVITED");

    let (status, body) =
        common::send(&app.router, Method::POST, &join_uri, Some(&guest.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "JOINED");

    let (status, _) =
        common::send(&app.router, Method::POST, &join_uri, Some(&guest.token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn repeated_invites_refresh_one_unread_notice() {
    let app = common::test_app().await;
    let leader = common::signup(&app.router, "inviter").await;
    let guest = common::signup(&app.router, "invitee").await;
    let team_id = create_team(&app, &leader, json!({ "name": "Repeaters" })).await;
    let invite_uri = format!("/api/v1/teams/{team_id}/invite");

    for _ in 0..2 {
        let (status, _) = common::send(
            &app.router,
            Method::POST,
            &invite_uri,
            Some(&leader.token),
            Some(&json!({ "userId": guest.id })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let invites = notice::Entity::find()
        .filter(notice::Column::UserId.eq(guest.id))
        .filter(notice::Column::NoticeType.eq(NoticeType::TeamInvite))
        .all(&app.db)
        .await
        .unwrap_or_default();
    assert_eq!(invites.len(), 1);
    assert!(!invites[0].is_read);
    assert_eq!(invites[0].related_id, Some(team_id));
}

#[tokio::test]
async fn only_leader_can_invite() {
    let app = common::test_app().await;
    let leader = common::signup(&app.router, "real_leader").await;
    let member = common::signup(&app.router, "plain_member").await;
    let guest = common::signup(&app.router, "hopeful").await;
    let team_id = create_team(&app, &leader, json!({ "name": "Hierarchy" })).await;

    common::send(
        &app.router,
        Method::POST,
        &format!("/api/v1/teams/{team_id}/join"),
        Some(&member.token),
        None,
    )
    .await;

    let (status, _) = common::send(
        &app.router,
        Method::POST,
        &format!("/api/v1/teams/{team_id}/invite"),
        Some(&member.token),
        Some(&json!({ "userId": guest.id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn leader_cannot_leave_but_members_can() {
    let app = common::test_app().await;
    let leader = common::signup(&app.router, "anchor").await;
    let member = common::signup(&app.router, "drifter").await;
    let team_id = create_team(&app, &leader, json!({ "name": "Harbor" })).await;
    let leave_uri = format!("/api/v1/teams/{team_id}/leave");

    let (status, _) =
        common::send(&app.router, Method::POST, &leave_uri, Some(&leader.token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) =
        common::send(&app.router, Method::POST, &leave_uri, Some(&member.token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    common::send(
        &app.router,
        Method::POST,
        &format!("/api/v1/teams/{team_id}/join"),
        Some(&member.token),
        None,
    )
    .await;
    let (status, _) =
        common::send(&app.router, Method::POST, &leave_uri, Some(&member.token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = common::send(
        &app.router,
        Method::GET,
        &format!("/api/v1/teams/{team_id}/members"),
        None,
        None,
    )
    .await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn following_a_team_notifies_the_leader() {
    let app = common::test_app().await;
    let leader = common::signup(&app.router, "popular").await;
    let fan = common::signup(&app.router, "team_fan").await;
    let team_id = create_team(&app, &leader, json!({ "name": "Stars" })).await;
    let follow_uri = format!("/api/v1/teams/{team_id}/follow");

    let (status, _) =
        common::send(&app.router, Method::POST, &follow_uri, Some(&fan.token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) =
        common::send(&app.router, Method::POST, &follow_uri, Some(&fan.token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = common::send(
        &app.router,
        Method::GET,
        "/api/v1/users/me/followed-teams",
        Some(&fan.token),
        None,
    )
    .await;
    assert_eq!(body["data"][0]["name"], "Stars");

    let (_, body) =
        common::send(&app.router, Method::GET, "/api/v1/notices", Some(&leader.token), None).await;
    assert_eq!(body["data"]["items"][0]["type"], "TEAM_FOLLOW");
    assert_eq!(body["data"]["items"][0]["metadata"]["teamId"], team_id.to_string());
}
