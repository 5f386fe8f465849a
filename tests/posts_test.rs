mod common;

use axum::http::{Method, StatusCode};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use scribe_api::entities::{EditorRole, editor, post, post_tag, tag};

#[tokio::test]
async fn solo_post_gets_a_single_owner() {
    let app = common::test_app().await;
    let author = common::signup(&app.router, "solo").await;

    let post_id = common::create_post(
        &app.router,
        &author,
        json!({ "title": "First", "content": "Body", "status": "PUBLIC" }),
    )
    .await;

    let editors = editor::Entity::find()
        .filter(editor::Column::PostId.eq(post_id))
        .all(&app.db)
        .await
        .unwrap_or_default();
    assert_eq!(editors.len(), 1);
    assert_eq!(editors[0].user_id, author.id);
    assert_eq!(editors[0].role, EditorRole::Owner);
}

#[tokio::test]
async fn duplicate_tags_are_stored_once() {
    let app = common::test_app().await;
    let author = common::signup(&app.router, "tagger").await;

    let (status, body) = common::send(
        &app.router,
        Method::POST,
        "/api/v1/posts",
        Some(&author.token),
        Some(&json!({
            "title": "Tagged",
            "content": "Body",
            "status": "PUBLIC",
            "tags": ["rust", "web", "rust"],
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["tags"].as_array().map(Vec::len), Some(2));

    let post_id = common::uuid_at(&body["data"]["id"]);
    let tags = tag::Entity::find().count(&app.db).await.unwrap_or_default();
    let links = post_tag::Entity::find()
        .filter(post_tag::Column::PostId.eq(post_id))
        .count(&app.db)
        .await
        .unwrap_or_default();
    assert_eq!(tags, 2);
    assert_eq!(links, 2);
}

#[tokio::test]
async fn team_post_grants_every_joined_member() {
    let app = common::test_app().await;
    let leader = common::signup(&app.router, "lead").await;
    let first = common::signup(&app.router, "member_one").await;
    let second = common::signup(&app.router, "member_two").await;

    let (status, team) = common::send(
        &app.router,
        Method::POST,
        "/api/v1/teams",
        Some(&leader.token),
        Some(&json!({ "name": "Writers" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let team_id = common::uuid_at(&team["data"]["id"]);

    for member in [&first, &second] {
        let (status, _) = common::send(
            &app.router,
            Method::POST,
            &format!("/api/v1/teams/{team_id}/join"),
            Some(&member.token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let post_id = common::create_post(
        &app.router,
        &first,
        json!({ "title": "Team post", "content": "Body", "teamId": team_id }),
    )
    .await;

    let editors = editor::Entity::find()
        .filter(editor::Column::PostId.eq(post_id))
        .all(&app.db)
        .await
        .unwrap_or_default();
    assert_eq!(editors.len(), 3);
    let owners: Vec<_> = editors
        .iter()
        .filter(|e| e.role == EditorRole::Owner)
        .collect();
    assert_eq!(owners.len(), 1);
    assert_eq!(owners[0].user_id, first.id);
}

#[tokio::test]
async fn posting_to_a_team_requires_membership() {
    let app = common::test_app().await;
    let leader = common::signup(&app.router, "keeper").await;
    let outsider = common::signup(&app.router, "outsider").await;

    let (_, team) = common::send(
        &app.router,
        Method::POST,
        "/api/v1/teams",
        Some(&leader.token),
        Some(&json!({ "name": "Closed" })),
    )
    .await;
    let team_id = common::uuid_at(&team["data"]["id"]);

    let (status, _) = common::send(
        &app.router,
        Method::POST,
        "/api/v1/posts",
        Some(&outsider.token),
        Some(&json!({ "title": "Sneaky", "content": "Body", "teamId": team_id })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn stranger_cannot_update_post() {
    let app = common::test_app().await;
    let author = common::signup(&app.router, "owner").await;
    let stranger = common::signup(&app.router, "stranger").await;
    let post_id = common::create_post(
        &app.router,
        &author,
        json!({ "title": "Original", "content": "Body", "status": "PUBLIC" }),
    )
    .await;

    let uri = format!("/api/v1/posts/{post_id}");
    let (status, _) = common::send(
        &app.router,
        Method::PATCH,
        &uri,
        Some(&stranger.token),
        Some(&json!({ "title": "Hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = common::send(&app.router, Method::GET, &uri, None, None).await;
    assert_eq!(body["data"]["title"], "Original");

    let (status, body) = common::send(
        &app.router,
        Method::PATCH,
        &uri,
        Some(&author.token),
        Some(&json!({ "title": "Edited", "tags": ["news"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Edited");
    assert_eq!(body["data"]["tags"][0], "news");
}

#[tokio::test]
async fn private_post_is_hidden_from_others() {
    let app = common::test_app().await;
    let author = common::signup(&app.router, "private_author").await;
    let viewer = common::signup(&app.router, "curious").await;
    let post_id = common::create_post(
        &app.router,
        &author,
        json!({ "title": "Secret", "content": "Body" }),
    )
    .await;
    let uri = format!("/api/v1/posts/{post_id}");

    let (status, _) = common::send(&app.router, Method::GET, &uri, Some(&viewer.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::send(&app.router, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) =
        common::send(&app.router, Method::GET, &uri, Some(&author.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "PRIVATE");
    assert_eq!(body["data"]["viewCount"], 1);
}

#[tokio::test]
async fn draft_endpoint_ignores_requested_status() {
    let app = common::test_app().await;
    let author = common::signup(&app.router, "drafter").await;

    let (status, body) = common::send(
        &app.router,
        Method::POST,
        "/api/v1/posts/draft",
        Some(&author.token),
        Some(&json!({ "title": "WIP", "content": "Body", "status": "PUBLIC" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "DRAFT");

    let (status, body) = common::send(
        &app.router,
        Method::GET,
        "/api/v1/posts/my?status=DRAFT",
        Some(&author.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn listing_filters_by_tag_and_skips_non_public() {
    let app = common::test_app().await;
    let author = common::signup(&app.router, "lister").await;
    common::create_post(
        &app.router,
        &author,
        json!({ "title": "Rusty", "content": "Body", "status": "PUBLIC", "tags": ["rust"] }),
    )
    .await;
    common::create_post(
        &app.router,
        &author,
        json!({ "title": "Other", "content": "Body", "status": "PUBLIC", "tags": ["go"] }),
    )
    .await;
    common::create_post(
        &app.router,
        &author,
        json!({ "title": "Hidden", "content": "Body", "tags": ["rust"] }),
    )
    .await;

    let (status, body) =
        common::send(&app.router, Method::GET, "/api/v1/posts?tag=rust", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["title"], "Rusty");

    let (_, body) = common::send(&app.router, Method::GET, "/api/v1/posts", None, None).await;
    assert_eq!(body["data"]["total"], 2);

    let (_, body) =
        common::send(&app.router, Method::GET, "/api/v1/posts?tag=unknown", None, None).await;
    assert_eq!(body["data"]["total"], 0);
}

#[tokio::test]
async fn only_owner_can_delete() {
    let app = common::test_app().await;
    let author = common::signup(&app.router, "deleter").await;
    let other = common::signup(&app.router, "bystander").await;
    let post_id = common::create_post(
        &app.router,
        &author,
        json!({ "title": "Doomed", "content": "Body", "status": "PUBLIC" }),
    )
    .await;
    let uri = format!("/api/v1/posts/{post_id}");

    let (status, _) = common::send(&app.router, Method::DELETE, &uri, Some(&other.token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) =
        common::send(&app.router, Method::DELETE, &uri, Some(&author.token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = common::send(&app.router, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn likes_toggle_once_per_user() {
    let app = common::test_app().await;
    let author = common::signup(&app.router, "liked").await;
    let fan = common::signup(&app.router, "fan").await;
    let post_id = common::create_post(
        &app.router,
        &author,
        json!({ "title": "Likeable", "content": "Body", "status": "PUBLIC" }),
    )
    .await;
    let uri = format!("/api/v1/posts/{post_id}/like");

    let (status, body) = common::send(&app.router, Method::POST, &uri, Some(&fan.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["liked"], true);
    assert_eq!(body["data"]["likeCount"], 1);

    let (status, _) = common::send(&app.router, Method::POST, &uri, Some(&fan.token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) =
        common::send(&app.router, Method::DELETE, &uri, Some(&fan.token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["likeCount"], 0);

    let (status, _) = common::send(&app.router, Method::DELETE, &uri, Some(&fan.token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn bookmarks_show_up_in_my_list() {
    let app = common::test_app().await;
    let author = common::signup(&app.router, "bookwriter").await;
    let reader = common::signup(&app.router, "bookreader").await;
    let post_id = common::create_post(
        &app.router,
        &author,
        json!({ "title": "Keeper", "content": "Body", "status": "PUBLIC" }),
    )
    .await;
    let uri = format!("/api/v1/posts/{post_id}/bookmark");

    let (status, _) = common::send(&app.router, Method::POST, &uri, Some(&reader.token), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = common::send(&app.router, Method::POST, &uri, Some(&reader.token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = common::send(
        &app.router,
        Method::GET,
        "/api/v1/users/me/bookmarks",
        Some(&reader.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn comments_update_count_and_notify_owner() {
    let app = common::test_app().await;
    let author = common::signup(&app.router, "commented").await;
    let commenter = common::signup(&app.router, "commenter").await;
    let post_id = common::create_post(
        &app.router,
        &author,
        json!({ "title": "Discuss", "content": "Body", "status": "PUBLIC" }),
    )
    .await;
    let uri = format!("/api/v1/posts/{post_id}/comments");

    let (status, body) = common::send(
        &app.router,
        Method::POST,
        &uri,
        Some(&commenter.token),
        Some(&json!({ "content": "Nice read" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["author"]["nickname"], "commenter");
    let comment_id = common::uuid_at(&body["data"]["id"]);

    let (status, _) = common::send(
        &app.router,
        Method::POST,
        &uri,
        Some(&commenter.token),
        Some(&json!({ "content": "Reply", "parentId": comment_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) =
        common::send(&app.router, Method::GET, &format!("/api/v1/posts/{post_id}"), None, None)
            .await;
    assert_eq!(body["data"]["commentCount"], 2);

    let (_, body) = common::send(
        &app.router,
        Method::GET,
        "/api/v1/notices/unread-count",
        Some(&author.token),
        None,
    )
    .await;
    assert_eq!(body["data"]["count"], 2);

    let (status, _) = common::send(
        &app.router,
        Method::DELETE,
        &format!("/api/v1/comments/{comment_id}"),
        Some(&author.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn updating_tags_replaces_the_old_set() {
    let app = common::test_app().await;
    let author = common::signup(&app.router, "retagger").await;
    let post_id = common::create_post(
        &app.router,
        &author,
        json!({ "title": "Tagged", "content": "Body", "tags": ["old", "keep"] }),
    )
    .await;

    let (status, body) = common::send(
        &app.router,
        Method::PATCH,
        &format!("/api/v1/posts/{post_id}"),
        Some(&author.token),
        Some(&json!({ "tags": ["keep", "new"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let tags = body["data"]["tags"].as_array().cloned().unwrap_or_default();
    assert_eq!(tags.len(), 2);
    assert!(tags.contains(&json!("keep")) && tags.contains(&json!("new")));

    let links = post_tag::Entity::find()
        .filter(post_tag::Column::PostId.eq(post_id))
        .find_also_related(tag::Entity)
        .all(&app.db)
        .await
        .unwrap_or_default();
    let mut names: Vec<String> = links
        .into_iter()
        .filter_map(|(_, tag)| tag.map(|t| t.name))
        .collect();
    names.sort();
    assert_eq!(names, vec!["keep".to_string(), "new".to_string()]);
}

async fn editors_of(db: &sea_orm::DatabaseConnection, post_id: uuid::Uuid) -> Vec<editor::Model> {
    editor::Entity::find()
        .filter(editor::Column::PostId.eq(post_id))
        .all(db)
        .await
        .unwrap_or_default()
}

#[tokio::test]
async fn changing_team_regenerates_editors() {
    let app = common::test_app().await;
    let leader = common::signup(&app.router, "team_head").await;
    let author = common::signup(&app.router, "mover").await;

    let (_, team) = common::send(
        &app.router,
        Method::POST,
        "/api/v1/teams",
        Some(&leader.token),
        Some(&json!({ "name": "Movers" })),
    )
    .await;
    let team_id = common::uuid_at(&team["data"]["id"]);
    common::send(
        &app.router,
        Method::POST,
        &format!("/api/v1/teams/{team_id}/join"),
        Some(&author.token),
        None,
    )
    .await;

    let post_id = common::create_post(
        &app.router,
        &author,
        json!({ "title": "Solo first", "content": "Body" }),
    )
    .await;
    let uri = format!("/api/v1/posts/{post_id}");
    assert_eq!(editors_of(&app.db, post_id).await.len(), 1);

    let (status, _) = common::send(
        &app.router,
        Method::PATCH,
        &uri,
        Some(&author.token),
        Some(&json!({ "teamId": team_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let editors = editors_of(&app.db, post_id).await;
    assert_eq!(editors.len(), 2);
    let owner = editors.iter().find(|e| e.role == EditorRole::Owner);
    assert_eq!(owner.map(|e| e.user_id), Some(author.id));
    assert!(
        editors
            .iter()
            .any(|e| e.user_id == leader.id && e.role == EditorRole::Editor)
    );

    let (status, body) = common::send(
        &app.router,
        Method::PATCH,
        &uri,
        Some(&author.token),
        Some(&json!({ "teamId": null })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["team"].is_null());
    let editors = editors_of(&app.db, post_id).await;
    assert_eq!(editors.len(), 1);
    assert_eq!(editors[0].user_id, author.id);
    assert_eq!(editors[0].role, EditorRole::Owner);
}

#[tokio::test]
async fn failed_create_leaves_no_rows_behind() {
    let app = common::test_app().await;
    let author = common::signup(&app.router, "unlucky").await;

    // Fails the tag links after the post and editor rows are already written.
    let created = app
        .db
        .execute_unprepared(
            "CREATE TRIGGER reject_post_tag BEFORE INSERT ON post_tag \
             BEGIN SELECT RAISE(ABORT, 'post_tag insert rejected'); END;",
        )
        .await;
    assert!(created.is_ok());

    let (status, _) = common::send(
        &app.router,
        Method::POST,
        "/api/v1/posts",
        Some(&author.token),
        Some(&json!({ "title": "Doomed", "content": "Body", "tags": ["lost"] })),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(post::Entity::find().count(&app.db).await.unwrap_or_default(), 0);
    assert_eq!(editor::Entity::find().count(&app.db).await.unwrap_or_default(), 0);
    assert_eq!(post_tag::Entity::find().count(&app.db).await.unwrap_or_default(), 0);
    assert_eq!(tag::Entity::find().count(&app.db).await.unwrap_or_default(), 0);
}

#[tokio::test]
async fn hidden_posts_cannot_be_liked_or_bookmarked() {
    let app = common::test_app().await;
    let author = common::signup(&app.router, "secretive").await;
    let stranger = common::signup(&app.router, "nosy").await;
    let hidden = common::create_post(
        &app.router,
        &author,
        json!({ "title": "Secret", "content": "private body" }),
    )
    .await;

    for action in ["like", "bookmark"] {
        let (status, _) = common::send(
            &app.router,
            Method::POST,
            &format!("/api/v1/posts/{hidden}/{action}"),
            Some(&stranger.token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{action} on a private post");
    }

    let (status, _) = common::send(
        &app.router,
        Method::POST,
        &format!("/api/v1/posts/{hidden}/bookmark"),
        Some(&author.token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = common::send(
        &app.router,
        Method::GET,
        "/api/v1/users/me/bookmarks",
        Some(&author.token),
        None,
    )
    .await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn posts_turned_private_drop_out_of_saved_lists() {
    let app = common::test_app().await;
    let author = common::signup(&app.router, "flipper").await;
    let reader = common::signup(&app.router, "saver").await;
    let post_id = common::create_post(
        &app.router,
        &author,
        json!({ "title": "Soon hidden", "content": "Body", "status": "PUBLIC" }),
    )
    .await;

    for action in ["like", "bookmark"] {
        let (status, _) = common::send(
            &app.router,
            Method::POST,
            &format!("/api/v1/posts/{post_id}/{action}"),
            Some(&reader.token),
            None,
        )
        .await;
        assert!(status.is_success(), "{action} failed with {status}");
    }

    let (status, _) = common::send(
        &app.router,
        Method::PATCH,
        &format!("/api/v1/posts/{post_id}"),
        Some(&author.token),
        Some(&json!({ "status": "PRIVATE" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for list in ["/api/v1/users/me/bookmarks", "/api/v1/users/me/likes"] {
        let (status, body) =
            common::send(&app.router, Method::GET, list, Some(&reader.token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["total"], 0, "{list} still shows the post");
    }
}
