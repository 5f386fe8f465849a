//! Post authoring.
//!
//! A post is written together with its editor rows and tag links in one transaction.
//! Without a team the author is the single OWNER; with a team every JOINED member gets an
//! editor row, OWNER for the author and EDITOR for everyone else.

use std::collections::HashSet;

use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, TransactionTrait};
use uuid::Uuid;

use super::finish;
use crate::config::Config;
use crate::dto::post::{
    CreatePostRequest, EditorSummary, MyPostsFilter, PostDetail, PostFilter, UpdatePostRequest,
};
use crate::dto::{Page, PageQuery};
use crate::entities::{EditorRole, PostStatus, TeamMemberStatus, post, user};
use crate::error::AppError;
use crate::repositories::post_repo::{self, NewPost, PublicFilter};
use crate::repositories::{now, tag_repo, team_repo};

/// Create a post with the requested status (default `PRIVATE`).
///
/// # Errors
///
/// `NotFound`/`Forbidden` for an unknown team or one the author has not joined; any
/// database failure is reported as a failure to create the post.
pub async fn create_post(
    db: &DatabaseConnection,
    config: &Config,
    dto: CreatePostRequest,
    user_id: Uuid,
) -> Result<PostDetail, AppError> {
    let status = dto.status.unwrap_or_default();
    create(db, config, dto, status, user_id).await
}

/// Create a post whose status is always `DRAFT`.
///
/// # Errors
///
/// Same as [`create_post`].
pub async fn draft_post(
    db: &DatabaseConnection,
    config: &Config,
    dto: CreatePostRequest,
    user_id: Uuid,
) -> Result<PostDetail, AppError> {
    create(db, config, dto, PostStatus::Draft, user_id).await
}

async fn create(
    db: &DatabaseConnection,
    config: &Config,
    dto: CreatePostRequest,
    status: PostStatus,
    user_id: Uuid,
) -> Result<PostDetail, AppError> {
    if let Some(team_id) = dto.team_id {
        ensure_joined(db, team_id, user_id).await?;
    }

    let tags = normalize_tags(dto.tags.unwrap_or_default());
    let new = NewPost {
        title: dto.title.trim().to_string(),
        content: dto.content,
        excerpt: dto.excerpt,
        thumbnail: dto
            .thumbnail
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| config.default_thumbnail_url.clone()),
        status,
        team_id: dto.team_id,
    };

    let txn = db.begin().await?;
    let result = async {
        let post = post_repo::insert(&txn, new).await?;
        assign_editors(&txn, post.id, post.team_id, user_id).await?;
        attach_tags(&txn, post.id, &tags).await?;
        Ok::<_, AppError>(post.id)
    }
    .await;
    let post_id = finish(txn, result, "create post").await?;

    tracing::info!(%post_id, %user_id, ?status, tags = tags.len(), "Post created");
    get_post_with_editors(db, post_id).await
}

/// Apply the fields present in `dto`.
///
/// Tags, when present, replace the old set. A change of team regenerates the editor rows.
///
/// # Errors
///
/// `NotFound` if the post is missing, `Forbidden` unless the caller is OWNER or EDITOR.
pub async fn update_post(
    db: &DatabaseConnection,
    post_id: Uuid,
    dto: UpdatePostRequest,
    user_id: Uuid,
) -> Result<PostDetail, AppError> {
    let post = get_post_by_id(db, post_id).await?;
    let role = post_repo::find_editor(db, post_id, user_id)
        .await?
        .map(|e| e.role);
    if !role.is_some_and(EditorRole::can_write) {
        return Err(AppError::Forbidden(
            "You do not have permission to edit this post.".to_string(),
        ));
    }

    let new_team = dto.team_id.filter(|team| *team != post.team_id);
    if let Some(Some(team_id)) = new_team {
        ensure_joined(db, team_id, user_id).await?;
    }
    let tags = dto.tags.map(normalize_tags);

    let mut active: post::ActiveModel = post.into();
    if let Some(title) = dto.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(content) = dto.content {
        active.content = Set(content);
    }
    if let Some(excerpt) = dto.excerpt {
        active.excerpt = Set(Some(excerpt));
    }
    if let Some(thumbnail) = dto.thumbnail {
        active.thumbnail = Set(thumbnail);
    }
    if let Some(status) = dto.status {
        active.status = Set(status);
    }
    if let Some(team_id) = new_team {
        active.team_id = Set(team_id);
    }
    active.updated_at = Set(now());

    let txn = db.begin().await?;
    let result = async {
        active.update(&txn).await?;
        if let Some(tags) = &tags {
            post_repo::delete_post_tags(&txn, post_id).await?;
            attach_tags(&txn, post_id, tags).await?;
        }
        if let Some(team_id) = new_team {
            post_repo::delete_editors(&txn, post_id).await?;
            assign_editors(&txn, post_id, team_id, user_id).await?;
        }
        Ok::<_, AppError>(())
    }
    .await;
    finish(txn, result, "update post").await?;

    tracing::info!(%post_id, %user_id, "Post updated");
    get_post_with_editors(db, post_id).await
}

/// # Errors
///
/// `NotFound` if no live post has this id.
pub async fn get_post_by_id(db: &DatabaseConnection, post_id: Uuid) -> Result<post::Model, AppError> {
    post_repo::find_by_id(db, post_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found.".to_string()))
}

/// Post with editors, team and tag names. No visibility check.
///
/// # Errors
///
/// `NotFound` if no live post has this id.
pub async fn get_post_with_editors(
    db: &DatabaseConnection,
    post_id: Uuid,
) -> Result<PostDetail, AppError> {
    let post = get_post_by_id(db, post_id).await?;
    detail(db, post).await
}

async fn detail(db: &DatabaseConnection, post: post::Model) -> Result<PostDetail, AppError> {
    let editors = post_repo::editors_with_users(db, post.id)
        .await?
        .into_iter()
        .filter_map(|(editor, user)| {
            user.map(|u| EditorSummary {
                user_id: editor.user_id,
                nickname: u.nickname,
                profile_image: u.profile_image,
                role: editor.role,
            })
        })
        .collect();
    let team = match post.team_id {
        Some(team_id) => team_repo::find_by_id(db, team_id).await?,
        None => None,
    };
    let tags = post_repo::tags_of(db, post.id)
        .await?
        .into_iter()
        .map(|t| t.name)
        .collect();

    Ok(PostDetail {
        post,
        editors,
        team,
        tags,
    })
}

/// Read a post as `viewer`, counting the view.
///
/// Non-public posts are only visible to their editors; everyone else gets `NotFound`.
///
/// # Errors
///
/// `NotFound` for missing or invisible posts.
pub async fn view_post(
    db: &DatabaseConnection,
    post_id: Uuid,
    viewer: Option<&user::Model>,
) -> Result<PostDetail, AppError> {
    let mut detail = get_post_with_editors(db, post_id).await?;
    if detail.post.status != PostStatus::Public
        && viewer.and_then(|u| detail.editor_role(u.id)).is_none()
    {
        return Err(AppError::NotFound("Post not found.".to_string()));
    }

    post_repo::increment_views(db, post_id).await?;
    detail.post.view_count += 1;
    Ok(detail)
}

/// Ensure `viewer` may see the post (public, or one of its editors).
///
/// # Errors
///
/// `NotFound` for missing or invisible posts.
pub async fn visible_post(
    db: &DatabaseConnection,
    post_id: Uuid,
    viewer: Option<Uuid>,
) -> Result<post::Model, AppError> {
    let post = get_post_by_id(db, post_id).await?;
    if post.status == PostStatus::Public {
        return Ok(post);
    }
    if let Some(user_id) = viewer {
        if post_repo::find_editor(db, post_id, user_id).await?.is_some() {
            return Ok(post);
        }
    }
    Err(AppError::NotFound("Post not found.".to_string()))
}

/// Public posts, newest first.
///
/// # Errors
///
/// Database failures.
pub async fn list_posts(
    db: &DatabaseConnection,
    filter: PostFilter,
    page: PageQuery,
) -> Result<Page<post::Model>, AppError> {
    let tag_id = match filter.tag.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(name) => match tag_repo::find_by_name(db, name).await? {
            Some(tag) => Some(tag.id),
            None => return Ok(page.into_page(Vec::new(), 0)),
        },
        None => None,
    };

    let public = PublicFilter {
        tag_id,
        owner_id: filter.author_id,
        team_id: filter.team_id,
    };
    let (items, total) = post_repo::list_public(db, &public, page.offset(), page.limit).await?;
    Ok(page.into_page(items, total))
}

/// Posts the user can edit or view as an editor.
///
/// # Errors
///
/// Database failures.
pub async fn list_my_posts(
    db: &DatabaseConnection,
    user_id: Uuid,
    filter: MyPostsFilter,
    page: PageQuery,
) -> Result<Page<post::Model>, AppError> {
    let (items, total) =
        post_repo::list_for_editor(db, user_id, filter.status, page.offset(), page.limit).await?;
    Ok(page.into_page(items, total))
}

/// Soft delete. Only the OWNER may delete.
///
/// # Errors
///
/// `NotFound` if the post is missing, `Forbidden` for non-owners.
pub async fn delete_post(db: &DatabaseConnection, post_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    let post = get_post_by_id(db, post_id).await?;
    let is_owner = post_repo::find_editor(db, post_id, user_id)
        .await?
        .is_some_and(|e| e.role == EditorRole::Owner);
    if !is_owner {
        return Err(AppError::Forbidden(
            "Only the owner can delete this post.".to_string(),
        ));
    }
    post_repo::soft_delete(db, post).await?;
    tracing::info!(%post_id, %user_id, "Post deleted");
    Ok(())
}

/// Permanent delete, including soft-deleted posts. Dependent rows cascade.
///
/// # Errors
///
/// `NotFound` if the id is unknown.
pub async fn hard_delete_post(db: &DatabaseConnection, post_id: Uuid) -> Result<(), AppError> {
    if post_repo::find_any(db, post_id).await?.is_none() {
        return Err(AppError::NotFound("Post not found.".to_string()));
    }
    post_repo::hard_delete(db, post_id).await?;
    tracing::warn!(%post_id, "Post permanently deleted");
    Ok(())
}

async fn ensure_joined(db: &DatabaseConnection, team_id: Uuid, user_id: Uuid) -> Result<(), AppError> {
    if team_repo::find_by_id(db, team_id).await?.is_none() {
        return Err(AppError::NotFound("Team not found.".to_string()));
    }
    let joined = team_repo::find_member(db, team_id, user_id)
        .await?
        .is_some_and(|m| m.status == TeamMemberStatus::Joined);
    if !joined {
        return Err(AppError::Forbidden(
            "You must be a member of the team to post for it.".to_string(),
        ));
    }
    Ok(())
}

async fn assign_editors<C: ConnectionTrait>(
    db: &C,
    post_id: Uuid,
    team_id: Option<Uuid>,
    author_id: Uuid,
) -> Result<(), AppError> {
    let members = match team_id {
        Some(team_id) => team_repo::joined_member_ids(db, team_id).await?,
        None => Vec::new(),
    };

    post_repo::insert_editor(db, post_id, author_id, EditorRole::Owner).await?;
    for member_id in members.into_iter().filter(|id| *id != author_id) {
        post_repo::insert_editor(db, post_id, member_id, EditorRole::Editor).await?;
    }
    Ok(())
}

async fn attach_tags<C: ConnectionTrait>(db: &C, post_id: Uuid, names: &[String]) -> Result<(), AppError> {
    for name in names {
        let tag = tag_repo::find_or_create(db, name).await?;
        post_repo::insert_post_tag(db, post_id, tag.id).await?;
    }
    Ok(())
}

/// Trim, drop blanks and keep the first occurrence of each name.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_deduplicated_in_order() {
        let tags = normalize_tags(vec![
            "a".to_string(),
            " b ".to_string(),
            "a".to_string(),
            String::new(),
        ]);
        assert_eq!(tags, vec!["a".to_string(), "b".to_string()]);
    }
}
