use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::entities::{EditorRole, PostStatus, post, team};

pub const MAX_TAGS: usize = 10;

fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.iter().any(|t| t.trim().is_empty() || t.trim().chars().count() > 30) {
        return Err(ValidationError::new("tag_name")
            .with_message("Each tag must be between 1 and 30 characters.".into()));
    }
    Ok(())
}

/// Distinguishes an absent field (`None`) from an explicit `null` (`Some(None)`).
fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 200, message = "title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: String,
    #[validate(length(max = 500, message = "excerpt must be at most 500 characters"))]
    pub excerpt: Option<String>,
    pub thumbnail: Option<String>,
    pub status: Option<PostStatus>,
    pub team_id: Option<Uuid>,
    #[validate(
        length(max = 10, message = "a post can have at most 10 tags"),
        custom(function = "validate_tags")
    )]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 200, message = "title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "content must not be empty"))]
    pub content: Option<String>,
    #[validate(length(max = 500, message = "excerpt must be at most 500 characters"))]
    pub excerpt: Option<String>,
    pub thumbnail: Option<String>,
    pub status: Option<PostStatus>,
    /// `null` detaches the post from its team.
    #[serde(default, deserialize_with = "double_option")]
    pub team_id: Option<Option<Uuid>>,
    #[validate(
        length(max = 10, message = "a post can have at most 10 tags"),
        custom(function = "validate_tags")
    )]
    pub tags: Option<Vec<String>>,
}

/// Filters for the public post listing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFilter {
    pub tag: Option<String>,
    pub author_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MyPostsFilter {
    pub status: Option<PostStatus>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorSummary {
    pub user_id: Uuid,
    pub nickname: String,
    pub profile_image: String,
    pub role: EditorRole,
}

/// A post with its editors, team and tag names.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: post::Model,
    pub editors: Vec<EditorSummary>,
    pub team: Option<team::Model>,
    pub tags: Vec<String>,
}

impl PostDetail {
    pub fn editor_role(&self, user_id: Uuid) -> Option<EditorRole> {
        self.editors
            .iter()
            .find(|e| e.user_id == user_id)
            .map(|e| e.role)
    }
}
