use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::entities::{Role, user};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMeRequest {
    #[validate(length(min = 1, max = 50, message = "name must be between 1 and 50 characters"))]
    pub name: Option<String>,
    #[validate(custom(function = "crate::auth::password::validate_nickname"))]
    pub nickname: Option<String>,
    #[validate(length(max = 500, message = "bio must be at most 500 characters"))]
    pub bio: Option<String>,
    pub profile_image: Option<String>,
}

/// Minimal public identity attached to posts, comments and lists.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: Uuid,
    pub name: String,
    pub nickname: String,
    pub profile_image: String,
}

impl From<&user::Model> for AuthorSummary {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            nickname: user.nickname.clone(),
            profile_image: user.profile_image.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicProfile {
    #[serde(flatten)]
    pub user: AuthorSummary,
    pub bio: Option<String>,
    pub created_at: String,
    pub follower_count: u64,
    pub following_count: u64,
    pub post_count: u64,
}

#[derive(Debug, Deserialize, Validate)]
pub struct NicknameQuery {
    #[validate(length(min = 1, message = "nickname is required"))]
    pub nickname: String,
}

#[derive(Debug, Serialize)]
pub struct NicknameAvailability {
    pub nickname: String,
    pub available: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserSearchFilter {
    pub keyword: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRequest {
    pub is_active: bool,
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub role: Role,
}
