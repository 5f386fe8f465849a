use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::entities::{TeamMemberStatus, team};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    #[validate(length(min = 2, max = 50, message = "name must be between 2 and 50 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: Option<String>,
    pub profile_image: Option<String>,
    #[serde(default)]
    pub is_invite_only: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTeamRequest {
    #[validate(length(min = 2, max = 50, message = "name must be between 2 and 50 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "description must be at most 500 characters"))]
    pub description: Option<String>,
    pub profile_image: Option<String>,
    pub is_invite_only: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub user_id: Uuid,
    pub name: String,
    pub nickname: String,
    pub profile_image: String,
    pub status: TeamMemberStatus,
    pub joined_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDetail {
    #[serde(flatten)]
    pub team: team::Model,
    pub members: Vec<MemberSummary>,
    pub follower_count: u64,
}
