use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::user::AuthorSummary;
use crate::entities::comment;

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 2000, message = "content must be between 1 and 2000 characters"))]
    pub content: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateCommentRequest {
    #[validate(length(min = 1, max = 2000, message = "content must be between 1 and 2000 characters"))]
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    #[serde(flatten)]
    pub comment: comment::Model,
    pub author: Option<AuthorSummary>,
}
