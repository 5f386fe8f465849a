use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::entities::{ReportStatus, ReportTargetType};

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    pub target_type: ReportTargetType,
    pub target_id: Uuid,
    #[validate(length(min = 1, max = 500, message = "reason must be between 1 and 500 characters"))]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportFilter {
    pub status: Option<ReportStatus>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandleReportRequest {
    pub status: ReportStatus,
}
