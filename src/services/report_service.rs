use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::dto::report::{CreateReportRequest, ReportFilter};
use crate::dto::{Page, PageQuery};
use crate::entities::{ReportStatus, ReportTargetType, report};
use crate::error::AppError;
use crate::repositories::{comment_repo, post_repo, report_repo, user_repo};

async fn target_exists(
    db: &DatabaseConnection,
    target_type: ReportTargetType,
    target_id: Uuid,
) -> Result<bool, AppError> {
    Ok(match target_type {
        ReportTargetType::Post => post_repo::find_by_id(db, target_id).await?.is_some(),
        ReportTargetType::Comment => comment_repo::find_by_id(db, target_id).await?.is_some(),
        ReportTargetType::User => user_repo::find_live(db, target_id).await?.is_some(),
    })
}

/// File a report against a post, comment or user.
///
/// # Errors
///
/// `NotFound` for missing targets, `BadRequest` for reporting yourself,
/// `Conflict` while an identical report is still pending.
pub async fn create_report(
    db: &DatabaseConnection,
    reporter_id: Uuid,
    dto: CreateReportRequest,
) -> Result<report::Model, AppError> {
    if dto.target_type == ReportTargetType::User && dto.target_id == reporter_id {
        return Err(AppError::BadRequest("You cannot report yourself.".to_string()));
    }
    if !target_exists(db, dto.target_type, dto.target_id).await? {
        return Err(AppError::NotFound("Report target not found.".to_string()));
    }
    if report_repo::find_pending(db, reporter_id, dto.target_type, dto.target_id)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "You have already reported this.".to_string(),
        ));
    }

    let report = report_repo::insert(
        db,
        reporter_id,
        dto.target_type,
        dto.target_id,
        dto.reason.trim().to_string(),
    )
    .await?;
    tracing::info!(report_id = %report.id, target_type = ?report.target_type, "Report filed");
    Ok(report)
}

/// # Errors
///
/// Database failures.
pub async fn list_reports(
    db: &DatabaseConnection,
    filter: ReportFilter,
    page: PageQuery,
) -> Result<Page<report::Model>, AppError> {
    let (items, total) = report_repo::list(db, filter.status, page.offset(), page.limit).await?;
    Ok(page.into_page(items, total))
}

/// Resolve or reject a report.
///
/// # Errors
///
/// `BadRequest` for `PENDING`, `NotFound` for unknown reports.
pub async fn handle_report(
    db: &DatabaseConnection,
    admin_id: Uuid,
    report_id: Uuid,
    status: ReportStatus,
) -> Result<report::Model, AppError> {
    if status == ReportStatus::Pending {
        return Err(AppError::BadRequest(
            "status must be RESOLVED or REJECTED".to_string(),
        ));
    }
    let report = report_repo::find_by_id(db, report_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Report not found.".to_string()))?;

    let report = report_repo::set_status(db, report, status, admin_id).await?;
    tracing::info!(report_id = %report.id, status = ?report.status, %admin_id, "Report handled");
    Ok(report)
}
