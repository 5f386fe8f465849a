//! Business rules, one module per resource.
//!
//! Services validate existence, ownership and duplicates, then call repositories. Multi-row
//! writes run in a transaction opened here and closed with [`finish`]. Notification side
//! effects run after the commit and never fail the caller.

pub mod auth_service;
pub mod block_service;
pub mod bookmark_service;
pub mod comment_service;
pub mod follow_service;
pub mod like_service;
pub mod notice_service;
pub mod post_service;
pub mod report_service;
pub mod tag_service;
pub mod team_service;
pub mod upload_service;
pub mod user_service;

use sea_orm::DatabaseTransaction;

use crate::error::AppError;

/// Commit on success, roll back on failure.
///
/// Domain errors raised inside the transaction come back unchanged; anything unexpected is
/// reported as a failure to perform `action`.
pub(crate) async fn finish<T>(
    txn: DatabaseTransaction,
    result: Result<T, AppError>,
    action: &str,
) -> Result<T, AppError> {
    match result {
        Ok(value) => {
            txn.commit()
                .await
                .map_err(|e| AppError::from(e).after_rollback(action))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = txn.rollback().await {
                tracing::error!(action, "Rollback failed: {rollback_err}");
            }
            tracing::debug!(action, error = ?err, "Transaction rolled back");
            Err(err.after_rollback(action))
        }
    }
}
