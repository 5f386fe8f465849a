use chrono::{Duration, Utc};
use sea_orm::DatabaseConnection;

use crate::dto::{Page, PageQuery};
use crate::entities::{post, tag};
use crate::error::AppError;
use crate::repositories::tag_repo::{self, TagCount};
use crate::repositories::post_repo;

const PREFIX_LIMIT: u64 = 20;

/// Tags ranked by how often they were attached during the last `days` days.
///
/// # Errors
///
/// Database failures.
pub async fn popular(db: &DatabaseConnection, days: i64, limit: u64) -> Result<Vec<TagCount>, AppError> {
    let since = (Utc::now() - Duration::days(days)).fixed_offset();
    Ok(tag_repo::popular_since(db, since, limit).await?)
}

/// Tags whose name starts with `prefix`, alphabetically.
///
/// # Errors
///
/// Database failures.
pub async fn search_tags(db: &DatabaseConnection, prefix: &str) -> Result<Vec<tag::Model>, AppError> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        return Ok(Vec::new());
    }
    Ok(tag_repo::search_prefix(db, prefix, PREFIX_LIMIT).await?)
}

/// Public posts whose title or content contains `term`.
///
/// # Errors
///
/// Database failures.
pub async fn search_posts(
    db: &DatabaseConnection,
    term: &str,
    page: PageQuery,
) -> Result<Page<post::Model>, AppError> {
    let (items, total) = post_repo::search_public(db, term.trim(), page.offset(), page.limit).await?;
    Ok(page.into_page(items, total))
}
