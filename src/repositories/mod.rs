//! Data access, one module per entity family.
//!
//! Every function is generic over [`sea_orm::ConnectionTrait`] so the same query runs on the
//! pool or inside a service-owned transaction. No business rules live here.

pub mod comment_repo;
pub mod notice_repo;
pub mod post_repo;
pub mod reaction_repo;
pub mod relation_repo;
pub mod report_repo;
pub mod tag_repo;
pub mod team_repo;
pub mod user_repo;

use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;

/// Current time in the column type every table uses.
pub fn now() -> DateTimeWithTimeZone {
    Utc::now().fixed_offset()
}

/// `%term%` pattern for `LIKE` searches, with `LIKE` wildcards stripped from `term`.
pub fn contains_pattern(term: &str) -> String {
    format!("%{}%", escape_like(term))
}

/// `term%` pattern for prefix searches.
pub fn prefix_pattern(term: &str) -> String {
    format!("{}%", escape_like(term))
}

fn escape_like(term: &str) -> String {
    term.trim().replace('%', "").replace('_', "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_patterns_strip_wildcards() {
        assert_eq!(contains_pattern(" ru%st_ "), "%rust%");
        assert_eq!(prefix_pattern("ab"), "ab%");
    }
}
