use serde::Deserialize;
use validator::Validate;

const fn default_days() -> i64 {
    7
}

const fn default_popular_limit() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PopularTagsQuery {
    #[serde(default = "default_days")]
    #[validate(range(min = 1, max = 365, message = "days must be between 1 and 365"))]
    pub days: i64,
    #[serde(default = "default_popular_limit")]
    #[validate(range(min = 1, max = 50, message = "limit must be between 1 and 50"))]
    pub limit: u64,
}

/// `?q=` for tag prefix lookup and full-text style search.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SearchQuery {
    #[validate(length(min = 1, max = 100, message = "q must be between 1 and 100 characters"))]
    pub q: String,
}
