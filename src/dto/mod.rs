//! Request and response shapes shared by routes and services.
//!
//! Request bodies are `camelCase` JSON validated with `validator`; use [`ValidJson`] and
//! [`ValidQuery`] in handlers so malformed input becomes an enveloped 400.

pub mod auth;
pub mod comment;
pub mod notice;
pub mod post;
pub mod report;
pub mod search;
pub mod team;
pub mod user;

use axum::extract::{FromRequest, FromRequestParts, Query, Request};
use axum::http::request::Parts;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;

/// JSON body that has passed its `validator` rules.
#[derive(Debug)]
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        value
            .validate()
            .map_err(|errors| AppError::from_validation(&errors))?;
        Ok(Self(value))
    }
}

/// Query string that has passed its `validator` rules.
#[derive(Debug)]
pub struct ValidQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        value
            .validate()
            .map_err(|errors| AppError::from_validation(&errors))?;
        Ok(Self(value))
    }
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    20
}

/// `?page=&limit=` with 1-based pages.
#[derive(Debug, Clone, Copy, Deserialize, Validate)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: u64,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: u64,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl PageQuery {
    pub const fn offset(&self) -> u64 {
        (self.page.saturating_sub(1)) * self.limit
    }

    pub fn into_page<T>(self, items: Vec<T>, total: u64) -> Page<T> {
        Page {
            items,
            total,
            page: self.page,
            limit: self.limit,
        }
    }
}

/// One page of results.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Plain `{ "message": ".." }` payload for operations with nothing else to return.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_offset() {
        let q = PageQuery { page: 3, limit: 10 };
        assert_eq!(q.offset(), 20);
        assert_eq!(PageQuery::default().offset(), 0);
    }

    #[test]
    fn limit_is_bounded() {
        assert!(PageQuery { page: 1, limit: 101 }.validate().is_err());
        assert!(PageQuery { page: 0, limit: 10 }.validate().is_err());
        assert!(PageQuery { page: 1, limit: 100 }.validate().is_ok());
    }
}
