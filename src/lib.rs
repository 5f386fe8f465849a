//! Scribe API - backend for a blogging and social writing platform
//!
//! This crate provides the REST API for Scribe:
//! - Posts with co-editors, tags, comments, likes and bookmarks
//! - Follows, blocks, teams and in-app notices
//! - Google and e-mail sign-in with cookie-based JWT sessions
//! - Reports and admin moderation

pub mod auth;
pub mod config;
pub mod db;
pub mod dto;
pub mod entities;
pub mod error;
pub mod rate_limit;
pub mod repositories;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
