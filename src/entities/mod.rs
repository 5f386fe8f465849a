//! `SeaORM` entity definitions, one module per table.

pub mod auth;
pub mod bookmark;
pub mod comment;
pub mod comment_like;
pub mod editor;
pub mod enums;
pub mod follow;
pub mod notice;
pub mod post;
pub mod post_like;
pub mod post_tag;
pub mod report;
pub mod tag;
pub mod team;
pub mod team_follow;
pub mod team_member;
pub mod user;
pub mod user_block;

pub use enums::{
    AuthProvider, EditorRole, NoticeType, PostStatus, ReportStatus, ReportTargetType, Role,
    TeamMemberStatus,
};
