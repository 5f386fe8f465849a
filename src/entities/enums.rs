use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account role, ordered by privilege.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Default,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "super_admin")]
    SuperAdmin,
}

impl Role {
    /// Admins and super-admins pass the admin guard.
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin | Self::SuperAdmin)
    }
}

/// Login provider recorded on the `auth` row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum AuthProvider {
    #[sea_orm(string_value = "google")]
    Google,
    #[sea_orm(string_value = "local")]
    Local,
}

/// Post visibility lifecycle.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Default,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostStatus {
    #[sea_orm(string_value = "DRAFT")]
    Draft,
    #[sea_orm(string_value = "PUBLIC")]
    Public,
    #[default]
    #[sea_orm(string_value = "PRIVATE")]
    Private,
}

/// Role an [`Editor`](super::editor) row grants on a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditorRole {
    #[sea_orm(string_value = "OWNER")]
    Owner,
    #[sea_orm(string_value = "EDITOR")]
    Editor,
    #[sea_orm(string_value = "VIEWER")]
    Viewer,
}

impl EditorRole {
    /// Owners and editors may modify the post.
    pub const fn can_write(self) -> bool {
        matches!(self, Self::Owner | Self::Editor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamMemberStatus {
    #[sea_orm(string_value = "INVITED")]
    Invited,
    #[sea_orm(string_value = "JOINED")]
    Joined,
}

/// Notification kinds emitted as side effects of other services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(30))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NoticeType {
    #[sea_orm(string_value = "FOLLOW")]
    Follow,
    #[sea_orm(string_value = "TEAM_INVITE")]
    TeamInvite,
    #[sea_orm(string_value = "TEAM_JOIN")]
    TeamJoin,
    #[sea_orm(string_value = "TEAM_LEAVE")]
    TeamLeave,
    #[sea_orm(string_value = "TEAM_KICK")]
    TeamKick,
    #[sea_orm(string_value = "TEAM_FOLLOW")]
    TeamFollow,
    #[sea_orm(string_value = "COMMENT")]
    Comment,
    #[sea_orm(string_value = "SYSTEM")]
    System,
}

impl NoticeType {
    /// Kinds that are refreshed in place while still unread instead of stacking up.
    pub const fn upserts_while_unread(self) -> bool {
        matches!(self, Self::TeamInvite | Self::TeamJoin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportTargetType {
    #[sea_orm(string_value = "POST")]
    Post,
    #[sea_orm(string_value = "COMMENT")]
    Comment,
    #[sea_orm(string_value = "USER")]
    User,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, Default,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    #[default]
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "RESOLVED")]
    Resolved,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => write!(f, "DRAFT"),
            Self::Public => write!(f, "PUBLIC"),
            Self::Private => write!(f, "PRIVATE"),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Admin => write!(f, "admin"),
            Self::SuperAdmin => write!(f, "super_admin"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_roles_pass_admin_check() {
        assert!(!Role::User.is_admin());
        assert!(Role::Admin.is_admin());
        assert!(Role::SuperAdmin.is_admin());
    }

    #[test]
    fn only_owner_and_editor_can_write() {
        assert!(EditorRole::Owner.can_write());
        assert!(EditorRole::Editor.can_write());
        assert!(!EditorRole::Viewer.can_write());
    }

    #[test]
    fn post_status_serializes_upper_case() {
        let json = serde_json::to_string(&PostStatus::Public).unwrap_or_default();
        assert_eq!(json, "\"PUBLIC\"");
        assert_eq!(PostStatus::default(), PostStatus::Private);
    }

    #[test]
    fn only_invite_and_join_notices_upsert() {
        assert!(NoticeType::TeamInvite.upserts_while_unread());
        assert!(NoticeType::TeamJoin.upserts_while_unread());
        assert!(!NoticeType::TeamLeave.upserts_while_unread());
        assert!(!NoticeType::Follow.upserts_while_unread());
    }
}
