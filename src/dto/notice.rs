use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeFilter {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct MarkedCount {
    pub updated: u64,
}
