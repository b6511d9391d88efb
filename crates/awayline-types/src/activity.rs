use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserId;

/// One recorded auto-reply event. Append-only; rows are never edited and
/// only disappear when the owning user is deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLogEntry {
    pub id: i64,
    pub user_id: UserId,
    /// Phone number or protocol handle of the sender that was replied to.
    pub contact_number: String,
    pub message_received: String,
    pub replied_sent: String,
    pub timestamp: DateTime<Utc>,
}

/// Insert payload for a new activity row. The store stamps `timestamp`.
#[derive(Debug, Clone)]
pub struct NewActivityLog {
    pub user_id: UserId,
    pub contact_number: String,
    pub message_received: String,
    pub replied_sent: String,
}

/// One page of a user's activity history, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPage {
    pub logs: Vec<ActivityLogEntry>,
    /// Total rows for this user across all pages.
    pub total: i64,
    pub page: u32,
    pub total_pages: u32,
}

impl ActivityPage {
    /// Pages needed to hold `total` rows at `limit` rows per page.
    pub fn page_count(total: i64, limit: u32) -> u32 {
        if total <= 0 {
            return 0;
        }
        (total as u64).div_ceil(u64::from(limit.max(1))) as u32
    }
}
