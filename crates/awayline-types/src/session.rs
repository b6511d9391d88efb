use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::user::UserId;

/// Auto-reply text a session starts with before the user edits it.
pub const DEFAULT_AUTO_REPLY_MESSAGE: &str =
    "Thank you for your message. I will get back to you soon.";

/// A user's messaging session. One row per user.
///
/// `is_active` is true only while a live protocol client is connected for
/// this user; rows still marked active at process start are the sessions the
/// orchestrator reconnects during reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub user_id: UserId,
    /// Opaque credential-namespace blob, written by the protocol layer only.
    pub session_data: Option<String>,
    pub is_active: bool,
    /// When true, auto-replies are suppressed while the connection stays up.
    pub is_paused: bool,
    /// Text sent to unknown contacts. Never empty.
    pub auto_reply_message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// The status surface exposed to dashboard clients.
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            is_active: self.is_active,
            is_paused: self.is_paused,
            auto_reply_message: self.auto_reply_message.clone(),
        }
    }
}

/// Wire shape of the session status, camelCase for dashboard consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub is_active: bool,
    pub is_paused: bool,
    pub auto_reply_message: String,
}
