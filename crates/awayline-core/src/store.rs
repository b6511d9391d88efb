//! Session store trait definition.

use awayline_types::activity::{ActivityPage, NewActivityLog};
use awayline_types::error::StoreError;
use awayline_types::session::Session;
use awayline_types::user::UserId;

/// Persistence port for session state and activity history.
///
/// Implementations live in awayline-infra (e.g., SqliteSessionStore).
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
/// All writes are single-row and single-statement; callers never need a
/// transaction.
pub trait SessionStore: Send + Sync {
    /// Fetch a user's session row, if one exists.
    fn get_session(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<Option<Session>, StoreError>> + Send;

    /// Create the session row with defaults if absent, then return it.
    /// Idempotent; an existing row is returned untouched.
    fn upsert_session_defaults(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<Session, StoreError>> + Send;

    /// Flip the connected flag. Writing a missing row affects nothing and
    /// is not an error.
    fn set_active(
        &self,
        user_id: UserId,
        active: bool,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Invert the pause flag in a single statement and return the new
    /// value. `NotFound` if the user has no session row.
    fn toggle_paused(
        &self,
        user_id: UserId,
    ) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send;

    /// Replace the auto-reply text with its trimmed form. Empty or
    /// whitespace-only input is rejected with `InvalidMessage` before any
    /// write.
    fn set_auto_reply_message(
        &self,
        user_id: UserId,
        message: &str,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Append one auto-reply record. The store stamps the timestamp.
    fn append_activity(
        &self,
        entry: &NewActivityLog,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Page through a user's activity history, newest first. `page` is
    /// 1-based; out-of-range pages return empty `logs` with accurate
    /// totals.
    fn list_activity(
        &self,
        user_id: UserId,
        page: u32,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<ActivityPage, StoreError>> + Send;

    /// Users whose sessions are still marked active. Startup reconciliation
    /// reconnects each of them.
    fn list_active_sessions(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<UserId>, StoreError>> + Send;
}
