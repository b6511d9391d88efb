//! SQLite session store implementation.
//!
//! Implements `SessionStore` from `awayline-core` using sqlx with split
//! read/write pools.

use awayline_core::store::SessionStore;
use awayline_types::activity::{ActivityLogEntry, ActivityPage, NewActivityLog};
use awayline_types::error::StoreError;
use awayline_types::session::Session;
use awayline_types::user::UserId;
use chrono::{DateTime, Utc};
use sqlx::Row;

use super::pool::DatabasePool;

/// SQLite-backed implementation of `SessionStore`.
pub struct SqliteSessionStore {
    pool: DatabasePool,
}

impl SqliteSessionStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

/// Internal row type for mapping SQLite rows to the domain `Session`.
struct SessionRow {
    id: i64,
    user_id: i64,
    session_data: Option<String>,
    is_active: bool,
    is_paused: bool,
    auto_reply_message: String,
    created_at: String,
    updated_at: String,
}

impl SessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            session_data: row.try_get("session_data")?,
            is_active: row.try_get("is_active")?,
            is_paused: row.try_get("is_paused")?,
            auto_reply_message: row.try_get("auto_reply_message")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_session(self) -> Result<Session, StoreError> {
        Ok(Session {
            id: self.id,
            user_id: UserId::new(self.user_id),
            session_data: self.session_data,
            is_active: self.is_active,
            is_paused: self.is_paused,
            auto_reply_message: self.auto_reply_message,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

/// Internal row type for mapping SQLite rows to `ActivityLogEntry`.
struct ActivityRow {
    id: i64,
    user_id: i64,
    contact_number: String,
    message_received: String,
    replied_sent: String,
    timestamp: String,
}

impl ActivityRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            contact_number: row.try_get("contact_number")?,
            message_received: row.try_get("message_received")?,
            replied_sent: row.try_get("replied_sent")?,
            timestamp: row.try_get("timestamp")?,
        })
    }

    fn into_entry(self) -> Result<ActivityLogEntry, StoreError> {
        Ok(ActivityLogEntry {
            id: self.id,
            user_id: UserId::new(self.user_id),
            contact_number: self.contact_number,
            message_received: self.message_received,
            replied_sent: self.replied_sent,
            timestamp: parse_datetime(&self.timestamp)?,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Query(format!("invalid datetime: {e}")))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

/// Classify sqlx failures: connection-level problems are `Unavailable`
/// (the startup reconciliation sweep retries those), everything else is
/// `Query`.
fn classify(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
        _ => StoreError::Query(err.to_string()),
    }
}

impl SessionStore for SqliteSessionStore {
    async fn get_session(&self, user_id: UserId) -> Result<Option<Session>, StoreError> {
        let row = sqlx::query("SELECT * FROM user_sessions WHERE user_id = ?")
            .bind(user_id.as_i64())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(classify)?;

        match row {
            Some(row) => {
                let session_row =
                    SessionRow::from_row(&row).map_err(|e| StoreError::Query(e.to_string()))?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn upsert_session_defaults(&self, user_id: UserId) -> Result<Session, StoreError> {
        let now = format_datetime(&Utc::now());
        // Column defaults fill in the flags and message; an existing row is
        // left untouched.
        sqlx::query(
            "INSERT INTO user_sessions (user_id, created_at, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(user_id) DO NOTHING",
        )
        .bind(user_id.as_i64())
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(classify)?;

        self.get_session(user_id)
            .await?
            .ok_or_else(|| StoreError::Query("session row missing after upsert".to_string()))
    }

    async fn set_active(&self, user_id: UserId, active: bool) -> Result<(), StoreError> {
        sqlx::query("UPDATE user_sessions SET is_active = ?, updated_at = ? WHERE user_id = ?")
            .bind(active)
            .bind(format_datetime(&Utc::now()))
            .bind(user_id.as_i64())
            .execute(&self.pool.writer)
            .await
            .map_err(classify)?;

        Ok(())
    }

    async fn toggle_paused(&self, user_id: UserId) -> Result<bool, StoreError> {
        let row = sqlx::query(
            "UPDATE user_sessions SET is_paused = NOT is_paused, updated_at = ?
             WHERE user_id = ? RETURNING is_paused",
        )
        .bind(format_datetime(&Utc::now()))
        .bind(user_id.as_i64())
        .fetch_optional(&self.pool.writer)
        .await
        .map_err(classify)?;

        match row {
            Some(row) => row
                .try_get("is_paused")
                .map_err(|e| StoreError::Query(e.to_string())),
            None => Err(StoreError::NotFound),
        }
    }

    async fn set_auto_reply_message(
        &self,
        user_id: UserId,
        message: &str,
    ) -> Result<(), StoreError> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(StoreError::InvalidMessage(
                "message cannot be empty".to_string(),
            ));
        }

        sqlx::query(
            "UPDATE user_sessions SET auto_reply_message = ?, updated_at = ? WHERE user_id = ?",
        )
        .bind(trimmed)
        .bind(format_datetime(&Utc::now()))
        .bind(user_id.as_i64())
        .execute(&self.pool.writer)
        .await
        .map_err(classify)?;

        Ok(())
    }

    async fn append_activity(&self, entry: &NewActivityLog) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO activity_logs (user_id, contact_number, message_received, replied_sent, timestamp)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(entry.user_id.as_i64())
        .bind(&entry.contact_number)
        .bind(&entry.message_received)
        .bind(&entry.replied_sent)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(classify)?;

        Ok(())
    }

    async fn list_activity(
        &self,
        user_id: UserId,
        page: u32,
        limit: u32,
    ) -> Result<ActivityPage, StoreError> {
        let page = page.max(1);
        let limit = limit.max(1);
        let offset = i64::from(page - 1) * i64::from(limit);

        let rows = sqlx::query(
            "SELECT * FROM activity_logs WHERE user_id = ?
             ORDER BY timestamp DESC, id DESC LIMIT ? OFFSET ?",
        )
        .bind(user_id.as_i64())
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(classify)?;

        let mut logs = Vec::with_capacity(rows.len());
        for row in &rows {
            let activity_row =
                ActivityRow::from_row(row).map_err(|e| StoreError::Query(e.to_string()))?;
            logs.push(activity_row.into_entry()?);
        }

        let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM activity_logs WHERE user_id = ?")
            .bind(user_id.as_i64())
            .fetch_one(&self.pool.reader)
            .await
            .map_err(classify)?;

        Ok(ActivityPage {
            logs,
            total: total.0,
            page,
            total_pages: ActivityPage::page_count(total.0, limit),
        })
    }

    async fn list_active_sessions(&self) -> Result<Vec<UserId>, StoreError> {
        let rows: Vec<(i64,)> =
            sqlx::query_as("SELECT user_id FROM user_sessions WHERE is_active = 1 ORDER BY user_id")
                .fetch_all(&self.pool.reader)
                .await
                .map_err(classify)?;

        Ok(rows.into_iter().map(|(id,)| UserId::new(id)).collect())
    }
}
