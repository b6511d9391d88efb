//! Database pool with split reader/writer connections in WAL mode.
//!
//! SQLite serializes writers, so the pool is split: a single-connection
//! writer pool keeps mutations ordered, while a multi-connection reader
//! pool serves concurrent status and activity queries. Both run in WAL
//! journal mode with foreign keys enforced.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Split read/write pool for the gateway database.
#[derive(Clone)]
pub struct DatabasePool {
    /// Multi-connection pool (up to 8) for SELECT queries.
    pub reader: SqlitePool,
    /// Single-connection pool for INSERT/UPDATE/DELETE.
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open (creating if missing) the database at `database_url` and run
    /// pending migrations on the writer before the reader pool opens.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let base_opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(5))
            .create_if_missing(true);

        let read_opts = base_opts.clone().read_only(true);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(base_opts)
            .await?;

        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(read_opts)
            .await?;

        Ok(Self { reader, writer })
    }
}

/// Default database URL from `AWAYLINE_DATA_DIR`, falling back to
/// `~/.awayline/awayline.db`.
pub fn default_database_url() -> String {
    let data_dir = std::env::var("AWAYLINE_DATA_DIR").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        format!("{home}/.awayline")
    });
    format!("sqlite://{data_dir}/awayline.db")
}
