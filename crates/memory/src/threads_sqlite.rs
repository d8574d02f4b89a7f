//! SQLite thread store. The `threads` table is produced by the offline
//! ingestion job; this side only reads it.

use std::{path::Path, time::Duration};

use {
    async_trait::async_trait,
    sqlx::{
        SqlitePool,
        sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    },
    tracing::info,
};

use crate::threads::{ThreadRecord, ThreadStore};

pub struct SqliteThreadStore {
    pool: SqlitePool,
}

impl SqliteThreadStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the database at `path` read-only.
    pub async fn open(path: &Path, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .read_only(true)
            .busy_timeout(Duration::from_secs(10));
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;
        info!(path = %path.display(), "opened thread store");
        Ok(Self::new(pool))
    }

    /// Number of rows in the `threads` table.
    pub async fn count(&self) -> anyhow::Result<i64> {
        let (n,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM threads")
            .fetch_one(&self.pool)
            .await?;
        Ok(n)
    }
}

#[async_trait]
impl ThreadStore for SqliteThreadStore {
    async fn lookup(&self, id: &str) -> anyhow::Result<Option<ThreadRecord>> {
        let row: Option<(Option<String>, Option<String>, Option<String>)> =
            sqlx::query_as("SELECT header, content, category FROM threads WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(header, content, category)| ThreadRecord {
            id: id.to_string(),
            header: header.unwrap_or_default(),
            content: content.unwrap_or_default(),
            category,
        }))
    }
}
