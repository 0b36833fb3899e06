//! SQLite-backed ban store using SQLx.

use super::{BanStore, StoreError};
use crate::ban::BanRecord;
use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::info;

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Durable ban store on a SQLite database file (or `:memory:`).
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connection acquire timeout - prevents connection storms from blocking indefinitely.
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Maximum time a connection can remain idle before being closed.
    const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

    /// Open (creating if missing) the database at `path`, running
    /// migrations. `:memory:` opens a private in-memory database.
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let pool = if path == ":memory:" {
            // Use a uniquely named shared-cache memory database per call.
            // `file::memory:` is global-ish and will collide across parallel tests.
            let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
            let memdb_uri = format!(
                "file:cidrbans-memdb-{}-{}?mode=memory&cache=shared",
                std::process::id(),
                id
            );

            let options = SqliteConnectOptions::new()
                .filename(&memdb_uri)
                .shared_cache(true)
                .create_if_missing(true);

            SqlitePoolOptions::new()
                .max_connections(1)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(Some(Self::IDLE_TIMEOUT))
                .test_before_acquire(true)
                .connect_with(options)
                .await?
        } else {
            if let Some(parent) = Path::new(path).parent()
                && !parent.as_os_str().is_empty()
                && let Err(e) = std::fs::create_dir_all(parent)
            {
                tracing::warn!(path = %parent.display(), error = %e, "Failed to create database directory");
            }

            let options = SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true);

            SqlitePoolOptions::new()
                .max_connections(5)
                .acquire_timeout(Self::ACQUIRE_TIMEOUT)
                .idle_timeout(Some(Self::IDLE_TIMEOUT))
                .test_before_acquire(true)
                .connect_with(options)
                .await?
        };

        sqlx::migrate!("./migrations").run(&pool).await?;

        // WAL mode lets ban checks read while an admin command writes.
        sqlx::query("PRAGMA journal_mode=WAL").execute(&pool).await?;
        sqlx::query("PRAGMA synchronous=NORMAL")
            .execute(&pool)
            .await?;

        info!(path = %path, "Ban database opened");

        Ok(Self { pool })
    }
}

#[async_trait]
impl BanStore for SqliteStore {
    async fn create(&self, record: &BanRecord) -> Result<u64, StoreError> {
        // OR IGNORE: a duplicate network key affects zero rows rather than
        // overwriting or erroring.
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO cidr_bans (network, reason, issued_by, created_at, expires_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.network)
        .bind(&record.reason)
        .bind(&record.issued_by)
        .bind(&record.created_at)
        .bind(&record.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, network: &str) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM cidr_bans WHERE network = ?")
            .bind(network)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn list(&self) -> Result<Vec<BanRecord>, StoreError> {
        // rowid order keeps first-match-wins deterministic across engines.
        let rows = sqlx::query_as::<_, (String, String, String, String, String)>(
            r#"
            SELECT network, reason, issued_by, created_at, expires_at
            FROM cidr_bans
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(
                |(network, reason, issued_by, created_at, expires_at)| BanRecord {
                    network,
                    reason,
                    issued_by,
                    created_at,
                    expires_at,
                },
            )
            .collect())
    }
}
