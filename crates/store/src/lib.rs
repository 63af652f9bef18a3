//! `splice-store` -- SQLite-backed persistence for the Splice editing kernel.
//!
//! This crate owns the embedded relational store: the schema (commands,
//! sequences, tracks, clips, media, snapshots), row models, and repository
//! functions. Repository functions are generic over a [`sqlx::SqliteExecutor`]
//! so the same code runs against the pool or inside the per-command
//! transaction.
//!
//! Integrity is enforced at this boundary: every rate and duration column is
//! `NOT NULL` with a `CHECK` constraint, so an insert with a missing or
//! non-positive rate fails instead of defaulting.

pub mod commands;
pub mod entities;
pub mod error;
pub mod models;
pub mod schema;
pub mod snapshots;

use std::path::Path;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Sqlite, Transaction};
use tracing::info;

pub use error::StoreError;

/// Handle to an open project database.
///
/// The kernel is single-writer, so the pool is capped at one connection;
/// there is never concurrent mutation of the log.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) a project database at `path`.
    ///
    /// Applies WAL journal mode and foreign-key enforcement, then runs any
    /// pending schema migrations.
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        schema::migrate(&pool).await?;

        info!(path = %path.display(), "Project store opened");
        Ok(Self { pool })
    }

    /// Open an in-memory database (tests and scratch sessions).
    ///
    /// The single connection is pinned for the lifetime of the pool so the
    /// in-memory database is not dropped between acquires.
    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .in_memory(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        schema::migrate(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin a write transaction.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>, StoreError> {
        Ok(self.pool.begin().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_in_memory_applies_schema() {
        let store = Store::open_in_memory().await.expect("open");
        let version = schema::current_version(store.pool()).await.expect("version");
        assert_eq!(version, schema::SCHEMA_VERSION);
    }

    #[tokio::test]
    async fn open_on_disk_creates_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("project.splice");
        let _store = Store::open(&path).await.expect("open");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn reopen_preserves_schema_version() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("project.splice");
        {
            let _store = Store::open(&path).await.expect("first open");
        }
        let store = Store::open(&path).await.expect("second open");
        let version = schema::current_version(store.pool()).await.expect("version");
        assert_eq!(version, schema::SCHEMA_VERSION);
    }
}
