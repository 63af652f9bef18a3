//! Schema DDL and the versioned migration runner.
//!
//! Every rate and duration column carries `NOT NULL` plus a `CHECK`
//! constraint so inserts fail rather than default. Gaps are never persisted;
//! only real clips reach the `clips` table.

use sqlx::sqlite::SqlitePool;
use tracing::{debug, info};

use crate::error::StoreError;

/// Current schema version. Bump together with a new entry in `MIGRATIONS`.
pub const SCHEMA_VERSION: i64 = 1;

/// Ordered (version, ddl) migrations. Each runs in its own transaction.
const MIGRATIONS: &[(i64, &str)] = &[(1, MIGRATION_V1)];

const MIGRATION_V1: &str = r#"
CREATE TABLE projects (
    id                      TEXT PRIMARY KEY,
    name                    TEXT NOT NULL,
    cursor_sequence_number  INTEGER NOT NULL DEFAULT 0,
    created_at              TEXT NOT NULL
);

CREATE TABLE sequences (
    id              TEXT PRIMARY KEY,
    project_id      TEXT NOT NULL REFERENCES projects(id),
    name            TEXT NOT NULL,
    rate_num        INTEGER NOT NULL CHECK (rate_num > 0),
    rate_den        INTEGER NOT NULL CHECK (rate_den > 0),
    playhead_count  INTEGER NOT NULL,
    selection_json  TEXT NOT NULL,
    created_at      TEXT NOT NULL
);

CREATE TABLE tracks (
    id           TEXT PRIMARY KEY,
    sequence_id  TEXT NOT NULL REFERENCES sequences(id) ON DELETE CASCADE,
    track_type   TEXT NOT NULL CHECK (track_type IN ('video', 'audio')),
    track_index  INTEGER NOT NULL,
    name         TEXT NOT NULL,
    UNIQUE (sequence_id, track_type, track_index)
);

CREATE TABLE media (
    id              TEXT PRIMARY KEY,
    project_id      TEXT NOT NULL REFERENCES projects(id),
    file_path       TEXT NOT NULL,
    duration_count  INTEGER NOT NULL CHECK (duration_count > 0),
    rate_num        INTEGER NOT NULL CHECK (rate_num > 0),
    rate_den        INTEGER NOT NULL CHECK (rate_den > 0)
);

CREATE TABLE clips (
    id                TEXT PRIMARY KEY,
    track_id          TEXT NOT NULL REFERENCES tracks(id) ON DELETE CASCADE,
    media_id          TEXT REFERENCES media(id),
    start_count       INTEGER NOT NULL,
    duration_count    INTEGER NOT NULL CHECK (duration_count > 0),
    source_in_count   INTEGER NOT NULL,
    source_out_count  INTEGER NOT NULL,
    rate_num          INTEGER NOT NULL CHECK (rate_num > 0),
    rate_den          INTEGER NOT NULL CHECK (rate_den > 0)
);

CREATE INDEX idx_clips_track_start ON clips(track_id, start_count);

CREATE TABLE commands (
    sequence_number         INTEGER PRIMARY KEY,
    parent_sequence_number  INTEGER,
    project_id              TEXT NOT NULL REFERENCES projects(id),
    sequence_id             TEXT,
    kind                    TEXT NOT NULL,
    args_json               TEXT NOT NULL,
    pre_selection_json      TEXT NOT NULL,
    post_selection_json     TEXT NOT NULL,
    playhead_pre            INTEGER NOT NULL,
    playhead_post           INTEGER NOT NULL,
    created_at              TEXT NOT NULL
);

CREATE INDEX idx_commands_parent ON commands(parent_sequence_number);

CREATE TABLE snapshots (
    sequence_number  INTEGER NOT NULL,
    sequence_id      TEXT NOT NULL,
    payload_json     TEXT NOT NULL,
    PRIMARY KEY (sequence_number, sequence_id)
);

CREATE TABLE schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT NOT NULL
);
"#;

/// Apply all pending migrations.
pub async fn migrate(pool: &SqlitePool) -> Result<(), StoreError> {
    let applied = current_version(pool).await?;

    for &(version, ddl) in MIGRATIONS {
        if version <= applied {
            continue;
        }
        debug!(version, "Applying schema migration");

        let mut tx = pool.begin().await?;
        sqlx::raw_sql(ddl)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Migration {
                version,
                message: e.to_string(),
            })?;
        sqlx::query("INSERT INTO schema_version (version, applied_at) VALUES (?, datetime('now'))")
            .bind(version)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(version, "Schema migration applied");
    }

    Ok(())
}

/// Highest applied schema version, or 0 for a fresh database.
pub async fn current_version(pool: &SqlitePool) -> Result<i64, StoreError> {
    let has_table: Option<String> = sqlx::query_scalar(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
    )
    .fetch_optional(pool)
    .await?;

    if has_table.is_none() {
        return Ok(0);
    }

    let version: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await?;
    Ok(version.unwrap_or(0))
}
