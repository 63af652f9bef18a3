//! Repositories for the materialized entity tables: projects, sequences,
//! tracks, clips, and media.
//!
//! These tables hold the *current* timeline state (the state at the undo
//! cursor). Replay purges and rebuilds them; commands mutate them inside the
//! same transaction that appends the command row.

use sqlx::SqliteExecutor;

use crate::error::StoreError;
use crate::models::{ClipRow, MediaRow, ProjectRow, SequenceRow, TrackRow};

const PROJECT_COLUMNS: &str = "id, name, cursor_sequence_number, created_at";
const SEQUENCE_COLUMNS: &str =
    "id, project_id, name, rate_num, rate_den, playhead_count, selection_json, created_at";
const TRACK_COLUMNS: &str = "id, sequence_id, track_type, track_index, name";
const MEDIA_COLUMNS: &str = "id, project_id, file_path, duration_count, rate_num, rate_den";
const CLIP_COLUMNS: &str = "id, track_id, media_id, start_count, duration_count, \
    source_in_count, source_out_count, rate_num, rate_den";

// --- projects ---

pub async fn insert_project<'e, E>(executor: E, row: &ProjectRow) -> Result<(), StoreError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO projects (id, name, cursor_sequence_number, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(&row.id)
    .bind(&row.name)
    .bind(row.cursor_sequence_number)
    .bind(&row.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// The single project stored in this database file, if any.
pub async fn find_project<'e, E>(executor: E) -> Result<Option<ProjectRow>, StoreError>
where
    E: SqliteExecutor<'e>,
{
    let query = format!("SELECT {PROJECT_COLUMNS} FROM projects LIMIT 1");
    Ok(sqlx::query_as::<_, ProjectRow>(&query)
        .fetch_optional(executor)
        .await?)
}

/// Move the persisted undo cursor. Runs inside the same transaction as the
/// state change it describes.
pub async fn update_cursor<'e, E>(
    executor: E,
    project_id: &str,
    cursor: i64,
) -> Result<(), StoreError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE projects SET cursor_sequence_number = ? WHERE id = ?")
        .bind(cursor)
        .bind(project_id)
        .execute(executor)
        .await?;
    Ok(())
}

// --- sequences ---

pub async fn insert_sequence<'e, E>(executor: E, row: &SequenceRow) -> Result<(), StoreError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO sequences
            (id, project_id, name, rate_num, rate_den, playhead_count, selection_json, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&row.id)
    .bind(&row.project_id)
    .bind(&row.name)
    .bind(row.rate_num)
    .bind(row.rate_den)
    .bind(row.playhead_count)
    .bind(&row.selection_json)
    .bind(&row.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn find_sequence<'e, E>(executor: E, id: &str) -> Result<Option<SequenceRow>, StoreError>
where
    E: SqliteExecutor<'e>,
{
    let query = format!("SELECT {SEQUENCE_COLUMNS} FROM sequences WHERE id = ?");
    Ok(sqlx::query_as::<_, SequenceRow>(&query)
        .bind(id)
        .fetch_optional(executor)
        .await?)
}

pub async fn list_sequences<'e, E>(executor: E) -> Result<Vec<SequenceRow>, StoreError>
where
    E: SqliteExecutor<'e>,
{
    let query = format!("SELECT {SEQUENCE_COLUMNS} FROM sequences ORDER BY created_at, id");
    Ok(sqlx::query_as::<_, SequenceRow>(&query)
        .fetch_all(executor)
        .await?)
}

/// Persist the view state (playhead + selection) of a sequence.
pub async fn update_sequence_view_state<'e, E>(
    executor: E,
    id: &str,
    playhead_count: i64,
    selection_json: &str,
) -> Result<(), StoreError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE sequences SET playhead_count = ?, selection_json = ? WHERE id = ?")
        .bind(playhead_count)
        .bind(selection_json)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

// --- tracks ---

pub async fn insert_track<'e, E>(executor: E, row: &TrackRow) -> Result<(), StoreError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO tracks (id, sequence_id, track_type, track_index, name) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(&row.id)
    .bind(&row.sequence_id)
    .bind(&row.track_type)
    .bind(row.track_index)
    .bind(&row.name)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn tracks_for_sequence<'e, E>(
    executor: E,
    sequence_id: &str,
) -> Result<Vec<TrackRow>, StoreError>
where
    E: SqliteExecutor<'e>,
{
    let query = format!(
        "SELECT {TRACK_COLUMNS} FROM tracks WHERE sequence_id = ? \
         ORDER BY track_type, track_index"
    );
    Ok(sqlx::query_as::<_, TrackRow>(&query)
        .bind(sequence_id)
        .fetch_all(executor)
        .await?)
}

pub async fn delete_track<'e, E>(executor: E, id: &str) -> Result<(), StoreError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM tracks WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

// --- media ---

pub async fn insert_media<'e, E>(executor: E, row: &MediaRow) -> Result<(), StoreError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO media (id, project_id, file_path, duration_count, rate_num, rate_den)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&row.id)
    .bind(&row.project_id)
    .bind(&row.file_path)
    .bind(row.duration_count)
    .bind(row.rate_num)
    .bind(row.rate_den)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn find_media<'e, E>(executor: E, id: &str) -> Result<Option<MediaRow>, StoreError>
where
    E: SqliteExecutor<'e>,
{
    let query = format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = ?");
    Ok(sqlx::query_as::<_, MediaRow>(&query)
        .bind(id)
        .fetch_optional(executor)
        .await?)
}

pub async fn list_media<'e, E>(executor: E) -> Result<Vec<MediaRow>, StoreError>
where
    E: SqliteExecutor<'e>,
{
    let query = format!("SELECT {MEDIA_COLUMNS} FROM media ORDER BY id");
    Ok(sqlx::query_as::<_, MediaRow>(&query)
        .fetch_all(executor)
        .await?)
}

pub async fn delete_media<'e, E>(executor: E, id: &str) -> Result<(), StoreError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM media WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

// --- clips ---

pub async fn insert_clip<'e, E>(executor: E, row: &ClipRow) -> Result<(), StoreError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO clips
            (id, track_id, media_id, start_count, duration_count,
             source_in_count, source_out_count, rate_num, rate_den)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&row.id)
    .bind(&row.track_id)
    .bind(&row.media_id)
    .bind(row.start_count)
    .bind(row.duration_count)
    .bind(row.source_in_count)
    .bind(row.source_out_count)
    .bind(row.rate_num)
    .bind(row.rate_den)
    .execute(executor)
    .await?;
    Ok(())
}

/// Full-row update of a clip (trims, moves, and shifts all go through here).
pub async fn update_clip<'e, E>(executor: E, row: &ClipRow) -> Result<(), StoreError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "UPDATE clips SET track_id = ?, media_id = ?, start_count = ?, duration_count = ?,
             source_in_count = ?, source_out_count = ?, rate_num = ?, rate_den = ?
         WHERE id = ?",
    )
    .bind(&row.track_id)
    .bind(&row.media_id)
    .bind(row.start_count)
    .bind(row.duration_count)
    .bind(row.source_in_count)
    .bind(row.source_out_count)
    .bind(row.rate_num)
    .bind(row.rate_den)
    .bind(&row.id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn delete_clip<'e, E>(executor: E, id: &str) -> Result<(), StoreError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("DELETE FROM clips WHERE id = ?")
        .bind(id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn find_clip<'e, E>(executor: E, id: &str) -> Result<Option<ClipRow>, StoreError>
where
    E: SqliteExecutor<'e>,
{
    let query = format!("SELECT {CLIP_COLUMNS} FROM clips WHERE id = ?");
    Ok(sqlx::query_as::<_, ClipRow>(&query)
        .bind(id)
        .fetch_optional(executor)
        .await?)
}

pub async fn clips_for_track<'e, E>(executor: E, track_id: &str) -> Result<Vec<ClipRow>, StoreError>
where
    E: SqliteExecutor<'e>,
{
    let query =
        format!("SELECT {CLIP_COLUMNS} FROM clips WHERE track_id = ? ORDER BY start_count");
    Ok(sqlx::query_as::<_, ClipRow>(&query)
        .bind(track_id)
        .fetch_all(executor)
        .await?)
}

/// All clips of a sequence, joined through tracks, ordered by track then start.
pub async fn clips_for_sequence<'e, E>(
    executor: E,
    sequence_id: &str,
) -> Result<Vec<ClipRow>, StoreError>
where
    E: SqliteExecutor<'e>,
{
    let query = format!(
        "SELECT c.id, c.track_id, c.media_id, c.start_count, c.duration_count,
                c.source_in_count, c.source_out_count, c.rate_num, c.rate_den
         FROM clips c
         JOIN tracks t ON t.id = c.track_id
         WHERE t.sequence_id = ?
         ORDER BY t.track_type, t.track_index, c.start_count"
    );
    Ok(sqlx::query_as::<_, ClipRow>(&query)
        .bind(sequence_id)
        .fetch_all(executor)
        .await?)
}

// --- purge (replay support) ---

/// Delete all materialized timeline state: clips, tracks, sequences, media.
/// Projects and the append-only log are untouched. Used by replay before a
/// snapshot restore, always inside the replay transaction.
pub async fn purge_timeline(conn: &mut sqlx::SqliteConnection) -> Result<(), StoreError> {
    sqlx::query("DELETE FROM clips").execute(&mut *conn).await?;
    sqlx::query("DELETE FROM tracks").execute(&mut *conn).await?;
    sqlx::query("DELETE FROM sequences")
        .execute(&mut *conn)
        .await?;
    sqlx::query("DELETE FROM media").execute(&mut *conn).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    async fn fixture_store() -> Store {
        let store = Store::open_in_memory().await.expect("open");
        insert_project(
            store.pool(),
            &ProjectRow {
                id: "p".into(),
                name: "Project".into(),
                cursor_sequence_number: 0,
                created_at: "now".into(),
            },
        )
        .await
        .expect("project");
        insert_sequence(
            store.pool(),
            &SequenceRow {
                id: "s".into(),
                project_id: "p".into(),
                name: "Main".into(),
                rate_num: 30,
                rate_den: 1,
                playhead_count: 0,
                selection_json: "{}".into(),
                created_at: "now".into(),
            },
        )
        .await
        .expect("sequence");
        insert_track(
            store.pool(),
            &TrackRow {
                id: "t".into(),
                sequence_id: "s".into(),
                track_type: "video".into(),
                track_index: 0,
                name: "V1".into(),
            },
        )
        .await
        .expect("track");
        store
    }

    fn clip(id: &str, start: i64, duration: i64) -> ClipRow {
        ClipRow {
            id: id.into(),
            track_id: "t".into(),
            media_id: None,
            start_count: start,
            duration_count: duration,
            source_in_count: 0,
            source_out_count: duration,
            rate_num: 30,
            rate_den: 1,
        }
    }

    #[tokio::test]
    async fn clip_crud_roundtrip() {
        let store = fixture_store().await;
        insert_clip(store.pool(), &clip("c1", 0, 100)).await.unwrap();

        let mut row = find_clip(store.pool(), "c1").await.unwrap().expect("clip");
        assert_eq!(row.start_count, 0);

        row.start_count = 50;
        update_clip(store.pool(), &row).await.unwrap();
        let row = find_clip(store.pool(), "c1").await.unwrap().expect("clip");
        assert_eq!(row.start_count, 50);

        delete_clip(store.pool(), "c1").await.unwrap();
        assert!(find_clip(store.pool(), "c1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn clips_for_track_ordered_by_start() {
        let store = fixture_store().await;
        insert_clip(store.pool(), &clip("b", 200, 50)).await.unwrap();
        insert_clip(store.pool(), &clip("a", 0, 100)).await.unwrap();

        let rows = clips_for_track(store.pool(), "t").await.unwrap();
        let ids: Vec<&str> = rows.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn clips_for_sequence_joins_tracks() {
        let store = fixture_store().await;
        insert_clip(store.pool(), &clip("c1", 0, 100)).await.unwrap();

        let rows = clips_for_sequence(store.pool(), "s").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(clips_for_sequence(store.pool(), "other")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn duplicate_track_index_rejected() {
        let store = fixture_store().await;
        let result = insert_track(
            store.pool(),
            &TrackRow {
                id: "t2".into(),
                sequence_id: "s".into(),
                track_type: "video".into(),
                track_index: 0,
                name: "V1 again".into(),
            },
        )
        .await;
        assert!(result.is_err(), "duplicate (sequence, type, index) must fail");
    }

    #[tokio::test]
    async fn cursor_update() {
        let store = fixture_store().await;
        update_cursor(store.pool(), "p", 7).await.unwrap();
        let project = find_project(store.pool()).await.unwrap().expect("project");
        assert_eq!(project.cursor_sequence_number, 7);
    }

    #[tokio::test]
    async fn purge_timeline_clears_entities() {
        let store = fixture_store().await;
        insert_clip(store.pool(), &clip("c1", 0, 100)).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        purge_timeline(&mut tx).await.unwrap();
        tx.commit().await.unwrap();
        assert!(list_sequences(store.pool()).await.unwrap().is_empty());
        assert!(find_clip(store.pool(), "c1").await.unwrap().is_none());
        // Project survives a purge.
        assert!(find_project(store.pool()).await.unwrap().is_some());
    }
}
