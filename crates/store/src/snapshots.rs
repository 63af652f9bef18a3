//! Repository for the `snapshots` table.
//!
//! A snapshot point is one sequence number; it carries one row per sequence
//! that existed at that point. Payloads are serialized row structs, so a
//! restore is a straight insert with no interpretation.

use sqlx::SqliteExecutor;

use crate::error::StoreError;
use crate::models::SnapshotRow;

pub async fn insert<'e, E>(executor: E, row: &SnapshotRow) -> Result<(), StoreError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO snapshots (sequence_number, sequence_id, payload_json) VALUES (?, ?, ?)",
    )
    .bind(row.sequence_number)
    .bind(&row.sequence_id)
    .bind(&row.payload_json)
    .execute(executor)
    .await?;
    Ok(())
}

/// Sequence numbers at which a snapshot exists, ascending.
pub async fn points<'e, E>(executor: E) -> Result<Vec<i64>, StoreError>
where
    E: SqliteExecutor<'e>,
{
    let points: Vec<i64> = sqlx::query_scalar(
        "SELECT DISTINCT sequence_number FROM snapshots ORDER BY sequence_number",
    )
    .fetch_all(executor)
    .await?;
    Ok(points)
}

/// All per-sequence rows captured at one snapshot point.
pub async fn rows_at<'e, E>(executor: E, sequence_number: i64) -> Result<Vec<SnapshotRow>, StoreError>
where
    E: SqliteExecutor<'e>,
{
    Ok(sqlx::query_as::<_, SnapshotRow>(
        "SELECT sequence_number, sequence_id, payload_json FROM snapshots \
         WHERE sequence_number = ? ORDER BY sequence_id",
    )
    .bind(sequence_number)
    .fetch_all(executor)
    .await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Store;

    fn row(seq: i64, sequence_id: &str) -> SnapshotRow {
        SnapshotRow {
            sequence_number: seq,
            sequence_id: sequence_id.into(),
            payload_json: "{}".into(),
        }
    }

    #[tokio::test]
    async fn points_are_distinct_and_ordered() {
        let store = Store::open_in_memory().await.expect("open");
        insert(store.pool(), &row(25, "s1")).await.unwrap();
        insert(store.pool(), &row(25, "s2")).await.unwrap();
        insert(store.pool(), &row(50, "s1")).await.unwrap();

        assert_eq!(points(store.pool()).await.unwrap(), vec![25, 50]);
    }

    #[tokio::test]
    async fn rows_at_returns_all_sequences_for_a_point() {
        let store = Store::open_in_memory().await.expect("open");
        insert(store.pool(), &row(25, "s1")).await.unwrap();
        insert(store.pool(), &row(25, "s2")).await.unwrap();
        insert(store.pool(), &row(50, "s1")).await.unwrap();

        let rows = rows_at(store.pool(), 25).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows_at(store.pool(), 99).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_point_for_same_sequence_rejected() {
        let store = Store::open_in_memory().await.expect("open");
        insert(store.pool(), &row(25, "s1")).await.unwrap();
        assert!(insert(store.pool(), &row(25, "s1")).await.is_err());
    }
}
