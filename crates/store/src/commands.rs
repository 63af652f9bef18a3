//! Repository for the append-only `commands` table.
//!
//! Commands are only ever inserted; history navigation moves a cursor, it
//! never rewrites rows.

use sqlx::SqliteExecutor;

use crate::error::StoreError;
use crate::models::CommandRow;

/// Column list for command queries.
const COMMAND_COLUMNS: &str = "sequence_number, parent_sequence_number, project_id, sequence_id, \
    kind, args_json, pre_selection_json, post_selection_json, playhead_pre, playhead_post, \
    created_at";

/// Append a committed command row.
pub async fn insert<'e, E>(executor: E, row: &CommandRow) -> Result<(), StoreError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "INSERT INTO commands
            (sequence_number, parent_sequence_number, project_id, sequence_id, kind, args_json,
             pre_selection_json, post_selection_json, playhead_pre, playhead_post, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(row.sequence_number)
    .bind(row.parent_sequence_number)
    .bind(&row.project_id)
    .bind(&row.sequence_id)
    .bind(&row.kind)
    .bind(&row.args_json)
    .bind(&row.pre_selection_json)
    .bind(&row.post_selection_json)
    .bind(row.playhead_pre)
    .bind(row.playhead_post)
    .bind(&row.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Highest assigned sequence number, 0 for an empty log.
pub async fn max_sequence_number<'e, E>(executor: E) -> Result<i64, StoreError>
where
    E: SqliteExecutor<'e>,
{
    let max: i64 = sqlx::query_scalar("SELECT COALESCE(MAX(sequence_number), 0) FROM commands")
        .fetch_one(executor)
        .await?;
    Ok(max)
}

/// Fetch a command by its sequence number.
pub async fn find<'e, E>(executor: E, sequence_number: i64) -> Result<Option<CommandRow>, StoreError>
where
    E: SqliteExecutor<'e>,
{
    let query = format!("SELECT {COMMAND_COLUMNS} FROM commands WHERE sequence_number = ?");
    let row = sqlx::query_as::<_, CommandRow>(&query)
        .bind(sequence_number)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

/// Children of a given node in the undo tree, ordered by sequence number.
///
/// Pass 0 for the empty root; root commands are stored with a NULL parent.
pub async fn children_of<'e, E>(executor: E, parent: i64) -> Result<Vec<CommandRow>, StoreError>
where
    E: SqliteExecutor<'e>,
{
    let query = if parent == 0 {
        format!(
            "SELECT {COMMAND_COLUMNS} FROM commands \
             WHERE parent_sequence_number IS NULL ORDER BY sequence_number"
        )
    } else {
        format!(
            "SELECT {COMMAND_COLUMNS} FROM commands \
             WHERE parent_sequence_number = ? ORDER BY sequence_number"
        )
    };
    let mut q = sqlx::query_as::<_, CommandRow>(&query);
    if parent != 0 {
        q = q.bind(parent);
    }
    Ok(q.fetch_all(executor).await?)
}

/// All command rows, ordered by sequence number (integrity checks).
pub async fn all<'e, E>(executor: E) -> Result<Vec<CommandRow>, StoreError>
where
    E: SqliteExecutor<'e>,
{
    let query = format!("SELECT {COMMAND_COLUMNS} FROM commands ORDER BY sequence_number");
    Ok(sqlx::query_as::<_, CommandRow>(&query)
        .fetch_all(executor)
        .await?)
}
