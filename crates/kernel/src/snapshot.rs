//! Snapshot capture and deterministic replay.
//!
//! A snapshot is the complete post-state of one committed command: one row
//! per sequence, each payload carrying the sequence row, its tracks and
//! clips, and the full media registry, so a restore needs nothing outside
//! the payload. Replay purges the materialized state, restores the nearest
//! snapshot on the target's ancestor chain, and re-runs the forward
//! implementations of the remaining commands in order.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use splice_common::KernelConfig;
use splice_store::models::{ClipRow, CommandRow, MediaRow, SequenceRow, SnapshotRow, TrackRow};
use splice_store::{commands, entities, snapshots, Store, StoreError};
use splice_timeline::TimelineProjection;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::command::CommandKind;
use crate::error::{CommandError, ReplayIntegrityError, UndoTreeError};
use crate::state;

/// Complete state of one sequence immediately after a command committed.
#[derive(Serialize, Deserialize)]
pub(crate) struct SequenceSnapshot {
    pub sequence: SequenceRow,
    pub tracks: Vec<TrackRow>,
    pub clips: Vec<ClipRow>,
    /// Full media registry at capture time; payloads are self-contained.
    pub media: Vec<MediaRow>,
}

/// Capture the committed state as a snapshot keyed by `sequence_number`.
///
/// Runs in its own transaction after the command commit, so it always
/// reflects a fully committed command.
pub(crate) async fn capture(store: &Store, sequence_number: i64) -> Result<(), CommandError> {
    let mut tx = store.begin().await?;
    let sequence_rows = entities::list_sequences(&mut *tx).await?;
    let media = entities::list_media(&mut *tx).await?;

    for sequence in sequence_rows {
        let tracks = entities::tracks_for_sequence(&mut *tx, &sequence.id).await?;
        let clips = entities::clips_for_sequence(&mut *tx, &sequence.id).await?;
        let payload = SequenceSnapshot {
            sequence: sequence.clone(),
            tracks,
            clips,
            media: media.clone(),
        };
        let payload_json = serde_json::to_string(&payload).map_err(|e| {
            ReplayIntegrityError::SnapshotDecode {
                sequence_number,
                message: e.to_string(),
            }
        })?;
        snapshots::insert(
            &mut *tx,
            &SnapshotRow {
                sequence_number,
                sequence_id: sequence.id.clone(),
                payload_json,
            },
        )
        .await?;
    }

    tx.commit().await.map_err(StoreError::from)?;
    info!(sequence_number, "Snapshot captured");
    Ok(())
}

/// Rebuild the materialized state at log position `target` (0 = empty root)
/// and return the projection of that state.
///
/// The whole rebuild, including the cursor move, is one transaction.
pub(crate) async fn replay_to(
    store: &Store,
    config: &KernelConfig,
    project_id: &str,
    target: i64,
) -> Result<TimelineProjection, CommandError> {
    let chain = ancestor_chain(store, config, target).await?;
    let chain_numbers: HashSet<i64> = chain.iter().map(|c| c.sequence_number).collect();

    // Nearest snapshot at or before the target, on the target's own chain;
    // a snapshot on a sibling branch describes different history.
    let points = snapshots::points(store.pool()).await?;
    let snap = points
        .iter()
        .rev()
        .copied()
        .find(|p| *p <= target && chain_numbers.contains(p))
        .unwrap_or(0);

    debug!(
        target,
        snapshot = snap,
        replayed = chain.iter().filter(|c| c.sequence_number > snap).count(),
        "Replaying history"
    );

    let mut tx = store.begin().await?;
    entities::purge_timeline(&mut tx).await?;
    if snap > 0 {
        restore_snapshot(&mut tx, snap).await?;
    }

    let mut projection = state::load_projection(&mut tx).await?;

    for row in chain.iter().filter(|c| c.sequence_number > snap) {
        let mut kind = CommandKind::from_row(&row.kind, &row.args_json).map_err(|e| {
            ReplayIntegrityError::CommandDecode {
                sequence_number: row.sequence_number,
                message: e.to_string(),
            }
        })?;
        let batch = kind.forward(&projection)?;
        if batch.is_empty() {
            return Err(ReplayIntegrityError::Diverged {
                sequence_number: row.sequence_number,
                message: "logged command replayed to an empty batch".into(),
            }
            .into());
        }
        state::apply_batch(&mut tx, project_id, &row.created_at, &batch).await?;

        if batch.invalidates_sequence {
            if let Some(sequence_id) = batch.sequence_id {
                if let Some(seq_row) =
                    entities::find_sequence(&mut *tx, &sequence_id.to_string()).await?
                {
                    let view = state::load_sequence_view(&mut tx, &seq_row).await?;
                    projection.load_sequence(view);
                }
            }
        } else {
            projection.apply(&batch)?;
        }
    }

    entities::update_cursor(&mut *tx, project_id, target).await?;
    tx.commit().await.map_err(StoreError::from)?;
    Ok(projection)
}

/// The target command and all its ancestors, oldest first. Empty for the
/// root position.
async fn ancestor_chain(
    store: &Store,
    config: &KernelConfig,
    target: i64,
) -> Result<Vec<CommandRow>, CommandError> {
    if target == 0 {
        return Ok(Vec::new());
    }

    let mut chain = Vec::new();
    let mut position = target;
    loop {
        if chain.len() >= config.max_replay_depth {
            return Err(ReplayIntegrityError::BrokenParentChain {
                sequence_number: target,
            }
            .into());
        }
        let row = commands::find(store.pool(), position).await?.ok_or_else(|| {
            if position == target {
                CommandError::UndoTree(UndoTreeError::UnknownPosition {
                    sequence_number: target,
                })
            } else {
                CommandError::ReplayIntegrity(ReplayIntegrityError::MissingCommand {
                    sequence_number: position,
                })
            }
        })?;
        let parent = row.parent_sequence_number;
        chain.push(row);
        match parent {
            None => break,
            // Parents are always older than children; anything else is a
            // cycle or corruption.
            Some(p) if p >= position => {
                return Err(ReplayIntegrityError::BrokenParentChain {
                    sequence_number: target,
                }
                .into());
            }
            Some(p) => position = p,
        }
    }
    chain.reverse();
    Ok(chain)
}

/// Restore all per-sequence payloads captured at `snap` into the (purged)
/// entity tables: sequences, tracks, media, then clips, so foreign keys
/// resolve. Fails fatally if a clip references media absent from the
/// payload; nothing is ever substituted.
async fn restore_snapshot(conn: &mut SqliteConnection, snap: i64) -> Result<(), CommandError> {
    let rows = snapshots::rows_at(&mut *conn, snap).await?;
    let mut media: HashMap<String, MediaRow> = HashMap::new();
    let mut clips: Vec<ClipRow> = Vec::new();

    for row in &rows {
        let payload: SequenceSnapshot = serde_json::from_str(&row.payload_json).map_err(|e| {
            ReplayIntegrityError::SnapshotDecode {
                sequence_number: snap,
                message: e.to_string(),
            }
        })?;
        entities::insert_sequence(&mut *conn, &payload.sequence).await?;
        for track in &payload.tracks {
            entities::insert_track(&mut *conn, track).await?;
        }
        for m in payload.media {
            media.entry(m.id.clone()).or_insert(m);
        }
        clips.extend(payload.clips);
    }

    for m in media.values() {
        entities::insert_media(&mut *conn, m).await?;
    }
    for clip in &clips {
        if let Some(media_id) = &clip.media_id {
            if !media.contains_key(media_id) {
                return Err(ReplayIntegrityError::MissingMedia {
                    media_id: media_id.clone(),
                    sequence_number: snap,
                }
                .into());
            }
        }
        entities::insert_clip(&mut *conn, clip).await?;
    }
    Ok(())
}
