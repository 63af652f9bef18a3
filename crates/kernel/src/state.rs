//! Bridging between storage rows and the in-memory projection.
//!
//! Rows are plain strings and integers; views are typed. Conversion fails
//! loudly: a row with an unparseable id, rate, or selection payload is a
//! malformed-row error, never a defaulted value.

use serde_json;
use splice_common::{SelectionState, SequenceId};
use splice_store::entities;
use splice_store::models::{ClipRow, MediaRow, SequenceRow, TrackRow};
use splice_store::StoreError;
use splice_timeline::{
    ClipView, MediaView, Mutation, MutationBatch, SequenceView, TimelineProjection, TrackView,
};
use sqlx::SqliteConnection;

use crate::error::{CommandError, ValidationError};

fn malformed(table: &str, message: impl ToString) -> CommandError {
    CommandError::Persistence(StoreError::MalformedRow {
        table: table.to_string(),
        message: message.to_string(),
    })
}

fn parse_id<T>(table: &str, value: &str) -> Result<T, CommandError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value.parse().map_err(|e: T::Err| malformed(table, e))
}

pub(crate) fn selection_json(selection: &SelectionState) -> Result<String, CommandError> {
    serde_json::to_string(selection)
        .map_err(|e| ValidationError::MalformedArgs(e.to_string()).into())
}

// --- row -> view ---

pub(crate) fn media_view(row: &MediaRow) -> Result<MediaView, CommandError> {
    Ok(MediaView {
        id: parse_id("media", &row.id)?,
        file_path: row.file_path.clone(),
        duration: row.duration_count,
        rate: row.rate()?,
    })
}

pub(crate) fn clip_view(row: &ClipRow) -> Result<ClipView, CommandError> {
    Ok(ClipView {
        id: parse_id("clips", &row.id)?,
        track_id: parse_id("clips", &row.track_id)?,
        media_id: row
            .media_id
            .as_deref()
            .map(|id| parse_id("clips", id))
            .transpose()?,
        start: row.start_count,
        duration: row.duration_count,
        source_in: row.source_in_count,
        source_out: row.source_out_count,
        rate: row.rate()?,
    })
}

pub(crate) fn track_view(row: &TrackRow) -> Result<TrackView, CommandError> {
    Ok(TrackView::new(
        parse_id("tracks", &row.id)?,
        row.track_type.parse()?,
        row.track_index,
        row.name.clone(),
    ))
}

pub(crate) fn sequence_view_shell(row: &SequenceRow) -> Result<SequenceView, CommandError> {
    let mut view = SequenceView::new(
        parse_id("sequences", &row.id)?,
        row.name.clone(),
        row.rate()?,
    );
    view.playhead = row.playhead_count;
    view.selection = serde_json::from_str(&row.selection_json)
        .map_err(|e| malformed("sequences", e))?;
    Ok(view)
}

// --- view -> row ---

pub(crate) fn clip_row(view: &ClipView) -> ClipRow {
    ClipRow {
        id: view.id.to_string(),
        track_id: view.track_id.to_string(),
        media_id: view.media_id.map(|id| id.to_string()),
        start_count: view.start,
        duration_count: view.duration,
        source_in_count: view.source_in,
        source_out_count: view.source_out,
        rate_num: view.rate.num(),
        rate_den: view.rate.den(),
    }
}

pub(crate) fn media_row(view: &MediaView, project_id: &str) -> MediaRow {
    MediaRow {
        id: view.id.to_string(),
        project_id: project_id.to_string(),
        file_path: view.file_path.clone(),
        duration_count: view.duration,
        rate_num: view.rate.num(),
        rate_den: view.rate.den(),
    }
}

// --- loading ---

/// Load one sequence (tracks and clips included) from storage.
pub(crate) async fn load_sequence_view(
    conn: &mut SqliteConnection,
    row: &SequenceRow,
) -> Result<SequenceView, CommandError> {
    let mut view = sequence_view_shell(row)?;
    for track_row in entities::tracks_for_sequence(&mut *conn, &row.id).await? {
        view.add_track(track_view(&track_row)?);
        for clip_row in entities::clips_for_track(&mut *conn, &track_row.id).await? {
            view.insert_clip(clip_view(&clip_row)?)?;
        }
    }
    Ok(view)
}

/// Load the full projection: every sequence plus the media registry.
pub(crate) async fn load_projection(
    conn: &mut SqliteConnection,
) -> Result<TimelineProjection, CommandError> {
    let mut projection = TimelineProjection::new();
    for media in entities::list_media(&mut *conn).await? {
        projection.insert_media(media_view(&media)?);
    }
    for sequence_row in entities::list_sequences(&mut *conn).await? {
        let view = load_sequence_view(conn, &sequence_row).await?;
        projection.load_sequence(view);
    }
    Ok(projection)
}

// --- persisting a batch ---

/// Write a mutation batch to storage. Runs inside the command transaction.
pub(crate) async fn apply_batch(
    conn: &mut SqliteConnection,
    project_id: &str,
    created_at: &str,
    batch: &MutationBatch,
) -> Result<(), CommandError> {
    for mutation in &batch.mutations {
        match mutation {
            Mutation::InsertSequence { id, name, rate } => {
                entities::insert_sequence(
                    &mut *conn,
                    &SequenceRow {
                        id: id.to_string(),
                        project_id: project_id.to_string(),
                        name: name.clone(),
                        rate_num: rate.num(),
                        rate_den: rate.den(),
                        playhead_count: 0,
                        selection_json: selection_json(&SelectionState::new())?,
                        created_at: created_at.to_string(),
                    },
                )
                .await?;
            }
            Mutation::InsertTrack {
                id,
                sequence_id,
                track_type,
                index,
                name,
            } => {
                entities::insert_track(
                    &mut *conn,
                    &TrackRow {
                        id: id.to_string(),
                        sequence_id: sequence_id.to_string(),
                        track_type: track_type.as_str().to_string(),
                        track_index: *index,
                        name: name.clone(),
                    },
                )
                .await?;
            }
            Mutation::DeleteTrack { track_id, .. } => {
                entities::delete_track(&mut *conn, &track_id.to_string()).await?;
            }
            Mutation::InsertMedia(media) => {
                entities::insert_media(&mut *conn, &media_row(media, project_id)).await?;
            }
            Mutation::InsertClip(clip) => {
                entities::insert_clip(&mut *conn, &clip_row(clip)).await?;
            }
            Mutation::UpdateClip(clip) => {
                entities::update_clip(&mut *conn, &clip_row(clip)).await?;
            }
            Mutation::DeleteClip { clip_id, .. } => {
                entities::delete_clip(&mut *conn, &clip_id.to_string()).await?;
            }
            Mutation::SetPlayhead { sequence_id, count } => {
                let row = require_sequence(conn, *sequence_id).await?;
                entities::update_sequence_view_state(
                    &mut *conn,
                    &row.id,
                    *count,
                    &row.selection_json,
                )
                .await?;
            }
            Mutation::SetSelection {
                sequence_id,
                selection,
            } => {
                let row = require_sequence(conn, *sequence_id).await?;
                entities::update_sequence_view_state(
                    &mut *conn,
                    &row.id,
                    row.playhead_count,
                    &selection_json(selection)?,
                )
                .await?;
            }
        }
    }
    Ok(())
}

async fn require_sequence(
    conn: &mut SqliteConnection,
    id: SequenceId,
) -> Result<SequenceRow, CommandError> {
    entities::find_sequence(&mut *conn, &id.to_string())
        .await?
        .ok_or_else(|| {
            CommandError::Validation(ValidationError::UnknownEntity {
                kind: "sequence",
                id: id.to_string(),
            })
        })
}
