//! Command kinds and their forward implementations.
//!
//! A command is a typed payload; its forward implementation reads the
//! projection and emits a [`MutationBatch`]. It never writes storage itself.
//!
//! Commands that create entities pin the generated identifier into their own
//! argument payload on first execution (`Option<..Id>` fields become `Some`),
//! and reuse it on every replay of the same logged command. Without this,
//! replay would mint fresh ids and every later command referencing the
//! entity would fail to resolve. `TrimEdges` pins its clamped delta the same
//! way, so replay applies exactly what was committed rather than re-clamping
//! a larger request.

use serde::{Deserialize, Serialize};
use splice_common::{ClipId, FrameRate, MediaId, RationalTime, SequenceId, TrackId};
use splice_timeline::{
    solve, ClipView, EdgeSelection, MediaView, Mutation, MutationBatch, RippleOutcome,
    TimelineProjection, TrackType,
};
use tracing::debug;

use crate::error::{CommandError, ConstraintViolation, ValidationError};

/// Result of executing a command.
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    /// The command committed. Carries the pinned command payload so callers
    /// can read generated identifiers out of it.
    Committed {
        sequence_number: i64,
        command: CommandKind,
    },
    /// The command had no effect (e.g. a trim clamped to zero) and was not
    /// logged.
    NoOp,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateSequenceArgs {
    /// Pinned on first execution.
    pub sequence_id: Option<SequenceId>,
    pub name: String,
    pub rate: FrameRate,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddTrackArgs {
    pub track_id: Option<TrackId>,
    pub sequence_id: SequenceId,
    pub track_type: TrackType,
    pub index: i32,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoveTrackArgs {
    pub track_id: TrackId,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AddMediaArgs {
    pub media_id: Option<MediaId>,
    pub file_path: String,
    /// Duration in the media's own rate.
    pub duration: i64,
    pub rate: FrameRate,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InsertClipArgs {
    pub clip_id: Option<ClipId>,
    pub track_id: TrackId,
    pub media_id: Option<MediaId>,
    /// Start and duration in sequence frames.
    pub start: i64,
    pub duration: i64,
    /// Source window in the clip's native rate.
    pub source_in: i64,
    pub source_out: i64,
    pub rate: FrameRate,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeleteClipArgs {
    pub clip_id: ClipId,
    /// When set, later clips on the same track close the vacated span.
    pub ripple: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MoveClipArgs {
    pub clip_id: ClipId,
    /// Target track; `None` keeps the current track.
    pub track_id: Option<TrackId>,
    pub start: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrimEdgesArgs {
    pub sequence_id: SequenceId,
    pub edges: Vec<EdgeSelection>,
    /// Requested on input; replaced by the clamped effective delta when the
    /// command commits.
    pub delta: i64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum CommandKind {
    CreateSequence(CreateSequenceArgs),
    AddTrack(AddTrackArgs),
    RemoveTrack(RemoveTrackArgs),
    AddMedia(AddMediaArgs),
    InsertClip(InsertClipArgs),
    DeleteClip(DeleteClipArgs),
    MoveClip(MoveClipArgs),
    TrimEdges(TrimEdgesArgs),
}

impl CommandKind {
    /// Stable name stored in the `kind` column.
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::CreateSequence(_) => "CreateSequence",
            CommandKind::AddTrack(_) => "AddTrack",
            CommandKind::RemoveTrack(_) => "RemoveTrack",
            CommandKind::AddMedia(_) => "AddMedia",
            CommandKind::InsertClip(_) => "InsertClip",
            CommandKind::DeleteClip(_) => "DeleteClip",
            CommandKind::MoveClip(_) => "MoveClip",
            CommandKind::TrimEdges(_) => "TrimEdges",
        }
    }

    /// Serialize the argument payload. Called after `forward`, so pinned
    /// identifiers are included.
    pub fn args_json(&self) -> Result<String, CommandError> {
        let args = match self {
            CommandKind::CreateSequence(a) => serde_json::to_string(a),
            CommandKind::AddTrack(a) => serde_json::to_string(a),
            CommandKind::RemoveTrack(a) => serde_json::to_string(a),
            CommandKind::AddMedia(a) => serde_json::to_string(a),
            CommandKind::InsertClip(a) => serde_json::to_string(a),
            CommandKind::DeleteClip(a) => serde_json::to_string(a),
            CommandKind::MoveClip(a) => serde_json::to_string(a),
            CommandKind::TrimEdges(a) => serde_json::to_string(a),
        };
        args.map_err(|e| ValidationError::MalformedArgs(e.to_string()).into())
    }

    /// Rebuild a command from its persisted `kind` and `args_json` columns.
    pub fn from_row(kind: &str, args_json: &str) -> Result<Self, serde_json::Error> {
        match kind {
            "CreateSequence" => serde_json::from_str(args_json).map(CommandKind::CreateSequence),
            "AddTrack" => serde_json::from_str(args_json).map(CommandKind::AddTrack),
            "RemoveTrack" => serde_json::from_str(args_json).map(CommandKind::RemoveTrack),
            "AddMedia" => serde_json::from_str(args_json).map(CommandKind::AddMedia),
            "InsertClip" => serde_json::from_str(args_json).map(CommandKind::InsertClip),
            "DeleteClip" => serde_json::from_str(args_json).map(CommandKind::DeleteClip),
            "MoveClip" => serde_json::from_str(args_json).map(CommandKind::MoveClip),
            "TrimEdges" => serde_json::from_str(args_json).map(CommandKind::TrimEdges),
            other => Err(serde::de::Error::custom(format!(
                "unknown command kind {other:?}"
            ))),
        }
    }

    /// Compute the command's mutations against the current projection.
    ///
    /// Pure with respect to storage. An empty batch means the command has no
    /// effect and must not be logged.
    pub fn forward(&mut self, projection: &TimelineProjection) -> Result<MutationBatch, CommandError> {
        match self {
            CommandKind::CreateSequence(args) => forward_create_sequence(args),
            CommandKind::AddTrack(args) => forward_add_track(args, projection),
            CommandKind::RemoveTrack(args) => forward_remove_track(args, projection),
            CommandKind::AddMedia(args) => forward_add_media(args),
            CommandKind::InsertClip(args) => forward_insert_clip(args, projection),
            CommandKind::DeleteClip(args) => forward_delete_clip(args, projection),
            CommandKind::MoveClip(args) => forward_move_clip(args, projection),
            CommandKind::TrimEdges(args) => forward_trim_edges(args, projection),
        }
    }
}

fn forward_create_sequence(args: &mut CreateSequenceArgs) -> Result<MutationBatch, CommandError> {
    if args.name.is_empty() {
        return Err(ValidationError::MissingField("name").into());
    }
    let id = *args.sequence_id.get_or_insert_with(SequenceId::generate);

    let mut batch = MutationBatch::new(Some(id));
    batch.push(Mutation::InsertSequence {
        id,
        name: args.name.clone(),
        rate: args.rate,
    });
    Ok(batch)
}

fn forward_add_track(
    args: &mut AddTrackArgs,
    projection: &TimelineProjection,
) -> Result<MutationBatch, CommandError> {
    let sequence = projection
        .sequence(args.sequence_id)
        .ok_or_else(|| unknown("sequence", args.sequence_id))?;
    if args.index < 0 {
        return Err(ValidationError::Negative("track index", args.index as i64).into());
    }
    if sequence
        .tracks()
        .iter()
        .any(|t| t.track_type == args.track_type && t.index == args.index)
    {
        return Err(ConstraintViolation::DuplicateTrackIndex {
            sequence: args.sequence_id.to_string(),
            track_type: args.track_type.to_string(),
            index: args.index,
        }
        .into());
    }
    let id = *args.track_id.get_or_insert_with(TrackId::generate);

    let mut batch = MutationBatch::new(Some(args.sequence_id));
    batch.push(Mutation::InsertTrack {
        id,
        sequence_id: args.sequence_id,
        track_type: args.track_type,
        index: args.index,
        name: args.name.clone(),
    });
    Ok(batch)
}

fn forward_remove_track(
    args: &mut RemoveTrackArgs,
    projection: &TimelineProjection,
) -> Result<MutationBatch, CommandError> {
    let sequence = projection
        .sequence_of_track(args.track_id)
        .ok_or_else(|| unknown("track", args.track_id))?;
    let track = sequence
        .track(args.track_id)
        .ok_or_else(|| unknown("track", args.track_id))?;

    // Deleting a track cascades its clips, which a diff cannot express, so
    // the batch invalidates the sequence and the kernel reloads it.
    let mut batch = MutationBatch::new(Some(sequence.id)).invalidating();
    batch.push(Mutation::DeleteTrack {
        sequence_id: sequence.id,
        track_id: args.track_id,
    });

    let doomed: Vec<ClipId> = track
        .clips()
        .filter(|c| sequence.selection.is_clip_selected(c.id))
        .map(|c| c.id)
        .collect();
    if !doomed.is_empty() {
        let mut selection = sequence.selection.clone();
        for clip_id in doomed {
            selection.deselect_clip(clip_id);
        }
        batch.push(Mutation::SetSelection {
            sequence_id: sequence.id,
            selection,
        });
    }

    debug!(track = %args.track_id, "Remove track");
    Ok(batch)
}

fn forward_add_media(args: &mut AddMediaArgs) -> Result<MutationBatch, CommandError> {
    if args.file_path.is_empty() {
        return Err(ValidationError::MissingField("file_path").into());
    }
    if args.duration <= 0 {
        return Err(ValidationError::NonPositive("media duration", args.duration).into());
    }
    let id = *args.media_id.get_or_insert_with(MediaId::generate);

    let mut batch = MutationBatch::new(None);
    batch.push(Mutation::InsertMedia(MediaView {
        id,
        file_path: args.file_path.clone(),
        duration: args.duration,
        rate: args.rate,
    }));
    Ok(batch)
}

fn forward_insert_clip(
    args: &mut InsertClipArgs,
    projection: &TimelineProjection,
) -> Result<MutationBatch, CommandError> {
    let sequence = projection
        .sequence_of_track(args.track_id)
        .ok_or_else(|| unknown("track", args.track_id))?;
    let track = sequence
        .track(args.track_id)
        .ok_or_else(|| unknown("track", args.track_id))?;

    if args.duration <= 0 {
        return Err(ValidationError::NonPositive("clip duration", args.duration).into());
    }
    if args.start < 0 {
        return Err(ValidationError::Negative("clip start", args.start).into());
    }

    // The source window must cover exactly the clip's duration, converted to
    // its native rate.
    let native = RationalTime::new(args.duration, sequence.rate)
        .rescale(args.rate)
        .map_err(ValidationError::Time)?;
    if args.source_out - args.source_in != native.count {
        return Err(ValidationError::SourceWindowMismatch {
            source_in: args.source_in,
            source_out: args.source_out,
            expected: native.count,
        }
        .into());
    }

    if let Some(media_id) = args.media_id {
        let media = projection
            .media(media_id)
            .ok_or_else(|| unknown("media", media_id))?;
        let media_native = RationalTime::new(media.duration, media.rate)
            .rescale(args.rate)
            .map_err(ValidationError::Time)?;
        if args.source_in < 0 || args.source_out > media_native.count {
            return Err(ConstraintViolation::OutOfMediaBounds {
                media: media_id.to_string(),
                source_in: args.source_in,
                source_out: args.source_out,
                media_duration: media_native.count,
            }
            .into());
        }
    }

    if !track.can_place(args.start, args.duration, None) {
        return Err(ConstraintViolation::Overlap {
            track: args.track_id.to_string(),
            at: args.start,
        }
        .into());
    }

    let id = *args.clip_id.get_or_insert_with(ClipId::generate);
    let mut batch = MutationBatch::new(Some(sequence.id));
    batch.push(Mutation::InsertClip(ClipView {
        id,
        track_id: args.track_id,
        media_id: args.media_id,
        start: args.start,
        duration: args.duration,
        source_in: args.source_in,
        source_out: args.source_out,
        rate: args.rate,
    }));
    Ok(batch)
}

fn forward_delete_clip(
    args: &mut DeleteClipArgs,
    projection: &TimelineProjection,
) -> Result<MutationBatch, CommandError> {
    let sequence = projection
        .sequence_of_clip(args.clip_id)
        .ok_or_else(|| unknown("clip", args.clip_id))?;
    let clip = sequence
        .clip(args.clip_id)
        .ok_or_else(|| unknown("clip", args.clip_id))?
        .clone();

    let mut batch = MutationBatch::new(Some(sequence.id));
    batch.push(Mutation::DeleteClip {
        sequence_id: sequence.id,
        clip_id: args.clip_id,
    });

    if args.ripple {
        // Close the vacated span: everything after the deleted clip on its
        // track pulls left by the clip's duration.
        let track = sequence
            .track(clip.track_id)
            .ok_or_else(|| unknown("track", clip.track_id))?;
        for later in track.clips().filter(|c| c.start >= clip.end()) {
            let mut moved = later.clone();
            moved.start -= clip.duration;
            batch.push(Mutation::UpdateClip(moved));
        }
    }

    if sequence.selection.is_clip_selected(args.clip_id) {
        let mut selection = sequence.selection.clone();
        selection.deselect_clip(args.clip_id);
        batch.push(Mutation::SetSelection {
            sequence_id: sequence.id,
            selection,
        });
    }

    debug!(clip = %args.clip_id, ripple = args.ripple, "Delete clip");
    Ok(batch)
}

fn forward_move_clip(
    args: &mut MoveClipArgs,
    projection: &TimelineProjection,
) -> Result<MutationBatch, CommandError> {
    let sequence = projection
        .sequence_of_clip(args.clip_id)
        .ok_or_else(|| unknown("clip", args.clip_id))?;
    let clip = sequence
        .clip(args.clip_id)
        .ok_or_else(|| unknown("clip", args.clip_id))?
        .clone();

    if args.start < 0 {
        return Err(ValidationError::Negative("clip start", args.start).into());
    }
    let target_track_id = args.track_id.unwrap_or(clip.track_id);
    let target_track = sequence
        .track(target_track_id)
        .ok_or_else(|| unknown("track", target_track_id))?;

    let exclude = (target_track_id == clip.track_id).then_some(clip.id);
    if !target_track.can_place(args.start, clip.duration, exclude) {
        return Err(ConstraintViolation::Overlap {
            track: target_track_id.to_string(),
            at: args.start,
        }
        .into());
    }

    if target_track_id == clip.track_id && args.start == clip.start {
        // Moving a clip onto itself is not an edit.
        return Ok(MutationBatch::new(Some(sequence.id)));
    }

    let mut moved = clip;
    moved.track_id = target_track_id;
    moved.start = args.start;

    let mut batch = MutationBatch::new(Some(sequence.id));
    batch.push(Mutation::UpdateClip(moved));
    Ok(batch)
}

fn forward_trim_edges(
    args: &mut TrimEdgesArgs,
    projection: &TimelineProjection,
) -> Result<MutationBatch, CommandError> {
    if args.delta == 0 {
        return Err(ValidationError::ZeroDelta.into());
    }
    let sequence = projection
        .sequence(args.sequence_id)
        .ok_or_else(|| unknown("sequence", args.sequence_id))?;

    let outcome = solve(sequence, projection.media_map(), &args.edges, args.delta)?;
    let preview = match outcome {
        RippleOutcome::Applied(preview) => preview,
        RippleOutcome::NoOp { requested_delta } => {
            debug!(requested = requested_delta, "Trim clamped to zero");
            return Ok(MutationBatch::new(Some(args.sequence_id)));
        }
    };

    // Pin the clamped delta so replay reproduces the committed edit exactly.
    args.delta = preview.effective_delta;

    let mut batch = MutationBatch::new(Some(args.sequence_id));
    for edit in &preview.edits {
        let clip = sequence
            .clip(edit.clip)
            .ok_or_else(|| unknown("clip", edit.clip))?;
        let mut updated = clip.clone();
        updated.start = edit.start;
        updated.duration = edit.duration;
        updated.source_in = edit.source_in;
        updated.source_out = edit.source_out;
        batch.push(Mutation::UpdateClip(updated));
    }
    Ok(batch)
}

fn unknown(kind: &'static str, id: impl std::fmt::Display) -> CommandError {
    ValidationError::UnknownEntity {
        kind,
        id: id.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use splice_common::SelectionState;

    fn projection_with_sequence() -> (TimelineProjection, SequenceId, TrackId) {
        let mut projection = TimelineProjection::new();
        let sequence_id = SequenceId::generate();
        let track_id = TrackId::generate();
        let mut batch = MutationBatch::new(Some(sequence_id));
        batch.push(Mutation::InsertSequence {
            id: sequence_id,
            name: "Main".into(),
            rate: FrameRate::FPS_30,
        });
        batch.push(Mutation::InsertTrack {
            id: track_id,
            sequence_id,
            track_type: TrackType::Video,
            index: 0,
            name: "V1".into(),
        });
        projection.apply(&batch).unwrap();
        (projection, sequence_id, track_id)
    }

    fn insert_clip_args(track_id: TrackId, start: i64, duration: i64) -> InsertClipArgs {
        InsertClipArgs {
            clip_id: None,
            track_id,
            media_id: None,
            start,
            duration,
            source_in: 0,
            source_out: duration,
            rate: FrameRate::FPS_30,
        }
    }

    #[test]
    fn create_sequence_pins_generated_id() {
        let mut kind = CommandKind::CreateSequence(CreateSequenceArgs {
            sequence_id: None,
            name: "Main".into(),
            rate: FrameRate::FPS_29_97,
        });
        let projection = TimelineProjection::new();
        kind.forward(&projection).unwrap();

        let CommandKind::CreateSequence(args) = &kind else { unreachable!() };
        let pinned = args.sequence_id.expect("id pinned after forward");

        // A second forward run (replay) reuses the pinned id.
        let mut replayed = CommandKind::from_row("CreateSequence", &kind.args_json().unwrap())
            .unwrap();
        replayed.forward(&projection).unwrap();
        let CommandKind::CreateSequence(args) = &replayed else { unreachable!() };
        assert_eq!(args.sequence_id, Some(pinned));
    }

    #[test]
    fn create_sequence_rejects_empty_name() {
        let mut kind = CommandKind::CreateSequence(CreateSequenceArgs {
            sequence_id: None,
            name: String::new(),
            rate: FrameRate::FPS_30,
        });
        assert_matches!(
            kind.forward(&TimelineProjection::new()),
            Err(CommandError::Validation(ValidationError::MissingField("name")))
        );
    }

    #[test]
    fn add_track_rejects_duplicate_index() {
        let (projection, sequence_id, _) = projection_with_sequence();
        let mut kind = CommandKind::AddTrack(AddTrackArgs {
            track_id: None,
            sequence_id,
            track_type: TrackType::Video,
            index: 0,
            name: "V1 again".into(),
        });
        assert_matches!(
            kind.forward(&projection),
            Err(CommandError::Constraint(
                ConstraintViolation::DuplicateTrackIndex { .. }
            ))
        );
    }

    #[test]
    fn remove_track_invalidates_and_deselects_its_clips() {
        let (mut projection, sequence_id, track_id) = projection_with_sequence();
        let mut kind = CommandKind::InsertClip(insert_clip_args(track_id, 0, 100));
        let batch = kind.forward(&projection).unwrap();
        projection.apply(&batch).unwrap();
        let CommandKind::InsertClip(args) = &kind else { unreachable!() };
        let clip_id = args.clip_id.unwrap();

        let mut selection = SelectionState::new();
        selection.select_clip(clip_id, false);
        let mut batch = MutationBatch::new(Some(sequence_id));
        batch.push(Mutation::SetSelection {
            sequence_id,
            selection,
        });
        projection.apply(&batch).unwrap();

        let mut kind = CommandKind::RemoveTrack(RemoveTrackArgs { track_id });
        let batch = kind.forward(&projection).unwrap();
        assert!(batch.invalidates_sequence, "cascade cannot be diff-applied");
        assert!(batch
            .mutations
            .iter()
            .any(|m| matches!(m, Mutation::DeleteTrack { track_id: t, .. } if *t == track_id)));
        let deselected = batch.mutations.iter().any(|m| {
            matches!(m, Mutation::SetSelection { selection, .. } if !selection.is_clip_selected(clip_id))
        });
        assert!(deselected);

        let mut unknown_track = CommandKind::RemoveTrack(RemoveTrackArgs {
            track_id: TrackId::generate(),
        });
        assert_matches!(
            unknown_track.forward(&projection),
            Err(CommandError::Validation(ValidationError::UnknownEntity { .. }))
        );
    }

    #[test]
    fn insert_clip_rejects_overlap_and_bad_window() {
        let (mut projection, _, track_id) = projection_with_sequence();
        let mut first = CommandKind::InsertClip(insert_clip_args(track_id, 0, 100));
        let batch = first.forward(&projection).unwrap();
        projection.apply(&batch).unwrap();

        let mut overlapping = CommandKind::InsertClip(insert_clip_args(track_id, 50, 100));
        assert_matches!(
            overlapping.forward(&projection),
            Err(CommandError::Constraint(ConstraintViolation::Overlap { .. }))
        );

        let mut bad_window = CommandKind::InsertClip(InsertClipArgs {
            source_out: 99,
            ..insert_clip_args(track_id, 200, 100)
        });
        assert_matches!(
            bad_window.forward(&projection),
            Err(CommandError::Validation(
                ValidationError::SourceWindowMismatch { .. }
            ))
        );
    }

    #[test]
    fn insert_clip_checks_media_bounds() {
        let (mut projection, _, track_id) = projection_with_sequence();
        let media_id = MediaId::generate();
        projection.insert_media(MediaView {
            id: media_id,
            file_path: "/media/a.mov".into(),
            duration: 50,
            rate: FrameRate::FPS_30,
        });

        let mut kind = CommandKind::InsertClip(InsertClipArgs {
            media_id: Some(media_id),
            ..insert_clip_args(track_id, 0, 100)
        });
        assert_matches!(
            kind.forward(&projection),
            Err(CommandError::Constraint(
                ConstraintViolation::OutOfMediaBounds { .. }
            ))
        );
    }

    #[test]
    fn delete_clip_with_ripple_shifts_later_clips() {
        let (mut projection, _, track_id) = projection_with_sequence();
        for start in [0, 100, 200] {
            let mut kind = CommandKind::InsertClip(insert_clip_args(track_id, start, 100));
            let batch = kind.forward(&projection).unwrap();
            projection.apply(&batch).unwrap();
        }
        let sequence = projection.sequence_of_track(track_id).unwrap();
        let middle = sequence
            .track(track_id)
            .unwrap()
            .clips()
            .nth(1)
            .unwrap()
            .id;

        let mut kind = CommandKind::DeleteClip(DeleteClipArgs {
            clip_id: middle,
            ripple: true,
        });
        let batch = kind.forward(&projection).unwrap();
        // One delete plus one shift for the clip at 200.
        let updates: Vec<_> = batch
            .mutations
            .iter()
            .filter_map(|m| match m {
                Mutation::UpdateClip(c) => Some(c.start),
                _ => None,
            })
            .collect();
        assert_eq!(updates, vec![100]);
    }

    #[test]
    fn delete_clip_drops_it_from_selection() {
        let (mut projection, sequence_id, track_id) = projection_with_sequence();
        let mut kind = CommandKind::InsertClip(insert_clip_args(track_id, 0, 100));
        let batch = kind.forward(&projection).unwrap();
        projection.apply(&batch).unwrap();
        let CommandKind::InsertClip(args) = &kind else { unreachable!() };
        let clip_id = args.clip_id.unwrap();

        let mut selection = SelectionState::new();
        selection.select_clip(clip_id, false);
        let mut batch = MutationBatch::new(Some(sequence_id));
        batch.push(Mutation::SetSelection {
            sequence_id,
            selection,
        });
        projection.apply(&batch).unwrap();

        let mut kind = CommandKind::DeleteClip(DeleteClipArgs {
            clip_id,
            ripple: false,
        });
        let batch = kind.forward(&projection).unwrap();
        let has_deselect = batch.mutations.iter().any(|m| {
            matches!(m, Mutation::SetSelection { selection, .. } if !selection.is_clip_selected(clip_id))
        });
        assert!(has_deselect);
    }

    #[test]
    fn move_clip_onto_itself_is_empty_batch() {
        let (mut projection, _, track_id) = projection_with_sequence();
        let mut kind = CommandKind::InsertClip(insert_clip_args(track_id, 0, 100));
        let batch = kind.forward(&projection).unwrap();
        projection.apply(&batch).unwrap();
        let CommandKind::InsertClip(args) = &kind else { unreachable!() };

        let mut kind = CommandKind::MoveClip(MoveClipArgs {
            clip_id: args.clip_id.unwrap(),
            track_id: None,
            start: 0,
        });
        assert!(kind.forward(&projection).unwrap().is_empty());
    }

    #[test]
    fn trim_edges_pins_effective_delta() {
        let (mut projection, sequence_id, track_id) = projection_with_sequence();
        let media_id = MediaId::generate();
        projection.insert_media(MediaView {
            id: media_id,
            file_path: "/media/a.mov".into(),
            duration: 120,
            rate: FrameRate::FPS_30,
        });
        let mut kind = CommandKind::InsertClip(InsertClipArgs {
            media_id: Some(media_id),
            ..insert_clip_args(track_id, 0, 100)
        });
        let batch = kind.forward(&projection).unwrap();
        projection.apply(&batch).unwrap();
        let CommandKind::InsertClip(args) = &kind else { unreachable!() };
        let clip_id = args.clip_id.unwrap();

        let mut trim = CommandKind::TrimEdges(TrimEdgesArgs {
            sequence_id,
            edges: vec![EdgeSelection::right(clip_id)],
            delta: 50,
        });
        let batch = trim.forward(&projection).unwrap();
        assert!(!batch.is_empty());
        let CommandKind::TrimEdges(args) = &trim else { unreachable!() };
        assert_eq!(args.delta, 20, "media headroom clamps 50 down to 20");
    }

    #[test]
    fn trim_edges_zero_delta_rejected() {
        let (projection, sequence_id, _) = projection_with_sequence();
        let mut trim = CommandKind::TrimEdges(TrimEdgesArgs {
            sequence_id,
            edges: vec![],
            delta: 0,
        });
        assert_matches!(
            trim.forward(&projection),
            Err(CommandError::Validation(ValidationError::ZeroDelta))
        );
    }

    #[test]
    fn kind_roundtrips_through_row_columns() {
        let kind = CommandKind::DeleteClip(DeleteClipArgs {
            clip_id: ClipId::generate(),
            ripple: true,
        });
        let json = kind.args_json().unwrap();
        let back = CommandKind::from_row(kind.name(), &json).unwrap();
        assert_matches!(back, CommandKind::DeleteClip(args) if args.ripple);

        assert!(CommandKind::from_row("Frobnicate", "{}").is_err());
    }
}
