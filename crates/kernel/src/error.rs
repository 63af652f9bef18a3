//! Kernel error taxonomy.
//!
//! Five families with distinct recovery contracts. Validation and
//! constraint failures are recoverable: they are reported to the caller and
//! the log is untouched. Replay-integrity and undo-tree failures indicate a
//! corrupted history and abort with context. Persistence failures roll the
//! transaction back and are safe to retry once.

use splice_common::TimeError;
use splice_store::StoreError;
use splice_timeline::TimelineError;
use thiserror::Error;

/// The command is malformed or references entities that do not exist.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("required field `{0}` is missing or empty")]
    MissingField(&'static str),

    #[error("{kind} {id} not found")]
    UnknownEntity { kind: &'static str, id: String },

    #[error("command issued from within another command")]
    ReentrantExecution,

    #[error("trim delta must be non-zero")]
    ZeroDelta,

    #[error("{0} must be positive, got {1}")]
    NonPositive(&'static str, i64),

    #[error("{0} must be non-negative, got {1}")]
    Negative(&'static str, i64),

    #[error("source window [{source_in}, {source_out}) does not cover {expected} native units")]
    SourceWindowMismatch {
        source_in: i64,
        source_out: i64,
        expected: i64,
    },

    #[error("no edges selected")]
    EmptySelection,

    #[error("edge of clip {0} selected more than once")]
    DuplicateEdge(String),

    #[error(transparent)]
    Time(#[from] TimeError),

    #[error("command payload did not serialize: {0}")]
    MalformedArgs(String),
}

/// The edit cannot be satisfied against the current timeline state.
#[derive(Error, Debug)]
pub enum ConstraintViolation {
    #[error("clip would overlap track {track} at frame {at}")]
    Overlap { track: String, at: i64 },

    #[error("track {track_type} index {index} already exists in sequence {sequence}")]
    DuplicateTrackIndex {
        sequence: String,
        track_type: String,
        index: i32,
    },

    #[error(
        "source window [{source_in}, {source_out}) exceeds media {media} bounds [0, {media_duration})"
    )]
    OutOfMediaBounds {
        media: String,
        source_in: i64,
        source_out: i64,
        media_duration: i64,
    },
}

/// History cannot be reproduced. Always fatal for the operation; nothing is
/// ever substituted for a missing entity or field.
#[derive(Error, Debug)]
pub enum ReplayIntegrityError {
    #[error("command {sequence_number} is missing from the log")]
    MissingCommand { sequence_number: i64 },

    #[error("parent chain of command {sequence_number} is broken or cyclic")]
    BrokenParentChain { sequence_number: i64 },

    #[error("media {media_id} referenced at snapshot {sequence_number} is absent from the payload")]
    MissingMedia {
        media_id: String,
        sequence_number: i64,
    },

    #[error("snapshot payload at {sequence_number} failed to decode: {message}")]
    SnapshotDecode {
        sequence_number: i64,
        message: String,
    },

    #[error("command {sequence_number} payload failed to decode: {message}")]
    CommandDecode {
        sequence_number: i64,
        message: String,
    },

    #[error("command {sequence_number} replayed to a different outcome: {message}")]
    Diverged {
        sequence_number: i64,
        message: String,
    },
}

/// Invalid navigation of the undo tree.
#[derive(Error, Debug)]
pub enum UndoTreeError {
    #[error("nothing to undo")]
    NothingToUndo,

    #[error("nothing to redo")]
    NothingToRedo,

    #[error("redo from {cursor} is ambiguous between children {candidates:?}; a child must be named")]
    AmbiguousRedo { cursor: i64, candidates: Vec<i64> },

    #[error("command {child} is not a child of the current command {cursor}")]
    NotAChild { child: i64, cursor: i64 },

    #[error("log position {sequence_number} does not exist")]
    UnknownPosition { sequence_number: i64 },
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("constraint violation: {0}")]
    Constraint(#[from] ConstraintViolation),

    #[error("replay integrity: {0}")]
    ReplayIntegrity(#[from] ReplayIntegrityError),

    #[error("undo tree: {0}")]
    UndoTree(#[from] UndoTreeError),

    #[error("persistence: {0}")]
    Persistence(#[from] StoreError),
}

impl From<TimeError> for CommandError {
    fn from(err: TimeError) -> Self {
        CommandError::Validation(ValidationError::Time(err))
    }
}

impl From<TimelineError> for CommandError {
    fn from(err: TimelineError) -> Self {
        match err {
            TimelineError::Overlap { track, at, .. } => {
                CommandError::Constraint(ConstraintViolation::Overlap {
                    track: track.to_string(),
                    at,
                })
            }
            TimelineError::UnknownSequence(id) => {
                CommandError::Validation(ValidationError::UnknownEntity {
                    kind: "sequence",
                    id: id.to_string(),
                })
            }
            TimelineError::UnknownTrack(id) => {
                CommandError::Validation(ValidationError::UnknownEntity {
                    kind: "track",
                    id: id.to_string(),
                })
            }
            TimelineError::UnknownClip(id) => {
                CommandError::Validation(ValidationError::UnknownEntity {
                    kind: "clip",
                    id: id.to_string(),
                })
            }
            TimelineError::UnknownMedia(id) => {
                CommandError::Validation(ValidationError::UnknownEntity {
                    kind: "media",
                    id: id.to_string(),
                })
            }
            TimelineError::DuplicateEdge(id) => {
                CommandError::Validation(ValidationError::DuplicateEdge(id.to_string()))
            }
            TimelineError::EmptySelection => {
                CommandError::Validation(ValidationError::EmptySelection)
            }
            TimelineError::BadTrackType(t) => {
                CommandError::Validation(ValidationError::MalformedArgs(format!(
                    "unrecognized track type {t:?}"
                )))
            }
            TimelineError::Time(err) => CommandError::Validation(ValidationError::Time(err)),
        }
    }
}
