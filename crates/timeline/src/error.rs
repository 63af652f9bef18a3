//! Timeline model errors.

use splice_common::{ClipId, MediaId, SequenceId, TimeError, TrackId};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    #[error("sequence {0} is not loaded in the projection")]
    UnknownSequence(SequenceId),

    #[error("track {0} not found")]
    UnknownTrack(TrackId),

    #[error("clip {0} not found")]
    UnknownClip(ClipId),

    #[error("media {0} not found")]
    UnknownMedia(MediaId),

    #[error("clip {clip} overlaps an existing item on track {track} at frame {at}")]
    Overlap {
        track: TrackId,
        clip: ClipId,
        at: i64,
    },

    #[error("edge of clip {0} selected more than once")]
    DuplicateEdge(ClipId),

    #[error("no edges selected")]
    EmptySelection,

    #[error("unrecognized track type {0:?}")]
    BadTrackType(String),

    #[error(transparent)]
    Time(#[from] TimeError),
}
