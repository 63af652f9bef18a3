//! Mutation batches: the diff language between commands and state.
//!
//! A command's forward implementation never touches storage or the
//! projection directly; it emits a [`MutationBatch`] that the kernel applies
//! to both. A batch that cannot be expressed as a precise diff sets
//! `invalidates_sequence`, which tells the kernel to reload the sequence
//! wholesale instead of patching it.

use splice_common::{ClipId, FrameRate, SelectionState, SequenceId, TrackId};

use crate::projection::{ClipView, MediaView, TrackType};

#[derive(Clone, Debug, PartialEq)]
pub enum Mutation {
    InsertSequence {
        id: SequenceId,
        name: String,
        rate: FrameRate,
    },
    InsertTrack {
        id: TrackId,
        sequence_id: SequenceId,
        track_type: TrackType,
        index: i32,
        name: String,
    },
    DeleteTrack {
        sequence_id: SequenceId,
        track_id: TrackId,
    },
    InsertMedia(MediaView),
    InsertClip(ClipView),
    UpdateClip(ClipView),
    DeleteClip {
        sequence_id: SequenceId,
        clip_id: ClipId,
    },
    SetPlayhead {
        sequence_id: SequenceId,
        count: i64,
    },
    SetSelection {
        sequence_id: SequenceId,
        selection: SelectionState,
    },
}

/// An ordered set of mutations produced by one command execution.
#[derive(Clone, Debug, Default)]
pub struct MutationBatch {
    /// Sequence the batch edits, if any (media imports have none).
    pub sequence_id: Option<SequenceId>,
    pub mutations: Vec<Mutation>,
    /// When set, the projection must reload `sequence_id` from storage
    /// instead of diff-applying (e.g. a track delete cascades its clips).
    pub invalidates_sequence: bool,
}

impl MutationBatch {
    pub fn new(sequence_id: Option<SequenceId>) -> Self {
        Self {
            sequence_id,
            mutations: Vec::new(),
            invalidates_sequence: false,
        }
    }

    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    pub fn invalidating(mut self) -> Self {
        self.invalidates_sequence = true;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}
