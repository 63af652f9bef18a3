//! Clip and track selection state.
//!
//! The selection is captured before and after every command and stored in
//! the command row, so undo restores the pre-selection and redo restores the
//! post-selection.

use serde::{Deserialize, Serialize};

use crate::ids::{ClipId, TrackId};

/// Tracks which clips and tracks are currently selected in a sequence.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    selected_clips: Vec<ClipId>,
    selected_tracks: Vec<TrackId>,
}

impl SelectionState {
    /// Create a new empty selection state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a clip. If `multi` is false, clears previous clip selection first.
    pub fn select_clip(&mut self, clip_id: ClipId, multi: bool) {
        if !multi {
            self.selected_clips.clear();
        }
        if !self.selected_clips.contains(&clip_id) {
            self.selected_clips.push(clip_id);
        }
    }

    /// Deselect a specific clip.
    pub fn deselect_clip(&mut self, clip_id: ClipId) {
        self.selected_clips.retain(|id| *id != clip_id);
    }

    /// Select a track. If `multi` is false, clears previous track selection first.
    pub fn select_track(&mut self, track_id: TrackId, multi: bool) {
        if !multi {
            self.selected_tracks.clear();
        }
        if !self.selected_tracks.contains(&track_id) {
            self.selected_tracks.push(track_id);
        }
    }

    /// Deselect a specific track.
    pub fn deselect_track(&mut self, track_id: TrackId) {
        self.selected_tracks.retain(|id| *id != track_id);
    }

    /// Clear all selections.
    pub fn clear(&mut self) {
        self.selected_clips.clear();
        self.selected_tracks.clear();
    }

    pub fn selected_clips(&self) -> &[ClipId] {
        &self.selected_clips
    }

    pub fn selected_tracks(&self) -> &[TrackId] {
        &self.selected_tracks
    }

    pub fn is_clip_selected(&self, clip_id: ClipId) -> bool {
        self.selected_clips.contains(&clip_id)
    }

    pub fn is_track_selected(&self, track_id: TrackId) -> bool {
        self.selected_tracks.contains(&track_id)
    }

    /// Returns true if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.selected_clips.is_empty() && self.selected_tracks.is_empty()
    }

    pub fn count(&self) -> usize {
        self.selected_clips.len() + self.selected_tracks.len()
    }
}
