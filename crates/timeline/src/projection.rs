//! The materialized timeline view.
//!
//! Per track, items live in a `BTreeMap` keyed by start frame, which gives
//! ordered iteration and O(log n) neighbor queries during solving and hit
//! testing. The projection is rebuilt from storage on open and after replay;
//! between commands it is patched incrementally by mutation batches.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use splice_common::{ClipId, FrameRate, MediaId, SelectionState, SequenceId, TrackId};
use tracing::debug;

use crate::error::TimelineError;
use crate::mutation::{Mutation, MutationBatch};

/// Kind of a track. Stored as `"video"` / `"audio"`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackType {
    Video,
    Audio,
}

impl TrackType {
    pub fn as_str(self) -> &'static str {
        match self {
            TrackType::Video => "video",
            TrackType::Audio => "audio",
        }
    }
}

impl fmt::Display for TrackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackType {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video" => Ok(TrackType::Video),
            "audio" => Ok(TrackType::Audio),
            other => Err(TimelineError::BadTrackType(other.to_string())),
        }
    }
}

/// An imported media file as the timeline sees it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaView {
    pub id: MediaId,
    pub file_path: String,
    /// Duration in the media's own rate.
    pub duration: i64,
    pub rate: FrameRate,
}

/// A clip as the timeline sees it.
///
/// `start` and `duration` are frames at the owning sequence's rate.
/// `source_in`/`source_out` are counts at the clip's own `rate`, which may
/// differ from the sequence rate (audio clips keep sample coordinates).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClipView {
    pub id: ClipId,
    pub track_id: TrackId,
    pub media_id: Option<MediaId>,
    pub start: i64,
    pub duration: i64,
    pub source_in: i64,
    pub source_out: i64,
    pub rate: FrameRate,
}

impl ClipView {
    pub fn end(&self) -> i64 {
        self.start + self.duration
    }
}

/// An empty span on a track, reported by gap queries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GapSpan {
    pub track_id: TrackId,
    pub start: i64,
    pub duration: i64,
}

/// One track's ordered, non-overlapping items.
#[derive(Clone, Debug)]
pub struct TrackView {
    pub id: TrackId,
    pub track_type: TrackType,
    pub index: i32,
    pub name: String,
    items: BTreeMap<i64, ClipView>,
}

impl TrackView {
    pub fn new(id: TrackId, track_type: TrackType, index: i32, name: String) -> Self {
        Self {
            id,
            track_type,
            index,
            name,
            items: BTreeMap::new(),
        }
    }

    /// Clips in timeline order.
    pub fn clips(&self) -> impl Iterator<Item = &ClipView> {
        self.items.values()
    }

    pub fn clip_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// First clip starting at or after `frame`.
    pub fn next_at_or_after(&self, frame: i64) -> Option<&ClipView> {
        self.items.range(frame..).next().map(|(_, c)| c)
    }

    /// Last clip starting strictly before `frame`.
    pub fn prev_before(&self, frame: i64) -> Option<&ClipView> {
        self.items.range(..frame).next_back().map(|(_, c)| c)
    }

    /// End of the last clip; 0 for an empty track.
    pub fn length(&self) -> i64 {
        self.items.values().next_back().map_or(0, ClipView::end)
    }

    /// Whether `[start, start + duration)` is free of clips other than
    /// `exclude` (pass the clip's own id when testing a move).
    pub fn can_place(&self, start: i64, duration: i64, exclude: Option<ClipId>) -> bool {
        let end = start + duration;
        !self
            .items
            .values()
            .any(|c| Some(c.id) != exclude && c.start < end && start < c.end())
    }

    /// Empty spans on this track, including a leading gap before frame 0's
    /// first clip.
    pub fn gaps(&self) -> Vec<GapSpan> {
        let mut gaps = Vec::new();
        let mut cursor = 0;
        for clip in self.items.values() {
            if clip.start > cursor {
                gaps.push(GapSpan {
                    track_id: self.id,
                    start: cursor,
                    duration: clip.start - cursor,
                });
            }
            cursor = clip.end();
        }
        gaps
    }

    fn check_free(&self, start: i64, duration: i64) -> Result<(), TimelineError> {
        let end = start + duration;
        if let Some((_, prev)) = self.items.range(..start).next_back() {
            if prev.end() > start {
                return Err(TimelineError::Overlap {
                    track: self.id,
                    clip: prev.id,
                    at: start,
                });
            }
        }
        if let Some((_, next)) = self.items.range(start..).next() {
            if next.start < end {
                return Err(TimelineError::Overlap {
                    track: self.id,
                    clip: next.id,
                    at: next.start,
                });
            }
        }
        Ok(())
    }
}

/// One sequence's materialized state.
#[derive(Clone, Debug)]
pub struct SequenceView {
    pub id: SequenceId,
    pub name: String,
    pub rate: FrameRate,
    /// Playhead position in frames at `rate`.
    pub playhead: i64,
    pub selection: SelectionState,
    tracks: Vec<TrackView>,
    clip_index: HashMap<ClipId, (TrackId, i64)>,
}

impl SequenceView {
    pub fn new(id: SequenceId, name: String, rate: FrameRate) -> Self {
        Self {
            id,
            name,
            rate,
            playhead: 0,
            selection: SelectionState::new(),
            tracks: Vec::new(),
            clip_index: HashMap::new(),
        }
    }

    /// Tracks ordered by (type, index): video tracks first, then audio.
    pub fn tracks(&self) -> &[TrackView] {
        &self.tracks
    }

    pub fn track(&self, id: TrackId) -> Option<&TrackView> {
        self.tracks.iter().find(|t| t.id == id)
    }

    fn track_mut(&mut self, id: TrackId) -> Result<&mut TrackView, TimelineError> {
        self.tracks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(TimelineError::UnknownTrack(id))
    }

    pub fn clip(&self, id: ClipId) -> Option<&ClipView> {
        let (track_id, start) = self.clip_index.get(&id)?;
        self.track(*track_id)?.items.get(start)
    }

    pub fn contains_clip(&self, id: ClipId) -> bool {
        self.clip_index.contains_key(&id)
    }

    pub fn clip_count(&self) -> usize {
        self.clip_index.len()
    }

    /// End of the longest track.
    pub fn length(&self) -> i64 {
        self.tracks.iter().map(TrackView::length).max().unwrap_or(0)
    }

    /// Empty spans across all tracks.
    pub fn find_gaps(&self) -> Vec<GapSpan> {
        self.tracks.iter().flat_map(TrackView::gaps).collect()
    }

    pub fn add_track(&mut self, track: TrackView) {
        self.tracks.push(track);
        self.tracks
            .sort_by_key(|t| (t.track_type, t.index));
    }

    pub fn remove_track(&mut self, id: TrackId) -> Result<(), TimelineError> {
        let pos = self
            .tracks
            .iter()
            .position(|t| t.id == id)
            .ok_or(TimelineError::UnknownTrack(id))?;
        let track = self.tracks.remove(pos);
        for clip in track.items.values() {
            self.clip_index.remove(&clip.id);
        }
        Ok(())
    }

    pub fn insert_clip(&mut self, clip: ClipView) -> Result<(), TimelineError> {
        let track = self.track_mut(clip.track_id)?;
        track.check_free(clip.start, clip.duration)?;
        self.clip_index.insert(clip.id, (clip.track_id, clip.start));
        let track = self.track_mut(clip.track_id)?;
        track.items.insert(clip.start, clip);
        Ok(())
    }

    pub fn remove_clip(&mut self, id: ClipId) -> Result<ClipView, TimelineError> {
        let (track_id, start) = self
            .clip_index
            .remove(&id)
            .ok_or(TimelineError::UnknownClip(id))?;
        let track = self.track_mut(track_id)?;
        track
            .items
            .remove(&start)
            .ok_or(TimelineError::UnknownClip(id))
    }

    /// Replace the geometry of a set of clips atomically.
    ///
    /// All updated clips are detached before any is re-inserted, so edits
    /// that swap or chain positions (a ripple shifting a whole track) do not
    /// trip over transient overlaps between individually valid updates.
    pub fn update_clips(&mut self, updates: &[ClipView]) -> Result<(), TimelineError> {
        let mut detached = Vec::with_capacity(updates.len());
        for update in updates {
            detached.push(self.remove_clip(update.id)?);
        }
        for update in updates {
            if let Err(err) = self.insert_clip(update.clone()) {
                // Roll the projection back to the pre-batch arrangement.
                for u in updates {
                    let _ = self.remove_clip(u.id);
                }
                for original in detached {
                    self.insert_clip(original)?;
                }
                return Err(err);
            }
        }
        Ok(())
    }

    /// Check per-track ordering and non-overlap invariants.
    pub fn validate(&self) -> Result<(), TimelineError> {
        for track in &self.tracks {
            let mut prev: Option<&ClipView> = None;
            for clip in track.items.values() {
                if let Some(p) = prev {
                    if p.end() > clip.start {
                        return Err(TimelineError::Overlap {
                            track: track.id,
                            clip: clip.id,
                            at: clip.start,
                        });
                    }
                }
                prev = Some(clip);
            }
        }
        Ok(())
    }
}

/// All loaded sequences plus the project-wide media registry.
#[derive(Clone, Default)]
pub struct TimelineProjection {
    sequences: HashMap<SequenceId, SequenceView>,
    media: HashMap<MediaId, MediaView>,
}

impl TimelineProjection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sequence(&self, id: SequenceId) -> Option<&SequenceView> {
        self.sequences.get(&id)
    }

    pub fn sequence_ids(&self) -> impl Iterator<Item = SequenceId> + '_ {
        self.sequences.keys().copied()
    }

    /// Sequence containing the given clip, if any.
    pub fn sequence_of_clip(&self, clip_id: ClipId) -> Option<&SequenceView> {
        self.sequences.values().find(|s| s.contains_clip(clip_id))
    }

    /// Sequence owning the given track, if any.
    pub fn sequence_of_track(&self, track_id: TrackId) -> Option<&SequenceView> {
        self.sequences.values().find(|s| s.track(track_id).is_some())
    }

    pub fn media(&self, id: MediaId) -> Option<&MediaView> {
        self.media.get(&id)
    }

    pub fn media_map(&self) -> &HashMap<MediaId, MediaView> {
        &self.media
    }

    /// Wholesale-replace one sequence (the explicit reload path).
    pub fn load_sequence(&mut self, view: SequenceView) {
        self.sequences.insert(view.id, view);
    }

    pub fn insert_media(&mut self, media: MediaView) {
        self.media.insert(media.id, media);
    }

    pub fn clear(&mut self) {
        self.sequences.clear();
        self.media.clear();
    }

    /// Diff-apply a mutation batch.
    ///
    /// Clip updates inside the batch are deferred and applied atomically at
    /// the end (see [`SequenceView::update_clips`]). On error the batch may
    /// be partially applied; the caller is expected to reload from storage.
    pub fn apply(&mut self, batch: &MutationBatch) -> Result<(), TimelineError> {
        let mut clip_updates: Vec<ClipView> = Vec::new();

        for mutation in &batch.mutations {
            match mutation {
                Mutation::InsertSequence { id, name, rate } => {
                    self.sequences
                        .insert(*id, SequenceView::new(*id, name.clone(), *rate));
                }
                Mutation::InsertTrack {
                    id,
                    sequence_id,
                    track_type,
                    index,
                    name,
                } => {
                    let seq = self.sequence_mut(*sequence_id)?;
                    seq.add_track(TrackView::new(*id, *track_type, *index, name.clone()));
                }
                Mutation::DeleteTrack {
                    sequence_id,
                    track_id,
                } => {
                    self.sequence_mut(*sequence_id)?.remove_track(*track_id)?;
                }
                Mutation::InsertMedia(media) => {
                    self.media.insert(media.id, media.clone());
                }
                Mutation::InsertClip(clip) => {
                    let seq = self
                        .sequence_of_track(clip.track_id)
                        .map(|s| s.id)
                        .ok_or(TimelineError::UnknownTrack(clip.track_id))?;
                    self.sequence_mut(seq)?.insert_clip(clip.clone())?;
                }
                Mutation::UpdateClip(clip) => {
                    clip_updates.push(clip.clone());
                }
                Mutation::DeleteClip {
                    sequence_id,
                    clip_id,
                } => {
                    self.sequence_mut(*sequence_id)?.remove_clip(*clip_id)?;
                }
                Mutation::SetPlayhead { sequence_id, count } => {
                    self.sequence_mut(*sequence_id)?.playhead = *count;
                }
                Mutation::SetSelection {
                    sequence_id,
                    selection,
                } => {
                    self.sequence_mut(*sequence_id)?.selection = selection.clone();
                }
            }
        }

        if !clip_updates.is_empty() {
            let sequence_id = batch
                .sequence_id
                .ok_or_else(|| TimelineError::UnknownClip(clip_updates[0].id))?;
            self.sequence_mut(sequence_id)?.update_clips(&clip_updates)?;
            debug!(
                sequence = %sequence_id,
                clips = clip_updates.len(),
                "Applied clip geometry updates"
            );
        }

        Ok(())
    }

    fn sequence_mut(&mut self, id: SequenceId) -> Result<&mut SequenceView, TimelineError> {
        self.sequences
            .get_mut(&id)
            .ok_or(TimelineError::UnknownSequence(id))
    }
}
