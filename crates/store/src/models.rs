//! Row models for the project database.
//!
//! Rows are deliberately plain (strings and integers) so they serialize
//! losslessly into snapshot payloads and map 1:1 onto the schema. Conversion
//! to domain types (typed ids, `FrameRate`) happens at the kernel boundary
//! and fails loudly on malformed data.

use serde::{Deserialize, Serialize};
use splice_common::{FrameRate, TimeError};

/// One row of `projects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: String,
    pub name: String,
    /// Sequence number of the command the materialized state reflects
    /// (0 = empty root). Persisted so a reopened project knows where in the
    /// undo tree it stands.
    pub cursor_sequence_number: i64,
    pub created_at: String,
}

/// One row of `sequences`. Playhead and selection live here so that a replay
/// target that coincides with a snapshot restores them from the row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SequenceRow {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub rate_num: i32,
    pub rate_den: i32,
    pub playhead_count: i64,
    pub selection_json: String,
    pub created_at: String,
}

impl SequenceRow {
    pub fn rate(&self) -> Result<FrameRate, TimeError> {
        FrameRate::new(self.rate_num, self.rate_den)
    }
}

/// One row of `tracks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TrackRow {
    pub id: String,
    pub sequence_id: String,
    /// `"video"` or `"audio"` (schema-enforced).
    pub track_type: String,
    pub track_index: i32,
    pub name: String,
}

/// One row of `media`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MediaRow {
    pub id: String,
    pub project_id: String,
    pub file_path: String,
    pub duration_count: i64,
    pub rate_num: i32,
    pub rate_den: i32,
}

impl MediaRow {
    pub fn rate(&self) -> Result<FrameRate, TimeError> {
        FrameRate::new(self.rate_num, self.rate_den)
    }
}

/// One row of `clips`.
///
/// `start_count` and `duration_count` are in the owning sequence's rate (the
/// timeline axis); `source_in_count`/`source_out_count` are in the clip's own
/// rate `(rate_num, rate_den)`, which may differ (e.g. audio samples inside a
/// video-rate sequence).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClipRow {
    pub id: String,
    pub track_id: String,
    pub media_id: Option<String>,
    pub start_count: i64,
    pub duration_count: i64,
    pub source_in_count: i64,
    pub source_out_count: i64,
    pub rate_num: i32,
    pub rate_den: i32,
}

impl ClipRow {
    pub fn rate(&self) -> Result<FrameRate, TimeError> {
        FrameRate::new(self.rate_num, self.rate_den)
    }
}

/// One row of `commands`. Never mutated after commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CommandRow {
    pub sequence_number: i64,
    /// `None` only for commands whose parent is the empty root.
    pub parent_sequence_number: Option<i64>,
    pub project_id: String,
    /// Sequence the command edited, if any (project-level commands such as
    /// media imports carry `None`).
    pub sequence_id: Option<String>,
    pub kind: String,
    pub args_json: String,
    pub pre_selection_json: String,
    pub post_selection_json: String,
    pub playhead_pre: i64,
    pub playhead_post: i64,
    pub created_at: String,
}

/// One row of `snapshots`: the full state of one sequence immediately after
/// the command `sequence_number` committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SnapshotRow {
    pub sequence_number: i64,
    pub sequence_id: String,
    pub payload_json: String,
}
