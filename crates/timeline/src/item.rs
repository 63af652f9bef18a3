//! The item abstraction: clips and gaps under one roof.
//!
//! Ripple and roll operate on *items*, where an item is either a real clip or
//! an ephemeral gap materialized over empty space. Gaps carry an unbounded
//! source range, so the same edge-trim arithmetic applies to both without
//! special cases. Gaps are never persisted and never appear in a selection;
//! the solver synthesizes them next to selected edges and discards them with
//! the result.

use serde::{Deserialize, Serialize};
use splice_common::ClipId;

/// One side of an item.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Left,
    Right,
}

/// A selected edge, as supplied by the caller. Only clip edges are
/// selectable; gap edges exist only inside the solver.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeSelection {
    pub clip: ClipId,
    pub edge: Edge,
}

impl EdgeSelection {
    pub fn left(clip: ClipId) -> Self {
        Self {
            clip,
            edge: Edge::Left,
        }
    }

    pub fn right(clip: ClipId) -> Self {
        Self {
            clip,
            edge: Edge::Right,
        }
    }
}

/// Identity of a solver work item.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum ItemId {
    Clip(ClipId),
    /// Index into the solver's per-run gap arena.
    Gap(u32),
}

impl ItemId {
    pub(crate) fn is_gap(self) -> bool {
        matches!(self, ItemId::Gap(_))
    }
}
