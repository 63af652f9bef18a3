//! `splice-timeline` -- the in-memory timeline model.
//!
//! Holds the materialized projection of the current edit state (sequences,
//! tracks, clips, playhead, selection) and the ripple/roll constraint solver
//! that turns edge drags into legal per-clip edits. Everything in this crate
//! is pure: no persistence, no I/O. The kernel feeds it mutation batches and
//! reads views back out.

pub mod error;
pub mod item;
pub mod mutation;
pub mod projection;
pub mod solver;

pub use error::TimelineError;
pub use item::{Edge, EdgeSelection};
pub use mutation::{Mutation, MutationBatch};
pub use projection::{
    ClipView, MediaView, SequenceView, TimelineProjection, TrackType, TrackView,
};
pub use solver::{solve, ClipEdit, RippleOutcome, RipplePreview};
