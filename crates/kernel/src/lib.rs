//! `splice-kernel` -- the editing kernel.
//!
//! Every timeline mutation is a command appended to a persistent,
//! branchable log; the visible timeline is a materialized projection of
//! that log. Undo and redo navigate the parent-linked command tree and
//! replay state deterministically, bounded by periodic snapshots.
//!
//! The public surface is [`CommandLog`]: `execute`, `undo`, `redo`,
//! `jump_to`, `preview_ripple`, and the projection accessors.

pub mod command;
pub mod error;
pub mod log;

mod snapshot;
mod state;

pub use command::{
    AddMediaArgs, AddTrackArgs, CommandKind, CreateSequenceArgs, DeleteClipArgs, ExecutionOutcome,
    InsertClipArgs, MoveClipArgs, RemoveTrackArgs, TrimEdgesArgs,
};
pub use error::{
    CommandError, ConstraintViolation, ReplayIntegrityError, UndoTreeError, ValidationError,
};
pub use log::{CommandLog, HistoryStats};
