//! `splice-common` -- Shared foundation types for the Splice editing kernel.
//!
//! This crate is the foundation that the store, timeline, and kernel crates
//! depend on. It defines:
//!
//! - **Time**: `RationalTime` / `FrameRate` -- exact frame/sample arithmetic
//!   as integer (count, rate) pairs. Never floating point, never a defaulted
//!   rate.
//! - **Ids**: `ProjectId`, `SequenceId`, `TrackId`, `ClipId`, `MediaId`
//!   (UUID newtypes for type safety)
//! - **Selection**: `SelectionState`, captured before and after every
//!   command so undo/redo can restore it
//! - **Config**: `KernelConfig` (snapshot interval and tuning knobs)
//! - **Errors**: `TimeError` (thiserror-based)

pub mod config;
pub mod error;
pub mod ids;
pub mod selection;
pub mod time;

// Re-export commonly used items at crate root.
pub use config::KernelConfig;
pub use error::TimeError;
pub use ids::{ClipId, MediaId, ProjectId, SequenceId, TrackId};
pub use selection::SelectionState;
pub use time::{FrameRate, RationalTime};
