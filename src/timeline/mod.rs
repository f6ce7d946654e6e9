//! Timeline assembler.
//!
//! Places each resolved combination in its own fixed-size frame block and
//! keys it as a held step function: every block opens with a reset of all
//! style targets to 0, immediately followed by the block's non-zero
//! weights.
//!
//! # Frame Budget
//!
//! The timeline never exceeds `max_frames`. Combinations that do not fit
//! are never split across the boundary; they are returned in an
//! [`OverflowReport`] so the host can decide what to show.
//!
//! # Determinism
//!
//! The same inputs always produce the same timeline, down to the order of
//! step keys.

mod assembler;
mod types;

pub use assembler::TimelineAssembler;
pub use types::{
    ExcludedLook, FrameRange, KeyKind, OverflowReport, ResolvedLook, StepKey, Timeline,
    TimelineEntry,
};
