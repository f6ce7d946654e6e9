//! Timeline value types.

use crate::model::{Combination, TargetRef, WeightMap};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Half-open frame interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FrameRange {
    pub start: i64,
    pub end: i64,
}

impl FrameRange {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> i64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    pub fn contains(&self, frame: i64) -> bool {
        self.start <= frame && frame < self.end
    }
}

/// A combination with its resolved weights, ready for layout.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResolvedLook {
    pub combination: Combination,
    pub weights: WeightMap,
}

/// What a step key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum KeyKind {
    /// Returns a target to 0 at the start of a block.
    Reset,
    /// Sets a target's resolved weight for the rest of the block.
    Set,
}

/// A held (stepped) key on one target channel.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StepKey {
    pub frame: i64,
    pub target: TargetRef,
    pub weight: f64,
    pub kind: KeyKind,
}

/// One combination placed on the timeline.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimelineEntry {
    /// Position in the timeline.
    pub index: usize,
    pub frames: FrameRange,
    pub combination: Combination,
    pub weights: WeightMap,
}

/// A combination left off the timeline by the frame budget.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ExcludedLook {
    /// Position the combination had in the input order.
    pub index: usize,
    pub combination: Combination,
}

/// Describes combinations that did not fit in `max_frames`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OverflowReport {
    /// Frames needed to show every combination.
    pub required_frames: u64,
    pub max_frames: u32,
    /// Combinations that made it onto the timeline.
    pub fitted: usize,
    /// Combinations left off, in input order.
    pub excluded: Vec<ExcludedLook>,
}

impl OverflowReport {
    pub fn excluded_count(&self) -> usize {
        self.excluded.len()
    }
}

/// Ordered, frame-indexed sequence of combinations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Timeline {
    pub frame_step: u32,
    pub start_frame: i64,
    pub max_frames: u32,
    pub entries: Vec<TimelineEntry>,
    /// Step keys in frame order; each block opens with resets followed by
    /// the block's non-zero weights.
    pub keys: Vec<StepKey>,
    /// Present when combinations were left off.
    pub overflow: Option<OverflowReport>,
}

impl Timeline {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Frames used by the placed entries.
    pub fn total_frames(&self) -> u64 {
        self.entries.len() as u64 * u64::from(self.frame_step)
    }

    /// First frame after the last block.
    pub fn end_frame(&self) -> i64 {
        self.entries
            .last()
            .map_or(self.start_frame, |entry| entry.frames.end)
    }

    pub fn is_truncated(&self) -> bool {
        self.overflow.is_some()
    }

    /// Entry whose block covers `frame`.
    pub fn entry_at(&self, frame: i64) -> Option<&TimelineEntry> {
        if frame < self.start_frame || self.frame_step == 0 {
            return None;
        }
        let offset = frame.checked_sub(self.start_frame)?;
        let index = usize::try_from(offset / i64::from(self.frame_step)).ok()?;
        self.entries.get(index)
    }

    pub fn combinations(&self) -> impl Iterator<Item = &Combination> {
        self.entries.iter().map(|e| &e.combination)
    }
}
