//! Engine configuration.
//!
//! [`EngineConfig`] holds every parameter a regeneration depends on:
//! timeline layout, the frame budget, and combination ordering.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Configuration for combination generation and timeline assembly.
///
/// # Defaults
///
/// ```
/// use u_lookbook::EngineConfig;
///
/// let config = EngineConfig::default();
/// assert_eq!(config.frame_step, 10);
/// assert_eq!(config.max_frames, 6000);
/// assert_eq!(config.start_frame, 0);
/// assert!(config.order_seed.is_none());
/// ```
///
/// # Builder Pattern
///
/// ```
/// use u_lookbook::EngineConfig;
///
/// let config = EngineConfig::default()
///     .with_frame_step(5)
///     .with_start_frame(1)
///     .with_order_seed(42);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineConfig {
    /// Frames held per combination.
    pub frame_step: u32,

    /// Frame budget for the whole timeline.
    ///
    /// Combinations that do not fit are reported, not dropped silently.
    pub max_frames: u32,

    /// First frame of the first block.
    pub start_frame: i64,

    /// Seed for a reproducible shuffle of the combination order.
    ///
    /// `None` keeps the deterministic order: lexicographic by module
    /// order, then target.
    pub order_seed: Option<u64>,

    /// Drop the neutral (nothing active) combination.
    pub skip_empty: bool,

    /// Drop combinations with more active targets than this.
    pub max_active_targets: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_step: 10,
            max_frames: 6000,
            start_frame: 0,
            order_seed: None,
            skip_empty: false,
            max_active_targets: None,
        }
    }
}

impl EngineConfig {
    pub fn with_frame_step(mut self, step: u32) -> Self {
        self.frame_step = step;
        self
    }

    pub fn with_max_frames(mut self, frames: u32) -> Self {
        self.max_frames = frames;
        self
    }

    pub fn with_start_frame(mut self, frame: i64) -> Self {
        self.start_frame = frame;
        self
    }

    pub fn with_order_seed(mut self, seed: u64) -> Self {
        self.order_seed = Some(seed);
        self
    }

    pub fn with_skip_empty(mut self, skip: bool) -> Self {
        self.skip_empty = skip;
        self
    }

    pub fn with_max_active_targets(mut self, n: usize) -> Self {
        self.max_active_targets = Some(n);
        self
    }

    /// Number of whole combinations the frame budget can hold.
    pub fn capacity(&self) -> usize {
        if self.frame_step == 0 {
            return 0;
        }
        (self.max_frames / self.frame_step) as usize
    }

    /// Validates the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        if self.frame_step == 0 {
            return Err(crate::ValidationError::config("frame_step must be positive"));
        }
        if self
            .start_frame
            .checked_add(i64::from(self.max_frames))
            .is_none()
        {
            return Err(crate::ValidationError::config(
                "start_frame + max_frames overflows the frame range",
            ));
        }
        Ok(())
    }
}
