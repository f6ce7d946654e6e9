//! Validation errors.
//!
//! Only malformed input is an error. Timeline overflow and propagation
//! problems are ordinary results and travel as data
//! ([`OverflowReport`](crate::timeline::OverflowReport),
//! [`PropagationWarning`](crate::propagation::PropagationWarning)).

use crate::model::{ModuleId, ModuleType, StyleId, TargetId, TargetRef};
use thiserror::Error;

/// Malformed module, rule, style, or configuration data.
///
/// Any of these aborts a regeneration before partial output is produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("style {style} has {count} module instances (at most {limit} allowed)")]
    TooManyModules {
        style: StyleId,
        count: usize,
        limit: usize,
    },

    #[error("style {style} has more than one {module_type} module")]
    DuplicateModuleType {
        style: StyleId,
        module_type: ModuleType,
    },

    #[error("style {style} lists module {module} more than once")]
    DuplicateModule { style: StyleId, module: ModuleId },

    #[error("module {module} lists target {target} more than once")]
    DuplicateTarget { module: ModuleId, target: TargetId },

    #[error("module {module} has {count} targets (at most {limit} allowed)")]
    TooManyTargets {
        module: ModuleId,
        count: usize,
        limit: usize,
    },

    #[error("style {style} would produce {count} candidate combinations (at most {limit} allowed)")]
    TooManyCandidates {
        style: StyleId,
        count: usize,
        limit: usize,
    },

    #[error("unknown module: {0}")]
    UnknownModule(ModuleId),

    #[error("unknown target: {0}")]
    UnknownTarget(TargetRef),

    #[error("target {0} cannot exclude itself")]
    SelfExclusion(TargetRef),

    #[error("cross-module exclusion {a} / {b} stays within one module")]
    SameModuleCrossExclusion { a: TargetRef, b: TargetRef },

    #[error("weight constraint has {targets} targets but {max_weights} max weights")]
    ConstraintLengthMismatch { targets: usize, max_weights: usize },

    #[error("weight constraint needs at least 2 targets, got {0}")]
    ConstraintTooSmall(usize),

    #[error("weight constraint references {0} more than once")]
    ConstraintRepeatsTarget(TargetRef),

    #[error("max weight {value} for {target} is outside [0, 1]")]
    MaxWeightOutOfRange { target: TargetRef, value: f64 },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl ValidationError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ValidationError>;
