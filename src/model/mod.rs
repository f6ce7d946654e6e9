//! Data model: module instances, targets, styles, and rules.
//!
//! All data is supplied by the host (an asset browser, a rule store) and
//! treated as immutable input. Everything the engine produces is derived
//! from it on each call.
//!
//! # Key Components
//!
//! - **Ids**: [`ModuleId`], [`TargetId`], [`StyleId`], [`TargetRef`]
//! - **Structure**: [`ModuleInstance`], [`Target`], [`ModuleType`], [`Style`]
//! - **Rules**: [`InternalExclusion`], [`CrossExclusion`],
//!   [`WeightConstraint`], collected in a [`RuleSet`]
//! - **Derived values**: [`Combination`], [`WeightMap`]

mod ids;
mod look;
mod rules;
mod style;

pub use ids::{ModuleId, ParseTargetRefError, StyleId, TargetId, TargetRef};
pub use look::{Combination, WeightMap};
pub use rules::{
    CrossExclusion, InternalExclusion, Rule, RuleSet, RuleViolation, WeightConstraint,
    WEIGHT_EPSILON,
};
pub use style::{
    ModuleInstance, ModuleType, Style, Target, MAX_CANDIDATES, MAX_MODULES_PER_STYLE,
    MAX_TARGETS_PER_MODULE, TARGET_ENVELOPE,
};
