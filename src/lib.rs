//! Combinatorial blendshape look generation.
//!
//! Given a style made of up to four module instances (scalp, crown, tail,
//! bang), each owning a handful of deformation-weight targets, the engine
//! enumerates every combination of simultaneously active targets that the
//! style's rules allow, resolves each combination's weights, and lays the
//! results out on a bounded frame timeline for review.
//!
//! - **Exclusion graphs** ([`exclusion`]): per-module valid target subsets.
//! - **Combination generation** ([`combination`]): cartesian merge across
//!   modules with cross-module exclusions applied.
//! - **Weight resolution** ([`weights`]): 1.0/0.0 weights with weight
//!   constraint clamps.
//! - **Timeline assembly** ([`timeline`]): fixed frame blocks, held step
//!   keys, and overflow reports.
//! - **Rule propagation** ([`propagation`]): union a new rule into every
//!   style sharing its module instances.
//! - **Regeneration diff** ([`diff`]): preview what a regenerate would
//!   invalidate.
//!
//! # Architecture
//!
//! Every stage is a pure, synchronous function over host-supplied data.
//! The engine performs no I/O; persistence and display belong to the host.
//! [`Regenerator`] chains generation, resolution and assembly with
//! validation up front and optional cooperative cancellation.

pub mod combination;
pub mod config;
pub mod diff;
pub mod error;
pub mod exclusion;
pub mod model;
pub mod pipeline;
pub mod propagation;
pub mod random;
pub mod timeline;
pub mod weights;

pub use config::EngineConfig;
pub use error::{Result, ValidationError};
pub use pipeline::{regenerate, regenerate_with_cancel, resolve_looks, Regenerator};
