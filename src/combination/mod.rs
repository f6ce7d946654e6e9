//! Combination generator.
//!
//! Cartesian-products the locally valid subsets of each module instance in
//! style order, merges every tuple into one candidate, and drops candidates
//! that contain both ends of a cross-module exclusion.
//!
//! # Ordering
//!
//! Output is sorted lexicographically by module position, then target id,
//! so identical inputs give identical order. A seed in
//! [`EngineConfig::order_seed`](crate::EngineConfig::order_seed) replaces
//! that order with a reproducible shuffle.
//!
//! # Complexity
//!
//! The product of the per-module subset counts. The documented envelope is
//! four modules of four targets each (at most 65 536 candidates).

mod generator;

pub use generator::{CombinationGenerator, GenerationResult};
