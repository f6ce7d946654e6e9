//! Weight resolver.
//!
//! Computes the resolved weight of every target for a combination: 1.0
//! when active, 0.0 otherwise, then clamped by each weight constraint
//! whose full target set is active.
//!
//! With the `parallel` feature, [`WeightResolver::resolve_all`] resolves
//! combinations on the rayon thread pool.

mod resolver;

pub use resolver::{resolve_weights, WeightResolver};
