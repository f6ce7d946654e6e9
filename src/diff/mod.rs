//! Regeneration differ.
//!
//! Before a host throws away a keyed timeline and regenerates it, the
//! differ shows which frame ranges would disappear under the new rules,
//! which would change weight, and how many new combinations would appear.
//! Combinations are matched by target-set identity.

mod differ;

pub use differ::{DiffReport, InvalidRange, RegenerationDiffer, ReweightedRange};
