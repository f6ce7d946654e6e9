//! Rule propagation index.
//!
//! A rule authored against module instances in one style is unioned into
//! every other style containing those same instances. Styles are found
//! through a host-supplied [`StyleCatalog`]; [`InMemoryCatalog`] is a
//! ready-made index for hosts that keep styles in memory.
//!
//! Propagation is additive and idempotent. When the catalog cannot answer,
//! the originating style is still updated and the failure comes back as a
//! [`PropagationWarning`].

mod catalog;
mod propagator;

pub use catalog::{CatalogError, InMemoryCatalog, StyleCatalog};
pub use propagator::{PropagationOutcome, PropagationWarning, RulePropagator};
