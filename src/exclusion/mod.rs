//! Exclusion graph builder.
//!
//! Turns a module instance's internal exclusion pairs into an undirected
//! graph and enumerates every locally valid target subset: the independent
//! sets of that graph, including the empty set.
//!
//! # Design
//!
//! Enumeration is a filtered power set, which is cheap inside the
//! documented envelope of four targets per module. Larger modules are
//! accepted up to a hard limit and logged. A maximal-independent-set
//! enumerator can replace the power set later without changing
//! [`valid_local_subsets`].

mod graph;

pub use graph::{valid_local_subsets, ExclusionGraph};
