//! Dependency graph module.
//!
//! # Overview
//!
//! ```text
//! declare_free / declare_relation  (one mutator, see crate::gather)
//!        ↓
//! store::DepGraph   (forward + reverse adjacency, ready set, free set)
//!        ↓  Iterator::next
//! ordered Node stream
//!        ↓  once exhausted
//! cycles::CycleReport::from_graph   (residual edges, if any)
//! ```

pub mod cycles;
pub mod store;

pub use cycles::CycleReport;
pub use store::DepGraph;
