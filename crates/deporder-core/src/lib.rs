#![forbid(unsafe_code)]
//! deporder-core library.
//!
//! Computes a deterministic processing order for a set of named sources
//! that declare `before:` / `after:` constraints on one another.
//!
//! ```text
//! source::discover_sources ─▶ gather::gather ─▶ graph::DepGraph ─▶ Iterator<Node>
//!                               (parallel read,     (single owner)      ↓ exhausted
//!                                serialized merge)              graph::CycleReport
//! ```
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums carrying an [`error::ErrorCode`].
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod config;
pub mod error;
pub mod extract;
pub mod gather;
pub mod graph;
pub mod relation;
pub mod source;

pub use error::{ErrorCode, OrderError, SourceError};
pub use extract::{HeaderExtractor, RelationExtractor};
pub use gather::{GatherOptions, GatherReport, gather};
pub use graph::{CycleReport, DepGraph};
pub use relation::{Direction, Node, Relation};
pub use source::{Source, discover_sources};
