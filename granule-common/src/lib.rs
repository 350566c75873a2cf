//! # Shared Region Graph Model
//!
//! Data structures shared between the granularity selector and the tools that
//! produce or consume region graphs. Everything here is independent of the
//! integer-program machinery in the `granule` crate.
//!
//! ## Key Types
//!
//! - [`RegionGraph`] - Acyclic nesting graph of profiled regions
//! - [`Region`] - One candidate region with its error/coverage measures
//! - [`Reachability`] - Precomputed transitive closure (ancestor queries)
//! - [`RegionStore`] - Load/save hand-off for region graphs
//! - [`InvalidRegions`] - Append-only exclusion list applied before selection
//!
//! ## Nesting Semantics
//!
//! An edge `parent -> child` means `parent` structurally encloses `child`
//! (an outer loop around an inner loop, a function around its loops).
//! Ancestry is the transitive closure of these edges.

pub mod graph;
pub mod invalid;
pub mod reachability;
pub mod region;
pub mod store;

pub use graph::{GraphError, RegionGraph};
pub use invalid::InvalidRegions;
pub use reachability::Reachability;
pub use region::{Region, RegionId};
pub use store::{JsonFileStore, MemoryStore, RegionStore, StoreError};
