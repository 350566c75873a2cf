//! # Granule - Replay Granularity Selector
//!
//! Granule decides which profiled program regions should be replayed at
//! coarse granularity. Every candidate region carries two measures: the
//! approximation error of replaying it coarsely, and its share of total
//! execution time (coverage). Granule picks a set of regions that stays
//! within an error tolerance, reaches as much coverage as possible, and never
//! contains a region together with one of its enclosing or enclosed regions.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Region graph (graph.json)                      │
//! │        regions: name, error %, coverage %  +  nesting edges     │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ RegionStore::load_graph
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Granule (This Crate)                         │
//! │                                                                 │
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐        │
//! │  │   Selector   │──▶│  Relaxation  │──▶│   Coverage   │        │
//! │  │ (ladder run) │   │    Search    │   │    Solver    │        │
//! │  └──────────────┘   └──────────────┘   └──────┬───────┘        │
//! │         │                                     │                 │
//! │         ▼                                     ▼                 │
//! │  ┌──────────────┐                      ┌──────────────┐        │
//! │  │    Report    │                      │  MILP backend│        │
//! │  │ (csv/stderr) │                      │  (microlp)   │        │
//! │  └──────────────┘                      └──────────────┘        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`solver`]: the integer program for one (tolerance, coverage floor)
//!   pair, and the backend that solves it
//! - [`search`]: linear backoff over coverage floors for one tolerance
//! - [`selector`]: sweep of the tolerated-error ladder, final solve,
//!   reporting and persistence
//! - [`annotation`]: per-solve `matching`/`selected` snapshots
//! - [`report`]: error/coverage table and selection listing
//! - [`domain`]: error types and the tolerated-error ladder
//! - [`cli`]: command-line arguments and run configuration
//!
//! The region graph model, its transitive closure and its persistence live in
//! the `granule-common` crate.
//!
//! ## Typical Usage
//!
//! ```bash
//! # Sweep the ladder and select for 15% tolerated error
//! granule --measures-dir measures select --error 15
//!
//! # Exclude a region that failed to replay, then select again
//! granule --measures-dir measures invalid mark loop_42
//! ```

pub mod annotation;
pub mod cli;
pub mod domain;
pub mod report;
pub mod search;
pub mod selection;
pub mod selector;
pub mod solver;

pub use selector::{GranularitySelector, RunSummary, SelectorConfig};
