//! Domain model for granule
//!
//! This module contains core domain types and errors that provide:
//! - Compile-time safety via newtype pattern (`Tolerance`)
//! - Structured error handling

pub mod errors;
pub mod ladder;

pub use errors::{ConfigError, SelectError, SolverError};
pub use ladder::{Tolerance, TOLERATED_ERRORS};
