//! Structured error types for granule
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! Infeasibility is deliberately absent here: an integer program with no
//! feasible assignment is an ordinary outcome (see `solver::Attempt`), not an
//! error.

use granule_common::{RegionId, StoreError};
use std::path::PathBuf;
use thiserror::Error;

/// Failures of the integer-program backend. All of these are unrecoverable:
/// they mean the formulation or the solver integration is broken.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Solver resolved binary variable of {region} to {value}")]
    ContractViolation { region: RegionId, value: f64 },

    #[error("Solver returned {got} values for {expected} variables")]
    AssignmentLength { expected: usize, got: usize },

    #[error("Solver backend failed: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum SelectError {
    #[error("Tolerated error {0}% is not on the tolerance ladder")]
    ToleranceNotOnLadder(f64),

    #[error("Cannot load region graph: {0}")]
    GraphUnavailable(String),

    #[error("Failed to write report {path}: {source}")]
    ReportFailed { path: PathBuf, source: std::io::Error },

    #[error(transparent)]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Coverage step must be positive, got {0}")]
    InvalidStep(f64),

    #[error("Maximum coverage must be within [0, 100], got {0}")]
    MaxCoverageOutOfRange(f64),

    #[error("Coverage step {step} needs more than {limit} attempts per tolerance")]
    StepTooSmall { step: f64, limit: u32 },

    #[error("At least one solver job is required")]
    ZeroJobs,

    #[error("Measures directory {0} does not exist")]
    MissingMeasuresDir(PathBuf),
}
