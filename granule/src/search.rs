//! Coverage relaxation search.
//!
//! Which coverage is reachable under a given error bound has no closed form:
//! it depends on which regions match and on how they nest. The search
//! discovers it by linear backoff, from the highest floor down:
//!
//! ```text
//! floor = max_coverage
//! loop:
//!     solve_under_coverage(floor)  ──► Solved   → return (selection, floor)
//!                                  └─► Unsolvable → floor -= step
//! until the first floor <= 0 has been tried
//! ```
//!
//! Infeasible floors are expected along the way and only logged at debug
//! level. The step trades precision of the reported coverage for solve count.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use granule_common::{Reachability, RegionGraph, RegionId};
use log::debug;
use std::collections::BTreeSet;

use crate::annotation::Annotations;
use crate::domain::{ConfigError, SolverError};
use crate::selection::Selection;
use crate::solver::{solve_under_coverage, Attempt, SolverBackend};

pub const DEFAULT_MAX_COVERAGE: f64 = 100.0;
pub const DEFAULT_STEP: f64 = 5.0;

/// Upper bound on coverage floors tried for one tolerance.
pub const MAX_FLOORS: u32 = 10_000;

/// Result of a relaxation search for one error tolerance.
#[derive(Debug, Clone, PartialEq)]
pub enum Relaxation {
    Found { annotations: Annotations, selection: Selection, coverage: f64 },
    /// No floor, down to and including the first non-positive one, was
    /// feasible.
    Unsolvable { annotations: Annotations },
}

impl Relaxation {
    /// Achieved coverage floor, if any floor was feasible.
    #[must_use]
    pub fn coverage(&self) -> Option<f64> {
        match self {
            Relaxation::Found { coverage, .. } => Some(*coverage),
            Relaxation::Unsolvable { .. } => None,
        }
    }

    #[must_use]
    pub fn annotations(&self) -> &Annotations {
        match self {
            Relaxation::Found { annotations, .. } | Relaxation::Unsolvable { annotations } => {
                annotations
            }
        }
    }
}

/// Backoff parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelaxationSearch {
    max_coverage: f64,
    step: f64,
}

impl Default for RelaxationSearch {
    fn default() -> Self {
        Self { max_coverage: DEFAULT_MAX_COVERAGE, step: DEFAULT_STEP }
    }
}

impl RelaxationSearch {
    /// # Errors
    /// A non-positive (or NaN) step, a maximum outside `[0, 100]`, or a
    /// step so small that more than [`MAX_FLOORS`] floors would be tried.
    pub fn new(max_coverage: f64, step: f64) -> Result<Self, ConfigError> {
        if step.is_nan() || step <= 0.0 {
            return Err(ConfigError::InvalidStep(step));
        }
        if !(0.0..=100.0).contains(&max_coverage) {
            return Err(ConfigError::MaxCoverageOutOfRange(max_coverage));
        }
        if (max_coverage / step).ceil() >= f64::from(MAX_FLOORS) {
            return Err(ConfigError::StepTooSmall { step, limit: MAX_FLOORS });
        }
        Ok(Self { max_coverage, step })
    }

    #[must_use]
    pub fn max_coverage(&self) -> f64 {
        self.max_coverage
    }

    #[must_use]
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Floors tried, in order: `max, max - step, ...`, ending with the first
    /// floor that is `<= 0`.
    pub fn floors(&self) -> impl Iterator<Item = f64> {
        let Self { max_coverage, step } = *self;
        let last = (max_coverage / step).ceil() as u32;
        (0..=last).map(move |k| max_coverage - f64::from(k) * step)
    }

    /// Best achievable coverage floor for error tolerance `err`. Regions in
    /// `invalid` are never selected.
    ///
    /// # Errors
    /// Only solver failures; infeasibility is reported as
    /// [`Relaxation::Unsolvable`].
    pub fn solve<B: SolverBackend + ?Sized>(
        &self,
        graph: &RegionGraph,
        reach: &Reachability,
        backend: &B,
        err: f64,
        invalid: &BTreeSet<RegionId>,
    ) -> Result<Relaxation, SolverError> {
        let mut annotations = Annotations::for_tolerance(graph, err).excluding(invalid);

        for floor in self.floors() {
            match solve_under_coverage(graph, reach, &annotations, floor, backend)? {
                Attempt::Solved(selection) => {
                    debug!(
                        "Error {err}%: feasible at coverage {floor} ({} regions)",
                        selection.len()
                    );
                    annotations.mark_selected(&selection);
                    return Ok(Relaxation::Found { annotations, selection, coverage: floor });
                }
                Attempt::Unsolvable => debug!("Error {err}%: coverage {floor} unreachable"),
            }
        }

        Ok(Relaxation::Unsolvable { annotations })
    }
}
