//! Coverage solver: one integer program per (tolerance, coverage floor).
//!
//! # Formulation
//!
//! One binary variable `x_r` per region, in ascending region id order.
//!
//! ```text
//! minimise    Σ coverage_r · x_r
//! subject to  Σ coverage_r · x_r  >= min_coverage
//!             x_r = 0                          for every non-matching r
//!             x_a + x_d <= 1                   for every ancestor a of d
//! ```
//!
//! Among the selections that reach the floor, the one with the smallest
//! total coverage is returned. The exclusion rows cover the full transitive
//! closure, not only direct parent/child edges, so the program has O(n²)
//! rows in the worst case.
//!
//! The program is built as plain data ([`CoverageProgram`]) and handed to a
//! [`SolverBackend`]. Infeasibility is an ordinary [`Attempt::Unsolvable`]
//! outcome; only a broken backend produces an error.

pub mod microlp;

use granule_common::{Reachability, RegionGraph, RegionId};
use log::trace;

use crate::annotation::Annotations;
use crate::domain::SolverError;
use crate::selection::Selection;

pub use self::microlp::MicroLpBackend;

/// Distance from 0 or 1 still accepted as a binary value.
const BINARY_TOLERANCE: f64 = 1e-6;

/// The integer program for one solve, as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageProgram {
    /// Region behind each variable, ascending.
    variables: Vec<RegionId>,
    /// Objective and floor coefficients (region coverage), per variable.
    coefficients: Vec<f64>,
    min_coverage: f64,
    /// Variables forced to zero (regions outside the error tolerance).
    excluded: Vec<usize>,
    /// `(ancestor, descendant)` variable pairs that cannot both be one.
    conflicts: Vec<(usize, usize)>,
}

impl CoverageProgram {
    /// Build the program for `graph` under the flags in `annotations`.
    #[must_use]
    pub fn formulate(
        graph: &RegionGraph,
        reach: &Reachability,
        annotations: &Annotations,
        min_coverage: f64,
    ) -> Self {
        let variables: Vec<RegionId> = graph.ids().collect();
        let coefficients = graph.regions().map(|r| r.coverage).collect();

        let excluded = variables
            .iter()
            .enumerate()
            .filter(|&(_, &id)| !annotations.is_matching(id))
            .map(|(i, _)| i)
            .collect();

        // Variables are sorted by id, so positions come from a binary search
        let position = |id: RegionId| variables.binary_search(&id).ok();
        let conflicts = reach
            .ancestor_pairs()
            .filter_map(|(a, d)| Some((position(a)?, position(d)?)))
            .collect();

        Self { variables, coefficients, min_coverage, excluded, conflicts }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    #[must_use]
    pub fn variables(&self) -> &[RegionId] {
        &self.variables
    }

    #[must_use]
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    #[must_use]
    pub fn min_coverage(&self) -> f64 {
        self.min_coverage
    }

    #[must_use]
    pub fn excluded(&self) -> &[usize] {
        &self.excluded
    }

    #[must_use]
    pub fn conflicts(&self) -> &[(usize, usize)] {
        &self.conflicts
    }

    /// Objective value of a 0/1 assignment.
    #[must_use]
    pub fn objective(&self, chosen: &[bool]) -> f64 {
        self.coefficients.iter().zip(chosen).filter(|&(_, &on)| on).map(|(c, _)| c).sum()
    }

    /// True if the 0/1 assignment satisfies every constraint.
    #[must_use]
    pub fn is_satisfied_by(&self, chosen: &[bool]) -> bool {
        chosen.len() == self.len()
            && self.objective(chosen) >= self.min_coverage
            && self.excluded.iter().all(|&i| !chosen[i])
            && self.conflicts.iter().all(|&(a, d)| !(chosen[a] && chosen[d]))
    }
}

/// Raw result of a backend solve.
#[derive(Debug, Clone, PartialEq)]
pub enum Assignment {
    /// One value per program variable, in variable order.
    Feasible(Vec<f64>),
    Infeasible,
}

/// An integer-program solver able to handle a [`CoverageProgram`].
///
/// Implementations must be deterministic for a given program.
pub trait SolverBackend {
    fn name(&self) -> &'static str;

    /// Solve `program` to optimality.
    ///
    /// # Errors
    /// Backend failures other than infeasibility.
    fn solve(&self, program: &CoverageProgram) -> Result<Assignment, SolverError>;
}

impl<B: SolverBackend + ?Sized> SolverBackend for &B {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn solve(&self, program: &CoverageProgram) -> Result<Assignment, SolverError> {
        (**self).solve(program)
    }
}

/// Outcome of one solve at a fixed coverage floor.
#[derive(Debug, Clone, PartialEq)]
pub enum Attempt {
    Solved(Selection),
    /// No assignment satisfies the floor, the tolerance and the exclusions.
    Unsolvable,
}

/// Pick a minimal-coverage set of matching, mutually unnested regions whose
/// coverage reaches `min_coverage`.
///
/// # Errors
/// [`SolverError`] if the backend fails or returns a non-binary value.
pub fn solve_under_coverage<B: SolverBackend + ?Sized>(
    graph: &RegionGraph,
    reach: &Reachability,
    annotations: &Annotations,
    min_coverage: f64,
    backend: &B,
) -> Result<Attempt, SolverError> {
    let program = CoverageProgram::formulate(graph, reach, annotations, min_coverage);

    // Nothing to choose from: only a non-positive floor is reachable
    if program.is_empty() {
        return Ok(if min_coverage <= 0.0 {
            Attempt::Solved(Selection::new())
        } else {
            Attempt::Unsolvable
        });
    }

    trace!(
        "{}: {} variables, {} exclusions, {} conflicts, floor {min_coverage}",
        backend.name(),
        program.len(),
        program.excluded().len(),
        program.conflicts().len()
    );

    match backend.solve(&program)? {
        Assignment::Feasible(values) => decode(&program, &values).map(Attempt::Solved),
        Assignment::Infeasible => Ok(Attempt::Unsolvable),
    }
}

/// Turn backend values into a selection, rejecting anything that is not 0 or 1.
fn decode(program: &CoverageProgram, values: &[f64]) -> Result<Selection, SolverError> {
    if values.len() != program.len() {
        return Err(SolverError::AssignmentLength { expected: program.len(), got: values.len() });
    }

    let mut selection = Selection::new();
    for (&region, &value) in program.variables().iter().zip(values) {
        if (value - 1.0).abs() <= BINARY_TOLERANCE {
            selection.insert(region);
        } else if value.abs() > BINARY_TOLERANCE {
            return Err(SolverError::ContractViolation { region, value });
        }
    }
    Ok(selection)
}
