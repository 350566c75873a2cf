//! Pure-Rust MILP backend (`good_lp` modelling over the `microlp` solver).

use good_lp::{
    constraint, microlp, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};

use super::{Assignment, CoverageProgram, SolverBackend};
use crate::domain::SolverError;

/// Branch-and-bound backend. Deterministic: the same program always yields
/// the same assignment, because variables are created in program order.
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpBackend;

impl SolverBackend for MicroLpBackend {
    fn name(&self) -> &'static str {
        "microlp"
    }

    fn solve(&self, program: &CoverageProgram) -> Result<Assignment, SolverError> {
        let mut problem = ProblemVariables::new();
        let vars: Vec<Variable> =
            program.variables().iter().map(|_| problem.add(variable().binary())).collect();

        let covered: Expression =
            vars.iter().zip(program.coefficients()).map(|(&x, &coverage)| coverage * x).sum();
        let floor = program.min_coverage();

        let mut model =
            problem.minimise(covered.clone()).using(microlp).with(constraint!(covered >= floor));
        for &i in program.excluded() {
            let x = vars[i];
            model = model.with(constraint!(x == 0));
        }
        for &(a, d) in program.conflicts() {
            let (ancestor, descendant) = (vars[a], vars[d]);
            model = model.with(constraint!(ancestor + descendant <= 1));
        }

        match model.solve() {
            Ok(solution) => {
                Ok(Assignment::Feasible(vars.iter().map(|&x| solution.value(x)).collect()))
            }
            Err(ResolutionError::Infeasible) => Ok(Assignment::Infeasible),
            Err(e) => Err(SolverError::Backend(e.to_string())),
        }
    }
}
