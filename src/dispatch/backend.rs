//! The LP solver boundary (SPEC_FULL.md §4.5): a thin trait standing
//! between the dispatch model and `good_lp`, in the same spirit as the
//! optimizer's strategy trait it replaces. Swapping solvers means writing a
//! new `LpBackend` impl, not touching the model builder.

use good_lp::{Constraint, Expression, ProblemVariables, Solution, SolverModel, Variable};

use super::types::DispatchError;

pub trait LpSolution {
    fn value(&self, var: Variable) -> f64;
}

struct GoodLpSolution<S>(S);

impl<S: Solution> LpSolution for GoodLpSolution<S> {
    fn value(&self, var: Variable) -> f64 {
        self.0.value(var)
    }
}

pub trait LpBackend {
    fn solve(
        &self,
        vars: ProblemVariables,
        objective: Expression,
        constraints: Vec<Constraint>,
    ) -> Result<Box<dyn LpSolution>, DispatchError>;
}

/// The shipped backend: `good_lp`'s bundled `microlp` solver. Pure-Rust, no
/// external solver binary, which is why it was promoted from the teacher's
/// optional feature to a core dependency here.
pub struct MicroLpBackend;

impl LpBackend for MicroLpBackend {
    fn solve(
        &self,
        vars: ProblemVariables,
        objective: Expression,
        constraints: Vec<Constraint>,
    ) -> Result<Box<dyn LpSolution>, DispatchError> {
        let mut builder = vars.minimise(objective).using(good_lp::microlp);
        for c in constraints {
            builder = builder.with(c);
        }
        let solution = builder
            .solve()
            .map_err(|e| DispatchError::SolverFailure { status: e.to_string() })?;
        Ok(Box::new(GoodLpSolution(solution)))
    }
}
