use super::{Draft, Reduction, Scope};
use crate::numerics::Real;
use crate::problem::Problem;
use crate::settings::SolverSettings;

/// Remove objective terms.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectiveReduction;

impl ObjectiveReduction {
    pub const NAME: &'static str = "objective";
}

impl<N: Real> Reduction<N> for ObjectiveReduction {
    type Unit = usize;

    fn prepare(&mut self, problem: &Problem<N>, _: &SolverSettings, _: &Scope<N>) -> Vec<usize> {
        (0..problem.ncols()).rev().collect()
    }

    fn is_admissible(&self, draft: &Draft<N>, scope: &Scope<N>, col: usize) -> bool {
        !draft.problem.domains().is_removed(col)
            && !scope
                .num
                .is_zeta_zero(&draft.problem.objective().coefficients[col])
    }

    fn apply(&self, draft: &mut Draft<N>, _: &Scope<N>, col: usize) {
        draft.problem.objective_mut().coefficients[col] = N::zero();
    }
}
