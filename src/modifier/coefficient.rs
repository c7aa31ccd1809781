use super::variable::fixing_value;
use super::{Draft, Reduction, Scope};
use crate::numerics::Real;
use crate::problem::Problem;
use crate::settings::SolverSettings;

/// Remove single coefficients by substituting a value for their column in
/// their row only.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoefficientReduction;

impl CoefficientReduction {
    pub const NAME: &'static str = "coefficient";
}

impl<N: Real> Reduction<N> for CoefficientReduction {
    /// `(row, col)` of a nonzero.
    type Unit = (usize, usize);

    fn prepare(
        &mut self,
        problem: &Problem<N>,
        _: &SolverSettings,
        _: &Scope<N>,
    ) -> Vec<(usize, usize)> {
        let matrix = problem.matrix();
        (0..problem.nrows())
            .rev()
            .flat_map(move |row| matrix.row(row).iter().map(move |(col, _)| (row, col)))
            .collect()
    }

    fn is_admissible(&self, draft: &Draft<N>, scope: &Scope<N>, (row, col): (usize, usize)) -> bool {
        let pb = &draft.problem;
        let domains = pb.domains();
        let has_value = (scope.solution.is_feasible() && scope.solution.primal.len() == pb.ncols())
            || !domains.lb_inf(col)
            || !domains.ub_inf(col);
        !pb.is_redundant(row)
            && !domains.is_removed(col)
            && has_value
            && pb.matrix().coefficient(row, col).is_some()
    }

    fn apply(&self, draft: &mut Draft<N>, scope: &Scope<N>, (row, col): (usize, usize)) {
        let value = fixing_value(&draft.problem, scope, col);
        if let Some(a) = draft.problem.matrix().coefficient(row, col).cloned() {
            draft.problem.shift_sides(row, a * value);
            draft.change_coefficient(row, col, N::zero());
        }
    }
}
