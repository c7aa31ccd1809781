use super::{Draft, Reduction, Scope};
use crate::numerics::{Num, Real};
use crate::problem::{Problem, VariableDomains};
use crate::settings::SolverSettings;

/// Collapse the domain of a column to a single value.
#[derive(Debug, Clone, Copy, Default)]
pub struct VariableReduction;

impl VariableReduction {
    pub const NAME: &'static str = "variable";
}

/// Value a column is moved to: its reference value when there is a feasible
/// reference, otherwise the finite bound closest to zero.
pub(super) fn fixing_value<N: Real>(problem: &Problem<N>, scope: &Scope<N>, col: usize) -> N {
    let solution = scope.solution;
    if solution.is_feasible() && solution.primal.len() == problem.ncols() {
        let value = solution.primal[col].clone();
        if problem.domains().is_integral(col) {
            value.round()
        } else {
            value
        }
    } else {
        problem.domains().smallest_bound(col)
    }
}

/// True if the column has room to move: it is not removed and its domain is
/// neither collapsed nor contradictory.
pub(super) fn is_open<N: Real>(domains: &VariableDomains<N>, num: &Num<N>, col: usize) -> bool {
    !domains.is_removed(col)
        && (domains.lb_inf(col)
            || domains.ub_inf(col)
            || num.is_zeta_lt(&domains.lower_bounds[col], &domains.upper_bounds[col]))
}

impl<N: Real> Reduction<N> for VariableReduction {
    type Unit = usize;

    fn prepare(&mut self, problem: &Problem<N>, _: &SolverSettings, _: &Scope<N>) -> Vec<usize> {
        (0..problem.ncols()).rev().collect()
    }

    fn is_admissible(&self, draft: &Draft<N>, scope: &Scope<N>, col: usize) -> bool {
        is_open(draft.problem.domains(), scope.num, col)
    }

    fn apply(&self, draft: &mut Draft<N>, scope: &Scope<N>, col: usize) {
        let value = fixing_value(&draft.problem, scope, col);
        let domains = draft.problem.domains_mut();
        domains.set_lb(col, value.clone());
        domains.set_ub(col, value);
    }
}
