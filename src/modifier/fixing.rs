use super::{Draft, Reduction, Scope};
use crate::flags::ColFlag;
use crate::numerics::Real;
use crate::problem::Problem;
use crate::settings::SolverSettings;

/// Remove columns whose domain is a single value.
///
/// The value is moved into the sides of the rows and into the objective
/// offset, and the column is flagged fixed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixingReduction;

impl FixingReduction {
    pub const NAME: &'static str = "fixing";
}

impl<N: Real> Reduction<N> for FixingReduction {
    type Unit = usize;

    fn prepare(&mut self, problem: &Problem<N>, _: &SolverSettings, _: &Scope<N>) -> Vec<usize> {
        (0..problem.ncols()).rev().collect()
    }

    fn is_admissible(&self, draft: &Draft<N>, scope: &Scope<N>, col: usize) -> bool {
        let domains = draft.problem.domains();
        !domains.is_removed(col)
            && !domains.lb_inf(col)
            && !domains.ub_inf(col)
            && scope
                .num
                .is_zeta_eq(&domains.lower_bounds[col], &domains.upper_bounds[col])
    }

    fn apply(&self, draft: &mut Draft<N>, _: &Scope<N>, col: usize) {
        let domains = draft.problem.domains_mut();
        let mut value = domains.lower_bounds[col].clone();
        if domains.is_integral(col) {
            value = value.round();
        }
        domains.set_lb(col, value.clone());
        domains.set_ub(col, value.clone());
        domains.flags[col].set(ColFlag::Fixed);
        let entries: Vec<_> = draft
            .problem
            .matrix()
            .col(col)
            .map(|(row, a)| (row, a.clone()))
            .collect();
        for (row, a) in entries {
            draft.problem.shift_sides(row, a * value.clone());
            draft.change_coefficient(row, col, N::zero());
        }
        let obj = draft.problem.objective_mut();
        obj.offset = obj.offset.clone() + obj.coefficients[col].clone() * value;
        obj.coefficients[col] = N::zero();
    }
}
