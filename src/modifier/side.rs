use super::variable::is_open;
use super::{Draft, Reduction, Scope};
use crate::flags::RowFlag;
use crate::numerics::Real;
use crate::problem::Problem;
use crate::settings::SolverSettings;

/// Turn ranged and one-sided rows into equations.
#[derive(Debug, Clone, Copy, Default)]
pub struct SideReduction;

impl SideReduction {
    pub const NAME: &'static str = "side";
}

/// Point of the side interval of `row` closest to zero.
fn smallest_side<N: Real>(problem: &Problem<N>, row: usize) -> N {
    let flags = problem.row_flags()[row];
    let matrix = problem.matrix();
    if !flags.test(RowFlag::LhsInf) && matrix.lhs()[row].is_positive() {
        matrix.lhs()[row].clone()
    } else if !flags.test(RowFlag::RhsInf) && matrix.rhs()[row].is_negative() {
        matrix.rhs()[row].clone()
    } else {
        N::zero()
    }
}

impl<N: Real> Reduction<N> for SideReduction {
    type Unit = usize;

    fn prepare(&mut self, problem: &Problem<N>, _: &SolverSettings, _: &Scope<N>) -> Vec<usize> {
        (0..problem.nrows()).rev().collect()
    }

    fn is_admissible(&self, draft: &Draft<N>, scope: &Scope<N>, row: usize) -> bool {
        let pb = &draft.problem;
        let flags = pb.row_flags()[row];
        if flags.test(RowFlag::Redundant) {
            return false;
        }
        let free_side = flags.test_any(&[RowFlag::LhsInf, RowFlag::RhsInf])
            || !scope
                .num
                .is_zeta_eq(&pb.matrix().lhs()[row], &pb.matrix().rhs()[row]);
        let domains = pb.domains();
        free_side
            && pb
                .matrix()
                .row(row)
                .iter()
                .any(|(col, _)| is_open(domains, scope.num, col))
    }

    fn apply(&self, draft: &mut Draft<N>, scope: &Scope<N>, row: usize) {
        let pb = &draft.problem;
        let solution = scope.solution;
        let value = if solution.is_feasible() && solution.primal.len() == pb.ncols() {
            let activity = pb.row_activity(row, &solution.primal);
            if pb.is_row_integral(row, scope.num) {
                activity.round()
            } else {
                activity
            }
        } else {
            smallest_side(pb, row)
        };
        let matrix = draft.problem.matrix_mut();
        matrix.modify_lhs(row, value.clone());
        matrix.modify_rhs(row, value);
    }
}
