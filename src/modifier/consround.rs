use super::{Draft, Reduction, Scope};
use crate::flags::RowFlag;
use crate::numerics::{self, Real};
use crate::problem::Problem;
use crate::settings::SolverSettings;

/// Make the coefficients and sides of a row integral.
///
/// Sides are rounded outward. With a feasible reference they are widened
/// further so that the reference activity, under the rounded coefficients,
/// stays feasible.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsroundReduction;

impl ConsroundReduction {
    pub const NAME: &'static str = "consround";
}

impl<N: Real> Reduction<N> for ConsroundReduction {
    type Unit = usize;

    fn prepare(&mut self, problem: &Problem<N>, _: &SolverSettings, _: &Scope<N>) -> Vec<usize> {
        (0..problem.nrows()).collect()
    }

    fn is_admissible(&self, draft: &Draft<N>, scope: &Scope<N>, row: usize) -> bool {
        let pb = &draft.problem;
        let flags = pb.row_flags()[row];
        let num = scope.num;
        let matrix = pb.matrix();
        !flags.test(RowFlag::Redundant)
            && (!flags.test(RowFlag::LhsInf) && !num.is_zeta_integral(&matrix.lhs()[row])
                || !flags.test(RowFlag::RhsInf) && !num.is_zeta_integral(&matrix.rhs()[row])
                || matrix.row(row).iter().any(|(_, a)| !num.is_zeta_integral(a)))
    }

    fn apply(&self, draft: &mut Draft<N>, scope: &Scope<N>, row: usize) {
        let num = scope.num;
        let solution = scope.solution;
        let rounded: Vec<(usize, N, N)> = draft
            .problem
            .matrix()
            .row(row)
            .iter()
            .map(|(col, a)| (col, a.clone(), a.round()))
            .collect();
        let activity = (solution.is_feasible() && solution.primal.len() == draft.problem.ncols())
            .then(|| {
                rounded.iter().fold(N::zero(), |acc, (col, _, a)| {
                    acc + a.clone() * solution.primal[*col].clone()
                })
            });
        for (col, a, new) in rounded {
            if new != a {
                draft.change_coefficient(row, col, new);
            }
        }
        let flags = draft.problem.row_flags()[row];
        let matrix = draft.problem.matrix_mut();
        if !flags.test(RowFlag::LhsInf) {
            let mut lhs = num.feas_floor(&matrix.lhs()[row]);
            if let Some(act) = &activity {
                lhs = numerics::min(lhs, num.feas_floor(act));
            }
            matrix.modify_lhs(row, lhs);
        }
        if !flags.test(RowFlag::RhsInf) {
            let mut rhs = num.feas_ceil(&matrix.rhs()[row]);
            if let Some(act) = &activity {
                rhs = numerics::max(rhs, num.feas_ceil(act));
            }
            matrix.modify_rhs(row, rhs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::Module;
    use super::super::tests::batches_probed;
    use super::*;
    use crate::modifier::ModifierStatus;
    use crate::oracle::Retcode;
    use crate::problem::ProblemBuilder;
    use crate::solution::Solution;

    // 1.4x + 0.3y in [0.6, 2.5]
    fn fractional_row() -> Problem<f64> {
        let mut b = ProblemBuilder::new("p", 1, 2);
        b.add_entry(0, 0, 1.4).add_entry(0, 1, 0.3);
        b.set_row_lhs(0, Some(0.6)).set_row_rhs(0, Some(2.5));
        b.build().unwrap()
    }

    #[test]
    fn rounds_coefficients_and_sides() {
        let mut pb = fractional_row();
        let mut module = Module::new(ConsroundReduction::NAME, ConsroundReduction);
        let (status, _) =
            batches_probed(&mut module, &mut pb, &Solution::default(), 1, |_| Retcode::DUAL_FAIL);
        assert_eq!(status, ModifierStatus::Successful);
        // 0.3 rounds to zero and leaves the row
        assert_eq!(pb.matrix().row(0).indices, &[0]);
        assert_eq!(pb.matrix().row(0).values, &[1.]);
        assert_eq!((pb.matrix().lhs()[0], pb.matrix().rhs()[0]), (0., 3.));
    }

    #[test]
    fn sides_never_tighten() {
        // 2x in [1.2, 1.2000001] and 3y in [-0.5, 4.4]
        let mut b = ProblemBuilder::new("p", 2, 2);
        b.add_entry(0, 0, 2.).add_entry(1, 1, 3.);
        b.set_row_lhs(0, Some(1.2)).set_row_rhs(0, Some(1.2000001));
        b.set_row_lhs(1, Some(-0.5)).set_row_rhs(1, Some(4.4));
        let mut pb = b.build().unwrap();
        let mut module = Module::new(ConsroundReduction::NAME, ConsroundReduction);
        let (status, _) =
            batches_probed(&mut module, &mut pb, &Solution::default(), 0, |_| Retcode::DUAL_FAIL);
        assert_eq!(status, ModifierStatus::Successful);
        assert_eq!(pb.matrix().lhs(), &[1., -1.]);
        assert_eq!(pb.matrix().rhs(), &[2., 5.]);
    }

    #[test]
    fn sides_keep_the_reference_feasible() {
        let mut pb = fractional_row();
        // activity under rounded coefficients: 1 * 0.5 = 0.5
        let reference = Solution::feasible(vec![0.5, 1.]);
        let mut module = Module::new(ConsroundReduction::NAME, ConsroundReduction);
        let (status, _) = batches_probed(&mut module, &mut pb, &reference, 1, |_| Retcode::DUAL_FAIL);
        assert_eq!(status, ModifierStatus::Successful);
        assert_eq!((pb.matrix().lhs()[0], pb.matrix().rhs()[0]), (0., 3.));
    }
}
