use super::{Draft, Reduction, Scope};
use crate::flags::RowFlag;
use crate::numerics::Real;
use crate::params::Emphasis;
use crate::problem::Problem;
use crate::settings::SolverSettings;
use crate::solution::SolutionStatus;

/// Drop rows by flagging them redundant.
///
/// With an infeasible reference and safe emphasis, only rows implied by the
/// variable domains may go: any other row could be the reason of the
/// infeasibility.
#[derive(Debug, Clone, Default)]
pub struct ConstraintReduction {
    implied: Vec<bool>,
}

impl ConstraintReduction {
    pub const NAME: &'static str = "constraint";
}

fn restricted<N>(scope: &Scope<N>) -> bool {
    scope.emphasis == Emphasis::Safe && scope.solution.status == SolutionStatus::Infeasible
}

impl<N: Real> Reduction<N> for ConstraintReduction {
    type Unit = usize;

    fn prepare(&mut self, problem: &Problem<N>, _: &SolverSettings, scope: &Scope<N>) -> Vec<usize> {
        self.implied = if restricted(scope) {
            problem
                .activities()
                .iter()
                .enumerate()
                .map(|(row, act)| act.implies_sides(problem, row, scope.num))
                .collect()
        } else {
            Vec::new()
        };
        (0..problem.nrows()).rev().collect()
    }

    fn is_admissible(&self, draft: &Draft<N>, scope: &Scope<N>, row: usize) -> bool {
        !draft.problem.is_redundant(row) && (!restricted(scope) || self.implied[row])
    }

    fn apply(&self, draft: &mut Draft<N>, _: &Scope<N>, row: usize) {
        draft.problem.matrix_mut().row_flags_mut()[row].set(RowFlag::Redundant)
    }
}

#[cfg(test)]
mod tests {
    use super::super::Module;
    use super::super::tests::batches_probed;
    use super::*;
    use crate::flags::ColFlag;
    use crate::modifier::ModifierStatus;
    use crate::oracle::Retcode;
    use crate::problem::ProblemBuilder;
    use crate::solution::Solution;

    /// Rows 0 and 1 link x and y; row 2 only holds y, which is fixed to 1.
    fn three_by_two() -> Problem<f64> {
        let mut b = ProblemBuilder::new("p", 3, 2);
        b.set_col_ub(0, Some(5.));
        b.set_col_lb(1, Some(1.)).set_col_ub(1, Some(1.));
        b.add_entry(0, 0, 1.).add_entry(0, 1, 1.).set_row_lhs(0, Some(7.));
        b.add_entry(1, 0, 1.).add_entry(1, 1, -1.).set_row_rhs(1, Some(2.));
        b.add_entry(2, 1, 2.).set_row_lhs(2, Some(0.)).set_row_rhs(2, Some(3.));
        let mut pb = b.build().unwrap();
        pb.domains_mut().flags[1].set(ColFlag::Fixed);
        pb
    }

    #[test]
    fn implied_row_is_dropped_once() {
        let mut pb = three_by_two();
        let infeasible = Solution::new(SolutionStatus::Infeasible);
        let mut module = Module::new(ConstraintReduction::NAME, ConstraintReduction::default());
        let (status, probes) =
            batches_probed(&mut module, &mut pb, &infeasible, 2, |_| Retcode::DUAL_FAIL);
        assert_eq!((status, probes), (ModifierStatus::Successful, 1));
        assert!(pb.is_redundant(2));
        assert!(!pb.is_redundant(0) && !pb.is_redundant(1));
        let (status, probes) =
            batches_probed(&mut module, &mut pb, &infeasible, 2, |_| Retcode::DUAL_FAIL);
        assert_eq!((status, probes), (ModifierStatus::NotAdmissible, 0));
    }

    #[test]
    fn every_row_without_infeasible_reference() {
        let mut pb = three_by_two();
        let mut module = Module::new(ConstraintReduction::NAME, ConstraintReduction::default());
        // The bug lives in row 0.
        let (status, probes) = batches_probed(&mut module, &mut pb, &Solution::default(), 0, |pb| {
            if pb.is_redundant(0) { Retcode::OKAY } else { Retcode::PRIMAL_FAIL }
        });
        assert_eq!((status, probes), (ModifierStatus::Unsuccessful, 1));
        let (status, probes) = batches_probed(&mut module, &mut pb, &Solution::default(), 3, |pb| {
            if pb.is_redundant(0) { Retcode::OKAY } else { Retcode::PRIMAL_FAIL }
        });
        assert_eq!((status, probes), (ModifierStatus::Successful, 3));
        assert_eq!(
            (0..3).map(|i| pb.is_redundant(i)).collect::<Vec<_>>(),
            vec![false, true, true]
        );
    }

    #[test]
    fn admissibility_is_stable() {
        let pb = three_by_two();
        let num = crate::numerics::Num::default();
        let solution = Solution::new(SolutionStatus::Infeasible);
        let scope = Scope {
            num: &num,
            solution: &solution,
            emphasis: Emphasis::Safe,
        };
        let mut reduction = ConstraintReduction::default();
        let units = reduction.prepare(&pb, &SolverSettings::new(), &scope);
        let draft = Draft::new(pb, SolverSettings::new());
        let first: Vec<bool> = units
            .iter()
            .map(|&r| reduction.is_admissible(&draft, &scope, r))
            .collect();
        let second: Vec<bool> = units
            .iter()
            .map(|&r| reduction.is_admissible(&draft, &scope, r))
            .collect();
        assert_eq!(first, second);
        assert_eq!(first, vec![true, false, false]);
        let aggressive = Scope {
            emphasis: Emphasis::Aggressive,
            ..scope
        };
        assert!(units.iter().all(|&r| reduction.is_admissible(&draft, &aggressive, r)));
    }
}
