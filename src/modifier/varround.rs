use super::{Draft, Reduction, Scope};
use crate::numerics::{Num, Real};
use crate::problem::{Problem, VariableDomains};
use crate::settings::SolverSettings;

/// Make the objective coefficient and the bounds of a column integral.
///
/// Bounds are rounded outward so that the domain only grows and any known
/// feasible value stays inside it. Domains collapsed to a single value are
/// left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct VarroundReduction;

impl VarroundReduction {
    pub const NAME: &'static str = "varround";
}

fn collapsed<N: Real>(domains: &VariableDomains<N>, num: &Num<N>, col: usize) -> bool {
    !domains.lb_inf(col)
        && !domains.ub_inf(col)
        && num.is_zeta_eq(&domains.lower_bounds[col], &domains.upper_bounds[col])
}

impl<N: Real> Reduction<N> for VarroundReduction {
    type Unit = usize;

    fn prepare(&mut self, problem: &Problem<N>, _: &SolverSettings, _: &Scope<N>) -> Vec<usize> {
        (0..problem.ncols()).collect()
    }

    fn is_admissible(&self, draft: &Draft<N>, scope: &Scope<N>, col: usize) -> bool {
        let pb = &draft.problem;
        let domains = pb.domains();
        let num = scope.num;
        let rounded_bounds = !collapsed(domains, num, col)
            && (!domains.lb_inf(col) && !num.is_zeta_integral(&domains.lower_bounds[col])
                || !domains.ub_inf(col) && !num.is_zeta_integral(&domains.upper_bounds[col]));
        !domains.is_removed(col)
            && (!num.is_zeta_integral(&pb.objective().coefficients[col]) || rounded_bounds)
    }

    fn apply(&self, draft: &mut Draft<N>, scope: &Scope<N>, col: usize) {
        let num = scope.num;
        let obj = &mut draft.problem.objective_mut().coefficients[col];
        *obj = obj.round();
        let domains = draft.problem.domains_mut();
        if collapsed(domains, num, col) {
            return;
        }
        if !domains.lb_inf(col) {
            let lb = num.feas_floor(&domains.lower_bounds[col]);
            domains.set_lb(col, lb);
        }
        if !domains.ub_inf(col) {
            let ub = num.feas_ceil(&domains.upper_bounds[col]);
            domains.set_ub(col, ub);
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

    fn one_column() -> Problem<f64> {
        let mut b = ProblemBuilder::new("p", 1, 1);
        b.set_col_lb(0, Some(0.3)).set_col_ub(0, Some(4.7)).set_obj(0, 2.5);
        b.add_entry(0, 0, 1.).set_row_rhs(0, Some(4.));
        b.build().unwrap()
    }

    #[test]
    fn rounds_outward() {
        let mut pb = one_column();
        let mut module = Module::new(VarroundReduction::NAME, VarroundReduction);
        let (status, probes) =
            batches_probed(&mut module, &mut pb, &Solution::default(), 2, |_| Retcode::DUAL_FAIL);
        assert_eq!((status, probes), (ModifierStatus::Successful, 1));
        assert_eq!(pb.domains().lower_bounds[0], 0.);
        assert_eq!(pb.domains().upper_bounds[0], 5.);
        assert_eq!(pb.objective().coefficients[0], 3.);
        let (status, _) =
            batches_probed(&mut module, &mut pb, &Solution::default(), 2, |_| Retcode::DUAL_FAIL);
        assert_eq!(status, ModifierStatus::NotAdmissible);
    }

    #[test]
    fn collapsed_domains_stay() {
        let mut b = ProblemBuilder::new("p", 0, 1);
        b.set_col_lb(0, Some(3.5)).set_col_ub(0, Some(3.5));
        let mut pb = b.build().unwrap();
        let mut module = Module::new(VarroundReduction::NAME, VarroundReduction);
        let (status, _) =
            batches_probed(&mut module, &mut pb, &Solution::default(), 2, |_| Retcode::DUAL_FAIL);
        assert_eq!(status, ModifierStatus::NotAdmissible);
        assert_eq!(pb.domains().upper_bounds[0], 3.5);
    }

    #[test]
    fn kept_when_the_bug_disappears() {
        let mut pb = one_column();
        let mut module = Module::new(VarroundReduction::NAME, VarroundReduction);
        let (status, _) =
            batches_probed(&mut module, &mut pb, &Solution::default(), 2, |_| Retcode::OKAY);
        assert_eq!(status, ModifierStatus::Unsuccessful);
        assert_eq!(pb.domains().lower_bounds[0], 0.3);
        assert_eq!(pb.objective().coefficients[0], 2.5);
    }
}
