//! Quantities derived from a problem, recomputed in parallel on demand.

use super::Problem;
use crate::flags::RowFlag;
use crate::numerics::{Num, Real};
use rayon::prelude::*;
use std::fmt;

/// Range of values a row can take over the variable domains.
///
/// `min` and `max` only sum the finite contributions; `ninfmin` and `ninfmax`
/// count the contributions that are infinite.
#[derive(Debug, Clone, PartialEq)]
pub struct RowActivity<N> {
    pub min: N,
    pub max: N,
    pub ninfmin: usize,
    pub ninfmax: usize,
}

impl<N: Real> RowActivity<N> {
    /// True if every point of the domains satisfies both sides of the row.
    pub fn implies_sides(&self, problem: &Problem<N>, row: usize, num: &Num<N>) -> bool {
        let flags = problem.row_flags()[row];
        let lhs_ok = flags.test(RowFlag::LhsInf)
            || (self.ninfmin == 0 && num.is_feas_ge(&self.min, &problem.matrix().lhs()[row]));
        let rhs_ok = flags.test(RowFlag::RhsInf)
            || (self.ninfmax == 0 && num.is_feas_le(&self.max, &problem.matrix().rhs()[row]));
        lhs_ok && rhs_ok
    }
}

/// Number of rows preventing a column from moving in each direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Locks {
    pub up: usize,
    pub down: usize,
}

/// Structural classification of a row, used in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintType {
    Redundant,
    Empty,
    Singleton,
    VariableBound,
    SetPartitioning,
    SetPacking,
    SetCovering,
    Cardinality,
    Knapsack,
    Linear,
}

impl fmt::Display for ConstraintType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            ConstraintType::Redundant => "redundant",
            ConstraintType::Empty => "empty",
            ConstraintType::Singleton => "singleton",
            ConstraintType::VariableBound => "varbound",
            ConstraintType::SetPartitioning => "setppc-partitioning",
            ConstraintType::SetPacking => "setppc-packing",
            ConstraintType::SetCovering => "setppc-covering",
            ConstraintType::Cardinality => "cardinality",
            ConstraintType::Knapsack => "knapsack",
            ConstraintType::Linear => "linear",
        };
        write!(f, "{name}")
    }
}

impl<N: Real> Problem<N> {
    fn activity(&self, row: usize) -> RowActivity<N> {
        let domains = self.domains();
        let mut res = RowActivity {
            min: N::zero(),
            max: N::zero(),
            ninfmin: 0,
            ninfmax: 0,
        };
        for (col, a) in self.matrix().row(row).iter() {
            let lb = (!domains.lb_inf(col)).then(|| &domains.lower_bounds[col]);
            let ub = (!domains.ub_inf(col)).then(|| &domains.upper_bounds[col]);
            let (low, high) = if a.is_positive() { (lb, ub) } else { (ub, lb) };
            match low {
                Some(v) => res.min = res.min.clone() + a.clone() * v.clone(),
                None => res.ninfmin += 1,
            }
            match high {
                Some(v) => res.max = res.max.clone() + a.clone() * v.clone(),
                None => res.ninfmax += 1,
            }
        }
        res
    }

    /// Activity bounds of every row.
    pub fn activities(&self) -> Vec<RowActivity<N>> {
        (0..self.nrows())
            .into_par_iter()
            .map(|row| self.activity(row))
            .collect()
    }

    /// Locks of every column, ignoring redundant rows.
    pub fn locks(&self) -> Vec<Locks> {
        let matrix = self.matrix();
        (0..self.ncols())
            .into_par_iter()
            .map(|col| {
                let mut locks = Locks::default();
                for (row, a) in matrix.col(col) {
                    if self.is_redundant(row) {
                        continue;
                    }
                    let flags = matrix.row_flags()[row];
                    let (lhs, rhs) = (!flags.test(RowFlag::LhsInf), !flags.test(RowFlag::RhsInf));
                    let (up, down) = if a.is_positive() { (rhs, lhs) } else { (lhs, rhs) };
                    locks.up += up as usize;
                    locks.down += down as usize;
                }
                locks
            })
            .collect()
    }

    fn constraint_type(&self, row: usize, num: &Num<N>) -> ConstraintType {
        if self.is_redundant(row) {
            return ConstraintType::Redundant;
        }
        let view = self.matrix().row(row);
        let flags = self.row_flags()[row];
        match view.len() {
            0 => return ConstraintType::Empty,
            1 => return ConstraintType::Singleton,
            2 if view.iter().any(|(col, _)| self.domains().is_integral(col)) => {
                return ConstraintType::VariableBound;
            }
            _ => (),
        }
        let domains = self.domains();
        let binary = view.iter().all(|(col, _)| {
            domains.is_integral(col)
                && !domains.lb_inf(col)
                && !domains.ub_inf(col)
                && num.is_eq(&domains.lower_bounds[col], &N::zero())
                && num.is_eq(&domains.upper_bounds[col], &N::one())
        });
        let one = N::one();
        let lhs = (!flags.test(RowFlag::LhsInf)).then(|| &self.matrix().lhs()[row]);
        let rhs = (!flags.test(RowFlag::RhsInf)).then(|| &self.matrix().rhs()[row]);
        if binary && view.iter().all(|(_, a)| num.is_eq(a, &one)) {
            let lhs_one = lhs.is_some_and(|l| num.is_eq(l, &one));
            let rhs_one = rhs.is_some_and(|r| num.is_eq(r, &one));
            return match (lhs_one, rhs_one) {
                (true, true) => ConstraintType::SetPartitioning,
                (false, true) if lhs.is_none() => ConstraintType::SetPacking,
                (true, false) if rhs.is_none() => ConstraintType::SetCovering,
                _ => ConstraintType::Cardinality,
            };
        }
        let integral = view
            .iter()
            .all(|(col, a)| domains.is_integral(col) && num.is_integral(a));
        if integral && (lhs.is_none() || rhs.is_none()) {
            ConstraintType::Knapsack
        } else {
            ConstraintType::Linear
        }
    }

    /// Classification of every row.
    pub fn constraint_types(&self, num: &Num<N>) -> Vec<ConstraintType> {
        (0..self.nrows())
            .into_par_iter()
            .map(|row| self.constraint_type(row, num))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::ProblemBuilder;
    use super::super::tests::small;
    use super::*;

    #[test]
    fn activities_of_small() {
        let acts = small().activities();
        // x + y with x in [0, 10], y in [0, inf)
        assert_eq!(acts[0].min, 0.);
        assert_eq!(acts[0].ninfmin, 0);
        assert_eq!(acts[0].max, 10.);
        assert_eq!(acts[0].ninfmax, 1);
        // x - z with z free
        assert_eq!(acts[2].ninfmin, 1);
        assert_eq!(acts[2].ninfmax, 1);
    }

    #[test]
    fn implied_sides() {
        let num = Num::default();
        let mut b = ProblemBuilder::<f64>::new("p", 2, 2);
        b.set_col_ub(0, Some(1.)).set_col_ub(1, Some(1.));
        b.add_entry(0, 0, 1.).add_entry(0, 1, 1.).set_row_rhs(0, Some(2.));
        b.add_entry(1, 0, 1.).add_entry(1, 1, 1.).set_row_rhs(1, Some(1.));
        let pb = b.build().unwrap();
        let acts = pb.activities();
        assert!(acts[0].implies_sides(&pb, 0, &num));
        assert!(!acts[1].implies_sides(&pb, 1, &num));
    }

    #[test]
    fn locks_of_small() {
        let locks = small().locks();
        // x: >= row (down), equation (both)
        assert_eq!(locks[0], Locks { up: 1, down: 2 });
        // z: <= row with positive coefficient, equation with negative
        assert_eq!(locks[2], Locks { up: 2, down: 1 });
    }

    #[test]
    fn classification() {
        let num = Num::default();
        let mut b = ProblemBuilder::<f64>::new("p", 4, 3);
        for j in 0..3 {
            b.set_col_ub(j, Some(1.)).set_col_integral(j, true);
            b.add_entry(0, j, 1.).add_entry(1, j, 1.).add_entry(2, j, 3.);
        }
        b.set_row_lhs(0, Some(1.)).set_row_rhs(0, Some(1.));
        b.set_row_rhs(1, Some(1.));
        b.set_row_rhs(2, Some(5.));
        b.add_entry(3, 1, 2.).set_row_rhs(3, Some(1.));
        let types = b.build().unwrap().constraint_types(&num);
        assert_eq!(
            types,
            vec![
                ConstraintType::SetPartitioning,
                ConstraintType::SetPacking,
                ConstraintType::Knapsack,
                ConstraintType::Singleton
            ]
        );
    }
}
