//! Reference solutions of a problem.

use crate::flags::RowFlag;
use crate::numerics::{Num, Real};
use crate::problem::{IndexMaps, Problem};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolutionStatus {
    Feasible,
    Infeasible,
    Unbounded,
    Unknown,
}

impl fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            SolutionStatus::Feasible => "feasible",
            SolutionStatus::Infeasible => "infeasible",
            SolutionStatus::Unbounded => "unbounded",
            SolutionStatus::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

impl FromStr for SolutionStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String> {
        match s.to_ascii_lowercase().as_str() {
            "feasible" => Ok(SolutionStatus::Feasible),
            "infeasible" => Ok(SolutionStatus::Infeasible),
            "unbounded" => Ok(SolutionStatus::Unbounded),
            "unknown" => Ok(SolutionStatus::Unknown),
            _ => Err(format!("unknown solution status {s}")),
        }
    }
}

/// A solution with its status.
///
/// `primal` is filled for feasible and unbounded solutions, `ray` only for
/// unbounded ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution<N> {
    pub status: SolutionStatus,
    pub primal: Vec<N>,
    pub ray: Vec<N>,
}

impl<N> Default for Solution<N> {
    fn default() -> Self {
        Self::new(SolutionStatus::Unknown)
    }
}

impl<N> Solution<N> {
    pub fn new(status: SolutionStatus) -> Self {
        Self {
            status,
            primal: Vec::new(),
            ray: Vec::new(),
        }
    }
    pub fn feasible(primal: Vec<N>) -> Self {
        Self {
            status: SolutionStatus::Feasible,
            primal,
            ray: Vec::new(),
        }
    }
    pub fn unbounded(primal: Vec<N>, ray: Vec<N>) -> Self {
        Self {
            status: SolutionStatus::Unbounded,
            primal,
            ray,
        }
    }
    pub fn is_feasible(&self) -> bool {
        self.status == SolutionStatus::Feasible
    }
}

impl<N: Real> Solution<N> {
    /// Drop the entries of the columns removed by `Problem::compress`.
    pub fn compress(&self, maps: &IndexMaps) -> Self {
        let keep = |v: &[N]| -> Vec<N> {
            if v.len() != maps.cols.len() {
                return v.to_vec();
            }
            v.iter()
                .zip(&maps.cols)
                .filter(|(_, m)| m.is_some())
                .map(|(x, _)| x.clone())
                .collect()
        };
        Self {
            status: self.status,
            primal: keep(&self.primal),
            ray: keep(&self.ray),
        }
    }

    /// Names of the bounds and rows the primal vector violates.
    pub fn violations(&self, problem: &Problem<N>, num: &Num<N>) -> Vec<String> {
        let mut res = Vec::new();
        if !self.is_feasible() || self.primal.len() != problem.ncols() {
            return res;
        }
        let domains = problem.domains();
        for (col, x) in self.primal.iter().enumerate() {
            let below = !domains.lb_inf(col) && !num.is_feas_ge(x, &domains.lower_bounds[col]);
            let above = !domains.ub_inf(col) && !num.is_feas_le(x, &domains.upper_bounds[col]);
            let fractional = domains.is_integral(col) && !num.is_feas_eq(x, &x.round());
            if below || above || fractional {
                res.push(problem.col_names()[col].clone())
            }
        }
        let matrix = problem.matrix();
        for row in 0..problem.nrows() {
            if problem.is_redundant(row) {
                continue;
            }
            let act = problem.row_activity(row, &self.primal);
            let flags = problem.row_flags()[row];
            let lhs_violated = !flags.test(RowFlag::LhsInf) && !num.is_feas_ge(&act, &matrix.lhs()[row]);
            let rhs_violated = !flags.test(RowFlag::RhsInf) && !num.is_feas_le(&act, &matrix.rhs()[row]);
            if lhs_violated || rhs_violated {
                res.push(problem.row_names()[row].clone())
            }
        }
        res
    }
}
