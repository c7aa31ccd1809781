//! Mixed-integer programs as seen by the reductions.
//!
//! Rows and columns are never removed while reducing: they are flagged
//! `Redundant` or `Fixed` instead, so indices stay valid across rounds.
//! Physical removal is done by `Problem::compress`.

mod activity;
mod builder;
mod compress;

pub use self::activity::{ConstraintType, Locks, RowActivity};
pub use self::builder::ProblemBuilder;
pub use self::compress::IndexMaps;

use crate::flags::{ColFlag, ColFlags, RowFlag, RowFlags};
use crate::matrix::ConstraintMatrix;
use crate::numerics::{Num, Real};
use std::fmt;

/// Direction of the optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjSense {
    Minimize,
    Maximize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Objective<N> {
    pub coefficients: Vec<N>,
    /// Constant term.
    pub offset: N,
    pub sense: ObjSense,
}

/// Bounds and attributes of the columns.
///
/// An infinite bound is stored as zero with the corresponding flag set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariableDomains<N> {
    pub lower_bounds: Vec<N>,
    pub upper_bounds: Vec<N>,
    pub flags: Vec<ColFlags>,
}

impl<N: Real> VariableDomains<N> {
    pub fn lb_inf(&self, col: usize) -> bool {
        self.flags[col].test(ColFlag::LbInf)
    }
    pub fn ub_inf(&self, col: usize) -> bool {
        self.flags[col].test(ColFlag::UbInf)
    }
    pub fn is_integral(&self, col: usize) -> bool {
        self.flags[col].test_any(&[ColFlag::Integral, ColFlag::ImplInt])
    }
    /// Fixed or inactive columns take no part in the reductions.
    pub fn is_removed(&self, col: usize) -> bool {
        self.flags[col].test_any(&[ColFlag::Fixed, ColFlag::Inactive])
    }
    pub fn set_lb(&mut self, col: usize, value: N) {
        self.lower_bounds[col] = value;
        self.flags[col].unset(ColFlag::LbInf)
    }
    pub fn set_ub(&mut self, col: usize, value: N) {
        self.upper_bounds[col] = value;
        self.flags[col].unset(ColFlag::UbInf)
    }
    /// The finite bound closest to zero, or zero when both are infinite.
    pub fn smallest_bound(&self, col: usize) -> N {
        let lb = (!self.lb_inf(col)).then(|| &self.lower_bounds[col]);
        let ub = (!self.ub_inf(col)).then(|| &self.upper_bounds[col]);
        match (lb, ub) {
            (Some(l), Some(u)) => {
                if l.is_positive() {
                    l.clone()
                } else if u.is_negative() {
                    u.clone()
                } else {
                    N::zero()
                }
            }
            (Some(l), None) => {
                if l.is_positive() { l.clone() } else { N::zero() }
            }
            (None, Some(u)) => {
                if u.is_negative() { u.clone() } else { N::zero() }
            }
            (None, None) => N::zero(),
        }
    }
}

/// A mixed-integer program.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem<N> {
    name: String,
    objective: Objective<N>,
    matrix: ConstraintMatrix<N>,
    domains: VariableDomains<N>,
    col_names: Vec<String>,
    row_names: Vec<String>,
}

impl<N: Real> Problem<N> {
    pub(crate) fn from_parts(
        name: String,
        objective: Objective<N>,
        matrix: ConstraintMatrix<N>,
        domains: VariableDomains<N>,
        col_names: Vec<String>,
        row_names: Vec<String>,
    ) -> Self {
        assert_eq!(objective.coefficients.len(), matrix.ncols());
        assert_eq!(domains.flags.len(), matrix.ncols());
        assert_eq!(col_names.len(), matrix.ncols());
        assert_eq!(row_names.len(), matrix.nrows());
        Self {
            name,
            objective,
            matrix,
            domains,
            col_names,
            row_names,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
    pub fn nrows(&self) -> usize {
        self.matrix.nrows()
    }
    pub fn ncols(&self) -> usize {
        self.matrix.ncols()
    }
    pub fn objective(&self) -> &Objective<N> {
        &self.objective
    }
    pub fn objective_mut(&mut self) -> &mut Objective<N> {
        &mut self.objective
    }
    pub fn matrix(&self) -> &ConstraintMatrix<N> {
        &self.matrix
    }
    pub fn matrix_mut(&mut self) -> &mut ConstraintMatrix<N> {
        &mut self.matrix
    }
    pub fn domains(&self) -> &VariableDomains<N> {
        &self.domains
    }
    pub fn domains_mut(&mut self) -> &mut VariableDomains<N> {
        &mut self.domains
    }
    pub fn col_flags(&self) -> &[ColFlags] {
        &self.domains.flags
    }
    pub fn row_flags(&self) -> &[RowFlags] {
        self.matrix.row_flags()
    }
    pub fn col_names(&self) -> &[String] {
        &self.col_names
    }
    pub fn row_names(&self) -> &[String] {
        &self.row_names
    }
    pub fn is_redundant(&self, row: usize) -> bool {
        self.row_flags()[row].test(RowFlag::Redundant)
    }

    /// Value of row `row` at the point `primal`.
    pub fn row_activity(&self, row: usize, primal: &[N]) -> N {
        self.matrix
            .row(row)
            .iter()
            .fold(N::zero(), |acc, (col, a)| acc + a.clone() * primal[col].clone())
    }
    /// True if every value of the row is integral, with integral variables only.
    pub fn is_row_integral(&self, row: usize, num: &Num<N>) -> bool {
        self.matrix
            .row(row)
            .iter()
            .all(|(col, a)| self.domains.is_integral(col) && num.is_integral(a))
    }

    /// Shrinkage measure of the problem.
    ///
    /// No successful reduction increases any of its counts.
    pub fn size(&self, num: &Num<N>) -> ProblemSize {
        let rows = (0..self.nrows()).filter(|&i| !self.is_redundant(i)).count();
        let cols = (0..self.ncols())
            .filter(|&j| !self.col_flags()[j].test(ColFlag::Fixed))
            .count();
        let nonintegral = (0..self.nrows())
            .map(|i| {
                self.matrix
                    .row(i)
                    .iter()
                    .filter(|(_, a)| !num.is_integral(a))
                    .count()
            })
            .sum();
        ProblemSize {
            rows,
            cols,
            nnz: self.matrix.nnz(),
            nonintegral,
        }
    }
}

/// Counts describing how far a problem has been reduced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProblemSize {
    /// Rows not flagged redundant.
    pub rows: usize,
    /// Columns not flagged fixed.
    pub cols: usize,
    pub nnz: usize,
    /// Non-integral matrix coefficients.
    pub nonintegral: usize,
}

impl ProblemSize {
    /// The quantity that never grows during a reduction run.
    pub fn measure(&self) -> usize {
        self.rows + self.cols + self.nonintegral
    }
}

impl fmt::Display for ProblemSize {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} rows, {} columns, {} nonzeros, {} non-integral",
            self.rows, self.cols, self.nnz, self.nonintegral
        )
    }
}
