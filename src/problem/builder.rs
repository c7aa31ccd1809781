use super::{ObjSense, Objective, Problem, VariableDomains};
use crate::error::{Error, Result};
use crate::flags::{ColFlag, ColFlags, RowFlag, RowFlags};
use crate::matrix::ConstraintMatrix;
use crate::numerics::Real;
use std::collections::BTreeMap;

/// Incremental construction of a `Problem`.
///
/// Columns start with bounds `[0, inf)`, rows with both sides infinite.
/// Infinite bounds and sides are given as `None`.
#[derive(Debug, Clone)]
pub struct ProblemBuilder<N> {
    name: String,
    obj: Vec<N>,
    obj_offset: N,
    sense: ObjSense,
    lb: Vec<Option<N>>,
    ub: Vec<Option<N>>,
    integral: Vec<bool>,
    lhs: Vec<Option<N>>,
    rhs: Vec<Option<N>>,
    entries: BTreeMap<(usize, usize), N>,
    col_names: Vec<String>,
    row_names: Vec<String>,
}

impl<N: Real> ProblemBuilder<N> {
    pub fn new<S: Into<String>>(name: S, nrows: usize, ncols: usize) -> Self {
        Self {
            name: name.into(),
            obj: vec![N::zero(); ncols],
            obj_offset: N::zero(),
            sense: ObjSense::Minimize,
            lb: vec![Some(N::zero()); ncols],
            ub: vec![None; ncols],
            integral: vec![false; ncols],
            lhs: vec![None; nrows],
            rhs: vec![None; nrows],
            entries: BTreeMap::new(),
            col_names: (0..ncols).map(|j| format!("x{j}")).collect(),
            row_names: (0..nrows).map(|i| format!("c{i}")).collect(),
        }
    }
    pub fn ncols(&self) -> usize {
        self.obj.len()
    }
    pub fn nrows(&self) -> usize {
        self.lhs.len()
    }
    pub fn set_name<S: Into<String>>(&mut self, name: S) -> &mut Self {
        self.name = name.into();
        self
    }
    pub fn set_obj(&mut self, col: usize, value: N) -> &mut Self {
        self.obj[col] = value;
        self
    }
    pub fn set_obj_offset(&mut self, value: N) -> &mut Self {
        self.obj_offset = value;
        self
    }
    pub fn set_obj_sense(&mut self, sense: ObjSense) -> &mut Self {
        self.sense = sense;
        self
    }
    pub fn set_col_lb(&mut self, col: usize, value: Option<N>) -> &mut Self {
        self.lb[col] = value;
        self
    }
    pub fn set_col_ub(&mut self, col: usize, value: Option<N>) -> &mut Self {
        self.ub[col] = value;
        self
    }
    pub fn set_col_integral(&mut self, col: usize, integral: bool) -> &mut Self {
        self.integral[col] = integral;
        self
    }
    pub fn set_col_name<S: Into<String>>(&mut self, col: usize, name: S) -> &mut Self {
        self.col_names[col] = name.into();
        self
    }
    pub fn set_row_lhs(&mut self, row: usize, value: Option<N>) -> &mut Self {
        self.lhs[row] = value;
        self
    }
    pub fn set_row_rhs(&mut self, row: usize, value: Option<N>) -> &mut Self {
        self.rhs[row] = value;
        self
    }
    pub fn set_row_name<S: Into<String>>(&mut self, row: usize, name: S) -> &mut Self {
        self.row_names[row] = name.into();
        self
    }
    /// Set the coefficient of column `col` in row `row`.
    pub fn add_entry(&mut self, row: usize, col: usize, value: N) -> &mut Self {
        let _ = self.entries.insert((row, col), value);
        self
    }
    /// Append a column and return its index.
    pub fn add_col<S: Into<String>>(&mut self, name: S) -> usize {
        self.obj.push(N::zero());
        self.lb.push(Some(N::zero()));
        self.ub.push(None);
        self.integral.push(false);
        self.col_names.push(name.into());
        self.ncols() - 1
    }
    /// Append a row and return its index.
    pub fn add_row<S: Into<String>>(&mut self, name: S) -> usize {
        self.lhs.push(None);
        self.rhs.push(None);
        self.row_names.push(name.into());
        self.nrows() - 1
    }

    /// Check the data and assemble the problem.
    pub fn build(self) -> Result<Problem<N>> {
        let (nrows, ncols) = (self.nrows(), self.ncols());
        if let Some(&(row, col)) = self
            .entries
            .keys()
            .find(|&&(row, col)| row >= nrows || col >= ncols)
        {
            return Err(Error::Inconsistent(format!(
                "coefficient ({row}, {col}) outside of a {nrows}x{ncols} matrix"
            )));
        }
        let mut flags = vec![ColFlags::default(); ncols];
        let mut lower_bounds = Vec::with_capacity(ncols);
        let mut upper_bounds = Vec::with_capacity(ncols);
        for (j, (lb, ub)) in self.lb.into_iter().zip(self.ub).enumerate() {
            if let (Some(l), Some(u)) = (&lb, &ub) {
                if l > u {
                    return Err(Error::Inconsistent(format!(
                        "column {} has lower bound {l} above upper bound {u}",
                        self.col_names[j]
                    )));
                }
            }
            flags[j].assign(ColFlag::LbInf, lb.is_none());
            flags[j].assign(ColFlag::UbInf, ub.is_none());
            flags[j].assign(ColFlag::Integral, self.integral[j]);
            lower_bounds.push(lb.unwrap_or_else(N::zero));
            upper_bounds.push(ub.unwrap_or_else(N::zero));
        }
        let mut row_flags = vec![RowFlags::default(); nrows];
        let mut lhs = Vec::with_capacity(nrows);
        let mut rhs = Vec::with_capacity(nrows);
        for (i, (l, r)) in self.lhs.into_iter().zip(self.rhs).enumerate() {
            row_flags[i].assign(RowFlag::LhsInf, l.is_none());
            row_flags[i].assign(RowFlag::RhsInf, r.is_none());
            if let (Some(l), Some(r)) = (&l, &r) {
                row_flags[i].assign(RowFlag::Equation, l == r);
            }
            lhs.push(l.unwrap_or_else(N::zero));
            rhs.push(r.unwrap_or_else(N::zero));
        }
        let matrix = ConstraintMatrix::new((nrows, ncols), self.entries, lhs, rhs, row_flags);
        let objective = Objective {
            coefficients: self.obj,
            offset: self.obj_offset,
            sense: self.sense,
        };
        let domains = VariableDomains {
            lower_bounds,
            upper_bounds,
            flags,
        };
        Ok(Problem::from_parts(
            self.name,
            objective,
            matrix,
            domains,
            self.col_names,
            self.row_names,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let mut b = ProblemBuilder::<f64>::new("p", 1, 2);
        let y = b.add_col("y");
        b.add_entry(0, y, 2.).set_row_rhs(0, Some(3.));
        let pb = b.build().unwrap();
        assert_eq!(pb.ncols(), 3);
        assert_eq!(pb.col_names()[2], "y");
        assert!(!pb.domains().lb_inf(y));
        assert!(pb.domains().ub_inf(y));
        assert!(pb.row_flags()[0].test(RowFlag::LhsInf));
        assert!(!pb.row_flags()[0].test(RowFlag::Equation));
        assert_eq!(pb.matrix().coefficient(0, 2), Some(&2.));
    }

    #[test]
    fn rejects_inconsistent_data() {
        let mut b = ProblemBuilder::<f64>::new("p", 1, 1);
        b.add_entry(1, 0, 1.);
        assert!(b.build().is_err());
        let mut b = ProblemBuilder::<f64>::new("p", 1, 1);
        b.set_col_lb(0, Some(2.)).set_col_ub(0, Some(1.));
        assert!(b.build().is_err());
    }
}
