//! Sparse constraint matrix with row-major and column-major access.

use crate::flags::{RowFlag, RowFlags};
use crate::numerics::Real;
use sprs::{CsMat, TriMat};
use std::collections::BTreeMap;
use std::ops::Range;

/// Pending coefficient changes, applied in one go by
/// `ConstraintMatrix::change_coefficients`.
///
/// A zero value removes the entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixBuffer<N> {
    entries: BTreeMap<(usize, usize), N>,
}

impl<N> Default for MatrixBuffer<N> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<N: Real> MatrixBuffer<N> {
    pub fn new() -> Self {
        Self::default()
    }
    /// Record the new value of the coefficient at `(row, col)`.
    /// A later entry on the same position overwrites an earlier one.
    pub fn add_entry(&mut self, row: usize, col: usize, value: N) {
        let _ = self.entries.insert((row, col), value);
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn clear(&mut self) {
        self.entries.clear()
    }
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &N)> {
        self.entries.iter().map(|(&pos, val)| (pos, val))
    }
}

/// Row-major slice of one constraint.
#[derive(Debug)]
pub struct RowView<'a, N> {
    /// Column indices, increasing.
    pub indices: &'a [usize],
    pub values: &'a [N],
}

impl<N> Clone for RowView<'_, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N> Copy for RowView<'_, N> {}

impl<'a, N> RowView<'a, N> {
    pub fn len(&self) -> usize {
        self.indices.len()
    }
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
    pub fn iter(self) -> impl Iterator<Item = (usize, &'a N)> + 'a {
        self.indices.iter().copied().zip(self.values.iter())
    }
}

/// Coefficients of the constraints together with their sides and flags.
///
/// The coefficients are stored once, in a CSR matrix. The column-major view is
/// a CSC matrix whose values are positions in the CSR data, so both access
/// paths always see the same numbers. Both are rebuilt together by every
/// structural change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintMatrix<N> {
    coefficients: CsMat<N>,
    transpose: CsMat<usize>,
    lhs: Vec<N>,
    rhs: Vec<N>,
    row_flags: Vec<RowFlags>,
}

impl<N: Real> ConstraintMatrix<N> {
    /// Build the matrix from coefficient entries. Zero entries are dropped.
    ///
    /// The lengths of `lhs`, `rhs` and `row_flags` must equal `nrows`.
    pub fn new(
        (nrows, ncols): (usize, usize),
        entries: BTreeMap<(usize, usize), N>,
        lhs: Vec<N>,
        rhs: Vec<N>,
        row_flags: Vec<RowFlags>,
    ) -> Self {
        assert_eq!(lhs.len(), nrows);
        assert_eq!(rhs.len(), nrows);
        assert_eq!(row_flags.len(), nrows);
        let (coefficients, transpose) = Self::assemble((nrows, ncols), entries);
        Self {
            coefficients,
            transpose,
            lhs,
            rhs,
            row_flags,
        }
    }

    fn assemble(
        shape: (usize, usize),
        entries: BTreeMap<(usize, usize), N>,
    ) -> (CsMat<N>, CsMat<usize>) {
        let entries: Vec<_> = entries.into_iter().filter(|(_, v)| !v.is_zero()).collect();
        let mut tri_mat = TriMat::with_capacity(shape, entries.len());
        let mut positions = TriMat::with_capacity(shape, entries.len());
        // Entries come sorted by (row, col), which is the CSR data order.
        for (pos, ((i, j), val)) in entries.into_iter().enumerate() {
            tri_mat.add_triplet(i, j, val);
            positions.add_triplet(i, j, pos);
        }
        (tri_mat.to_csr(), positions.to_csc())
    }

    pub fn nrows(&self) -> usize {
        self.coefficients.rows()
    }
    pub fn ncols(&self) -> usize {
        self.coefficients.cols()
    }
    pub fn nnz(&self) -> usize {
        self.coefficients.nnz()
    }

    fn row_range(&self, row: usize) -> Range<usize> {
        self.coefficients.indptr().outer_inds_sz(row)
    }
    fn col_range(&self, col: usize) -> Range<usize> {
        self.transpose.indptr().outer_inds_sz(col)
    }

    pub fn row(&self, row: usize) -> RowView<'_, N> {
        let range = self.row_range(row);
        RowView {
            indices: &self.coefficients.indices()[range.clone()],
            values: &self.coefficients.data()[range],
        }
    }
    /// Iterate over `(row, coefficient)` of the nonzeros of a column, rows increasing.
    pub fn col(&self, col: usize) -> impl Iterator<Item = (usize, &N)> + '_ {
        let range = self.col_range(col);
        let data = self.coefficients.data();
        self.transpose.indices()[range.clone()]
            .iter()
            .zip(self.transpose.data()[range].iter())
            .map(move |(&row, &pos)| (row, &data[pos]))
    }
    pub fn col_len(&self, col: usize) -> usize {
        self.col_range(col).len()
    }
    pub fn coefficient(&self, row: usize, col: usize) -> Option<&N> {
        let view = self.row(row);
        view.indices
            .binary_search(&col)
            .ok()
            .map(|k| &view.values[k])
    }
    /// All nonzero coefficients keyed by `(row, col)`.
    pub fn entries(&self) -> BTreeMap<(usize, usize), N> {
        let mut res = BTreeMap::new();
        for row in 0..self.nrows() {
            for (col, val) in self.row(row).iter() {
                let _ = res.insert((row, col), val.clone());
            }
        }
        res
    }

    /// Apply buffered coefficient changes and rebuild both views.
    pub fn change_coefficients(&mut self, buffer: &MatrixBuffer<N>) {
        if buffer.is_empty() {
            return;
        }
        let mut entries = self.entries();
        for ((row, col), val) in buffer.iter() {
            assert!(row < self.nrows() && col < self.ncols());
            let _ = entries.insert((row, col), val.clone());
        }
        let shape = (self.nrows(), self.ncols());
        let (coefficients, transpose) = Self::assemble(shape, entries);
        self.coefficients = coefficients;
        self.transpose = transpose;
    }

    pub fn lhs(&self) -> &[N] {
        &self.lhs
    }
    pub fn rhs(&self) -> &[N] {
        &self.rhs
    }
    pub fn row_flags(&self) -> &[RowFlags] {
        &self.row_flags
    }
    pub fn row_flags_mut(&mut self) -> &mut [RowFlags] {
        &mut self.row_flags
    }

    /// Set a finite left-hand side.
    pub fn modify_lhs(&mut self, row: usize, value: N) {
        self.lhs[row] = value;
        self.row_flags[row].unset(RowFlag::LhsInf);
        self.update_equation(row);
    }
    /// Set a finite right-hand side.
    pub fn modify_rhs(&mut self, row: usize, value: N) {
        self.rhs[row] = value;
        self.row_flags[row].unset(RowFlag::RhsInf);
        self.update_equation(row);
    }
    pub fn modify_lhs_inf(&mut self, row: usize) {
        self.lhs[row] = N::zero();
        self.row_flags[row].set(RowFlag::LhsInf);
        self.update_equation(row);
    }
    pub fn modify_rhs_inf(&mut self, row: usize) {
        self.rhs[row] = N::zero();
        self.row_flags[row].set(RowFlag::RhsInf);
        self.update_equation(row);
    }
    fn update_equation(&mut self, row: usize) {
        let flags = &mut self.row_flags[row];
        let equation = !flags.test(RowFlag::LhsInf)
            && !flags.test(RowFlag::RhsInf)
            && self.lhs[row] == self.rhs[row];
        flags.assign(RowFlag::Equation, equation);
    }

    /// Keep the rows and columns whose map entry is `Some`, renumbered as
    /// given by the maps.
    pub(crate) fn restrict(&self, row_map: &[Option<usize>], col_map: &[Option<usize>]) -> Self {
        let nrows = row_map.iter().flatten().count();
        let ncols = col_map.iter().flatten().count();
        let mut entries = BTreeMap::new();
        let mut lhs = Vec::with_capacity(nrows);
        let mut rhs = Vec::with_capacity(nrows);
        let mut row_flags = Vec::with_capacity(nrows);
        for (row, new_row) in row_map.iter().enumerate() {
            if let Some(new_row) = *new_row {
                for (col, val) in self.row(row).iter() {
                    if let Some(new_col) = col_map[col] {
                        let _ = entries.insert((new_row, new_col), val.clone());
                    }
                }
                lhs.push(self.lhs[row].clone());
                rhs.push(self.rhs[row].clone());
                row_flags.push(self.row_flags[row]);
            }
        }
        Self::new((nrows, ncols), entries, lhs, rhs, row_flags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // [ 1 0 2 ]
    // [ 0 0 3 ]
    // [ 4 5 0 ]
    fn example() -> ConstraintMatrix<f64> {
        let entries: BTreeMap<_, _> = vec![
            ((0, 0), 1.),
            ((0, 2), 2.),
            ((1, 2), 3.),
            ((2, 0), 4.),
            ((2, 1), 5.),
        ]
        .into_iter()
        .collect();
        ConstraintMatrix::new(
            (3, 3),
            entries,
            vec![0.; 3],
            vec![1.; 3],
            vec![RowFlags::default(); 3],
        )
    }

    fn col_vec(m: &ConstraintMatrix<f64>, col: usize) -> Vec<(usize, f64)> {
        m.col(col).map(|(i, &v)| (i, v)).collect()
    }

    #[test]
    fn row_and_column_views() {
        let m = example();
        assert_eq!(m.nnz(), 5);
        assert_eq!(m.row(0).indices, &[0, 2]);
        assert_eq!(m.row(0).values, &[1., 2.]);
        assert!(m.row(1).len() == 1);
        assert_eq!(col_vec(&m, 0), vec![(0, 1.), (2, 4.)]);
        assert_eq!(col_vec(&m, 1), vec![(2, 5.)]);
        assert_eq!(col_vec(&m, 2), vec![(0, 2.), (1, 3.)]);
        assert_eq!(m.coefficient(2, 1), Some(&5.));
        assert_eq!(m.coefficient(1, 1), None);
    }

    #[test]
    fn views_agree_after_changes() {
        let mut m = example();
        let mut buffer = MatrixBuffer::new();
        buffer.add_entry(0, 2, 0.);
        buffer.add_entry(1, 1, 7.);
        buffer.add_entry(2, 0, -1.);
        m.change_coefficients(&buffer);
        assert_eq!(m.nnz(), 5);
        assert_eq!(col_vec(&m, 2), vec![(1, 3.)]);
        assert_eq!(col_vec(&m, 1), vec![(1, 7.), (2, 5.)]);
        for row in 0..m.nrows() {
            for (col, val) in m.row(row).iter() {
                assert!(m.col(col).any(|(i, v)| i == row && v == val));
            }
        }
        let total: usize = (0..m.ncols()).map(|j| m.col_len(j)).sum();
        assert_eq!(total, m.nnz());
    }

    #[test]
    fn sides_and_equation_flag() {
        let mut m = example();
        m.modify_lhs(1, 1.);
        assert!(m.row_flags()[1].test(RowFlag::Equation));
        m.modify_rhs_inf(1);
        assert!(m.row_flags()[1].test(RowFlag::RhsInf));
        assert!(!m.row_flags()[1].test(RowFlag::Equation));
        m.modify_rhs(1, 1.);
        assert!(m.row_flags()[1].test(RowFlag::Equation));
    }

    #[test]
    fn restriction() {
        let m = example();
        let r = m.restrict(&[Some(0), None, Some(1)], &[Some(0), None, Some(1)]);
        assert_eq!(r.nrows(), 2);
        assert_eq!(r.ncols(), 2);
        assert_eq!(r.row(0).values, &[1., 2.]);
        assert_eq!(r.row(1).indices, &[0]);
    }
}
