use super::{Objective, Problem, VariableDomains};
use crate::flags::{ColFlag, RowFlag};
use crate::matrix::MatrixBuffer;
use crate::numerics::Real;
use rayon::prelude::*;

/// Position of each original row and column in a compressed problem,
/// `None` for the removed ones.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IndexMaps {
    pub rows: Vec<Option<usize>>,
    pub cols: Vec<Option<usize>>,
}

fn index_map(keep: &[bool]) -> Vec<Option<usize>> {
    let mut next = 0;
    keep.iter()
        .map(|&k| {
            k.then(|| {
                next += 1;
                next - 1
            })
        })
        .collect()
}

fn compact<T: Clone + Send + Sync>(values: &[T], map: &[Option<usize>]) -> Vec<T> {
    values
        .par_iter()
        .zip(map.par_iter())
        .filter_map(|(v, m)| m.map(|_| v.clone()))
        .collect()
}

impl<N: Real> Problem<N> {
    /// Physically remove redundant rows and fixed columns.
    ///
    /// The contribution of each fixed column, at its lower bound, is moved into
    /// the row sides and the objective offset first.
    pub fn compress(&self) -> (Problem<N>, IndexMaps) {
        let mut pb = self.clone();
        let mut buffer = MatrixBuffer::new();
        for col in 0..pb.ncols() {
            if !pb.col_flags()[col].test(ColFlag::Fixed) {
                continue;
            }
            let value = pb.domains().lower_bounds[col].clone();
            let entries: Vec<_> = pb.matrix().col(col).map(|(i, a)| (i, a.clone())).collect();
            for (row, a) in entries {
                pb.shift_sides(row, a * value.clone());
                buffer.add_entry(row, col, N::zero());
            }
            let obj = pb.objective_mut();
            obj.offset = obj.offset.clone() + obj.coefficients[col].clone() * value;
            obj.coefficients[col] = N::zero();
        }
        pb.matrix_mut().change_coefficients(&buffer);

        let keep_rows: Vec<bool> = (0..pb.nrows()).map(|i| !pb.is_redundant(i)).collect();
        let keep_cols: Vec<bool> = (0..pb.ncols())
            .map(|j| !pb.col_flags()[j].test(ColFlag::Fixed))
            .collect();
        let maps = IndexMaps {
            rows: index_map(&keep_rows),
            cols: index_map(&keep_cols),
        };
        let objective = Objective {
            coefficients: compact(&pb.objective().coefficients, &maps.cols),
            offset: pb.objective().offset.clone(),
            sense: pb.objective().sense,
        };
        let domains = VariableDomains {
            lower_bounds: compact(&pb.domains().lower_bounds, &maps.cols),
            upper_bounds: compact(&pb.domains().upper_bounds, &maps.cols),
            flags: compact(&pb.domains().flags, &maps.cols),
        };
        let compressed = Problem::from_parts(
            pb.name().to_string(),
            objective,
            pb.matrix().restrict(&maps.rows, &maps.cols),
            domains,
            compact(pb.col_names(), &maps.cols),
            compact(pb.row_names(), &maps.rows),
        );
        (compressed, maps)
    }

    /// Subtract `delta` from both finite sides of a row.
    pub(crate) fn shift_sides(&mut self, row: usize, delta: N) {
        let flags = self.row_flags()[row];
        let matrix = self.matrix_mut();
        if !flags.test(RowFlag::LhsInf) {
            let lhs = matrix.lhs()[row].clone() - delta.clone();
            matrix.modify_lhs(row, lhs);
        }
        if !flags.test(RowFlag::RhsInf) {
            let rhs = matrix.rhs()[row].clone() - delta;
            matrix.modify_rhs(row, rhs);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::small;
    use super::*;

    #[test]
    fn removes_fixed_and_redundant() {
        let mut pb = small();
        // fix y = 2, drop c2
        pb.domains_mut().set_lb(1, 2.);
        pb.domains_mut().set_ub(1, 2.);
        pb.domains_mut().flags[1].set(ColFlag::Fixed);
        pb.matrix_mut().row_flags_mut()[2].set(RowFlag::Redundant);
        let (c, maps) = pb.compress();
        assert_eq!(maps.cols, vec![Some(0), None, Some(1)]);
        assert_eq!(maps.rows, vec![Some(0), Some(1), None]);
        assert_eq!(c.ncols(), 2);
        assert_eq!(c.nrows(), 2);
        // x + y >= 1 becomes x >= -1
        assert_eq!(c.matrix().lhs()[0], -1.);
        // y + 3z <= 4 becomes 3z <= 2
        assert_eq!(c.matrix().rhs()[1], 2.);
        assert_eq!(c.matrix().row(1).values, &[3.]);
        assert_eq!(c.objective().offset, 4.);
        assert_eq!(c.objective().coefficients, vec![1., 0.5]);
        assert_eq!(c.col_names(), &["x0".to_string(), "x2".to_string()]);
    }
}
