//! Augmented-matrix reduction for linear equality systems.
//!
//! Each row is one constraint equation; each column but the last is one
//! variable, and the last column holds the equation's target sum. Reduction
//! uses Gauss–Jordan elimination with partial pivoting, after which
//! back-substitution and the over/under-constrained diagnostics read
//! directly off the reduced rows.
//!
//! This module knows nothing about variables or constraints as domain
//! objects; the solver assembles the matrix and interprets the results.

use strut_core::{near_zero, TOLERANCE};

/// An augmented matrix, row-major. `width` counts the variable columns plus
/// the trailing sum column.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Matrix {
    width: usize,
    rows: Vec<Vec<f64>>,
}

impl Matrix {
    /// Build a matrix from pre-assembled rows. Every row must have exactly
    /// `width` entries and `width` must be at least 1 (the sum column).
    pub(crate) fn from_rows(width: usize, rows: Vec<Vec<f64>>) -> Self {
        debug_assert!(width >= 1);
        debug_assert!(rows.iter().all(|row| row.len() == width));
        Self { width, rows }
    }

    fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of variable columns (the width minus the sum column).
    fn variable_columns(&self) -> usize {
        self.width - 1
    }

    /// Convert to reduced row echelon form in place.
    ///
    /// For each column in order, the pivot is the row at or below the lead
    /// row with the largest absolute value in that column (ties go to the
    /// lowest index). Columns whose best pivot is within tolerance of zero
    /// contribute no independent equation and are skipped without advancing
    /// the lead row.
    pub(crate) fn rref(&mut self) {
        let mut lead_row = 0;
        for lead_col in 0..self.width {
            if lead_row >= self.height() {
                break;
            }
            let pivot = self.pivot_row(lead_col, lead_row);
            if near_zero(self.rows[pivot][lead_col]) {
                continue;
            }
            self.rows.swap(lead_row, pivot);
            self.eliminate_below(lead_col, lead_row);
            self.normalize_row(lead_col, lead_row);
            lead_row += 1;
        }
    }

    /// Back-substitute an RREF matrix into one value per variable column.
    ///
    /// Rows whose coefficient columns are all within tolerance of zero are
    /// skipped; they encode no equation (redundant, trivially satisfied, or
    /// contradictory; the last case is reported by
    /// [`is_over_constrained`](Self::is_over_constrained), not here).
    /// Columns that never lead a row keep the default 0.0, so
    /// under-constrained variables come back zeroed.
    pub(crate) fn solution(&self) -> Vec<f64> {
        let columns = self.variable_columns();
        let mut values = vec![0.0; columns];

        for row in (0..self.height()).rev() {
            let Some(lead) = self.lead_column(row) else {
                continue;
            };
            // Start from the target sum, subtract the already-solved later
            // variables, then divide by the leading coefficient.
            let mut value = self.rows[row][self.width - 1];
            for col in lead + 1..columns {
                value -= self.rows[row][col] * values[col];
            }
            values[lead] = value / self.rows[row][lead];
        }
        values
    }

    /// Whether any reduced row reads `0 = nonzero`: zero in every
    /// coefficient column but a sum entry beyond tolerance. Such a row is
    /// unsatisfiable, so the system has no solution.
    pub(crate) fn is_over_constrained(&self) -> bool {
        (0..self.height())
            .any(|row| self.is_zero_row(row) && self.rows[row][self.width - 1].abs() > TOLERANCE)
    }

    /// Whether there are fewer independent equations than variables, i.e.
    /// multiple solutions exist.
    pub(crate) fn is_under_constrained(&self) -> bool {
        self.rank() < self.variable_columns()
    }

    /// Count of rows that encode an equation (any coefficient beyond
    /// tolerance). On an RREF matrix this is the rank.
    pub(crate) fn rank(&self) -> usize {
        (0..self.height()).filter(|&row| !self.is_zero_row(row)).count()
    }

    /// The row at or below `from` with the largest absolute value in
    /// `col`. Ties go to the lowest-index row; choosing the largest
    /// magnitude rather than the first nonzero entry is what keeps the
    /// elimination numerically stable.
    fn pivot_row(&self, col: usize, from: usize) -> usize {
        let mut max_row = from;
        let mut max_value = self.rows[from][col].abs();
        for row in from + 1..self.height() {
            let value = self.rows[row][col].abs();
            if value > max_value {
                max_value = value;
                max_row = row;
            }
        }
        max_row
    }

    /// Subtract multiples of the pivot row from every row below it so that
    /// `col` becomes zero below the pivot.
    fn eliminate_below(&mut self, col: usize, pivot: usize) {
        for row in pivot + 1..self.height() {
            let factor = self.rows[row][col] / self.rows[pivot][col];
            for c in col..self.width {
                let lead = self.rows[pivot][c];
                self.rows[row][c] -= factor * lead;
            }
        }
    }

    /// Scale `row` so its entry in `col` becomes exactly 1.
    fn normalize_row(&mut self, col: usize, row: usize) {
        let lead = self.rows[row][col];
        for c in col..self.width {
            self.rows[row][c] /= lead;
        }
    }

    /// First coefficient column of `row` beyond tolerance, if any.
    fn lead_column(&self, row: usize) -> Option<usize> {
        (0..self.variable_columns()).find(|&col| !near_zero(self.rows[row][col]))
    }

    /// Whether every coefficient column of `row` is within tolerance of
    /// zero. The sum column is ignored.
    fn is_zero_row(&self, row: usize) -> bool {
        self.lead_column(row).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn matrix(rows: Vec<Vec<f64>>) -> Matrix {
        let width = rows.first().map(|r| r.len()).unwrap_or(1);
        Matrix::from_rows(width, rows)
    }

    fn solve(rows: Vec<Vec<f64>>) -> Vec<f64> {
        let mut m = matrix(rows);
        m.rref();
        m.solution()
    }

    #[test]
    fn test_2x2_system() {
        // v1 + v2 = 6
        // 2v1 + v2 = 8
        // Solution: v1 = 2, v2 = 4
        let values = solve(vec![vec![1.0, 1.0, 6.0], vec![2.0, 1.0, 8.0]]);
        assert!((values[0] - 2.0).abs() < TOLERANCE);
        assert!((values[1] - 4.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_3x3_system() {
        // x + y + z = 6
        // 2x + y - z = 1
        // x - y + z = 2
        // Solution: x = 1, y = 2, z = 3
        let values = solve(vec![
            vec![1.0, 1.0, 1.0, 6.0],
            vec![2.0, 1.0, -1.0, 1.0],
            vec![1.0, -1.0, 1.0, 2.0],
        ]);
        assert!((values[0] - 1.0).abs() < TOLERANCE);
        assert!((values[1] - 2.0).abs() < TOLERANCE);
        assert!((values[2] - 3.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_rref_normalizes_leading_entries() {
        let mut m = matrix(vec![vec![2.0, 4.0, 8.0], vec![1.0, 3.0, 5.0]]);
        m.rref();
        assert!((m.rows[0][0] - 1.0).abs() < TOLERANCE);
        assert!(near_zero(m.rows[1][0]));
        assert!((m.rows[1][1] - 1.0).abs() < TOLERANCE);
    }

    #[test]
    fn test_under_constrained_single_row() {
        // v1 + v2 = 6 over two variables.
        let mut m = matrix(vec![vec![1.0, 1.0, 6.0]]);
        m.rref();
        assert!(m.is_under_constrained());
        assert!(!m.is_over_constrained());
        let values = m.solution();
        // The lead variable absorbs the sum; the trailing one keeps its default.
        assert!((values[0] - 6.0).abs() < TOLERANCE);
        assert_eq!(values[1], 0.0);
    }

    #[test]
    fn test_over_constrained_contradiction() {
        // v1 = 1 and v1 = 2.
        let mut m = matrix(vec![vec![1.0, 1.0], vec![1.0, 2.0]]);
        m.rref();
        assert!(m.is_over_constrained());
    }

    #[test]
    fn test_redundant_row_is_not_over_constrained() {
        // v1 + v2 = 6 stated twice: redundant, not contradictory.
        let mut m = matrix(vec![vec![1.0, 1.0, 6.0], vec![1.0, 1.0, 6.0]]);
        m.rref();
        assert!(!m.is_over_constrained());
        assert!(m.is_under_constrained());
        assert_eq!(m.rank(), 1);
    }

    #[test]
    fn test_empty_matrix() {
        let mut m = Matrix::from_rows(3, Vec::new());
        m.rref();
        assert_eq!(m.rank(), 0);
        assert!(m.is_under_constrained());
        assert!(!m.is_over_constrained());
        assert_eq!(m.solution(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_zero_column_is_skipped() {
        // Nothing mentions the first variable; its column pivots are all
        // within tolerance, so the lead row must not advance past it.
        let mut m = matrix(vec![vec![0.0, 1.0, 3.0], vec![0.0, 2.0, 6.0]]);
        m.rref();
        let values = m.solution();
        assert_eq!(values[0], 0.0);
        assert!((values[1] - 3.0).abs() < TOLERANCE);
        assert_eq!(m.rank(), 1);
        assert!(m.is_under_constrained());
    }

    #[test]
    fn test_pivot_prefers_largest_magnitude() {
        // The 0.0001 entry would be a terrible pivot; partial pivoting must
        // swap the second row up first.
        let values = solve(vec![vec![0.0001, 1.0, 1.0], vec![1.0, 1.0, 2.0]]);
        let expected_v1 = 1.0 / 0.9999;
        let expected_v2 = 1.0 - 0.0001 * expected_v1;
        assert!((values[0] - expected_v1).abs() < 1e-9);
        assert!((values[1] - expected_v2).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn prop_rank_never_exceeds_dimensions(
            rows in (1usize..=6, 0usize..=6).prop_flat_map(|(width_minus_one, height)| {
                let width = width_minus_one + 1;
                proptest::collection::vec(
                    proptest::collection::vec(-100.0f64..100.0, width..=width),
                    height..=height,
                )
            })
        ) {
            let m = {
                let width = rows.first().map(|r| r.len()).unwrap_or(1);
                let mut m = Matrix::from_rows(width, rows);
                m.rref();
                m
            };
            prop_assert!(m.rank() <= m.variable_columns().min(m.height()));
        }

        #[test]
        fn prop_exact_system_round_trips(
            solution in proptest::collection::vec(-10.0f64..10.0, 1..=4),
            seeds in proptest::collection::vec(
                proptest::collection::vec(-1.0f64..1.0, 4..=4),
                4..=4,
            )
        ) {
            // Build a diagonally dominant coefficient matrix (guaranteed
            // non-singular and well conditioned), derive the sums from the
            // chosen solution, and check that reduction reproduces it.
            let n = solution.len();
            let mut rows = Vec::with_capacity(n);
            for i in 0..n {
                let mut row = vec![0.0; n + 1];
                let mut off_diagonal = 0.0;
                for j in 0..n {
                    if j != i {
                        row[j] = seeds[i][j];
                        off_diagonal += seeds[i][j].abs();
                    }
                }
                row[i] = off_diagonal + 1.0;
                row[n] = (0..n).map(|j| row[j] * solution[j]).sum();
                rows.push(row);
            }

            let mut m = Matrix::from_rows(n + 1, rows);
            m.rref();
            prop_assert!(!m.is_over_constrained());
            prop_assert!(!m.is_under_constrained());
            let solved = m.solution();
            for (got, want) in solved.iter().zip(&solution) {
                prop_assert!((got - want).abs() < TOLERANCE, "got {got}, want {want}");
            }
        }
    }
}
