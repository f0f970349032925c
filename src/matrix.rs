//! Dense row-major matrix used by the transient solver.
//!
//! Sizes here are tiny (one row per node plus one per voltage source), so the
//! engine favours a simple dense layout and Gauss-Jordan elimination with
//! full pivoting over anything clever.

use std::fmt;
use std::ops::{Div, Index, IndexMut, Mul};

use crate::error::{Result, TranspiceError};

/// Absolute tolerance for [`PartialEq`] on matrices.
pub const EPSILON: f64 = 1e-9;

/// A pivot smaller than this, relative to the largest entry, is treated as zero.
///
/// The test is relative to the whole matrix, so a well-posed system whose
/// entries span more than thirteen decades is reported singular. An MNA
/// matrix with a voltage source (unit coupling entries) and resistors of
/// 100T or more (conductances of 1e-14) is one such case.
pub const SINGULAR_EPSILON: f64 = 1e-13;

/// A dense matrix of `f64` stored row-major.
#[derive(Debug, Clone, Default)]
pub struct Matrix {
    rows: usize,
    columns: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create a zero-filled `rows x columns` matrix.
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            data: vec![0.0; rows * columns],
        }
    }

    /// Create an `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::new(n, n);
        for i in 0..n {
            m[(i, i)] = 1.0;
        }
        m
    }

    /// Create an `n x 1` column vector.
    pub fn column_vector(values: &[f64]) -> Self {
        Self {
            rows: values.len(),
            columns: 1,
            data: values.to_vec(),
        }
    }

    /// Create a matrix from row slices. All rows must have the same length.
    pub fn from_rows(rows: &[&[f64]]) -> Result<Self> {
        let columns = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(rows.len() * columns);
        for row in rows {
            if row.len() != columns {
                return Err(TranspiceError::DimensionMismatch {
                    operation: "from_rows",
                    left: (1, columns),
                    right: (1, row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            columns,
            data,
        })
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Dimensions as `(rows, columns)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    /// Check if the matrix is square.
    pub fn is_square(&self) -> bool {
        self.rows == self.columns
    }

    /// Raw row-major values.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Get element at (row, column).
    pub fn get(&self, row: usize, column: usize) -> f64 {
        self[(row, column)]
    }

    /// Set element at (row, column).
    pub fn set(&mut self, row: usize, column: usize, value: f64) {
        self[(row, column)] = value;
    }

    /// Add to element at (row, column).
    pub fn add_at(&mut self, row: usize, column: usize, value: f64) {
        self[(row, column)] += value;
    }

    /// Zero every element, keeping the dimensions.
    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Change dimensions, keeping the overlapping top-left block.
    /// New cells are zero.
    pub fn resize(&mut self, rows: usize, columns: usize) {
        if rows == self.rows && columns == self.columns {
            return;
        }
        let mut data = vec![0.0; rows * columns];
        for r in 0..rows.min(self.rows) {
            for c in 0..columns.min(self.columns) {
                data[r * columns + c] = self.data[r * self.columns + c];
            }
        }
        self.rows = rows;
        self.columns = columns;
        self.data = data;
    }

    /// Transposed copy.
    pub fn transpose(&self) -> Matrix {
        let mut t = Matrix::new(self.columns, self.rows);
        for r in 0..self.rows {
            for c in 0..self.columns {
                t[(c, r)] = self[(r, c)];
            }
        }
        t
    }

    /// Elementwise sum. Fails when the shapes differ.
    pub fn try_add(&self, other: &Matrix) -> Result<Matrix> {
        if self.shape() != other.shape() {
            return Err(TranspiceError::DimensionMismatch {
                operation: "add",
                left: self.shape(),
                right: other.shape(),
            });
        }
        let data = self
            .data
            .iter()
            .zip(&other.data)
            .map(|(a, b)| a + b)
            .collect();
        Ok(Matrix {
            rows: self.rows,
            columns: self.columns,
            data,
        })
    }

    /// Matrix product. Fails when the inner dimensions differ.
    pub fn try_mul(&self, other: &Matrix) -> Result<Matrix> {
        if self.columns != other.rows {
            return Err(TranspiceError::DimensionMismatch {
                operation: "multiply",
                left: self.shape(),
                right: other.shape(),
            });
        }
        let mut product = Matrix::new(self.rows, other.columns);
        for r in 0..self.rows {
            for k in 0..self.columns {
                let a = self[(r, k)];
                if a == 0.0 {
                    continue;
                }
                for c in 0..other.columns {
                    product[(r, c)] += a * other[(k, c)];
                }
            }
        }
        Ok(product)
    }

    fn require_square(&self, operation: &'static str) -> Result<()> {
        if self.is_square() {
            Ok(())
        } else {
            Err(TranspiceError::DimensionMismatch {
                operation,
                left: self.shape(),
                right: (self.columns, self.rows),
            })
        }
    }

    fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0f64, |m, v| m.max(v.abs()))
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for c in 0..self.columns {
            self.data.swap(a * self.columns + c, b * self.columns + c);
        }
    }

    fn swap_columns(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for r in 0..self.rows {
            self.data.swap(r * self.columns + a, r * self.columns + b);
        }
    }

    /// Determinant by Gaussian elimination with full pivoting.
    pub fn determinant(&self) -> Result<f64> {
        self.require_square("determinant")?;
        let n = self.rows;
        let mut a = self.clone();
        let mut det = 1.0;

        for k in 0..n {
            // Largest remaining entry becomes the pivot
            let (mut pr, mut pc, mut big) = (k, k, 0.0);
            for r in k..n {
                for c in k..n {
                    let v = a[(r, c)].abs();
                    if v > big {
                        big = v;
                        pr = r;
                        pc = c;
                    }
                }
            }
            if big == 0.0 {
                return Ok(0.0);
            }
            if pr != k {
                a.swap_rows(pr, k);
                det = -det;
            }
            if pc != k {
                a.swap_columns(pc, k);
                det = -det;
            }

            let pivot = a[(k, k)];
            det *= pivot;
            for r in (k + 1)..n {
                let factor = a[(r, k)] / pivot;
                if factor == 0.0 {
                    continue;
                }
                for c in k..n {
                    let v = a[(k, c)];
                    a[(r, c)] -= factor * v;
                }
            }
        }

        Ok(det)
    }

    /// Inverse by Gauss-Jordan elimination with full pivoting.
    ///
    /// Fails with [`TranspiceError::SingularMatrix`] when a pivot vanishes.
    pub fn inverse(&self) -> Result<Matrix> {
        self.require_square("inverse")?;
        let n = self.rows;
        let mut a = self.clone();
        let threshold = SINGULAR_EPSILON * self.max_abs();

        let mut used = vec![false; n];
        let mut pivot_rows = vec![0usize; n];
        let mut pivot_cols = vec![0usize; n];

        for i in 0..n {
            let (mut row, mut col, mut big) = (0, 0, -1.0);
            for r in 0..n {
                if used[r] {
                    continue;
                }
                for c in 0..n {
                    if used[c] {
                        continue;
                    }
                    let v = a[(r, c)].abs();
                    if v > big {
                        big = v;
                        row = r;
                        col = c;
                    }
                }
            }
            if big <= threshold || big == 0.0 {
                return Err(TranspiceError::SingularMatrix);
            }
            used[col] = true;

            // Move the pivot onto the diagonal
            a.swap_rows(row, col);
            pivot_rows[i] = row;
            pivot_cols[i] = col;

            let inv_pivot = 1.0 / a[(col, col)];
            a[(col, col)] = 1.0;
            for c in 0..n {
                a[(col, c)] *= inv_pivot;
            }

            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = a[(r, col)];
                if factor == 0.0 {
                    continue;
                }
                a[(r, col)] = 0.0;
                for c in 0..n {
                    let v = a[(col, c)];
                    a[(r, c)] -= v * factor;
                }
            }
        }

        // Undo the row interchanges as column interchanges, in reverse
        for i in (0..n).rev() {
            a.swap_columns(pivot_rows[i], pivot_cols[i]);
        }

        Ok(a)
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, column): (usize, usize)) -> &f64 {
        debug_assert!(row < self.rows && column < self.columns);
        &self.data[row * self.columns + column]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, column): (usize, usize)) -> &mut f64 {
        debug_assert!(row < self.rows && column < self.columns);
        &mut self.data[row * self.columns + column]
    }
}

impl Mul<f64> for Matrix {
    type Output = Matrix;

    fn mul(mut self, scalar: f64) -> Matrix {
        self.data.iter_mut().for_each(|v| *v *= scalar);
        self
    }
}

impl Mul<f64> for &Matrix {
    type Output = Matrix;

    fn mul(self, scalar: f64) -> Matrix {
        self.clone() * scalar
    }
}

impl Div<f64> for Matrix {
    type Output = Matrix;

    fn div(mut self, scalar: f64) -> Matrix {
        self.data.iter_mut().for_each(|v| *v /= scalar);
        self
    }
}

impl Div<f64> for &Matrix {
    type Output = Matrix;

    fn div(self, scalar: f64) -> Matrix {
        self.clone() / scalar
    }
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| (a - b).abs() <= EPSILON)
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for r in 0..self.rows {
            let row = &self.data[r * self.columns..(r + 1) * self.columns];
            let cells: Vec<String> = row.iter().map(|v| format!("{:>12.6e}", v)).collect();
            writeln!(f, "[{}]", cells.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn m(rows: &[&[f64]]) -> Matrix {
        Matrix::from_rows(rows).unwrap()
    }

    #[test]
    fn test_resize_keeps_top_left() {
        let mut a = m(&[&[1.0, 2.0], &[3.0, 4.0]]);
        a.resize(3, 3);
        assert_eq!(a, m(&[&[1.0, 2.0, 0.0], &[3.0, 4.0, 0.0], &[0.0, 0.0, 0.0]]));
        a.resize(1, 2);
        assert_eq!(a, m(&[&[1.0, 2.0]]));
    }

    #[test]
    fn test_clear() {
        let mut a = m(&[&[1.0, 2.0], &[3.0, 4.0]]);
        a.clear();
        assert_eq!(a, Matrix::new(2, 2));
    }

    #[test]
    fn test_scalar_ops() {
        let a = m(&[&[1.0, -2.0]]);
        assert_eq!(&a * 3.0, m(&[&[3.0, -6.0]]));
        assert_eq!(a / 2.0, m(&[&[0.5, -1.0]]));
    }

    #[test]
    fn test_add_and_mul_check_dimensions() {
        let a = m(&[&[1.0, 2.0], &[3.0, 4.0]]);
        let v = Matrix::column_vector(&[1.0, 1.0]);
        assert_eq!(a.try_mul(&v).unwrap(), Matrix::column_vector(&[3.0, 7.0]));
        assert_eq!(a.try_add(&a).unwrap(), &a * 2.0);
        assert!(matches!(
            a.try_add(&v),
            Err(TranspiceError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            v.try_mul(&a),
            Err(TranspiceError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_equality_tolerates_noise() {
        let a = m(&[&[1.0]]);
        assert_eq!(a, m(&[&[1.0 + 1e-12]]));
        assert_ne!(a, m(&[&[1.001]]));
        assert_ne!(a, Matrix::new(1, 2));
    }

    #[test]
    fn test_determinant() {
        let a = m(&[&[2.0, 0.0, 1.0], &[1.0, 3.0, 2.0], &[1.0, 1.0, 2.0]]);
        assert_relative_eq!(a.determinant().unwrap(), 6.0, max_relative = 1e-12);
        let swapped = m(&[&[0.0, 1.0], &[1.0, 0.0]]);
        assert_relative_eq!(swapped.determinant().unwrap(), -1.0);
        let singular = m(&[&[1.0, 2.0], &[2.0, 4.0]]);
        assert_eq!(singular.determinant().unwrap(), 0.0);
    }

    #[test]
    fn test_inverse() {
        let a = m(&[&[4.0, 7.0, 2.0], &[3.0, 6.0, 1.0], &[2.0, 5.0, 3.0]]);
        let inv = a.inverse().unwrap();
        assert_eq!(a.try_mul(&inv).unwrap(), Matrix::identity(3));
        assert_eq!(inv.try_mul(&a).unwrap(), Matrix::identity(3));
    }

    #[test]
    fn test_inverse_needs_pivoting() {
        // Zero on the diagonal forces row and column interchanges
        let a = m(&[&[0.0, 1.0, 0.0], &[0.0, 0.0, 1.0], &[1.0, 0.0, 0.0]]);
        let inv = a.inverse().unwrap();
        assert_eq!(inv, a.transpose());
    }

    #[test]
    fn test_inverse_singular() {
        let a = m(&[&[1.0, 0.0], &[0.0, 0.0]]);
        assert!(matches!(a.inverse(), Err(TranspiceError::SingularMatrix)));
        assert!(matches!(Matrix::new(3, 3).inverse(), Err(TranspiceError::SingularMatrix)));
        assert!(matches!(
            Matrix::new(2, 3).inverse(),
            Err(TranspiceError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_inverse_threshold_is_relative() {
        // Invertible, but the small pivot is below 1e-13 of the largest entry
        let mixed = m(&[&[1.0, 0.0], &[0.0, 1e-14]]);
        assert!(matches!(mixed.inverse(), Err(TranspiceError::SingularMatrix)));

        // The same spread scaled down as a whole is fine
        let small = m(&[&[1e-14, 0.0], &[0.0, 2e-14]]);
        let inv = small.inverse().unwrap();
        assert_relative_eq!(inv[(0, 0)], 1e14, max_relative = 1e-12);
        assert_relative_eq!(inv[(1, 1)], 5e13, max_relative = 1e-12);
    }
}
