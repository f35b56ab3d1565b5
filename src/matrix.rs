//! Dense row-major matrices over GF(2^16) for PAR2 Reed-Solomon reconstruction.
//!
//! Ported from the reference implementation's `reedsolomon` matrix type
//! (itself "heavily inspired by github.com/klauspost/reedsolomon"), with the
//! PAR2-specific Vandermonde construction and the constant generator used to
//! fill its second row.

use crate::galois::{gf_div, gf_mul};
use thiserror::Error;

/// Errors produced by matrix construction and solving.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MatrixError {
    #[error("matrix must have at least one row")]
    InvalidRowSize,
    #[error("matrix must have at least one column")]
    InvalidColSize,
    #[error("row size is not the same for both matrices")]
    RowSizeMismatch,
    #[error("column size is not the same for both matrices")]
    ColSizeMismatch,
    #[error("rows must all share the same width")]
    RaggedRows,
    #[error("cannot multiply matrices: left.cols != right.rows")]
    DimensionMismatch,
    #[error("matrix is singular and cannot be solved")]
    Singular,
}

/// A dense row-major matrix of GF(2^16) elements.
///
/// Invariants: `rows > 0`, `cols > 0`, `data.len() == rows * cols`. Matrices
/// own their backing storage; `augment`/`augment_vertical` always allocate a
/// new matrix rather than aliasing either input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    data: Vec<u16>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Creates a new zero-filled matrix.
    pub fn new(rows: usize, cols: usize) -> Result<Self, MatrixError> {
        if rows == 0 {
            return Err(MatrixError::InvalidRowSize);
        }
        if cols == 0 {
            return Err(MatrixError::InvalidColSize);
        }
        Ok(Self {
            data: vec![0u16; rows * cols],
            rows,
            cols,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn data(&self) -> &[u16] {
        &self.data
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u16 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: u16) {
        self.data[row * self.cols + col] = value;
    }

    pub fn row(&self, row: usize) -> &[u16] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    fn row_mut(&mut self, row: usize) -> &mut [u16] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Builds a matrix from a set of equal-width rows.
    pub fn from_rows(rows: &[Vec<u16>]) -> Result<Self, MatrixError> {
        if rows.is_empty() {
            return Err(MatrixError::InvalidRowSize);
        }
        let cols = rows[0].len();
        if cols == 0 {
            return Err(MatrixError::InvalidColSize);
        }
        if rows.iter().any(|r| r.len() != cols) {
            return Err(MatrixError::RaggedRows);
        }
        let mut m = Matrix::new(rows.len(), cols)?;
        for (r, row) in rows.iter().enumerate() {
            m.row_mut(r).copy_from_slice(row);
        }
        Ok(m)
    }

    /// Builds a single-column matrix from a sequence of values.
    pub fn column(values: &[u16]) -> Result<Self, MatrixError> {
        if values.is_empty() {
            return Err(MatrixError::InvalidColSize);
        }
        let mut m = Matrix::new(values.len(), 1)?;
        m.data.copy_from_slice(values);
        Ok(m)
    }

    /// Builds a square identity matrix.
    pub fn identity(size: usize) -> Result<Self, MatrixError> {
        let mut m = Matrix::new(size, size)?;
        for i in 0..size {
            m.set(i, i, 1);
        }
        Ok(m)
    }

    /// Builds the PAR2-specification Vandermonde matrix.
    ///
    /// Row 0 and column 0 are all `1`. Row 1 is populated from the PAR2
    /// constant generator (see [`ConstantPool`]). Every other cell is the
    /// product (in GF(2^16)) of the cell directly above it and the cell in
    /// row 1 of the same column.
    pub fn vandermonde_par2(rows: usize, cols: usize) -> Result<Self, MatrixError> {
        let mut m = Matrix::new(rows, cols)?;
        let mut pool = ConstantPool::new();
        for r in 0..rows {
            for c in 0..cols {
                if c == 0 || r == 0 {
                    m.set(r, c, 1);
                    continue;
                }
                if r == 1 {
                    m.set(r, c, pool.next());
                    continue;
                }
                let value = gf_mul(m.get(r - 1, c), m.get(1, c));
                m.set(r, c, value);
            }
        }
        Ok(m)
    }

    /// Matrix multiplication using GF(2^16) `+`/`*`. Fails if `self.cols != other.rows`.
    pub fn mul(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        if self.cols != other.rows {
            return Err(MatrixError::DimensionMismatch);
        }
        let mut result = Matrix::new(self.rows, other.cols)?;
        for r in 0..result.rows {
            for c in 0..result.cols {
                let mut value = 0u16;
                for i in 0..self.cols {
                    value ^= gf_mul(self.get(r, i), other.get(i, c));
                }
                result.set(r, c, value);
            }
        }
        Ok(result)
    }

    /// Horizontal concatenation: `self` followed by `other`'s columns.
    /// Both matrices must have the same number of rows.
    pub fn augment(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        if self.rows != other.rows {
            return Err(MatrixError::RowSizeMismatch);
        }
        let mut result = Matrix::new(self.rows, self.cols + other.cols)?;
        for r in 0..self.rows {
            result.row_mut(r)[..self.cols].copy_from_slice(self.row(r));
            result.row_mut(r)[self.cols..].copy_from_slice(other.row(r));
        }
        Ok(result)
    }

    /// Vertical concatenation: `self`'s rows followed by `other`'s rows.
    /// Both matrices must have the same number of columns. Deep-copies both
    /// operands, so mutating either input afterward never changes the result.
    pub fn augment_vertical(&self, other: &Matrix) -> Result<Matrix, MatrixError> {
        if self.cols != other.cols {
            return Err(MatrixError::ColSizeMismatch);
        }
        let mut data = Vec::with_capacity(self.data.len() + other.data.len());
        data.extend_from_slice(&self.data);
        data.extend_from_slice(&other.data);
        Ok(Matrix {
            data,
            rows: self.rows + other.rows,
            cols: self.cols,
        })
    }

    /// Returns a copy containing only the given rows, in order.
    pub fn select_rows(&self, rows: &[usize]) -> Result<Matrix, MatrixError> {
        let mut m = Matrix::new(rows.len(), self.cols)?;
        for (dst, &src) in rows.iter().enumerate() {
            m.row_mut(dst).copy_from_slice(self.row(src));
        }
        Ok(m)
    }

    fn swap_rows(&mut self, r1: usize, r2: usize) {
        if r1 == r2 {
            return;
        }
        let cols = self.cols;
        let (lo, hi) = if r1 < r2 { (r1, r2) } else { (r2, r1) };
        let (head, tail) = self.data.split_at_mut(hi * cols);
        head[lo * cols..lo * cols + cols].swap_with_slice(&mut tail[..cols]);
    }

    /// In-place Gauss-Jordan elimination to reduced row-echelon form.
    ///
    /// For each pivot row, swaps in a row with a nonzero pivot column if
    /// needed (failing with [`MatrixError::Singular`] if none exists), scales
    /// the row so the pivot is `1`, eliminates the pivot column from every
    /// row below, then (after the forward pass) clears the pivot column from
    /// every row above.
    pub fn gaussian_elimination(&mut self) -> Result<(), MatrixError> {
        for r in 0..self.rows {
            if self.get(r, r) == 0 {
                let swap_with = (r + 1..self.rows).find(|&below| self.get(below, r) != 0);
                match swap_with {
                    Some(below) => self.swap_rows(r, below),
                    None => return Err(MatrixError::Singular),
                }
            }

            let pivot = self.get(r, r);
            if pivot != 1 {
                let scale = gf_div(1, pivot);
                for c in 0..self.cols {
                    let v = gf_mul(self.get(r, c), scale);
                    self.set(r, c, v);
                }
            }

            for below in (r + 1)..self.rows {
                let factor = self.get(below, r);
                if factor != 0 {
                    for c in 0..self.cols {
                        let v = self.get(below, c) ^ gf_mul(factor, self.get(r, c));
                        self.set(below, c, v);
                    }
                }
            }
        }

        for d in 0..self.rows {
            for above in 0..d {
                let factor = self.get(above, d);
                if factor != 0 {
                    for c in 0..self.cols {
                        let v = self.get(above, c) ^ gf_mul(factor, self.get(d, c));
                        self.set(above, c, v);
                    }
                }
            }
        }

        Ok(())
    }
}

/// The PAR2-specification constant generator used to populate row 1 of
/// [`Matrix::vandermonde_par2`].
///
/// Starting from value `1` at power `0`, repeatedly doubles the value (in
/// GF(2^16)) and increments the power, yielding the value only when the
/// power is not divisible by 3, 5, 17, or 257.
pub struct ConstantPool {
    power: u32,
    value: u16,
}

impl ConstantPool {
    pub fn new() -> Self {
        Self { power: 0, value: 1 }
    }

    pub fn next(&mut self) -> u16 {
        loop {
            self.value = gf_mul(self.value, 2);
            self.power += 1;
            if self.power % 3 != 0 && self.power % 5 != 0 && self.power % 17 != 0 && self.power % 257 != 0 {
                break;
            }
        }
        self.value
    }
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_pool_first_eleven_values() {
        let mut pool = ConstantPool::new();
        let values: Vec<u16> = (0..11).map(|_| pool.next()).collect();
        assert_eq!(
            values,
            vec![2, 4, 16, 128, 256, 2048, 8192, 16384, 4107, 32856, 17132]
        );
    }

    #[test]
    fn identity_times_self_is_identity() {
        let id = Matrix::identity(4).unwrap();
        let product = id.mul(&id).unwrap();
        assert_eq!(product, id);
    }

    #[test]
    fn vandermonde_sample() {
        let m = Matrix::vandermonde_par2(5, 6).unwrap();
        let expected: [[u16; 6]; 5] = [
            [1, 1, 1, 1, 1, 1],
            [1, 2, 4, 16, 128, 256],
            [1, 4, 16, 256, 16384, 4107],
            [1, 8, 64, 4096, 8566, 7099],
            [1, 16, 256, 4107, 43963, 7166],
        ];
        for r in 0..5 {
            for c in 0..6 {
                assert_eq!(m.get(r, c), expected[r][c], "mismatch at ({r},{c})");
            }
        }
    }

    #[test]
    fn gaussian_elimination_sample() {
        let mut m = Matrix::from_rows(&[
            vec![4, 2, 3, 1],
            vec![2, 3, 5, 0],
            vec![3, 4, 5, 0],
        ])
        .unwrap();
        m.gaussian_elimination().unwrap();
        assert_eq!(m.row(0), &[1, 0, 0, 43393]);
        assert_eq!(m.row(1), &[0, 1, 0, 14427]);
        assert_eq!(m.row(2), &[0, 0, 1, 21091]);
    }

    #[test]
    fn gaussian_elimination_singular_matrix_fails() {
        let mut m = Matrix::from_rows(&[vec![1, 1], vec![1, 1]]).unwrap();
        assert_eq!(m.gaussian_elimination(), Err(MatrixError::Singular));
    }

    #[test]
    fn augment_vertical_deep_copies() {
        let top = Matrix::identity(2).unwrap();
        let mut bottom = Matrix::new(1, 2).unwrap();
        bottom.set(0, 0, 7);
        bottom.set(0, 1, 8);
        let combined = top.augment_vertical(&bottom).unwrap();
        let mut bottom_mut = bottom;
        bottom_mut.set(0, 0, 99);
        assert_eq!(combined.row(2), &[7, 8]);
    }

    #[test]
    fn archive_end_to_end_vector() {
        // Canonical test vector from the PAR2 recovery spec: 10 data elements
        // recovered from 3 checksums via a 3x10 PAR2 Vandermonde matrix.
        let data: Vec<u16> = (1..=10).collect();
        let checksums: Vec<u16> = vec![11, 60570, 57778];

        let a = Matrix::identity(10)
            .unwrap()
            .augment_vertical(&Matrix::vandermonde_par2(3, 10).unwrap())
            .unwrap();
        let b = Matrix::column(&[data.clone(), checksums].concat()).unwrap();
        let augmented = a.augment(&b).unwrap();

        // Drop rows 4..6 (0-indexed) to simulate missing slices.
        let keep: Vec<usize> = (0..augmented.rows()).filter(|r| !(4..6).contains(r)).collect();
        let mut solvable = augmented.select_rows(&keep).unwrap();

        solvable.gaussian_elimination().unwrap();

        let recovered: Vec<u16> = (0..10).map(|r| solvable.get(r, solvable.cols() - 1)).collect();
        assert_eq!(recovered, data);
    }

    #[test]
    fn mul_dimension_mismatch() {
        let a = Matrix::new(2, 3).unwrap();
        let b = Matrix::new(2, 3).unwrap();
        assert_eq!(a.mul(&b), Err(MatrixError::DimensionMismatch));
    }
}
