//! Row-major `f32` matrix.
//!
//! Inputs, weights, biases and layer outputs all share this type. Every matrix product
//! goes through [`gemm_f32`]:
//! - default: a simple, safe triple-loop implementation
//! - optional: a faster backend via the `matrixmultiply` feature

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    pub fn filled(rows: usize, cols: usize, value: f32) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Build a matrix from a flat row-major buffer.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidData(format!(
                "buffer length {} does not match rows * cols ({rows} * {cols})",
                data.len()
            )));
        }
        Ok(Self { rows, cols, data })
    }

    /// Build a matrix from per-row vectors.
    ///
    /// This is a convenience constructor (it copies into contiguous storage).
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        let cols = rows.first().map(|r| r.len()).unwrap_or(0);
        let mut data = Vec::with_capacity(rows.len() * cols);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::InvalidData(format!(
                    "row {i} has len {}, expected {cols}",
                    row.len()
                )));
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// A `1 x n` matrix.
    pub fn row_vector(values: Vec<f32>) -> Self {
        Self {
            rows: 1,
            cols: values.len(),
            data: values,
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    #[inline]
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn row(&self, row: usize) -> &[f32] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Copy row `row` out as a `1 x cols` matrix.
    pub fn row_matrix(&self, row: usize) -> Matrix {
        Matrix::row_vector(self.row(row).to_vec())
    }

    /// Gather the given rows into a new matrix, in order.
    pub fn select_rows(&self, indices: &[usize]) -> Matrix {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        Matrix {
            rows: indices.len(),
            cols: self.cols,
            data,
        }
    }

    pub fn transpose(&self) -> Matrix {
        let mut out = Matrix::zeros(self.cols, self.rows);
        for r in 0..self.rows {
            for c in 0..self.cols {
                out.data[c * self.rows + r] = self.data[r * self.cols + c];
            }
        }
        out
    }

    pub fn map(&self, f: impl Fn(f32) -> f32) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// `self · rhs`.
    pub fn matmul(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.cols != rhs.rows {
            return Err(Error::shape(
                "matrix product rhs",
                (self.cols, rhs.cols),
                rhs.shape(),
            ));
        }
        let mut out = Matrix::zeros(self.rows, rhs.cols);
        if self.rows == 0 || rhs.cols == 0 || self.cols == 0 {
            return Ok(out);
        }
        gemm_f32(
            self.rows,
            rhs.cols,
            self.cols,
            1.0,
            &self.data,
            self.cols,
            1,
            &rhs.data,
            rhs.cols,
            1,
            0.0,
            &mut out.data,
            rhs.cols,
            1,
        );
        Ok(out)
    }

    /// Add a `1 x cols` row to every row of `self`.
    pub fn add_row(&mut self, bias: &Matrix) -> Result<()> {
        if bias.shape() != (1, self.cols) {
            return Err(Error::shape("broadcast row", (1, self.cols), bias.shape()));
        }
        for chunk in self.data.chunks_exact_mut(self.cols.max(1)) {
            for (v, &b) in chunk.iter_mut().zip(&bias.data) {
                *v += b;
            }
        }
        Ok(())
    }

    /// Column sums as a `1 x cols` matrix.
    pub fn sum_rows(&self) -> Matrix {
        let mut out = Matrix::zeros(1, self.cols);
        for r in 0..self.rows {
            for (acc, &v) in out.data.iter_mut().zip(self.row(r)) {
                *acc += v;
            }
        }
        out
    }

    /// Element-wise product, shapes must match.
    pub fn hadamard(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.shape() != rhs.shape() {
            return Err(Error::shape("element-wise product", self.shape(), rhs.shape()));
        }
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&rhs.data)
                .map(|(&a, &b)| a * b)
                .collect(),
        })
    }

    /// `self -= lr * grad`.
    pub fn sub_scaled(&mut self, grad: &Matrix, lr: f32) {
        debug_assert_eq!(self.shape(), grad.shape());
        for (p, &g) in self.data.iter_mut().zip(&grad.data) {
            *p = (-lr).mul_add(g, *p);
        }
    }

    pub fn abs_sum(&self) -> f32 {
        self.data.iter().map(|v| v.abs()).sum()
    }

    pub fn sq_sum(&self) -> f32 {
        self.data.iter().fold(0.0, |acc, &v| v.mul_add(v, acc))
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }
}

#[allow(clippy::too_many_arguments)]
#[inline]
pub(crate) fn gemm_f32(
    m: usize,
    n: usize,
    k: usize,
    alpha: f32,
    a: &[f32],
    rsa: usize,
    csa: usize,
    b: &[f32],
    rsb: usize,
    csb: usize,
    beta: f32,
    c: &mut [f32],
    rsc: usize,
    csc: usize,
) {
    debug_assert!(m > 0 && n > 0 && k > 0);

    #[cfg(feature = "matrixmultiply")]
    {
        // SAFETY: callers pass buffers sized for (m, k), (k, n) and (m, n) with the given
        // strides; `Matrix::matmul` is the only caller.
        unsafe {
            matrixmultiply::sgemm(
                m,
                k,
                n,
                alpha,
                a.as_ptr(),
                rsa as isize,
                csa as isize,
                b.as_ptr(),
                rsb as isize,
                csb as isize,
                beta,
                c.as_mut_ptr(),
                rsc as isize,
                csc as isize,
            );
        }
    }

    #[cfg(not(feature = "matrixmultiply"))]
    for i in 0..m {
        for j in 0..n {
            let mut acc = 0.0_f32;
            let a0 = i * rsa;
            let b0 = j * csb;

            for p in 0..k {
                let av = a[a0 + p * csa];
                let bv = b[p * rsb + b0];
                acc = av.mul_add(bv, acc);
            }

            let idx = i * rsc + j * csc;
            c[idx] = alpha * acc + beta * c[idx];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matmul_small() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let b = Matrix::from_rows(&[vec![5.0], vec![6.0]]).unwrap();
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.shape(), (2, 1));
        assert_eq!(c.as_slice(), &[17.0, 39.0]);
    }

    #[test]
    fn matmul_rejects_inner_dim_mismatch() {
        let a = Matrix::zeros(2, 3);
        let b = Matrix::zeros(2, 1);
        let err = a.matmul(&b).unwrap_err();
        assert!(matches!(
            err,
            Error::Shape {
                expected: (3, 1),
                got: (2, 1),
                ..
            }
        ));
    }

    #[test]
    fn add_row_broadcasts_over_rows() {
        let mut a = Matrix::zeros(2, 2);
        a.add_row(&Matrix::row_vector(vec![1.0, -1.0])).unwrap();
        assert_eq!(a.as_slice(), &[1.0, -1.0, 1.0, -1.0]);
    }

    #[test]
    fn transpose_and_sum_rows() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        let t = a.transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t.as_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
        assert_eq!(a.sum_rows().as_slice(), &[5.0, 7.0, 9.0]);
    }

    #[test]
    fn from_rows_rejects_ragged_input() {
        assert!(Matrix::from_rows(&[vec![1.0], vec![1.0, 2.0]]).is_err());
    }
}
