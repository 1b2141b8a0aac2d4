/*
 * @file matrix.rs
 * @author The blocked_lu authors
 * @copyright 2026 The blocked_lu authors
 *
 * Dense row-major matrices, and mutable views of a rectangular region of one.
 */

use crate::tilematrix::tile::multiply_accumulate;
use crate::tilematrix::permutation::Permutation;
use crate::error::{LuError,Result};
use std::cmp::max;
use std::ops::{Index,IndexMut};
use rand::Rng;

/**************************************************************************
 * Transposer
 **************************************************************************/

/**
 * Transpose a rows x cols row-major buffer in place, through a scratch copy.
 * Afterwards the buffer holds the cols x rows transpose.
 */
pub fn transpose(a:&mut [f64], rows:usize, cols:usize) {
    debug_assert!(a.len() >= rows*cols);
    let scratch = a[..rows*cols].to_vec();
    for i in 0..rows {
        for j in 0..cols {
            a[j*rows + i] = scratch[i*cols + j];
        }
    }
}

/**************************************************************************
 * Owned matrices
 **************************************************************************/

/** Dense row-major f64 matrix */
#[derive(Clone, PartialEq, Debug)]
pub struct Matrix {
    pub rows : usize,
    pub cols : usize,
    pub data : Vec<f64>
}

impl Matrix {
    /** Create a new zero matrix. */
    pub fn new(rows:usize, cols:usize) -> Matrix {
        Matrix { rows, cols, data: vec![0.0; rows*cols] }
    }

    /** The n x n identity */
    pub fn identity(n:usize) -> Matrix {
        let mut ret = Matrix::new(n,n);
        for i in 0..n { ret.data[i*n+i] = 1.0; }
        ret
    }

    /** Wrap an existing row-major buffer */
    pub fn from_vec(rows:usize, cols:usize, data:Vec<f64>) -> Result<Matrix> {
        if data.len() != rows*cols {
            return Err(LuError::DimensionMismatch { expected: rows*cols, got: data.len() });
        }
        Ok(Matrix { rows, cols, data })
    }

    /** Build from nested rows; all rows must have the same length */
    pub fn from_rows(rows:&[&[f64]]) -> Result<Matrix> {
        let cols = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(rows.len()*cols);
        for r in rows {
            if r.len() != cols {
                return Err(LuError::DimensionMismatch { expected: cols, got: r.len() });
            }
            data.extend_from_slice(r);
        }
        Ok(Matrix { rows: rows.len(), cols, data })
    }

    pub fn as_slice(&self) -> &[f64] { &self.data }
    pub fn as_mut_slice(&mut self) -> &mut [f64] { &mut self.data }

    /** A mutable view of the whole matrix */
    pub fn view_mut(&mut self) -> SubMatrixMut<'_> {
        let (rows, cols) = (self.rows, self.cols);
        SubMatrixMut::new(&mut self.data, cols, rows, cols)
    }

    /** Return the transpose of self */
    pub fn transpose(&self) -> Matrix {
        let mut ret = Matrix { rows: self.cols, cols: self.rows, data: self.data.clone() };
        transpose(&mut ret.data, self.rows, self.cols);
        ret
    }

    /** Multiply self by another matrix, and return the result */
    pub fn mul(&self, b:&Matrix, tile:usize) -> Matrix {
        assert_eq!(self.cols, b.rows, "inner dimensions must agree");
        let mut ret = Matrix::new(self.rows, b.cols);
        multiply_accumulate(&self.data, &b.data, &mut ret.data,
            self.rows, self.cols, b.cols, tile, b.cols);
        ret
    }

    /** Row i of the result is row perm[i] of self */
    pub fn permute_rows(&self, perm:&Permutation) -> Matrix {
        assert_eq!(perm.len(), self.rows);
        let mut ret = Matrix::new(self.rows, self.cols);
        for (i,&src) in perm.as_slice().iter().enumerate() {
            ret.data[i*self.cols .. (i+1)*self.cols]
                .copy_from_slice(&self.data[src*self.cols .. (src+1)*self.cols]);
        }
        ret
    }

    /** Largest entrywise absolute difference; infinite if the shapes differ */
    pub fn max_abs_diff(&self, other:&Matrix) -> f64 {
        if self.rows != other.rows || self.cols != other.cols { return f64::INFINITY; }
        self.data.iter().zip(other.data.iter()).fold(0.0, |m,(x,y)| m.max((x-y).abs()))
    }

    /** Largest absolute entry */
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0, |m,x| m.max(x.abs()))
    }

    /** Fill with uniform values in [-1,1) */
    pub fn randomize<R:Rng>(&mut self, rng:&mut R) {
        for x in self.data.iter_mut() { *x = rng.gen_range(-1.0..1.0); }
    }

    /**
     * A random n x n matrix that factors without trouble, but still needs
     * pivoting: a column-diagonally-dominant matrix with its rows shuffled.
     * Schur complements of such a matrix stay dominant, so every pivot is
     * at least about 1 in magnitude.
     */
    pub fn random_pivoting<R:Rng>(n:usize, rng:&mut R) -> Matrix {
        let mut dominant = Matrix::new(n,n);
        dominant.randomize(rng);
        for j in 0..n {
            let sign = if rng.gen::<bool>() { 1.0 } else { -1.0 };
            dominant.data[j*n+j] = sign * (n as f64 + 1.0);
        }
        dominant.permute_rows(&Permutation::random(n, rng))
    }
}

impl Index<(usize,usize)> for Matrix {
    type Output = f64;
    fn index(&self, (i,j):(usize,usize)) -> &f64 {
        debug_assert!(i < self.rows && j < self.cols);
        &self.data[i*self.cols + j]
    }
}

impl IndexMut<(usize,usize)> for Matrix {
    fn index_mut(&mut self, (i,j):(usize,usize)) -> &mut f64 {
        debug_assert!(i < self.rows && j < self.cols);
        &mut self.data[i*self.cols + j]
    }
}

/**************************************************************************
 * Submatrix views
 **************************************************************************/

/**
 * A mutable window of `rows x cols` starting at (`row`,`col`) inside a
 * row-major parent buffer with row stride `stride`.  The view keeps the
 * whole parent so that it can exchange complete parent rows, which the
 * pivoting step needs; everything else is addressed relative to the window.
 */
#[derive(Debug)]
pub struct SubMatrixMut<'a> {
    data   : &'a mut [f64],
    stride : usize,
    row    : usize,
    col    : usize,
    rows   : usize,
    cols   : usize
}

impl<'a> SubMatrixMut<'a> {
    /** View the top-left rows x cols of a buffer with the given stride */
    pub fn new(data:&'a mut [f64], stride:usize, rows:usize, cols:usize) -> Self {
        debug_assert!(cols <= stride);
        debug_assert!(rows == 0 || data.len() >= (rows-1)*stride + cols);
        SubMatrixMut { data, stride, row:0, col:0, rows, cols }
    }

    /** Narrow the view; offsets are relative to the current window */
    pub fn submatrix(self, row:usize, col:usize, rows:usize, cols:usize) -> SubMatrixMut<'a> {
        assert!(row + rows <= self.rows && col + cols <= self.cols);
        SubMatrixMut {
            row: self.row + row, col: self.col + col, rows, cols, ..self
        }
    }

    pub fn rows(&self) -> usize { self.rows }
    pub fn cols(&self) -> usize { self.cols }
    pub fn stride(&self) -> usize { self.stride }

    /** Absolute row of the window's first row in the parent */
    pub fn row_offset(&self) -> usize { self.row }

    /** Absolute column of the window's first column in the parent */
    pub fn col_offset(&self) -> usize { self.col }

    #[inline(always)]
    fn idx(&self, i:usize, j:usize) -> usize {
        debug_assert!(i < self.rows && j < self.cols);
        (self.row+i)*self.stride + self.col + j
    }

    #[inline(always)]
    pub fn get(&self, i:usize, j:usize) -> f64 { self.data[self.idx(i,j)] }

    #[inline(always)]
    pub fn set(&mut self, i:usize, j:usize, x:f64) {
        let idx = self.idx(i,j);
        self.data[idx] = x;
    }

    /**
     * Return mutable aliases to two different rows of the window, covering
     * columns `start..cols`.  Must be different to satisfy the borrow checker.
     */
    pub fn two_rows(&mut self, r1:usize, r2:usize, start:usize) -> (&mut [f64], &mut [f64]) {
        assert!(r1 < self.rows && r2 < self.rows && start <= self.cols);
        let stride = self.stride;
        let (lo_col, hi_col) = (self.col + start, self.col + self.cols);
        let (a1, a2) = ((self.row+r1)*stride, (self.row+r2)*stride);
        let (x1, x2) = if r1 < r2 {
            let (lo,hi) = self.data.split_at_mut(a2);
            (&mut lo[a1..], hi)
        } else if r2 < r1 {
            let (lo,hi) = self.data.split_at_mut(a1);
            (hi, &mut lo[a2..])
        } else {
            panic!("two_rows must be disjoint!");
        };
        (&mut x1[lo_col..hi_col], &mut x2[lo_col..hi_col])
    }

    /**
     * Exchange rows r1 and r2 of the window across the full width of the
     * parent, including columns to the left and right of the window.
     */
    pub fn swap_parent_rows(&mut self, r1:usize, r2:usize) {
        if r1 == r2 { return; }
        assert!(r1 < self.rows && r2 < self.rows);
        let stride = self.stride;
        let (lo, hi) = (self.row + r1.min(r2), self.row + max(r1,r2));
        let (head, tail) = self.data.split_at_mut(hi*stride);
        let width = stride.min(tail.len());
        head[lo*stride .. lo*stride+width].swap_with_slice(&mut tail[..width]);
    }

    /** Copy a block of the window into a fresh compact buffer */
    pub fn copy_block(&self, row:usize, col:usize, rows:usize, cols:usize) -> Vec<f64> {
        assert!(row + rows <= self.rows && col + cols <= self.cols);
        let mut ret = Vec::with_capacity(rows*cols);
        for i in row..row+rows {
            let start = self.idx(i, col);
            ret.extend_from_slice(&self.data[start .. start+cols]);
        }
        ret
    }

    /** Overwrite a block of the window from a compact buffer */
    pub fn write_block(&mut self, row:usize, col:usize, rows:usize, cols:usize, src:&[f64]) {
        assert!(row + rows <= self.rows && col + cols <= self.cols);
        assert!(src.len() >= rows*cols);
        for i in 0..rows {
            let start = self.idx(row+i, col);
            self.data[start .. start+cols].copy_from_slice(&src[i*cols .. (i+1)*cols]);
        }
    }

    /**
     * The parent buffer from element (i,j) of the window onwards.  Together
     * with `stride()` this addresses any sub-block starting there.
     */
    pub fn tail_mut(&mut self, i:usize, j:usize) -> &mut [f64] {
        let idx = self.idx(i,j);
        &mut self.data[idx..]
    }
}

/**************************************************************************
 * Tests
 **************************************************************************/

#[cfg(test)]
mod tests {
    use crate::tilematrix::matrix::{Matrix,transpose};
    use crate::tilematrix::permutation::Permutation;
    use rand::thread_rng;

    /** Transpose is its own inverse, bit for bit */
    #[test]
    fn test_transpose_involution() {
        for n in 0..=12usize {
            let mut a = Matrix::new(n,n);
            a.randomize(&mut thread_rng());
            let mut buf = a.data.clone();
            transpose(&mut buf, n, n);
            for i in 0..n {
                for j in 0..n {
                    assert_eq!(buf[j*n+i], a[(i,j)]);
                }
            }
            transpose(&mut buf, n, n);
            assert_eq!(buf, a.data);
        }
    }

    #[test]
    fn test_transpose_rectangular() {
        let a = Matrix::from_rows(&[&[1.0,2.0,3.0],&[4.0,5.0,6.0]]).unwrap();
        let t = a.transpose();
        assert_eq!((t.rows, t.cols), (3,2));
        assert_eq!(t.data, vec![1.0,4.0,2.0,5.0,3.0,6.0]);
        assert_eq!(t.transpose(), a);
    }

    #[test]
    fn test_mul_identity() {
        let mut a = Matrix::new(7,5);
        a.randomize(&mut thread_rng());
        assert_eq!(Matrix::identity(7).mul(&a, 3), a);
        assert_eq!(a.mul(&Matrix::identity(5), 4), a);
    }

    #[test]
    fn test_from_vec_checks_length() {
        assert!(Matrix::from_vec(2,3,vec![0.0;6]).is_ok());
        assert!(Matrix::from_vec(2,3,vec![0.0;5]).is_err());
        assert!(Matrix::from_rows(&[&[1.0,2.0],&[3.0]]).is_err());
    }

    /** Views address the right elements, and nested views compose */
    #[test]
    fn test_view_offsets() {
        let n = 6;
        let mut a = Matrix::new(n,n);
        for i in 0..n { for j in 0..n { a[(i,j)] = (10*i + j) as f64; } }
        let snapshot = a.clone();

        let mut v = a.view_mut().submatrix(1,2,5,4).submatrix(1,1,3,2);
        assert_eq!((v.row_offset(), v.col_offset()), (2,3));
        assert_eq!(v.get(0,0), 23.0);
        assert_eq!(v.get(2,1), 44.0);
        assert_eq!(v.copy_block(1,0,2,2), vec![33.0,34.0,43.0,44.0]);

        v.write_block(0,0,1,2,&[-1.0,-2.0]);
        v.set(2,0,-3.0);
        assert_eq!(v.tail_mut(1,1)[0], 34.0);
        assert_eq!(a[(2,3)], -1.0);
        assert_eq!(a[(2,4)], -2.0);
        assert_eq!(a[(4,3)], -3.0);
        assert_eq!(a[(2,5)], snapshot[(2,5)]);
    }

    /** Row swaps move whole parent rows, and two_rows hands out the window part */
    #[test]
    fn test_view_rows() {
        let n = 5;
        let mut a = Matrix::new(n,n);
        a.randomize(&mut thread_rng());
        let snapshot = a.clone();

        {
            let mut v = a.view_mut().submatrix(2,2,3,3);
            v.swap_parent_rows(2,0);
            let (x,y) = v.two_rows(1,0,1);
            assert_eq!(x.len(), 2);
            x[0] = 7.0;
            y[1] = 8.0;
        }
        for j in 0..n {
            assert_eq!(a[(2,j)], if j==4 { 8.0 } else { snapshot[(4,j)] });
            assert_eq!(a[(4,j)], snapshot[(2,j)]);
        }
        assert_eq!(a[(3,3)], 7.0);
    }

    #[test]
    fn test_random_pivoting_is_a_row_shuffle() {
        let n = 9;
        let a = Matrix::random_pivoting(n, &mut thread_rng());
        /* Exactly one dominant entry per column, each in a distinct row */
        let mut rows = Vec::with_capacity(n);
        for j in 0..n {
            let big : Vec<usize> = (0..n).filter(|&i| a[(i,j)].abs() > 2.0).collect();
            assert_eq!(big.len(), 1);
            rows.push(big[0]);
        }
        assert!(Permutation::from_vec(rows).is_ok());
    }
}
