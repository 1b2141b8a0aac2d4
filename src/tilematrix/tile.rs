/*
 * @file tile.rs
 * @author The blocked_lu authors
 * @copyright 2026 The blocked_lu authors
 *
 * Tiled matrix multiply.  The outer three loops block rows, columns and depth
 * by `tile` so that the working set stays in cache; inside each block a 3x3
 * micro-kernel keeps nine accumulators in locals across the whole depth loop.
 *
 * All operands are row-major.  A is m x p with row stride p, B is p x n with
 * row stride n, and C is m x n with an independent row stride, so that C can
 * be a sub-region of a larger matrix.
 */

use std::cmp::min;

/** Edge of the register micro-tile */
pub const MICRO : usize = 3;

/**************************************************************************
 * Accumulation modes
 **************************************************************************/

/** How a product term is folded into an accumulator */
trait Accumulate {
    fn acc(c:f64, a:f64, b:f64) -> f64;
}

/** c += a*b */
struct Add;

/** c -= a*b */
struct Sub;

impl Accumulate for Add {
    #[inline(always)]
    fn acc(c:f64, a:f64, b:f64) -> f64 { c + a*b }
}

impl Accumulate for Sub {
    #[inline(always)]
    fn acc(c:f64, a:f64, b:f64) -> f64 { c - a*b }
}

/** Shape of one multiply call */
#[derive(Clone,Copy,Debug)]
struct Dims {
    p      : usize, // inner dimension, and A's row stride
    n      : usize, // B's row stride
    stride : usize  // C's row stride
}

/**************************************************************************
 * Kernels
 **************************************************************************/

/**
 * C[i..i+3, j..j+3] (+/-)= A[i..i+3, k0..k1] * B[k0..k1, j..j+3].
 * The nine outputs live in locals for the whole depth loop; each depth step
 * loads three elements of A and one element of B per output column.
 */
#[inline(always)]
fn kernel_3x3<U:Accumulate>(a:&[f64], b:&[f64], c:&mut [f64], d:Dims,
    i:usize, j:usize, k0:usize, k1:usize)
{
    let (r0, r1, r2) = (i*d.stride, (i+1)*d.stride, (i+2)*d.stride);

    let mut c_0_0 = c[r0+j];
    let mut c_1_0 = c[r1+j];
    let mut c_2_0 = c[r2+j];

    let mut c_0_1 = c[r0+j+1];
    let mut c_1_1 = c[r1+j+1];
    let mut c_2_1 = c[r2+j+1];

    let mut c_0_2 = c[r0+j+2];
    let mut c_1_2 = c[r1+j+2];
    let mut c_2_2 = c[r2+j+2];

    for k in k0..k1 {
        let a_0 = a[i*d.p + k];
        let a_1 = a[(i+1)*d.p + k];
        let a_2 = a[(i+2)*d.p + k];

        let b_m = b[k*d.n + j];
        c_0_0 = U::acc(c_0_0, a_0, b_m);
        c_1_0 = U::acc(c_1_0, a_1, b_m);
        c_2_0 = U::acc(c_2_0, a_2, b_m);

        let b_m = b[k*d.n + j+1];
        c_0_1 = U::acc(c_0_1, a_0, b_m);
        c_1_1 = U::acc(c_1_1, a_1, b_m);
        c_2_1 = U::acc(c_2_1, a_2, b_m);

        let b_m = b[k*d.n + j+2];
        c_0_2 = U::acc(c_0_2, a_0, b_m);
        c_1_2 = U::acc(c_1_2, a_1, b_m);
        c_2_2 = U::acc(c_2_2, a_2, b_m);
    }

    c[r0+j] = c_0_0;
    c[r1+j] = c_1_0;
    c[r2+j] = c_2_0;

    c[r0+j+1] = c_0_1;
    c[r1+j+1] = c_1_1;
    c[r2+j+1] = c_2_1;

    c[r0+j+2] = c_0_2;
    c[r1+j+2] = c_1_2;
    c[r2+j+2] = c_2_2;
}

/** Scalar kernel for the fringe of a block that doesn't fill a 3x3 micro-tile */
#[inline(always)]
fn kernel_edge<U:Accumulate>(a:&[f64], b:&[f64], c:&mut [f64], d:Dims,
    rows:(usize,usize), cols:(usize,usize), k0:usize, k1:usize)
{
    for i in rows.0..rows.1 {
        for j in cols.0..cols.1 {
            let mut acc = c[i*d.stride + j];
            for k in k0..k1 {
                acc = U::acc(acc, a[i*d.p + k], b[k*d.n + j]);
            }
            c[i*d.stride + j] = acc;
        }
    }
}

/** The blocked driver shared by both accumulation modes */
fn tiled<U:Accumulate>(a:&[f64], b:&[f64], c:&mut [f64],
    m:usize, p:usize, n:usize, tile:usize, stride:usize)
{
    debug_assert!(tile > 0, "tile size must be positive");
    debug_assert!(stride >= n);
    if m == 0 || n == 0 || p == 0 { return; }
    debug_assert!(a.len() >= m*p);
    debug_assert!(b.len() >= p*n);
    debug_assert!(c.len() >= (m-1)*stride + n);

    let d = Dims { p, n, stride };
    for i in (0..m).step_by(tile) {
        let i_end = min(i+tile, m);
        for j in (0..n).step_by(tile) {
            let j_end = min(j+tile, n);
            for k in (0..p).step_by(tile) {
                let k_end = min(k+tile, p);

                let mut i1 = i;
                while i1 + MICRO <= i_end {
                    let mut j1 = j;
                    while j1 + MICRO <= j_end {
                        kernel_3x3::<U>(a, b, c, d, i1, j1, k, k_end);
                        j1 += MICRO;
                    }
                    kernel_edge::<U>(a, b, c, d, (i1, i1+MICRO), (j1, j_end), k, k_end);
                    i1 += MICRO;
                }
                kernel_edge::<U>(a, b, c, d, (i1, i_end), (j, j_end), k, k_end);
            }
        }
    }
}

/**************************************************************************
 * Public entry points
 **************************************************************************/

/**
 * C += A*B, where A is m x p, B is p x n, and C's rows are `row_stride` apart.
 *
 * The 3x3 micro-kernel covers everything when m and n are multiples of 3 and
 * of `tile`; any remaining fringe is computed by a scalar loop.
 * `tile` must be positive.  Panics if a buffer is too short for the given extents.
 */
pub fn multiply_accumulate(a:&[f64], b:&[f64], c:&mut [f64],
    m:usize, p:usize, n:usize, tile:usize, row_stride:usize)
{
    tiled::<Add>(a, b, c, m, p, n, tile, row_stride);
}

/**
 * C -= A*B.  Otherwise identical to [`multiply_accumulate`]; used to apply
 * Schur-complement corrections without a separate negation pass.
 */
pub fn multiply_subtract(a:&[f64], b:&[f64], c:&mut [f64],
    m:usize, p:usize, n:usize, tile:usize, row_stride:usize)
{
    tiled::<Sub>(a, b, c, m, p, n, tile, row_stride);
}

/**************************************************************************
 * Tests
 **************************************************************************/
