/*
 * @file factor.rs
 * @author The blocked_lu authors
 * @copyright 2026 The blocked_lu authors
 *
 * LU factorization with partial pivoting: the unblocked base case, the
 * panel step, and the driver that walks panels across the matrix.
 */

use crate::tilematrix::matrix::SubMatrixMut;
use crate::tilematrix::tile::{multiply_accumulate,multiply_subtract,MICRO};
use crate::solve::invert_unit_lower;
use crate::error::{LuError,Result};
use bincode::{Encode,Decode};

/**
 * A candidate pivot only replaces the running best if its magnitude is
 * larger by more than this margin.  Keeps near-ties on the earlier row.
 */
pub const PIVOT_EPSILON : f64 = 1e-6;

/** A pivot with magnitude below this is treated as zero. */
pub const SINGULAR_EPSILON : f64 = 1e-3;

/** Numerical thresholds for pivot selection */
#[derive(Copy,Clone,PartialEq,Debug,Encode,Decode)]
pub struct Thresholds {
    /** Default: [`PIVOT_EPSILON`]. */
    pub pivot : f64,

    /**
     * Absolute, not relative to the matrix norm, so badly scaled matrices
     * can be reported as singular.
     *
     * Default: [`SINGULAR_EPSILON`].
     */
    pub singular : f64
}

impl Default for Thresholds {
    fn default() -> Self {
        Thresholds { pivot: PIVOT_EPSILON, singular: SINGULAR_EPSILON }
    }
}

/**
 * Options for the blocked factorization.
 *
 * Implements `Default`, so you can get reasonable options
 * with `BlockOptions::default()`.
 */
#[derive(Copy,Clone,PartialEq,Debug,Encode,Decode)]
pub struct BlockOptions {
    /**
     * Width of each column panel.  Must be in `1..=n`.
     *
     * Default: 48.
     */
    pub block_size : usize,

    /**
     * Edge of the cache blocks in the trailing-matrix multiply.  Multiples
     * of 3 let the 3x3 micro-kernel cover whole blocks.
     *
     * Default: `None`, meaning the same as `block_size`.
     */
    pub tile_size : Option<usize>,

    /** Pivoting thresholds. */
    pub thresholds : Thresholds
}

impl Default for BlockOptions {
    fn default() -> Self {
        BlockOptions {
            block_size : 48,
            tile_size  : None,
            thresholds : Thresholds::default()
        }
    }
}

impl BlockOptions {
    /** Default options with the given panel width */
    pub fn with_block_size(block_size:usize) -> Self {
        BlockOptions { block_size, ..Default::default() }
    }

    /** The tile edge actually used by the multiply */
    pub fn tile(&self) -> usize {
        self.tile_size.unwrap_or(self.block_size)
    }
}

/** Check that a and ipiv describe an n x n problem */
fn check_dimensions(a:&[f64], ipiv:&[usize], n:usize) -> Result<()> {
    if a.len() != n*n {
        return Err(LuError::DimensionMismatch { expected: n*n, got: a.len() });
    }
    if ipiv.len() != n {
        return Err(LuError::DimensionMismatch { expected: n, got: ipiv.len() });
    }
    Ok(())
}

/**************************************************************************
 * Pivoted elimination
 **************************************************************************/

/**
 * Row-reduce the first `width` columns of `panel` with partial pivoting,
 * over all of its rows.
 *
 * Pivot candidates come from every row of the panel.  Swaps exchange whole
 * rows of the parent matrix, and the matching entries of `ipiv` at absolute
 * positions, so that the factors to the left stay consistent.  Multipliers
 * overwrite the eliminated entries; the Schur update only touches columns
 * inside `width`.
 */
fn eliminate(panel:&mut SubMatrixMut<'_>, ipiv:&mut [usize], width:usize, thresholds:&Thresholds)
    -> Result<()>
{
    let rows = panel.rows();
    let pos = panel.row_offset();
    debug_assert!(width <= panel.cols() && width <= rows);

    for i in 0..width {
        /* Find the pivot */
        let mut maxidx = i;
        let mut max = panel.get(i,i).abs();
        for j in i+1..rows {
            let candidate = panel.get(j,i).abs();
            if candidate - max > thresholds.pivot {
                maxidx = j;
                max = candidate;
            }
        }

        /* NaN counts as singular too */
        if !(max >= thresholds.singular) {
            log::debug!("singular pivot {:e} at column {}", max, pos+i);
            return Err(LuError::Singular { column: pos+i, pivot: max });
        }

        if maxidx != i {
            ipiv.swap(pos+i, pos+maxidx);
            panel.swap_parent_rows(i, maxidx);
        }

        /* Eliminate below the pivot */
        let pivot = panel.get(i,i);
        for j in i+1..rows {
            let (prow, jrow) = panel.two_rows(i, j, i);
            jrow[0] /= pivot;
            let l = jrow[0];
            for (x, u) in jrow[1..width-i].iter_mut().zip(prow[1..width-i].iter()) {
                *x -= l * u;
            }
        }
    }
    Ok(())
}

/**
 * Factor A = P L U in place, one column at a time.
 *
 * `a` is n x n row-major; `ipiv` must start as a permutation (normally the
 * identity) and has the row exchanges applied to it.
 */
pub fn factorize_unblocked(a:&mut [f64], ipiv:&mut [usize], n:usize) -> Result<()> {
    factorize_unblocked_with(a, ipiv, n, &Thresholds::default())
}

/** As [`factorize_unblocked`], with explicit thresholds */
pub fn factorize_unblocked_with(a:&mut [f64], ipiv:&mut [usize], n:usize, thresholds:&Thresholds)
    -> Result<()>
{
    check_dimensions(a, ipiv, n)?;
    let mut view = SubMatrixMut::new(a, n, n, n);
    eliminate(&mut view, ipiv, n, thresholds)
}

/**************************************************************************
 * Panels
 **************************************************************************/

/**
 * Factor the leading `width` columns of `panel`, and bring the rest of it
 * up to date.
 *
 * `panel` is the square trailing region of the parent, starting at the
 * panel's diagonal position.  After the pivoted elimination of the leading
 * columns, the top-right block is multiplied by the inverse of the panel's
 * unit lower factor, and the trailing block gets the Schur correction
 * `A22 -= A21 * A12`.
 */
pub fn factor_panel(mut panel:SubMatrixMut<'_>, ipiv:&mut [usize], width:usize, tile:usize,
    thresholds:&Thresholds) -> Result<()>
{
    let bm = panel.rows();
    let bn = width;
    debug_assert!(bn <= bm && panel.cols() == bm);

    eliminate(&mut panel, ipiv, bn, thresholds)?;

    let bn2 = bm - bn;
    if bn2 == 0 { return Ok(()); }

    /* A12 = L11^-1 A12 */
    let l11 = panel.copy_block(0, 0, bn, bn);
    let l11_inv = invert_unit_lower(&l11, bn);
    let a12 = panel.copy_block(0, bn, bn, bn2);
    let mut u12 = vec![0.0; bn*bn2];
    multiply_accumulate(&l11_inv, &a12, &mut u12, bn, bn, bn2, tile, bn2);
    panel.write_block(0, bn, bn, bn2, &u12);

    /* A22 -= A21 U12 */
    let a21 = panel.copy_block(bn, 0, bn2, bn);
    let stride = panel.stride();
    multiply_subtract(&a21, &u12, panel.tail_mut(bn, bn), bn2, bn, bn2, tile, stride);
    Ok(())
}

/**************************************************************************
 * Driver
 **************************************************************************/

/**
 * Blocked LU factorization with panels of width `block_size`.
 *
 * Produces the same packed factors and permutation as
 * [`factorize_unblocked`], up to rounding.
 */
pub fn factorize_blocked(a:&mut [f64], ipiv:&mut [usize], n:usize, block_size:usize) -> Result<()> {
    factorize_blocked_with(a, ipiv, n, &BlockOptions::with_block_size(block_size))
}

/** As [`factorize_blocked`], with explicit options */
pub fn factorize_blocked_with(a:&mut [f64], ipiv:&mut [usize], n:usize, options:&BlockOptions)
    -> Result<()>
{
    check_dimensions(a, ipiv, n)?;
    if n == 0 { return Ok(()); }

    let b = options.block_size;
    if b == 0 || b > n {
        return Err(LuError::InvalidBlockSize { block: b, n });
    }
    let tile = options.tile();
    if tile == 0 {
        return Err(LuError::InvalidTileSize(tile));
    }
    if tile % MICRO != 0 {
        log::warn!(target: "blocked_lu_perf",
            "Tile size {} is not a multiple of {}; the micro-kernel will leave fringes to the scalar loop.",
            tile, MICRO);
    }
    log::debug!("factoring {}x{} matrix in panels of {} (tile {})", n, n, b, tile);

    let mut i = 0;
    while n - i > b {
        log::trace!("panel at {}, width {}", i, b);
        let panel = SubMatrixMut::new(a, n, n, n).submatrix(i, i, n-i, n-i);
        factor_panel(panel, ipiv, b, tile, &options.thresholds)?;
        i += b;
    }

    /* Whatever is left: n mod b columns, or a full block if b divides n */
    log::trace!("final panel at {}, width {}", i, n-i);
    let panel = SubMatrixMut::new(a, n, n, n).submatrix(i, i, n-i, n-i);
    factor_panel(panel, ipiv, n-i, tile, &options.thresholds)
}

/**************************************************************************
 * Tests
 **************************************************************************/
