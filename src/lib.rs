/*!
 * Blocked LU factorization with partial pivoting.
 *
 * This crate factors a dense, square, row-major `f64` matrix `A` in place as
 * `P A = L U`, where `L` is unit lower-triangular, `U` is upper-triangular and
 * `P` is a row permutation recorded in a pivot vector `ipiv`.  Row `i` of
 * `P A` is row `ipiv[i]` of `A`.  After a successful call the buffer holds
 * `L` strictly below the diagonal (the unit diagonal is not stored) and `U`
 * on and above it.
 *
 * # Algorithms
 *
 * [`factorize_unblocked`] is the textbook right-looking elimination: for each
 * column, pick the largest pivot, swap it into place, store the multipliers
 * and update the rest of the matrix.
 *
 * [`factorize_blocked`] does the same work in column panels of width `b`.
 * Each panel is eliminated against all of the remaining rows, then the rows
 * to its right are brought up to date by
 *
 * * inverting the panel's unit lower factor `L11` (one triangular solve per
 *   basis vector, then a transpose),
 * * replacing the top-right block `A12` with `L11^-1 A12`, and
 * * subtracting `A21 A12` from the trailing block.
 *
 * The two products are computed by a cache-blocked, register-tiled multiply
 * ([`multiply_accumulate`], [`multiply_subtract`]) whose inner kernel keeps a
 * 3x3 block of the output in local accumulators across the whole depth loop.
 * Block sizes and tile sizes that are multiples of 3 let that kernel cover
 * everything; other sizes are handled, more slowly, by a scalar fringe loop.
 *
 * # Pivoting and failure
 *
 * A candidate pivot only displaces the current best if it is larger by more
 * than [`PIVOT_EPSILON`], and a pivot smaller in magnitude than
 * [`SINGULAR_EPSILON`] makes the factorization fail with
 * [`LuError::Singular`].  Both are absolute: a badly scaled matrix may be
 * declared singular.  They can be changed through [`Thresholds`].
 *
 * On failure the matrix and pivot vector have been partially updated, and
 * should be discarded.
 *
 * # Permutation contract
 *
 * The caller initializes `ipiv` (normally to the identity, see
 * [`Permutation::identity`]); the factorization only exchanges its entries.
 *
 * # Owned factors
 *
 * [`LuFactors`] wraps the whole process: it factors a copy of the input, can
 * then solve `A x = b`, hand back `L` and `U`, and be serialized with
 * [`bincode`] using [`STD_BINCODE_CONFIG`].
 *
 * # C interface
 *
 * With the `cffi` feature (on by default), the crate exports C functions
 * mirroring the Rust API, and the build script writes a header for them.
 */

/**
 * Dense matrices, views and the tiled multiply
 */
pub mod tilematrix;

mod error;
mod factor;
mod lu;
mod size;
mod solve;

#[cfg(feature = "cffi")]
pub mod cffi;

use bincode::config::{Configuration,LittleEndian,Fixint};

pub use error::{LuError,Result};
pub use factor::{factorize_unblocked,factorize_unblocked_with,factorize_blocked,factorize_blocked_with,
    factor_panel,BlockOptions,Thresholds,PIVOT_EPSILON,SINGULAR_EPSILON};
pub use lu::LuFactors;
pub use solve::{triangular_solve,invert_unit_lower,Triangle};
pub use tilematrix::tile::{multiply_accumulate,multiply_subtract};
pub use tilematrix::matrix::{Matrix,SubMatrixMut,transpose};
pub use tilematrix::permutation::Permutation;

/**
 * Standard bincode configuration for serializing [`LuFactors`] and
 * [`BlockOptions`]: little-endian, fixed-width integers.
 */
pub const STD_BINCODE_CONFIG : Configuration<LittleEndian, Fixint> =
    bincode::config::standard().with_fixed_int_encoding();
