/**
 * @file mod.rs
 * @author The blocked_lu authors
 * @copyright 2026 The blocked_lu authors
 *
 * Dense row-major f64 matrices, submatrix views into a shared buffer, and
 * the cache-blocked, register-tiled multiply that the panel factorization
 * spends most of its time in.
 */
pub mod tile;
pub mod matrix;
pub mod permutation;
