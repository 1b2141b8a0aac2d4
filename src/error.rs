/*
 * @file error.rs
 * @author The blocked_lu authors
 * @copyright 2026 The blocked_lu authors
 *
 * Error type for factorization and for (de)serializing factors.
 */

use thiserror::Error;

/** Result type alias using [`LuError`] */
pub type Result<T> = std::result::Result<T, LuError>;

/** Errors that can occur while factoring or decoding */
#[derive(Debug, Error)]
pub enum LuError {
    /**
     * The best available pivot in a column was below the singularity
     * threshold.  The matrix and permutation are left partially updated
     * and must be discarded.
     */
    #[error("Matrix is singular: best pivot {pivot:e} in column {column} is below the threshold")]
    Singular {
        /// Absolute column where elimination stopped
        column: usize,
        /// Magnitude of the best candidate pivot
        pivot: f64,
    },

    /** A buffer does not have the length its dimensions require */
    #[error("Dimension mismatch: expected {expected} elements, got {got}")]
    DimensionMismatch {
        expected: usize,
        got: usize,
    },

    /** Block size must be in 1..=n */
    #[error("Invalid block size {block} for a {n}x{n} matrix")]
    InvalidBlockSize {
        block: usize,
        n: usize,
    },

    /** Multiply tile edge must be positive */
    #[error("Invalid tile size {0}")]
    InvalidTileSize(usize),

    #[error("Encoding error: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("Decoding error: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    /** Decoded data is structurally invalid */
    #[error("Corrupt factorization: {0}")]
    Corrupt(&'static str),
}
