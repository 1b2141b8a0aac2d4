/*
 * @file lu.rs
 * @author The blocked_lu authors
 * @copyright 2026 The blocked_lu authors
 *
 * Owned LU factors: build once, then solve, inspect or serialize.
 */

use crate::factor::{factorize_blocked_with,BlockOptions};
use crate::solve::{triangular_solve,Triangle};
use crate::tilematrix::matrix::Matrix;
use crate::tilematrix::permutation::{Permutation,is_bijection};
use crate::error::{LuError,Result};
use crate::size::encoded_len;
use crate::STD_BINCODE_CONFIG;
use bincode::{Encode,Decode,encode_to_vec,decode_from_slice};

/** Size in bytes of a fixed-width integer under [`STD_BINCODE_CONFIG`] */
const WORD : usize = 8;

/** Read the fixed-width little-endian integer at byte offset `at` */
fn read_word(bytes:&[u8], at:usize) -> Result<usize> {
    let word = at.checked_add(WORD).and_then(|end| bytes.get(at..end))
        .ok_or(LuError::Corrupt("truncated header"))?;
    let mut le = [0u8; WORD];
    le.copy_from_slice(word);
    usize::try_from(u64::from_le_bytes(le)).map_err(|_| LuError::Corrupt("length out of range"))
}

/**
 * Check the length prefixes against the input size, so that the decoder
 * never reserves more than the input could hold.
 *
 * Layout: n, then the length and entries of `lu`, then the length and
 * entries of the permutation.
 */
fn check_layout(bytes:&[u8]) -> Result<()> {
    let n = read_word(bytes, 0)?;
    let lu_len = read_word(bytes, WORD)?;
    if n.checked_mul(n) != Some(lu_len) {
        return Err(LuError::Corrupt("factor length does not match dimension"));
    }
    let perm_at = lu_len.checked_mul(WORD).and_then(|x| x.checked_add(2*WORD))
        .filter(|&at| at <= bytes.len())
        .ok_or(LuError::Corrupt("factor length exceeds input"))?;
    if read_word(bytes, perm_at)? != n {
        return Err(LuError::Corrupt("permutation length does not match dimension"));
    }
    let total = n.checked_mul(WORD).and_then(|x| x.checked_add(perm_at + WORD));
    if total != Some(bytes.len()) {
        return Err(LuError::Corrupt("input length does not match dimension"));
    }
    Ok(())
}

/**
 * The result of factoring an n x n matrix A as P A = L U.
 *
 * `lu` holds L strictly below the diagonal (its unit diagonal is implicit)
 * and U on and above it, row-major.  Row i of P A is row `perm[i]` of A.
 */
#[derive(Clone, PartialEq, Debug, Encode, Decode)]
pub struct LuFactors {
    n    : usize,
    lu   : Vec<f64>,
    perm : Permutation
}

impl LuFactors {
    /** Factor a square matrix.  Fails if it isn't square, or is singular. */
    pub fn build(a:&Matrix, options:&BlockOptions) -> Result<Self> {
        if a.rows != a.cols {
            return Err(LuError::DimensionMismatch { expected: a.rows*a.rows, got: a.data.len() });
        }
        Self::from_slice(&a.data, a.rows, options)
    }

    /** Factor an n x n row-major buffer, which is left untouched. */
    pub fn from_slice(a:&[f64], n:usize, options:&BlockOptions) -> Result<Self> {
        let mut lu = a.to_vec();
        let mut perm = Permutation::identity(n);
        /* Small matrices are a single panel */
        let options = BlockOptions {
            block_size: options.block_size.clamp(1, n.max(1)),
            ..*options
        };
        factorize_blocked_with(&mut lu, perm.as_mut_slice(), n, &options)?;
        Ok(LuFactors { n, lu, perm })
    }

    pub fn dim(&self) -> usize { self.n }

    /** The packed factors */
    pub fn packed(&self) -> &[f64] { &self.lu }

    pub fn permutation(&self) -> &Permutation { &self.perm }

    /** Solve A x = b in place: permute, forward-substitute, back-substitute. */
    pub fn solve(&self, b:&mut [f64]) -> Result<()> {
        if b.len() != self.n {
            return Err(LuError::DimensionMismatch { expected: self.n, got: b.len() });
        }
        triangular_solve(Triangle::Lower, &self.lu, b, self.n, self.perm.as_slice());
        triangular_solve(Triangle::Upper, &self.lu, b, self.n, self.perm.as_slice());
        Ok(())
    }

    /** The unit lower-triangular factor, with its diagonal filled in */
    pub fn lower(&self) -> Matrix {
        let n = self.n;
        let mut l = Matrix::identity(n);
        for i in 0..n {
            l.data[i*n .. i*n+i].copy_from_slice(&self.lu[i*n .. i*n+i]);
        }
        l
    }

    /** The upper-triangular factor */
    pub fn upper(&self) -> Matrix {
        let n = self.n;
        let mut u = Matrix::new(n,n);
        for i in 0..n {
            u.data[i*n+i .. (i+1)*n].copy_from_slice(&self.lu[i*n+i .. (i+1)*n]);
        }
        u
    }

    /** Multiply the factors back together, undoing the row permutation */
    pub fn reconstruct(&self) -> Matrix {
        let pa = self.lower().mul(&self.upper(), 3);
        pa.permute_rows(&self.perm.inverse())
    }

    /** Serialized size in bytes */
    pub fn encoded_len(&self) -> Result<usize> {
        Ok(encoded_len(self, STD_BINCODE_CONFIG)?)
    }

    /** Serialize with [`STD_BINCODE_CONFIG`] */
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(encode_to_vec(self, STD_BINCODE_CONFIG)?)
    }

    /**
     * Deserialize from exactly the bytes produced by [`LuFactors::to_bytes`].
     * Rejects trailing bytes, mismatched lengths and invalid permutations.
     */
    pub fn from_bytes(bytes:&[u8]) -> Result<Self> {
        check_layout(bytes)?;
        let (ret, used) : (LuFactors, usize) = decode_from_slice(bytes, STD_BINCODE_CONFIG)?;
        if used != bytes.len() {
            return Err(LuError::Corrupt("trailing bytes"));
        }
        if ret.n.checked_mul(ret.n) != Some(ret.lu.len()) {
            return Err(LuError::Corrupt("factor length does not match dimension"));
        }
        if ret.perm.len() != ret.n || !is_bijection(ret.perm.as_slice()) {
            return Err(LuError::Corrupt("permutation is not a bijection"));
        }
        Ok(ret)
    }
}

/**************************************************************************
 * Tests
 **************************************************************************/
