/*
 * @file permutation.rs
 * @author The blocked_lu authors
 * @copyright 2026 The blocked_lu authors
 *
 * Row permutations, stored the way the factorization records them:
 * entry i is the original row that now sits in row i.
 */

use crate::error::{LuError,Result};
use bincode::{Encode,Decode};
use rand::Rng;
use rand::seq::SliceRandom;

#[derive(Clone, PartialEq, Eq, Debug, Encode, Decode)]
pub struct Permutation {
    ipiv: Vec<usize>
}

/** Is this slice a bijection on 0..len? */
pub fn is_bijection(ipiv:&[usize]) -> bool {
    let mut seen = vec![false; ipiv.len()];
    for &x in ipiv {
        if x >= ipiv.len() || seen[x] { return false; }
        seen[x] = true;
    }
    true
}

impl Permutation {
    /** The identity on 0..n */
    pub fn identity(n:usize) -> Self {
        Permutation { ipiv: (0..n).collect() }
    }

    /** Wrap a vector, which must be a bijection */
    pub fn from_vec(ipiv:Vec<usize>) -> Result<Self> {
        if !is_bijection(&ipiv) {
            return Err(LuError::Corrupt("permutation is not a bijection"));
        }
        Ok(Permutation { ipiv })
    }

    /** A uniformly random permutation, for testing purposes */
    pub fn random<R:Rng>(n:usize, rng:&mut R) -> Self {
        let mut ret = Permutation::identity(n);
        ret.ipiv.shuffle(rng);
        ret
    }

    pub fn len(&self) -> usize { self.ipiv.len() }
    pub fn as_slice(&self) -> &[usize] { &self.ipiv }

    /** Mutable access for the factorization routines, which only ever swap entries */
    pub fn as_mut_slice(&mut self) -> &mut [usize] { &mut self.ipiv }

    pub fn into_vec(self) -> Vec<usize> { self.ipiv }

    /** The inverse permutation: if self sends row r to i, the inverse sends i to r */
    pub fn inverse(&self) -> Self {
        let mut ret = vec![0; self.ipiv.len()];
        for (i,&r) in self.ipiv.iter().enumerate() { ret[r] = i; }
        Permutation { ipiv: ret }
    }

    /** out[i] = b[ipiv[i]] */
    pub fn gather(&self, b:&[f64]) -> Vec<f64> {
        self.ipiv.iter().map(|&r| b[r]).collect()
    }
}

/**************************************************************************
 * Tests
 **************************************************************************/
#[cfg(test)]
mod tests {
    use crate::tilematrix::permutation::{Permutation,is_bijection};
    use rand::thread_rng;

    #[test]
    fn test_bijection() {
        assert!(is_bijection(&[]));
        assert!(is_bijection(&[2,0,1]));
        assert!(!is_bijection(&[0,0,1]));
        assert!(!is_bijection(&[0,3,1]));
        assert!(Permutation::from_vec(vec![1,1]).is_err());
    }

    #[test]
    fn test_inverse_and_gather() {
        for n in 0..20usize {
            let p = Permutation::random(n, &mut thread_rng());
            assert!(is_bijection(p.as_slice()));
            let b : Vec<f64> = (0..n).map(|i| i as f64).collect();
            let g = p.gather(&b);
            assert_eq!(p.inverse().gather(&g), b);
            assert_eq!(p.inverse().inverse(), p);
        }
    }
}
