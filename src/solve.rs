/*
 * @file solve.rs
 * @author The blocked_lu authors
 * @copyright 2026 The blocked_lu authors
 *
 * Triangular solves against a packed LU buffer, and explicit inversion of
 * a unit lower-triangular block.
 */

use crate::tilematrix::matrix::transpose;

/** Which triangle of the packed LU buffer to solve against */
#[derive(Copy,Clone,PartialEq,Eq,Debug)]
pub enum Triangle {
    /** Unit lower-triangular L; the right-hand side is permuted first */
    Lower,
    /** Upper-triangular U, with its explicit diagonal */
    Upper
}

/**
 * Solve in place against one triangle of the n x n row-major buffer `a`.
 *
 * Lower: b is first permuted (position i receives b[ipiv[i]]), then
 * forward-substituted assuming a unit diagonal.  The diagonal of `a` is
 * never read, so `a` may be a packed LU buffer.
 *
 * Upper: back-substitution from row n-1 to 0, dividing by the diagonal.
 * `ipiv` is not used.
 */
pub fn triangular_solve(uplo:Triangle, a:&[f64], b:&mut [f64], n:usize, ipiv:&[usize]) {
    debug_assert!(a.len() >= n*n);
    debug_assert!(b.len() >= n);
    match uplo {
        Triangle::Lower => {
            debug_assert!(ipiv.len() >= n);
            let permuted : Vec<f64> = ipiv[..n].iter().map(|&r| b[r]).collect();
            for i in 0..n {
                let row = &a[i*n .. i*n+i];
                let mut x = permuted[i];
                for (lij, bj) in row.iter().zip(b[..i].iter()) {
                    x -= lij * bj;
                }
                b[i] = x;
            }
        },
        Triangle::Upper => {
            /* Dot product along a row of U: reads a row, which is contiguous */
            for i in (0..n).rev() {
                let row = &a[i*n+i+1 .. (i+1)*n];
                let sum : f64 = row.iter().zip(b[i+1..n].iter()).map(|(u,x)| u*x).sum();
                b[i] = (b[i] - sum) / a[i*n+i];
            }
        }
    }
}

/**
 * Return the inverse of the unit lower-triangular part of the n x n block `l`
 * (diagonal and upper part ignored), in row-major order.
 *
 * Solves once per basis vector, so row i of the scratch block is the i'th
 * column of the inverse; a transpose puts it in the usual orientation for
 * use as the left operand of a multiply.
 */
pub fn invert_unit_lower(l:&[f64], n:usize) -> Vec<f64> {
    let identity : Vec<usize> = (0..n).collect();
    let mut inv = vec![0.0; n*n];
    for i in 0..n {
        let col = &mut inv[i*n .. (i+1)*n];
        col[i] = 1.0;
        triangular_solve(Triangle::Lower, l, col, n, &identity);
    }
    transpose(&mut inv, n, n);
    inv
}

/**************************************************************************
 * Tests
 **************************************************************************/
#[cfg(test)]
mod tests {
    use crate::solve::{Triangle,triangular_solve,invert_unit_lower};
    use crate::tilematrix::matrix::Matrix;
    use crate::tilematrix::permutation::Permutation;
    use rand::{Rng,thread_rng};

    /** Random unit lower-triangular matrix, with garbage in the upper part */
    fn random_unit_lower(n:usize) -> Matrix {
        let mut rng = thread_rng();
        let scale = 1.0 / n as f64;
        let mut l = Matrix::new(n,n);
        for i in 0..n {
            for j in 0..n {
                l[(i,j)] = if j < i {
                    scale * rng.gen_range(-1.0..1.0)
                } else {
                    /* Never read by the lower solve */
                    rng.gen_range(100.0..200.0)
                };
            }
        }
        l
    }

    fn lower_times(l:&Matrix, x:&[f64]) -> Vec<f64> {
        let n = l.rows;
        (0..n).map(|i| x[i] + (0..i).map(|j| l[(i,j)]*x[j]).sum::<f64>()).collect()
    }

    /** Solve L x = b, then check L x reproduces b */
    #[test]
    fn test_lower_round_trip() {
        for n in 1..=24usize {
            let l = random_unit_lower(n);
            let b : Vec<f64> = (0..n).map(|_| thread_rng().gen_range(-1.0..1.0)).collect();
            let mut x = b.clone();
            triangular_solve(Triangle::Lower, &l.data, &mut x, n, &Permutation::identity(n).into_vec());
            let lx = lower_times(&l, &x);
            for i in 0..n { assert!((lx[i]-b[i]).abs() < 1e-9, "{} vs {}", lx[i], b[i]); }
        }
    }

    /** The lower solve gathers b through the permutation first */
    #[test]
    fn test_lower_permutes() {
        let n = 7;
        let l = random_unit_lower(n);
        let p = Permutation::random(n, &mut thread_rng());
        let b : Vec<f64> = (0..n).map(|_| thread_rng().gen_range(-1.0..1.0)).collect();

        let mut x = b.clone();
        triangular_solve(Triangle::Lower, &l.data, &mut x, n, p.as_slice());

        let mut y = p.gather(&b);
        triangular_solve(Triangle::Lower, &l.data, &mut y, n, &Permutation::identity(n).into_vec());
        assert_eq!(x, y);
    }

    #[test]
    fn test_upper_round_trip() {
        for n in 1..=24usize {
            let mut rng = thread_rng();
            let mut u = Matrix::new(n,n);
            for i in 0..n {
                for j in i..n { u[(i,j)] = rng.gen_range(-1.0..1.0) / n as f64; }
                u[(i,i)] = 1.0 + rng.gen_range(0.0..1.0);
            }
            let b : Vec<f64> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
            let mut x = b.clone();
            triangular_solve(Triangle::Upper, &u.data, &mut x, n, &[]);
            for i in 0..n {
                let ux : f64 = (i..n).map(|j| u[(i,j)]*x[j]).sum();
                assert!((ux-b[i]).abs() < 1e-9);
            }
        }
    }

    /** L * L^-1 = I, where L has an implicit unit diagonal */
    #[test]
    fn test_invert_unit_lower() {
        for n in 1..=16usize {
            let l = random_unit_lower(n);
            let inv = invert_unit_lower(&l.data, n);
            for j in 0..n {
                let col : Vec<f64> = (0..n).map(|i| inv[i*n+j]).collect();
                for i in 0..j { assert_eq!(col[i], 0.0); }
                let prod = lower_times(&l, &col);
                for i in 0..n {
                    let want = if i==j { 1.0 } else { 0.0 };
                    assert!((prod[i]-want).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn test_two_by_two_lower() {
        /* Packed LU of [[4,3],[6,3]] */
        let lu = [6.0, 3.0, 2.0/3.0, 1.0];
        let mut b = [10.0, 12.0];
        triangular_solve(Triangle::Lower, &lu, &mut b, 2, &[1,0]);
        triangular_solve(Triangle::Upper, &lu, &mut b, 2, &[1,0]);
        /* 4x + 3y = 10, 6x + 3y = 12 */
        assert!((b[0]-1.0).abs() < 1e-12);
        assert!((b[1]-2.0).abs() < 1e-12);
    }
}
