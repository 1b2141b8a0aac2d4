/*
 * @file cffi.rs
 * @author The blocked_lu authors
 * @copyright 2026 The blocked_lu authors
 *
 * C foreign function interface.
 * Return codes follow the C convention: 0 for success, -1 for a singular
 * matrix, -2 for bad arguments.
 */

use crate::{LuFactors,LuError,BlockOptions,Triangle,STD_BINCODE_CONFIG,
    factorize_unblocked,factorize_blocked,triangular_solve,multiply_accumulate,
    multiply_subtract,transpose};
use crate::size::encoded_len;
use core::ptr::NonNull;
use core::slice::{from_raw_parts,from_raw_parts_mut};
use bincode::encode_into_slice;

/** Success */
pub const LU_OK : i32 = 0;
/** The matrix is singular */
pub const LU_SINGULAR : i32 = -1;
/** Null pointers, negative sizes, or an invalid block size */
pub const LU_INVALID : i32 = -2;

fn status(res:Result<(), LuError>) -> i32 {
    match res {
        Ok(()) => LU_OK,
        Err(LuError::Singular { .. }) => LU_SINGULAR,
        Err(_) => LU_INVALID
    }
}

/** Read a C pivot vector, rejecting negative entries */
unsafe fn read_ipiv(ipiv:*const i32, n:usize) -> Option<Vec<usize>> {
    from_raw_parts(ipiv, n).iter().map(|&x| usize::try_from(x).ok()).collect()
}

unsafe fn write_ipiv(ipiv:*mut i32, src:&[usize]) {
    for (dst,&x) in from_raw_parts_mut(ipiv, src.len()).iter_mut().zip(src.iter()) {
        *dst = x as i32;
    }
}

/** Shared body of the two factorization entry points */
unsafe fn factor_c<F>(a:*mut f64, ipiv:*mut i32, n:i32, factor:F) -> i32
where F: FnOnce(&mut [f64], &mut [usize], usize) -> Result<(), LuError> {
    let n = match usize::try_from(n) { Ok(n) => n, Err(_) => return LU_INVALID };
    if n == 0 { return LU_OK; }
    if a.is_null() || ipiv.is_null() { return LU_INVALID; }
    let mut pivots = match read_ipiv(ipiv, n) { Some(p) => p, None => return LU_INVALID };
    let ret = status(factor(from_raw_parts_mut(a, n*n), &mut pivots, n));
    write_ipiv(ipiv, &pivots);
    ret
}

/****************************************************************************
 * Kernels
 ****************************************************************************/

#[no_mangle]
/// Unblocked LU with partial pivoting on an n x n row-major matrix.
/// `ipiv` must hold a permutation (normally the identity) on entry.
pub unsafe extern fn lu_dgetrf(a: *mut f64, ipiv: *mut i32, n: i32) -> i32 {
    factor_c(a, ipiv, n, |a, p, n| factorize_unblocked(a, p, n))
}

#[no_mangle]
/// Blocked LU with panels of width `b`
pub unsafe extern fn lu_dgetrf_block(a: *mut f64, ipiv: *mut i32, n: i32, b: i32) -> i32 {
    let b = match usize::try_from(b) { Ok(b) => b, Err(_) => return LU_INVALID };
    factor_c(a, ipiv, n, |a, p, n| factorize_blocked(a, p, n, b))
}

#[no_mangle]
/// Triangular solve against a packed LU buffer.  `uplo` is 'L' or 'U';
/// anything else leaves `b` alone.
pub unsafe extern fn lu_dtrsv(uplo: u8, a: *const f64, b: *mut f64, n: i32, ipiv: *const i32) {
    let n = match usize::try_from(n) { Ok(n) if n > 0 => n, _ => return };
    if a.is_null() || b.is_null() { return; }
    let mode = match uplo {
        b'L' | b'l' => Triangle::Lower,
        b'U' | b'u' => Triangle::Upper,
        _ => return
    };
    let pivots = if mode == Triangle::Lower {
        if ipiv.is_null() { return; }
        match read_ipiv(ipiv, n) { Some(p) => p, None => return }
    } else {
        Vec::new()
    };
    if pivots.iter().any(|&r| r >= n) { return; }
    triangular_solve(mode, from_raw_parts(a, n*n), from_raw_parts_mut(b, n), n, &pivots);
}

/** Convert multiply extents, or None if any is negative or the tile is zero */
fn gemm_dims(m:i32, p:i32, n:i32, tile:i32) -> Option<(usize,usize,usize,usize)> {
    let (m, p, n) = (usize::try_from(m).ok()?, usize::try_from(p).ok()?, usize::try_from(n).ok()?);
    let tile = usize::try_from(tile).ok().filter(|&t| t > 0)?;
    Some((m, p, n, tile))
}

#[no_mangle]
/// C += A B, all compact row-major: A is m x p, B is p x n, C is m x n
pub unsafe extern fn lu_dgemm(a: *const f64, b: *const f64, c: *mut f64,
        m: i32, p: i32, n: i32, tile: i32) {
    let (m, p, n, tile) = match gemm_dims(m, p, n, tile) { Some(d) => d, None => return };
    if m == 0 || n == 0 || p == 0 || a.is_null() || b.is_null() || c.is_null() { return; }
    multiply_accumulate(from_raw_parts(a, m*p), from_raw_parts(b, p*n),
        from_raw_parts_mut(c, m*n), m, p, n, tile, n);
}

#[no_mangle]
/// C -= A B, where C's rows are `row_stride` elements apart
pub unsafe extern fn lu_dgemm_sub(a: *const f64, b: *const f64, c: *mut f64,
        m: i32, p: i32, n: i32, row_stride: i32, tile: i32) {
    let (m, p, n, tile) = match gemm_dims(m, p, n, tile) { Some(d) => d, None => return };
    let stride = match usize::try_from(row_stride) { Ok(s) if s >= n => s, _ => return };
    if m == 0 || n == 0 || p == 0 || a.is_null() || b.is_null() || c.is_null() { return; }
    multiply_subtract(from_raw_parts(a, m*p), from_raw_parts(b, p*n),
        from_raw_parts_mut(c, (m-1)*stride + n), m, p, n, tile, stride);
}

#[no_mangle]
/// Transpose a rows x cols matrix in place
pub unsafe extern fn lu_transpose(a: *mut f64, rows: i32, cols: i32) {
    let (rows, cols) = match (usize::try_from(rows), usize::try_from(cols)) {
        (Ok(r), Ok(c)) => (r, c),
        _ => return
    };
    if a.is_null() || rows*cols == 0 { return; }
    transpose(from_raw_parts_mut(a, rows*cols), rows, cols);
}

/****************************************************************************
 * Owned factors
 ****************************************************************************/

#[no_mangle]
/// Factor a copy of an n x n matrix.  Return NULL on failure
pub unsafe extern fn lu_factors_build(a: *const f64, n: usize, block: usize) -> *mut LuFactors {
    if a.is_null() && n > 0 { return std::ptr::null_mut(); }
    let input = if n == 0 { &[][..] } else { from_raw_parts(a, n*n) };
    match LuFactors::from_slice(input, n, &BlockOptions::with_block_size(block)) {
        Ok(f) => Box::into_raw(Box::new(f)),
        Err(_) => std::ptr::null_mut()
    }
}

#[no_mangle]
/// Solve A x = b in place.  Return false if b has the wrong length
pub unsafe extern fn lu_factors_solve(ptr: NonNull<LuFactors>, b: *mut f64, n: usize) -> bool {
    if b.is_null() { return false; }
    ptr.as_ref().solve(from_raw_parts_mut(b, n)).is_ok()
}

#[no_mangle]
/// Encode to output_buf, if it's big enough.  Return the serialized size of the object, in bytes,
/// or 0 if it can't be encoded.
pub unsafe extern fn lu_factors_encode(
    ptr: NonNull<LuFactors>,
    output_buf: *mut u8,
    output_buf_size: usize
) -> usize {
    let required_size = match encoded_len(ptr.as_ref(), STD_BINCODE_CONFIG) {
        Ok(size) => size,
        Err(_) => return 0
    };
    if required_size <= output_buf_size && !output_buf.is_null() {
        let out = from_raw_parts_mut(output_buf, output_buf_size);
        if encode_into_slice(ptr.as_ref(), out, STD_BINCODE_CONFIG).is_err() { return 0; }
    }
    required_size
}

#[no_mangle]
/// Decode factors produced by `lu_factors_encode`.  Return NULL on failure
pub unsafe extern fn lu_factors_decode(input: *const u8, input_size: usize) -> *mut LuFactors {
    if input.is_null() { return std::ptr::null_mut(); }
    match LuFactors::from_bytes(from_raw_parts(input, input_size)) {
        Ok(f) => Box::into_raw(Box::new(f)),
        Err(_) => std::ptr::null_mut()
    }
}

#[no_mangle]
/// Destroy and free an LuFactors
pub unsafe extern fn lu_factors_free(ptr: *mut LuFactors) {
    if !ptr.is_null() { drop(Box::from_raw(ptr)); }
}

/**************************************************************************
 * Tests
 **************************************************************************/
#[cfg(test)]
mod tests {
    use crate::cffi::*;
    use core::ptr::NonNull;

    #[test]
    fn test_dgetrf_two_by_two() {
        let mut a = [4.0, 3.0, 6.0, 3.0];
        let mut ipiv = [0i32, 1];
        assert_eq!(unsafe { lu_dgetrf(a.as_mut_ptr(), ipiv.as_mut_ptr(), 2) }, LU_OK);
        assert_eq!(ipiv, [1, 0]);
        assert!((a[2] - 2.0/3.0).abs() < 1e-12);

        let mut b = [10.0, 12.0];
        unsafe {
            lu_dtrsv(b'L', a.as_ptr(), b.as_mut_ptr(), 2, ipiv.as_ptr());
            lu_dtrsv(b'U', a.as_ptr(), b.as_mut_ptr(), 2, ipiv.as_ptr());
        }
        assert!((b[0] - 1.0).abs() < 1e-12 && (b[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_dgetrf_block_status() {
        let mut a = [1.0, 2.0, 2.0, 4.0];
        let mut ipiv = [0i32, 1];
        assert_eq!(unsafe { lu_dgetrf_block(a.as_mut_ptr(), ipiv.as_mut_ptr(), 2, 1) }, LU_SINGULAR);

        let mut a = [1.0, 0.0, 0.0, 1.0];
        let mut ipiv = [0i32, 1];
        assert_eq!(unsafe { lu_dgetrf_block(a.as_mut_ptr(), ipiv.as_mut_ptr(), 2, 0) }, LU_INVALID);
        assert_eq!(unsafe { lu_dgetrf_block(a.as_mut_ptr(), ipiv.as_mut_ptr(), -1, 1) }, LU_INVALID);
        let mut bad = [0i32, -1];
        assert_eq!(unsafe { lu_dgetrf(a.as_mut_ptr(), bad.as_mut_ptr(), 2) }, LU_INVALID);
    }

    #[test]
    fn test_dgemm() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let b = [5.0, 6.0, 7.0, 8.0];
        let mut c = [1.0; 4];
        unsafe { lu_dgemm(a.as_ptr(), b.as_ptr(), c.as_mut_ptr(), 2, 2, 2, 3); }
        assert_eq!(c, [20.0, 23.0, 44.0, 51.0]);

        /* Write into the top-left 2x2 of a 2x3 buffer */
        let mut big = [0.0; 6];
        unsafe { lu_dgemm_sub(a.as_ptr(), b.as_ptr(), big.as_mut_ptr(), 2, 2, 2, 3, 3); }
        assert_eq!(big, [-19.0, -22.0, 0.0, -43.0, -50.0, 0.0]);

        let mut t = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        unsafe { lu_transpose(t.as_mut_ptr(), 2, 3); }
        assert_eq!(t, [1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_factors_object() {
        let a = [2.0, 1.0, 1.0, 1.0, 3.0, 2.0, 1.0, 0.0, 0.0];
        unsafe {
            let f = lu_factors_build(a.as_ptr(), 3, 2);
            assert!(!f.is_null());
            let mut b = [4.0, 5.0, 6.0];
            assert!(lu_factors_solve(NonNull::new(f).unwrap(), b.as_mut_ptr(), 3));
            for i in 0..3 {
                let row : f64 = (0..3).map(|j| a[i*3+j]*b[j]).sum();
                assert!((row - [4.0, 5.0, 6.0][i]).abs() < 1e-9);
            }

            let size = lu_factors_encode(NonNull::new(f).unwrap(), std::ptr::null_mut(), 0);
            let mut buf = vec![0u8; size];
            assert_eq!(lu_factors_encode(NonNull::new(f).unwrap(), buf.as_mut_ptr(), size), size);
            let g = lu_factors_decode(buf.as_ptr(), size);
            assert!(!g.is_null());
            assert_eq!(*f, *g);

            lu_factors_free(f);
            lu_factors_free(g);
        }

        let mut crafted = 2u64.to_le_bytes().to_vec();
        crafted.extend_from_slice(&(1u64<<61).to_le_bytes());
        assert!(unsafe { lu_factors_decode(crafted.as_ptr(), crafted.len()) }.is_null());

        let singular = [1.0, 1.0, 1.0, 1.0];
        assert!(unsafe { lu_factors_build(singular.as_ptr(), 2, 1) }.is_null());
    }
}
