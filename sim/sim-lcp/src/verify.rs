//! Independent check that `(x, w)` solves a box LCP.
//!
//! Meant for tests and debug builds: it does not trust solver internals, only
//! the defining conditions.

use nalgebra::{DMatrix, DVector};

use crate::error::LcpViolation;
use crate::pivot::{is_lower_unbounded, is_upper_unbounded};

/// Verify that `(x, w)` satisfies `A x = b + w` and box complementarity
/// within `tolerance`.
///
/// Returns the largest residual `|A x - b - w|` on success.
///
/// # Errors
///
/// Returns the first [`LcpViolation`] found, checking dimensions, then
/// residuals, then complementarity, in index order.
pub fn verify_lcp(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    lo: &DVector<f64>,
    hi: &DVector<f64>,
    x: &DVector<f64>,
    w: &DVector<f64>,
    tolerance: f64,
) -> Result<f64, LcpViolation> {
    let n = a.nrows();
    let lengths = [
        ("A columns", a.ncols()),
        ("b", b.len()),
        ("lo", lo.len()),
        ("hi", hi.len()),
        ("x", x.len()),
        ("w", w.len()),
    ];
    for (what, actual) in lengths {
        if actual != n {
            return Err(LcpViolation::DimensionMismatch {
                what,
                expected: n,
                actual,
            });
        }
    }

    let residual = a * x - b - w;
    let mut max_residual: f64 = 0.0;
    for (index, r) in residual.iter().enumerate() {
        if !(r.abs() <= tolerance) {
            return Err(LcpViolation::Residual {
                index,
                residual: *r,
                tolerance,
            });
        }
        max_residual = max_residual.max(r.abs());
    }

    for i in 0..n {
        if !is_complementary(x[i], w[i], lo[i], hi[i], tolerance) {
            return Err(LcpViolation::Complementarity {
                index: i,
                x: x[i],
                w: w[i],
                lo: lo[i],
                hi: hi[i],
            });
        }
    }

    Ok(max_residual)
}

/// Like [`verify_lcp`], but panics on a violation.
///
/// # Panics
///
/// Panics with the violation message if `(x, w)` is not a solution.
#[allow(clippy::panic)]
pub fn check_lcp(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    lo: &DVector<f64>,
    hi: &DVector<f64>,
    x: &DVector<f64>,
    w: &DVector<f64>,
    tolerance: f64,
) -> f64 {
    match verify_lcp(a, b, lo, hi, x, w, tolerance) {
        Ok(residual) => residual,
        Err(violation) => panic!("LCP check failed: {violation}"),
    }
}

/// Whether `(x, w)` lies on at least one complementary segment.
///
/// Segments meet at `lo == hi` and at `x` on a bound with `w == 0`; a point
/// there is accepted on either.
fn is_complementary(x: f64, w: f64, lo: f64, hi: f64, tol: f64) -> bool {
    let at_lo = !is_lower_unbounded(lo) && (x - lo).abs() <= tol && w >= -tol;
    let at_hi = !is_upper_unbounded(hi) && (x - hi).abs() <= tol && w <= tol;
    let inside = x >= lo - tol && x <= hi + tol && w.abs() <= tol;
    at_lo || at_hi || inside
}
