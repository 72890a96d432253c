//! Schur-complement reduction of always-free variables.
//!
//! Variables with `lo = -inf` and `hi = +inf` can never be bound, so their
//! `w` is zero in every partition the pivoting engines visit. Splitting the
//! system into that unbounded block `U` and the remaining block `R`:
//!
//! ```text
//! [A_UU A_UR] [x_U]   [b_U]   [ 0 ]
//! [A_RU A_RR] [x_R] = [b_R] + [w_R]
//! ```
//!
//! eliminating `x_U = A_UU⁻¹ (b_U - A_UR x_R)` leaves a box LCP of size |R|
//!
//! ```text
//! (A_RR - A_RU A_UU⁻¹ A_UR) x_R = (b_R - A_RU A_UU⁻¹ b_U) + w_R
//! ```
//!
//! whose matrix is again symmetric positive definite. `A_UU` is factored
//! once, every pivot then only touches the small reduced system, and the
//! complementarity conditions on `R` are the same ones the full system
//! imposes.

use nalgebra::{DMatrix, DVector};

use crate::LcpAlgorithm;
use crate::MatrixPermutation;
use crate::VariableState;
use crate::error::LcpError;
use crate::pivot::{self, Budget, PivotOutcome};

/// Solve with the unbounded variables (ascending original indexes in
/// `unbounded`) eliminated through their Schur complement.
#[allow(clippy::too_many_arguments)]
pub(crate) fn solve_reduced(
    algorithm: LcpAlgorithm,
    a: DMatrix<f64>,
    b: &DVector<f64>,
    lo: &DVector<f64>,
    hi: &DVector<f64>,
    unbounded: &[usize],
    budget: &Budget,
    tolerance: f64,
) -> Result<PivotOutcome, LcpError> {
    let n = a.nrows();
    let nu = unbounded.len();
    let m = n - nu;

    // Gather U at the front, keeping its original order.
    let mut perm = MatrixPermutation::new(a);
    for (k, &i) in unbounded.iter().enumerate() {
        let p = perm.permuted_index_of(i);
        perm.swap_rows_and_columns(k, p);
    }

    let a = perm.matrix();
    let chol = a
        .view((0, 0), (nu, nu))
        .clone_owned()
        .cholesky()
        .ok_or(LcpError::NotPositiveDefinite { size: nu })?;

    let b_perm = perm.permute(b);
    let a_ur = a.view((0, nu), (nu, m)).clone_owned();
    let y = chol.solve(&a_ur);
    let z = chol.solve(&b_perm.rows(0, nu).clone_owned());

    let schur = a.view((nu, nu), (m, m)) - a_ur.transpose() * &y;
    let b_reduced = b_perm.rows(nu, m) - a_ur.transpose() * &z;
    let lo_reduced = perm.permute(lo).rows(nu, m).clone_owned();
    let hi_reduced = perm.permute(hi).rows(nu, m).clone_owned();

    let reduced = pivot::run(
        algorithm,
        schur,
        &b_reduced,
        &lo_reduced,
        &hi_reduced,
        budget,
        tolerance,
    )?;

    let x_u = z - y * &reduced.x;

    let mut x_perm = DVector::zeros(n);
    x_perm.rows_mut(0, nu).copy_from(&x_u);
    x_perm.rows_mut(nu, m).copy_from(&reduced.x);
    let x = perm.unpermute(&x_perm);

    // w_U is exactly zero; only the reduced suffix carries values.
    let mut w_perm = DVector::zeros(n);
    w_perm.rows_mut(nu, m).copy_from(&reduced.w);
    let mut w = DVector::zeros(n);
    perm.unpermute_from(&w_perm, &mut w, nu);

    let mut states = vec![VariableState::Free; n];
    for (k, state) in reduced.states.iter().enumerate() {
        states[perm.original_index_of(nu + k)] = *state;
    }

    Ok(PivotOutcome {
        x,
        w,
        states,
        iterations: reduced.iterations,
    })
}
