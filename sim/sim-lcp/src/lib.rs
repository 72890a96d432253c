//! Box-constrained linear complementarity solver for contact constraints.
//!
//! Contact impulses with friction bounds are the solution of a *box LCP*:
//! find `x` and `w` with
//!
//! ```text
//! A x = b + w
//! ```
//!
//! where, per variable, either `x` sits on its lower bound with `w >= 0`, on
//! its upper bound with `w <= 0`, or strictly between with `w = 0`. `A` is
//! the symmetric positive definite effective-mass matrix `J M⁻¹ Jᵀ` and the
//! bounds come from the friction model of each contact.
//!
//! # Solvers
//!
//! | Algorithm | Strategy | Starts from |
//! |-----------|----------|-------------|
//! | [`LcpAlgorithm::Murty`] | least-index flip | everything free |
//! | [`LcpAlgorithm::CottleDantzig`] | driving variable + ratio test | `x = 0` |
//!
//! Both are principal pivoting methods: they keep the free variables in a
//! leading block of a [`MatrixPermutation`] and solve that block exactly by
//! Cholesky factorization. Results are exact up to round-off, unlike
//! iterative projected Gauss-Seidel.
//!
//! Variables bounded on neither side are eliminated up front through a Schur
//! complement when [`LcpSolverConfig::schur_complement`] is set.
//!
//! # Example
//!
//! ```
//! use nalgebra::{DMatrix, DVector};
//! use sim_lcp::{check_lcp, solve_lcp, LcpAlgorithm, LcpSolverConfig};
//!
//! // One contact: normal row [0, inf), two friction rows [-1, 1].
//! let a = DMatrix::from_row_slice(3, 3, &[
//!     2.0, 0.1, 0.0,
//!     0.1, 2.0, 0.0,
//!     0.0, 0.0, 1.0,
//! ]);
//! let b = DVector::from_vec(vec![4.0, -1.0, 2.0]);
//! let lo = DVector::from_vec(vec![-1.0, -1.0, 0.0]);
//! let hi = DVector::from_vec(vec![1.0, 1.0, f64::INFINITY]);
//!
//! let config = LcpSolverConfig::default().with_algorithm(LcpAlgorithm::CottleDantzig);
//! let solution = solve_lcp(&config, a.clone(), &b, &lo, &hi).unwrap();
//!
//! // Independent verification of the complementarity conditions.
//! check_lcp(&a, &b, &lo, &hi, &solution.x, &solution.w, 1e-9);
//! assert_eq!(solution.x[0], 1.0);
//! ```
//!
//! # Budgets
//!
//! Pivoting can take many steps on pathological systems. Both
//! [`LcpSolverConfig::max_iterations`] and [`LcpSolverConfig::max_time`]
//! bound the work; running out is reported as an [`LcpError`] so the caller
//! can fall back (for example, skip contact resolution for one step). An
//! empty budget fails every problem that has a bounded, non-pinned variable,
//! whichever algorithm is configured.

#![doc(html_root_url = "https://docs.rs/sim-lcp/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,
    clippy::many_single_char_names, // a, b, x, w are the standard LCP names
    clippy::suboptimal_flops,
)]

mod error;
mod permutation;
mod pivot;
mod schur;
mod solver;
mod verify;

pub use error::{LcpError, LcpViolation};
pub use permutation::MatrixPermutation;
pub use solver::{
    LcpAlgorithm, LcpSolution, LcpSolver, LcpSolverConfig, LcpSolverStats, VariableState,
    solve_lcp,
};
pub use verify::{check_lcp, verify_lcp};
