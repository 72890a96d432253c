//! Box LCP solver front end: configuration, validation and statistics.
//!
//! Given a symmetric positive definite `A`, a right-hand side `b` and
//! per-variable bounds `lo <= 0 <= hi`, the solver finds `x` and `w` with
//! `A x = b + w` where for every `i` one of
//!
//! ```text
//! x[i] = lo[i]          and  w[i] >= 0
//! x[i] = hi[i]          and  w[i] <= 0
//! lo[i] < x[i] < hi[i]  and  w[i] = 0
//! ```
//!
//! holds. The ordinary LCP is the special case `lo = 0`, `hi = +inf`.
//!
//! ```text
//!        w[i]
//!         |      | AtLower
//!         |      | x = lo
//!     w>0 |      |
//!     w=0 +      +-----------Free-----------+
//!     w<0 |                                 |
//!         |                                 | AtUpper
//!         |                                 | x = hi
//!         +------|-----------|--------------|------> x[i]
//!               lo           0              hi
//! ```
//!
//! Either `±inf` or `±f64::MAX` may be used for a missing bound.

use std::time::Duration;

use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use crate::error::LcpError;
use crate::pivot::{self, Budget};
use crate::schur;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Principal pivoting method used to choose which variable to flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum LcpAlgorithm {
    /// Least-index principal pivoting.
    ///
    /// Murty, K. G. (1988). Linear complementarity, linear and nonlinear
    /// programming.
    #[default]
    Murty,

    /// Driving-variable principal pivoting with a ratio test.
    ///
    /// Cottle, R. W.; Dantzig, G. B. (1968). "Complementary pivot theory of
    /// mathematical programming". Linear Algebra and its Applications. 1:
    /// 103–125.
    CottleDantzig,
}

/// Which of the three complementary segments a variable ended on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum VariableState {
    /// `lo < x < hi`, `w = 0`.
    Free,
    /// `x = lo`, `w >= 0`.
    AtLower,
    /// `x = hi`, `w <= 0`.
    AtUpper,
}

/// Configuration for the LCP solver.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LcpSolverConfig {
    /// Pivoting method.
    pub algorithm: LcpAlgorithm,

    /// Eliminate variables with no bounds at all through a Schur complement
    /// before pivoting. Speeds up systems with many unbounded variables.
    pub schur_complement: bool,

    /// Maximum number of pivots before giving up.
    ///
    /// A sensible limit is often hard to know ahead of time, which is why
    /// `max_time` also exists.
    pub max_iterations: usize,

    /// Maximum wall-clock time in seconds before giving up.
    /// A value `<= 0` fails any solve that needs a pivot.
    pub max_time: f64,

    /// Feasibility tolerance for the pivot rules.
    pub tolerance: f64,
}

impl Default for LcpSolverConfig {
    fn default() -> Self {
        Self {
            algorithm: LcpAlgorithm::Murty,
            schur_complement: true,
            max_iterations: usize::MAX,
            max_time: f64::MAX,
            tolerance: 1e-10,
        }
    }
}

impl LcpSolverConfig {
    /// Bounded configuration for real-time stepping.
    ///
    /// Gives up after 1000 pivots or 2 ms so a pathological frame cannot
    /// stall the simulation.
    #[must_use]
    pub fn realtime() -> Self {
        Self {
            algorithm: LcpAlgorithm::CottleDantzig,
            schur_complement: true,
            max_iterations: 1000,
            max_time: 0.002,
            tolerance: 1e-9,
        }
    }

    /// Set the pivoting method.
    #[must_use]
    pub const fn with_algorithm(mut self, algorithm: LcpAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Enable or disable the Schur-complement path.
    #[must_use]
    pub const fn with_schur_complement(mut self, enabled: bool) -> Self {
        self.schur_complement = enabled;
        self
    }

    /// Set maximum pivots.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set maximum wall-clock seconds.
    #[must_use]
    pub const fn with_max_time(mut self, seconds: f64) -> Self {
        self.max_time = seconds;
        self
    }

    /// Set the feasibility tolerance.
    #[must_use]
    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error string if any configuration value is out of range.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err("Tolerance must be positive and finite");
        }
        if self.max_time.is_nan() {
            return Err("Max time must not be NaN");
        }
        Ok(())
    }
}

/// A complementary solution.
#[derive(Debug, Clone, PartialEq)]
pub struct LcpSolution {
    /// Primal values, one per constraint row, original order.
    pub x: DVector<f64>,
    /// Dual values (`A x - b`), original order.
    pub w: DVector<f64>,
    /// Segment each variable ended on.
    pub states: Vec<VariableState>,
    /// Pivots performed.
    pub iterations: usize,
    /// Whether the Schur-complement path was taken.
    pub used_schur_complement: bool,
}

impl LcpSolution {
    /// Number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether the problem was empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Number of variables strictly inside their bounds.
    #[must_use]
    pub fn num_free(&self) -> usize {
        self.states
            .iter()
            .filter(|s| **s == VariableState::Free)
            .count()
    }
}

/// Statistics from the last solve.
#[derive(Debug, Clone, Default)]
pub struct LcpSolverStats {
    /// System dimension.
    pub dimension: usize,
    /// Variables with neither bound.
    pub unbounded_variables: usize,
    /// Whether the Schur-complement path was taken.
    pub used_schur_complement: bool,
    /// Pivots performed (up to the failure point on error).
    pub iterations: usize,
    /// Wall-clock time spent.
    pub elapsed: Duration,
    /// Whether a solution was found.
    pub converged: bool,
}

/// Principal pivoting box LCP solver.
///
/// # Example
///
/// ```
/// use nalgebra::{DMatrix, DVector};
/// use sim_lcp::{LcpSolver, LcpSolverConfig, VariableState};
///
/// let a = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]);
/// let b = DVector::from_vec(vec![-1.0, 3.0]);
/// let lo = DVector::zeros(2);
/// let hi = DVector::from_element(2, f64::INFINITY);
///
/// let mut solver = LcpSolver::new(LcpSolverConfig::default());
/// let solution = solver.solve(a, &b, &lo, &hi).unwrap();
///
/// assert_eq!(solution.x[0], 0.0);
/// assert!((solution.x[1] - 1.5).abs() < 1e-12);
/// assert_eq!(solution.states[0], VariableState::AtLower);
/// ```
#[derive(Debug, Clone, Default)]
pub struct LcpSolver {
    config: LcpSolverConfig,
    last_stats: LcpSolverStats,
}

impl LcpSolver {
    /// Create a new solver with the given configuration.
    #[must_use]
    pub fn new(config: LcpSolverConfig) -> Self {
        Self {
            config,
            last_stats: LcpSolverStats::default(),
        }
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &LcpSolverConfig {
        &self.config
    }

    /// Get mutable configuration.
    pub fn config_mut(&mut self) -> &mut LcpSolverConfig {
        &mut self.config
    }

    /// Get statistics from the last solve.
    #[must_use]
    pub fn last_stats(&self) -> &LcpSolverStats {
        &self.last_stats
    }

    /// Solve `A x = b + w` subject to the box complementarity conditions.
    ///
    /// `a` is taken by value: the solver permutes it in place and drops it.
    /// Clone it first if it is needed afterwards (for example to run
    /// [`check_lcp`](crate::check_lcp)).
    ///
    /// # Errors
    ///
    /// - [`LcpError::DimensionMismatch`] / [`LcpError::InvalidBounds`] /
    ///   [`LcpError::NonFiniteInput`] / [`LcpError::InvalidConfig`] for
    ///   malformed input
    /// - [`LcpError::IterationLimit`] / [`LcpError::TimeLimit`] when the
    ///   budget runs out
    /// - [`LcpError::NotPositiveDefinite`] when a reduced block cannot be
    ///   factored
    pub fn solve(
        &mut self,
        a: DMatrix<f64>,
        b: &DVector<f64>,
        lo: &DVector<f64>,
        hi: &DVector<f64>,
    ) -> Result<LcpSolution, LcpError> {
        self.config.validate().map_err(LcpError::InvalidConfig)?;
        validate_problem(&a, b, lo, hi)?;

        let n = a.nrows();
        let budget = Budget::new(self.config.max_iterations, self.config.max_time);
        let unbounded: Vec<usize> = (0..n)
            .filter(|&i| pivot::is_unbounded(lo[i], hi[i]))
            .collect();
        let use_schur = self.config.schur_complement && !unbounded.is_empty();

        let outcome = if use_schur {
            schur::solve_reduced(
                self.config.algorithm,
                a,
                b,
                lo,
                hi,
                &unbounded,
                &budget,
                self.config.tolerance,
            )
        } else {
            pivot::run(
                self.config.algorithm,
                a,
                b,
                lo,
                hi,
                &budget,
                self.config.tolerance,
            )
        };

        let iterations = match &outcome {
            Ok(out) => out.iterations,
            Err(LcpError::IterationLimit { iterations } | LcpError::TimeLimit { iterations, .. }) => {
                *iterations
            }
            Err(_) => 0,
        };
        self.last_stats = LcpSolverStats {
            dimension: n,
            unbounded_variables: unbounded.len(),
            used_schur_complement: use_schur,
            iterations,
            elapsed: budget.elapsed(),
            converged: outcome.is_ok(),
        };

        match outcome {
            Ok(out) => {
                debug!(
                    dimension = n,
                    algorithm = ?self.config.algorithm,
                    pivots = out.iterations,
                    schur = use_schur,
                    unbounded = unbounded.len(),
                    "LCP solved"
                );
                Ok(LcpSolution {
                    x: out.x,
                    w: out.w,
                    states: out.states,
                    iterations: out.iterations,
                    used_schur_complement: use_schur,
                })
            }
            Err(err) => {
                warn!(
                    dimension = n,
                    algorithm = ?self.config.algorithm,
                    "LCP solve failed: {}",
                    err
                );
                Err(err)
            }
        }
    }
}

/// Solve a box LCP with a one-off solver.
///
/// # Errors
///
/// See [`LcpSolver::solve`].
pub fn solve_lcp(
    config: &LcpSolverConfig,
    a: DMatrix<f64>,
    b: &DVector<f64>,
    lo: &DVector<f64>,
    hi: &DVector<f64>,
) -> Result<LcpSolution, LcpError> {
    LcpSolver::new(*config).solve(a, b, lo, hi)
}

fn validate_problem(
    a: &DMatrix<f64>,
    b: &DVector<f64>,
    lo: &DVector<f64>,
    hi: &DVector<f64>,
) -> Result<(), LcpError> {
    let n = a.nrows();
    let lengths = [
        ("A columns", a.ncols()),
        ("b", b.len()),
        ("lo", lo.len()),
        ("hi", hi.len()),
    ];
    for (what, actual) in lengths {
        if actual != n {
            return Err(LcpError::DimensionMismatch {
                what,
                expected: n,
                actual,
            });
        }
    }

    if let Some(k) = a.iter().position(|v| !v.is_finite()) {
        // Column-major storage.
        return Err(LcpError::NonFiniteInput {
            what: "A",
            row: k % n,
            col: k / n,
        });
    }
    if let Some(row) = b.iter().position(|v| !v.is_finite()) {
        return Err(LcpError::NonFiniteInput {
            what: "b",
            row,
            col: 0,
        });
    }

    for i in 0..n {
        // Negated so NaN bounds are rejected too.
        if !(lo[i] <= 0.0 && hi[i] >= 0.0) {
            return Err(LcpError::InvalidBounds {
                index: i,
                lo: lo[i],
                hi: hi[i],
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::verify_lcp;
    use approx::assert_relative_eq;

    fn contact_like_problem() -> (DMatrix<f64>, DVector<f64>, DVector<f64>, DVector<f64>) {
        // Two contacts with box friction plus two unbounded rows.
        let n = 8;
        let m = DMatrix::from_fn(n, n, |i, j| (((i + 1) * (j + 2)) % 7) as f64 / 7.0 - 0.4);
        let a = &m * m.transpose() + DMatrix::identity(n, n);
        let b = DVector::from_vec(vec![0.3, -1.2, 2.0, -0.7, 0.1, 1.5, -2.5, 0.4]);
        let inf = f64::INFINITY;
        let lo = DVector::from_vec(vec![-0.5, -0.5, 0.0, -0.5, -0.5, 0.0, -inf, -inf]);
        let hi = DVector::from_vec(vec![0.5, 0.5, inf, 0.5, 0.5, inf, inf, inf]);
        (a, b, lo, hi)
    }

    #[test]
    fn test_config_presets() {
        let default = LcpSolverConfig::default();
        assert_eq!(default.algorithm, LcpAlgorithm::Murty);
        assert!(default.schur_complement);
        assert_eq!(default.max_iterations, usize::MAX);
        assert!(default.validate().is_ok());

        let realtime = LcpSolverConfig::realtime();
        assert!(realtime.max_iterations < default.max_iterations);
        assert!(realtime.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(LcpSolverConfig::default().with_tolerance(0.0).validate().is_err());
        assert!(
            LcpSolverConfig::default()
                .with_tolerance(f64::NAN)
                .validate()
                .is_err()
        );
        assert!(
            LcpSolverConfig::default()
                .with_max_time(f64::NAN)
                .validate()
                .is_err()
        );
        // Non-positive time is a valid (if useless) budget.
        assert!(LcpSolverConfig::default().with_max_time(0.0).validate().is_ok());
    }

    #[test]
    fn test_all_paths_verify() {
        let (a, b, lo, hi) = contact_like_problem();
        for algorithm in [LcpAlgorithm::Murty, LcpAlgorithm::CottleDantzig] {
            for schur in [false, true] {
                let config = LcpSolverConfig::default()
                    .with_algorithm(algorithm)
                    .with_schur_complement(schur);
                let solution = solve_lcp(&config, a.clone(), &b, &lo, &hi).unwrap();
                assert_eq!(solution.used_schur_complement, schur);
                let residual = verify_lcp(&a, &b, &lo, &hi, &solution.x, &solution.w, 1e-8);
                assert!(residual.is_ok(), "{algorithm:?} schur={schur}: {residual:?}");
            }
        }
    }

    #[test]
    fn test_schur_and_full_paths_agree() {
        let (a, b, lo, hi) = contact_like_problem();
        let full = solve_lcp(
            &LcpSolverConfig::default().with_schur_complement(false),
            a.clone(),
            &b,
            &lo,
            &hi,
        )
        .unwrap();
        let reduced = solve_lcp(&LcpSolverConfig::default(), a, &b, &lo, &hi).unwrap();

        assert_relative_eq!(full.x, reduced.x, epsilon = 1e-9);
        assert_relative_eq!(full.w, reduced.w, epsilon = 1e-9);
        assert_eq!(full.states, reduced.states);
    }

    #[test]
    fn test_zero_iterations_fails() {
        let a = DMatrix::identity(2, 2);
        let b = DVector::from_vec(vec![-1.0, 1.0]);
        let lo = DVector::zeros(2);
        let hi = DVector::from_element(2, f64::INFINITY);

        for algorithm in [LcpAlgorithm::Murty, LcpAlgorithm::CottleDantzig] {
            let mut solver = LcpSolver::new(
                LcpSolverConfig::default()
                    .with_algorithm(algorithm)
                    .with_max_iterations(0),
            );
            let err = solver.solve(a.clone(), &b, &lo, &hi).unwrap_err();
            assert!(matches!(err, LcpError::IterationLimit { iterations: 0 }));
            assert!(!solver.last_stats().converged);
        }
    }

    #[test]
    fn test_non_positive_time_fails() {
        let a = DMatrix::identity(2, 2);
        let b = DVector::from_vec(vec![-1.0, 1.0]);
        let lo = DVector::zeros(2);
        let hi = DVector::from_element(2, f64::INFINITY);

        for max_time in [0.0, -1.0] {
            let config = LcpSolverConfig::default().with_max_time(max_time);
            let err = solve_lcp(&config, a.clone(), &b, &lo, &hi).unwrap_err();
            assert!(matches!(err, LcpError::TimeLimit { .. }));
            assert!(err.is_budget_exhausted());
        }
    }

    #[test]
    fn test_rejects_bounds_not_straddling_zero() {
        let a = DMatrix::identity(2, 2);
        let b = DVector::zeros(2);
        let lo = DVector::from_vec(vec![0.0, 0.5]);
        let hi = DVector::from_vec(vec![1.0, 1.0]);
        let err = solve_lcp(&LcpSolverConfig::default(), a, &b, &lo, &hi).unwrap_err();
        assert_eq!(
            err,
            LcpError::InvalidBounds {
                index: 1,
                lo: 0.5,
                hi: 1.0
            }
        );
    }

    #[test]
    fn test_rejects_nan_bound_and_bad_lengths() {
        let a = DMatrix::identity(2, 2);
        let b = DVector::zeros(2);
        let lo = DVector::from_vec(vec![f64::NAN, 0.0]);
        let hi = DVector::from_element(2, 1.0);
        let err = solve_lcp(&LcpSolverConfig::default(), a.clone(), &b, &lo, &hi).unwrap_err();
        assert!(matches!(err, LcpError::InvalidBounds { index: 0, .. }));

        let short = DVector::zeros(1);
        let err = solve_lcp(&LcpSolverConfig::default(), a, &short, &hi, &hi).unwrap_err();
        assert!(matches!(err, LcpError::DimensionMismatch { what: "b", .. }));
    }

    #[test]
    fn test_rejects_non_finite_matrix_and_rhs() {
        let lo = DVector::zeros(2);
        let hi = DVector::from_element(2, f64::INFINITY);
        let a = DMatrix::identity(2, 2);
        let nan_b = DVector::from_vec(vec![f64::NAN, 1.0]);

        for algorithm in [LcpAlgorithm::Murty, LcpAlgorithm::CottleDantzig] {
            let config = LcpSolverConfig::default().with_algorithm(algorithm);
            let err = solve_lcp(&config, a.clone(), &nan_b, &lo, &hi).unwrap_err();
            assert_eq!(
                err,
                LcpError::NonFiniteInput {
                    what: "b",
                    row: 0,
                    col: 0
                }
            );
            assert!(err.is_invalid_input());
        }

        let mut inf_a = DMatrix::identity(2, 2);
        inf_a[(0, 1)] = f64::INFINITY;
        let b = DVector::from_vec(vec![1.0, 1.0]);
        let mut solver = LcpSolver::default();
        let err = solver.solve(inf_a, &b, &lo, &hi).unwrap_err();
        assert_eq!(
            err,
            LcpError::NonFiniteInput {
                what: "A",
                row: 0,
                col: 1
            }
        );
        assert!(!solver.last_stats().converged);
    }

    #[test]
    fn test_max_value_means_unbounded() {
        let a = DMatrix::from_row_slice(2, 2, &[2.0, 0.5, 0.5, 1.0]);
        let b = DVector::from_vec(vec![1.0, -1.0]);
        let lo = DVector::from_element(2, -f64::MAX);
        let hi = DVector::from_element(2, f64::MAX);

        let mut solver = LcpSolver::default();
        let solution = solver.solve(a.clone(), &b, &lo, &hi).unwrap();
        assert!(solver.last_stats().used_schur_complement);
        assert_eq!(solver.last_stats().unbounded_variables, 2);
        assert_relative_eq!(&a * &solution.x, b, epsilon = 1e-12);
        assert_eq!(solution.num_free(), 2);
    }

    #[test]
    fn test_stats_record_last_solve() {
        let (a, b, lo, hi) = contact_like_problem();
        let mut solver = LcpSolver::new(LcpSolverConfig::default().with_schur_complement(false));
        let solution = solver.solve(a, &b, &lo, &hi).unwrap();

        let stats = solver.last_stats();
        assert_eq!(stats.dimension, 8);
        assert_eq!(stats.unbounded_variables, 2);
        assert!(!stats.used_schur_complement);
        assert!(stats.converged);
        assert_eq!(stats.iterations, solution.iterations);
    }

    #[test]
    fn test_empty_problem_succeeds() {
        let empty = DVector::zeros(0);
        let solution = solve_lcp(
            &LcpSolverConfig::default().with_max_iterations(0),
            DMatrix::zeros(0, 0),
            &empty,
            &empty,
            &empty,
        )
        .unwrap();
        assert!(solution.is_empty());
        assert_eq!(solution.len(), 0);
    }
}
