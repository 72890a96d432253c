//! Error types for LCP solving and verification.

use thiserror::Error;

/// Recoverable failures of an LCP solve.
///
/// None of these indicate a solver bug. Budget exhaustion and loss of
/// positive definiteness happen on pathological inputs (near-singular
/// systems, too many simultaneous active contacts); the caller chooses a
/// fallback such as skipping constraint resolution for the step.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LcpError {
    /// A vector or matrix does not match the system dimension.
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which argument is wrong.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Bounds do not straddle zero (`lo <= 0 <= hi` is required).
    #[error("invalid bounds for variable {index}: lo={lo}, hi={hi} (need lo <= 0 <= hi)")]
    InvalidBounds {
        /// Original variable index.
        index: usize,
        /// Lower bound.
        lo: f64,
        /// Upper bound.
        hi: f64,
    },

    /// `A` or `b` holds a NaN or infinite entry.
    #[error("non-finite {what} entry at ({row}, {col})")]
    NonFiniteInput {
        /// Which argument is wrong (`"A"` or `"b"`).
        what: &'static str,
        /// Row of the entry.
        row: usize,
        /// Column of the entry; always 0 for `b`.
        col: usize,
    },

    /// Invalid solver configuration.
    #[error("invalid LCP solver configuration: {0}")]
    InvalidConfig(&'static str),

    /// A reduced free-variable block could not be Cholesky factored.
    #[error("free block of size {size} is not positive definite")]
    NotPositiveDefinite {
        /// Size of the block that failed to factor.
        size: usize,
    },

    /// The pivot budget ran out before a complementary solution was found.
    #[error("no solution after {iterations} pivots")]
    IterationLimit {
        /// Pivots performed.
        iterations: usize,
    },

    /// The wall-clock budget ran out before a complementary solution was found.
    #[error("no solution after {elapsed:.6}s ({iterations} pivots)")]
    TimeLimit {
        /// Seconds spent.
        elapsed: f64,
        /// Pivots performed.
        iterations: usize,
    },
}

impl LcpError {
    /// Check if the solver gave up because a budget was exhausted.
    #[must_use]
    pub fn is_budget_exhausted(&self) -> bool {
        matches!(self, Self::IterationLimit { .. } | Self::TimeLimit { .. })
    }

    /// Check if the input problem was malformed.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Self::DimensionMismatch { .. }
                | Self::InvalidBounds { .. }
                | Self::NonFiniteInput { .. }
                | Self::InvalidConfig(_)
        )
    }
}

/// A candidate solution that fails the LCP conditions.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum LcpViolation {
    /// Vector lengths do not match the matrix.
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which argument is wrong.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// `A x - b - w` is not zero at this row.
    #[error("residual {residual:e} at row {index} exceeds tolerance {tolerance:e}")]
    Residual {
        /// Original row index.
        index: usize,
        /// Value of `(A x - b - w)[index]`.
        residual: f64,
        /// Tolerance used.
        tolerance: f64,
    },

    /// `(x[i], w[i])` lies on none of the three complementary segments.
    #[error("variable {index} is not complementary: x={x}, w={w}, bounds=[{lo}, {hi}]")]
    Complementarity {
        /// Original variable index.
        index: usize,
        /// Primal value.
        x: f64,
        /// Dual value.
        w: f64,
        /// Lower bound.
        lo: f64,
        /// Upper bound.
        hi: f64,
    },
}
