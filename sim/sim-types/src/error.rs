//! Error types shared by the contact and LCP crates.

use thiserror::Error;

/// Errors that can occur while setting up contact constraints.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// A friction model code that names no known model.
    #[error("unknown friction model code: {0}")]
    UnknownFrictionModel(i32),

    /// A box friction bound that is negative or not a number.
    #[error("invalid box friction bound: {0} (must be non-negative)")]
    InvalidFrictionBound(f64),

    /// Contact normal is not unit length.
    #[error("contact normal must be unit length, got norm {norm}")]
    NonUnitNormal {
        /// Norm of the offending normal.
        norm: f64,
    },

    /// Invalid mass properties.
    #[error("invalid mass properties: {reason}")]
    InvalidMassProperties {
        /// Description of what's wrong.
        reason: String,
    },
}

impl SimError {
    /// Create an invalid mass properties error.
    #[must_use]
    pub fn invalid_mass(reason: impl Into<String>) -> Self {
        Self::InvalidMassProperties {
            reason: reason.into(),
        }
    }

    /// Check if this is a friction model error.
    #[must_use]
    pub fn is_friction_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownFrictionModel(_) | Self::InvalidFrictionBound(_)
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SimError::UnknownFrictionModel(7);
        assert!(err.to_string().contains('7'));

        let err = SimError::InvalidFrictionBound(-2.5);
        assert!(err.to_string().contains("-2.5"));

        let err = SimError::NonUnitNormal { norm: 3.0 };
        assert!(err.to_string().contains("unit length"));
    }

    #[test]
    fn test_error_predicates() {
        let err = SimError::UnknownFrictionModel(9);
        assert!(err.is_friction_error());

        let err = SimError::invalid_mass("negative mass");
        assert!(!err.is_friction_error());
        assert!(err.to_string().contains("negative mass"));
    }
}
