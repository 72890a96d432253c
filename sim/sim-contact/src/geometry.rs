//! Collision geometry of a single contact.

use nalgebra::{Point3, Vector3};
use sim_types::SimError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Allowed deviation of the normal's length from 1.
const NORMAL_LENGTH_TOLERANCE: f64 = 1e-6;

/// Where and how deeply two bodies touch.
///
/// Produced by narrow-phase collision detection each step and consumed once.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ContactGeometry {
    /// World-space contact point.
    pub position: Point3<f64>,
    /// Unit contact normal. A positive normal impulse pushes body1 along
    /// it and body0 against it.
    pub normal: Vector3<f64>,
    /// Penetration depth, positive when overlapping.
    pub depth: f64,
}

impl ContactGeometry {
    /// Create contact geometry.
    #[must_use]
    pub const fn new(position: Point3<f64>, normal: Vector3<f64>, depth: f64) -> Self {
        Self {
            position,
            normal,
            depth,
        }
    }

    /// Whether the bodies actually overlap.
    #[must_use]
    pub fn is_penetrating(&self) -> bool {
        self.depth > 0.0
    }

    /// Check that the normal is unit length.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::NonUnitNormal`] otherwise.
    pub fn validate(&self) -> sim_types::Result<()> {
        let norm = self.normal.norm();
        if (norm - 1.0).abs() <= NORMAL_LENGTH_TOLERANCE {
            Ok(())
        } else {
            Err(SimError::NonUnitNormal { norm })
        }
    }
}
