//! Rigid body state as seen by contact constraints.
//!
//! Contact Jacobians only read a body's world-frame pose and velocity. These
//! types are that read-only view; integration lives elsewhere.

use nalgebra::{Matrix3, Matrix6, Point3, UnitQuaternion, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Position and orientation of a rigid body in world coordinates.
///
/// # Example
///
/// ```
/// use sim_types::Pose;
/// use nalgebra::Point3;
///
/// let pose = Pose::from_position(Point3::new(1.0, 2.0, 3.0));
/// let world = pose.transform_point(&Point3::new(1.0, 0.0, 0.0));
/// assert_eq!(world, Point3::new(2.0, 2.0, 3.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    /// Position of the body center in world coordinates.
    pub position: Point3<f64>,
    /// Orientation as a unit quaternion.
    pub rotation: UnitQuaternion<f64>,
}

impl Default for Pose {
    fn default() -> Self {
        Self::identity()
    }
}

impl Pose {
    /// Create an identity pose (origin, no rotation).
    #[must_use]
    pub fn identity() -> Self {
        Self {
            position: Point3::origin(),
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position only (identity rotation).
    #[must_use]
    pub fn from_position(position: Point3<f64>) -> Self {
        Self {
            position,
            rotation: UnitQuaternion::identity(),
        }
    }

    /// Create a pose from position and rotation.
    #[must_use]
    pub const fn from_position_rotation(
        position: Point3<f64>,
        rotation: UnitQuaternion<f64>,
    ) -> Self {
        Self { position, rotation }
    }

    /// Transform a point from local to world coordinates.
    #[must_use]
    pub fn transform_point(&self, local: &Point3<f64>) -> Point3<f64> {
        self.position + self.rotation * local.coords
    }

    /// Check if the pose contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|x| x.is_finite())
            && self.rotation.coords.iter().all(|x| x.is_finite())
    }
}

/// Linear and angular velocity of a rigid body, both in world coordinates.
///
/// # Example
///
/// ```
/// use sim_types::Twist;
/// use nalgebra::Vector3;
///
/// let twist = Twist::angular(Vector3::new(0.0, 0.0, 2.0));
/// let v = twist.velocity_at_point(&Vector3::new(1.0, 0.0, 0.0));
/// assert_eq!(v, Vector3::new(0.0, 2.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Twist {
    /// Linear velocity (m/s).
    pub linear: Vector3<f64>,
    /// Angular velocity (rad/s).
    pub angular: Vector3<f64>,
}

impl Default for Twist {
    fn default() -> Self {
        Self::zero()
    }
}

impl Twist {
    /// Create a twist with specified linear and angular velocity.
    #[must_use]
    pub const fn new(linear: Vector3<f64>, angular: Vector3<f64>) -> Self {
        Self { linear, angular }
    }

    /// Create a zero twist (at rest).
    #[must_use]
    pub fn zero() -> Self {
        Self {
            linear: Vector3::zeros(),
            angular: Vector3::zeros(),
        }
    }

    /// Create a twist with linear velocity only.
    #[must_use]
    pub fn linear(v: Vector3<f64>) -> Self {
        Self {
            linear: v,
            angular: Vector3::zeros(),
        }
    }

    /// Create a twist with angular velocity only.
    #[must_use]
    pub fn angular(omega: Vector3<f64>) -> Self {
        Self {
            linear: Vector3::zeros(),
            angular: omega,
        }
    }

    /// Velocity of a point at `offset` from the body center.
    ///
    /// `v_point` = `v_linear` + omega × r
    #[must_use]
    pub fn velocity_at_point(&self, offset: &Vector3<f64>) -> Vector3<f64> {
        self.linear + self.angular.cross(offset)
    }

    /// Stack as a 6-vector `[linear; angular]`, the column order of a
    /// per-body Jacobian block.
    #[must_use]
    pub fn to_generalized(&self) -> nalgebra::Vector6<f64> {
        nalgebra::Vector6::new(
            self.linear.x,
            self.linear.y,
            self.linear.z,
            self.angular.x,
            self.angular.y,
            self.angular.z,
        )
    }

    /// Check if the twist contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.linear.iter().all(|x| x.is_finite()) && self.angular.iter().all(|x| x.is_finite())
    }
}

/// Pose and twist of a rigid body.
///
/// # Example
///
/// ```
/// use sim_types::{Pose, RigidBodyState};
/// use nalgebra::Point3;
///
/// let body = RigidBodyState::at_rest(Pose::from_position(Point3::new(0.0, 0.0, 1.0)));
/// let arm = body.lever_arm(&Point3::origin());
/// assert_eq!(arm.z, -1.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RigidBodyState {
    /// Position and orientation.
    pub pose: Pose,
    /// Linear and angular velocity.
    pub twist: Twist,
}

impl RigidBodyState {
    /// Create a state from pose and twist.
    #[must_use]
    pub const fn new(pose: Pose, twist: Twist) -> Self {
        Self { pose, twist }
    }

    /// Create a state at rest at the given pose.
    #[must_use]
    pub fn at_rest(pose: Pose) -> Self {
        Self {
            pose,
            twist: Twist::zero(),
        }
    }

    /// World position of the body center.
    #[must_use]
    pub fn position(&self) -> Point3<f64> {
        self.pose.position
    }

    /// World angular velocity.
    #[must_use]
    pub fn angular_velocity(&self) -> Vector3<f64> {
        self.twist.angular
    }

    /// Vector from the body center to a world point.
    #[must_use]
    pub fn lever_arm(&self, point: &Point3<f64>) -> Vector3<f64> {
        point - self.pose.position
    }

    /// Check if the state contains `NaN` or `Inf` values.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.pose.is_finite() && self.twist.is_finite()
    }
}

/// Mass and inertia of a rigid body.
///
/// Constraint assemblers use this to build the per-body inverse mass block
/// `M⁻¹` that turns stacked contact Jacobians into an effective mass matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MassProperties {
    /// Total mass in kg.
    pub mass: f64,
    /// Inertia tensor about the center of mass in world coordinates (kg·m²).
    pub inertia: Matrix3<f64>,
}

impl MassProperties {
    /// Create mass properties with given values.
    #[must_use]
    pub const fn new(mass: f64, inertia: Matrix3<f64>) -> Self {
        Self { mass, inertia }
    }

    /// Create mass properties for a uniform sphere.
    ///
    /// Inertia of a solid sphere: I = (2/5) * m * r²
    #[must_use]
    pub fn sphere(mass: f64, radius: f64) -> Self {
        let i = 0.4 * mass * radius * radius;
        Self {
            mass,
            inertia: Matrix3::from_diagonal(&Vector3::new(i, i, i)),
        }
    }

    /// Create mass properties for a uniform box.
    ///
    /// Inertia of a solid box with dimensions (x, y, z):
    /// - Ixx = (1/12) * m * (y² + z²)
    /// - Iyy = (1/12) * m * (x² + z²)
    /// - Izz = (1/12) * m * (x² + y²)
    #[must_use]
    pub fn box_shape(mass: f64, half_extents: Vector3<f64>) -> Self {
        let x2 = 4.0 * half_extents.x * half_extents.x;
        let y2 = 4.0 * half_extents.y * half_extents.y;
        let z2 = 4.0 * half_extents.z * half_extents.z;

        Self {
            mass,
            inertia: Matrix3::from_diagonal(&Vector3::new(
                mass * (y2 + z2) / 12.0,
                mass * (x2 + z2) / 12.0,
                mass * (x2 + y2) / 12.0,
            )),
        }
    }

    /// Get the inverse mass (0 if mass is infinite/static).
    #[must_use]
    pub fn inverse_mass(&self) -> f64 {
        if self.is_static() {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// Get the inverse inertia tensor, `None` if the inertia is singular.
    #[must_use]
    pub fn inverse_inertia(&self) -> Option<Matrix3<f64>> {
        self.inertia.try_inverse()
    }

    /// Block-diagonal 6×6 inverse mass matrix `diag(m⁻¹ I₃, I⁻¹)`.
    ///
    /// Static bodies and singular inertia tensors contribute zero blocks.
    #[must_use]
    pub fn inverse_mass_matrix(&self) -> Matrix6<f64> {
        let mut m = Matrix6::zeros();
        if self.is_static() {
            return m;
        }
        m.fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&(Matrix3::identity() * self.inverse_mass()));
        if let Some(inv_inertia) = self.inverse_inertia() {
            m.fixed_view_mut::<3, 3>(3, 3).copy_from(&inv_inertia);
        }
        m
    }

    /// Check if this represents a static (immovable) body.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.mass <= 0.0 || self.mass.is_infinite()
    }

    /// Validate that the mass properties are physically valid.
    pub fn validate(&self) -> crate::Result<()> {
        if self.mass < 0.0 || self.mass.is_nan() {
            return Err(crate::SimError::invalid_mass("mass cannot be negative"));
        }

        let eigenvalues = self.inertia.symmetric_eigenvalues();
        if eigenvalues.iter().any(|&e| e < -1e-10 || !e.is_finite()) {
            return Err(crate::SimError::invalid_mass(
                "inertia tensor must be positive semi-definite",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_lever_arm_points_from_center() {
        let body = RigidBodyState::at_rest(Pose::from_position(Point3::new(1.0, 2.0, 3.0)));
        let arm = body.lever_arm(&Point3::new(1.0, 2.0, 2.5));
        assert_relative_eq!(arm, Vector3::new(0.0, 0.0, -0.5), epsilon = 1e-12);
    }

    #[test]
    fn test_twist_generalized_order() {
        let twist = Twist::new(Vector3::new(1.0, 2.0, 3.0), Vector3::new(4.0, 5.0, 6.0));
        let g = twist.to_generalized();
        assert_eq!(g[0], 1.0);
        assert_eq!(g[3], 4.0);
        assert_eq!(g[5], 6.0);
    }

    #[test]
    fn test_inverse_mass_matrix_blocks() {
        let props = MassProperties::sphere(2.0, 0.5);
        let m = props.inverse_mass_matrix();

        assert_relative_eq!(m[(0, 0)], 0.5, epsilon = 1e-12);
        assert_relative_eq!(m[(2, 2)], 0.5, epsilon = 1e-12);
        // I = 0.4 * 2 * 0.25 = 0.2
        assert_relative_eq!(m[(3, 3)], 5.0, epsilon = 1e-12);
        assert_eq!(m[(0, 3)], 0.0);
    }

    #[test]
    fn test_static_body_has_zero_inverse_mass() {
        let props = MassProperties::new(f64::INFINITY, Matrix3::identity());
        assert!(props.is_static());
        assert_eq!(props.inverse_mass(), 0.0);
        assert_eq!(props.inverse_mass_matrix(), Matrix6::zeros());
    }

    #[test]
    fn test_mass_validation() {
        assert!(MassProperties::box_shape(1.0, Vector3::new(0.5, 0.5, 0.5))
            .validate()
            .is_ok());
        assert!(MassProperties::new(-1.0, Matrix3::identity()).validate().is_err());
        assert!(MassProperties::new(1.0, -Matrix3::identity()).validate().is_err());
    }

    #[test]
    fn test_finite_checks() {
        let mut body = RigidBodyState::default();
        assert!(body.is_finite());
        body.twist.angular.x = f64::NAN;
        assert!(!body.is_finite());
    }
}
