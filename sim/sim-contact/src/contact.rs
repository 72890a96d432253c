//! Per-contact constraint rows in the contact-normal frame.
//!
//! A contact constrains the relative motion of the two touching points,
//! `body1_point - body0_point`. For a body with center `c` and lever arm
//! `r = p - c`, the contact point moves with `v + ω × r = v - [r]× ω`, so
//! in world coordinates
//!
//! ```text
//! J_body0 = [ -I,  [r0]× ]
//! J_body1 = [  I, -[r1]× ]
//! ```
//!
//! acting on generalized velocities `[v; ω]`. Both blocks are premultiplied
//! by the rotation `R` with `R n = z`, so rows 0 and 1 are tangential and
//! row 2 is the normal direction.

use std::fmt;

use nalgebra::{Matrix3, Matrix3x6, Point3, Rotation3, RowSVector, Vector3};
use sim_types::RigidBodyState;

use crate::{ContactGeometry, FrictionModel, align_vectors};

/// The first body of a contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContactBody<'a> {
    /// A moving body.
    Dynamic(&'a RigidBodyState),
    /// Immovable world anchor with no degrees of freedom.
    Static,
}

impl ContactBody<'_> {
    /// Whether the body contributes degrees of freedom.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }
}

/// Three constraint rows for one contact.
///
/// Rows 0 and 1 are tangential, row 2 is the normal. Each body block acts on
/// that body's `[v; ω]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactJacobian {
    /// Block for body0; zero for a static body.
    pub body0: Matrix3x6<f64>,
    /// Block for body1.
    pub body1: Matrix3x6<f64>,
    /// Complementarity flag per row.
    pub complementarity: [bool; 3],
    /// Lower impulse bound per row.
    pub lo: Vector3<f64>,
    /// Upper impulse bound per row.
    pub hi: Vector3<f64>,
}

impl ContactJacobian {
    /// Row `i` of both blocks side by side: `[body0 row | body1 row]`.
    ///
    /// # Panics
    ///
    /// Panics if `i >= 3`.
    #[must_use]
    pub fn row(&self, i: usize) -> RowSVector<f64, 12> {
        RowSVector::<f64, 12>::from_fn(|_, c| {
            if c < 6 {
                self.body0[(i, c)]
            } else {
                self.body1[(i, c - 6)]
            }
        })
    }
}

/// A contact between two bodies, alive for one simulation step.
///
/// # Example
///
/// ```
/// use nalgebra::{Matrix3, Point3, Vector3};
/// use sim_contact::{Contact, ContactBody, ContactGeometry, FrictionModel};
/// use sim_types::{Pose, RigidBodyState};
///
/// // A sphere resting on the ground plane.
/// let sphere = RigidBodyState::at_rest(Pose::from_position(Point3::new(0.0, 0.0, 0.5)));
/// let geometry = ContactGeometry::new(Point3::origin(), Vector3::z(), 0.001);
/// let contact = Contact::new(ContactBody::Static, &sphere, geometry, FrictionModel::box_friction());
///
/// let j = contact.compute_j();
/// assert_eq!(j.body0, nalgebra::Matrix3x6::zeros());
/// assert_eq!(j.body1.fixed_view::<3, 3>(0, 0).into_owned(), Matrix3::identity());
/// assert_eq!(contact.compute_error(), Vector3::new(0.0, 0.0, -0.001));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact<'a> {
    body0: ContactBody<'a>,
    body1: &'a RigidBodyState,
    geometry: ContactGeometry,
    friction: FrictionModel,
}

impl<'a> Contact<'a> {
    /// Create a contact.
    #[must_use]
    pub fn new(
        body0: ContactBody<'a>,
        body1: &'a RigidBodyState,
        geometry: ContactGeometry,
        friction: FrictionModel,
    ) -> Self {
        Self {
            body0,
            body1,
            geometry,
            friction,
        }
    }

    /// The first body.
    #[must_use]
    pub fn body0(&self) -> ContactBody<'a> {
        self.body0
    }

    /// The second body.
    #[must_use]
    pub fn body1(&self) -> &'a RigidBodyState {
        self.body1
    }

    /// Contact geometry.
    #[must_use]
    pub fn geometry(&self) -> &ContactGeometry {
        &self.geometry
    }

    /// Friction model.
    #[must_use]
    pub fn friction(&self) -> FrictionModel {
        self.friction
    }

    /// Check geometry and friction parameters.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: a non-unit normal or an invalid
    /// friction bound.
    pub fn validate(&self) -> sim_types::Result<()> {
        self.geometry.validate()?;
        self.friction.validate()
    }

    /// Constraint violation in the contact frame: `(0, 0, -depth)`.
    #[must_use]
    pub fn compute_error(&self) -> Vector3<f64> {
        Vector3::new(0.0, 0.0, -self.geometry.depth)
    }

    /// Rotation `R` with `R n = z`, taking world vectors into the contact
    /// frame.
    #[must_use]
    pub fn contact_frame(&self) -> Rotation3<f64> {
        align_vectors(&self.geometry.normal, &Vector3::z())
    }

    /// Build both Jacobian blocks and the row bounds.
    ///
    /// # Panics
    ///
    /// Panics if the friction model is invalid (negative or NaN box bound).
    #[must_use]
    pub fn compute_j(&self) -> ContactJacobian {
        let rotation = self.contact_frame();
        let r = rotation.matrix();
        let p = &self.geometry.position;

        let body0 = match self.body0 {
            ContactBody::Dynamic(body) => {
                frame_block(r, &(-Matrix3::identity()), &body.lever_arm(p).cross_matrix())
            }
            ContactBody::Static => Matrix3x6::zeros(),
        };
        let body1 = frame_block(
            r,
            &Matrix3::identity(),
            &(-self.body1.lever_arm(p).cross_matrix()),
        );

        let rows = self.friction.row_bounds();
        ContactJacobian {
            body0,
            body1,
            complementarity: rows.complementarity,
            lo: rows.lo,
            hi: rows.hi,
        }
    }

    /// Time derivative of the Jacobian.
    ///
    /// # Panics
    ///
    /// Always. The velocity-level stepper never needs `J̇`, and no other
    /// integrator supports contacts.
    #[allow(clippy::panic)]
    pub fn compute_jdot(&self) -> ContactJacobian {
        panic!(
            "ODE time stepper does not need to compute JdotV for contact constraints. \
             Other integrators do not yet support contacts."
        );
    }

    /// Jacobian for box friction expressed as separate friction rows.
    ///
    /// # Panics
    ///
    /// Not implemented.
    pub fn compute_j_box_friction(&self) -> ContactJacobian {
        unimplemented!("box friction Jacobian for contacts")
    }

    /// Time derivative of [`Contact::compute_j_box_friction`].
    ///
    /// # Panics
    ///
    /// Not implemented.
    pub fn compute_jdot_box_friction(&self) -> ContactJacobian {
        unimplemented!("box friction Jacobian derivative for contacts")
    }

    /// Jacobian for a Coulomb pyramid friction cone.
    ///
    /// # Panics
    ///
    /// Not implemented.
    pub fn compute_j_coulomb_pyramid(&self) -> ContactJacobian {
        unimplemented!("Coulomb pyramid Jacobian for contacts")
    }

    /// Time derivative of [`Contact::compute_j_coulomb_pyramid`].
    ///
    /// # Panics
    ///
    /// Not implemented.
    pub fn compute_jdot_coulomb_pyramid(&self) -> ContactJacobian {
        unimplemented!("Coulomb pyramid Jacobian derivative for contacts")
    }

    /// Segment from the contact point along a tenth of the normal, for
    /// renderers that draw contacts.
    #[must_use]
    pub fn debug_segment(&self) -> (Point3<f64>, Point3<f64>) {
        let p = self.geometry.position;
        (p, p + self.geometry.normal * 0.1)
    }
}

impl fmt::Display for Contact<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = &self.geometry.position;
        let n = &self.geometry.normal;
        write!(
            f,
            "Contact position: ({}, {}, {}) normal: ({}, {}, {}) depth: {}",
            p.x, p.y, p.z, n.x, n.y, n.z, self.geometry.depth
        )
    }
}

/// `[R·linear, R·angular]`.
fn frame_block(r: &Matrix3<f64>, linear: &Matrix3<f64>, angular: &Matrix3<f64>) -> Matrix3x6<f64> {
    let mut block = Matrix3x6::zeros();
    block.fixed_view_mut::<3, 3>(0, 0).copy_from(&(r * linear));
    block.fixed_view_mut::<3, 3>(0, 3).copy_from(&(r * angular));
    block
}
