//! Contact constraints for LCP-based rigid body simulation.
//!
//! Each contact between two bodies becomes three constraint rows expressed
//! in a frame whose third axis is the contact normal:
//!
//! ```text
//!            n (row 2, one-sided: push apart only)
//!            ^
//!            |
//!   t0 <-----+-----> (rows 0, 1: tangential, bounded by the friction model)
//!          body1
//! ```
//!
//! The rows come with impulse bounds chosen by the [`FrictionModel`]. An
//! external assembler stacks the per-contact blocks, forms the effective mass
//! matrix `J M⁻¹ Jᵀ` and hands it to a box LCP solver such as `sim-lcp`.
//!
//! # Example
//!
//! ```
//! use sim_contact::{Contact, ContactBody, ContactGeometry, FrictionModel};
//! use sim_types::{Pose, RigidBodyState};
//! use nalgebra::{Point3, Vector3};
//!
//! let ball = RigidBodyState::at_rest(Pose::from_position(Point3::new(0.0, 0.0, 0.5)));
//! let contact = Contact::new(
//!     ContactBody::Static,
//!     &ball,
//!     ContactGeometry::new(Point3::origin(), Vector3::z(), 0.0),
//!     FrictionModel::InfiniteFriction,
//! );
//!
//! let j = contact.compute_j();
//! assert_eq!(j.lo, Vector3::zeros());
//! assert_eq!(j.hi, Vector3::new(0.0, 0.0, f64::INFINITY));
//! ```
//!
//! # Layer 0 Crate
//!
//! No rendering or engine dependencies: rigid body state comes from
//! `sim-types`, collision detection and impulse application belong to the
//! caller.

#![doc(html_root_url = "https://docs.rs/sim-contact/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn)]

mod contact;
mod frame;
mod friction;
mod geometry;

pub use contact::{Contact, ContactBody, ContactJacobian};
pub use frame::align_vectors;
pub use friction::{DEFAULT_BOX_FRICTION_BOUND, FrictionModel, RowBounds};
pub use geometry::ContactGeometry;
