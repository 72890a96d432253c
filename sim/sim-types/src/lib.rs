//! Core types for contact constraint resolution.
//!
//! This crate provides the data that contact constraints read:
//!
//! - [`RigidBodyState`] - World pose and velocity of a rigid body
//! - [`MassProperties`] - Mass and inertia, for building `M⁻¹`
//! - [`SimError`] - Errors raised while setting up constraints
//!
//! # Design Philosophy
//!
//! These types are **pure data**. Rigid body integration, collision detection
//! and constraint assembly are owned by the caller; the contact and LCP crates
//! only read body state during Jacobian construction.
//!
//! # Coordinate System
//!
//! - X: right
//! - Y: forward
//! - Z: up
//! - Right-handed
//!
//! # Example
//!
//! ```
//! use sim_types::{RigidBodyState, Pose, Twist};
//! use nalgebra::{Point3, Vector3};
//!
//! let state = RigidBodyState::new(
//!     Pose::from_position(Point3::new(0.0, 0.0, 1.0)),
//!     Twist::angular(Vector3::new(0.0, 0.0, 1.0)),
//! );
//!
//! assert_eq!(state.position().z, 1.0);
//! assert_eq!(state.angular_velocity().z, 1.0);
//! ```

#![doc(html_root_url = "https://docs.rs/sim-types/0.1.0")]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![warn(missing_docs)]
#![allow(
    clippy::missing_const_for_fn,     // Many methods can't be const due to nalgebra
    clippy::suboptimal_flops,          // mul_add style changes aren't always clearer
    clippy::missing_errors_doc,        // Error docs added where non-obvious
)]

mod body;
mod error;

pub use body::{MassProperties, Pose, RigidBodyState, Twist};
pub use error::SimError;

// Re-export math types for convenience
pub use nalgebra::{Matrix3, Point3, UnitQuaternion, Vector3};

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;
