//! Friction policies as bound/complementarity patterns.
//!
//! A contact emits three constraint rows in its normal frame: two tangential
//! rows (0, 1) and the normal row (2). The friction model decides how the
//! LCP may use the tangential rows:
//!
//! | Model | complementarity | lo | hi |
//! |-------|-----------------|----|----|
//! | `NoFriction` | `[0, 0, 0]` | `[-∞, -∞, 0]` | `[∞, ∞, ∞]` |
//! | `InfiniteFriction` | `[1, 1, 0]` | `[0, 0, 0]` | `[0, 0, ∞]` |
//! | `Box { bound: B }` | `[0, 0, 0]` | `[-B, -B, 0]` | `[B, B, ∞]` |
//!
//! The normal row is always one-sided: contacts push apart, never pull
//! together. The box model is a cheap stand-in for the Coulomb cone
//! `|F_t| ≤ μ F_n`: the tangential bound does not scale with the normal
//! impulse.

use nalgebra::Vector3;
use sim_types::SimError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tangential bound used by [`FrictionModel::box_friction`].
pub const DEFAULT_BOX_FRICTION_BOUND: f64 = 100.0;

/// How the tangential rows of a contact are bounded.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FrictionModel {
    /// Tangential rows are unbounded.
    ///
    /// The rows still enter the system with `±∞` bounds, so their
    /// impulses are unlimited and tangential slip behaves as an equality
    /// constraint.
    NoFriction,

    /// Tangential rows are pinned at zero.
    InfiniteFriction,

    /// Tangential impulses limited to `[-bound, bound]`.
    Box {
        /// Half-width of the tangential box. Must be non-negative.
        bound: f64,
    },
}

impl Default for FrictionModel {
    fn default() -> Self {
        Self::box_friction()
    }
}

/// Per-row bounds for the three contact rows (tangent, tangent, normal).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowBounds {
    /// Complementarity flag per row.
    pub complementarity: [bool; 3],
    /// Lower impulse bounds.
    pub lo: Vector3<f64>,
    /// Upper impulse bounds.
    pub hi: Vector3<f64>,
}

impl FrictionModel {
    /// Box friction with [`DEFAULT_BOX_FRICTION_BOUND`].
    #[must_use]
    pub const fn box_friction() -> Self {
        Self::Box {
            bound: DEFAULT_BOX_FRICTION_BOUND,
        }
    }

    /// Integer code used by external configuration: 0 = no friction,
    /// 1 = infinite friction, 2 = box.
    #[must_use]
    pub const fn code(&self) -> i32 {
        match self {
            Self::NoFriction => 0,
            Self::InfiniteFriction => 1,
            Self::Box { .. } => 2,
        }
    }

    /// Model for an integer code. Box friction gets the default bound.
    ///
    /// # Panics
    ///
    /// Panics on an unknown code. A code outside the enumeration is a
    /// programming error and is never mapped to a fallback model; use
    /// `FrictionModel::try_from` to handle it instead.
    #[must_use]
    #[allow(clippy::panic)]
    pub fn from_code(code: i32) -> Self {
        match Self::try_from(code) {
            Ok(model) => model,
            Err(_) => panic!("Contact constraint encountered an unknown FrictionModel::{code}"),
        }
    }

    /// Check the model parameters.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidFrictionBound`] for a box bound that is
    /// negative or NaN.
    pub fn validate(&self) -> sim_types::Result<()> {
        match *self {
            Self::Box { bound } if !(bound >= 0.0) => Err(SimError::InvalidFrictionBound(bound)),
            _ => Ok(()),
        }
    }

    /// Bounds and complementarity flags for the three contact rows.
    ///
    /// # Panics
    ///
    /// Panics if the model is invalid (see [`FrictionModel::validate`]).
    #[must_use]
    #[allow(clippy::panic)]
    pub fn row_bounds(&self) -> RowBounds {
        let inf = f64::INFINITY;
        match *self {
            Self::NoFriction => RowBounds {
                complementarity: [false, false, false],
                lo: Vector3::new(-inf, -inf, 0.0),
                hi: Vector3::new(inf, inf, inf),
            },
            Self::InfiniteFriction => RowBounds {
                complementarity: [true, true, false],
                lo: Vector3::zeros(),
                hi: Vector3::new(0.0, 0.0, inf),
            },
            Self::Box { bound } => {
                if let Err(err) = self.validate() {
                    panic!("Contact constraint encountered an invalid FrictionModel: {err}");
                }
                RowBounds {
                    complementarity: [false, false, false],
                    lo: Vector3::new(-bound, -bound, 0.0),
                    hi: Vector3::new(bound, bound, inf),
                }
            }
        }
    }
}

impl TryFrom<i32> for FrictionModel {
    type Error = SimError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::NoFriction),
            1 => Ok(Self::InfiniteFriction),
            2 => Ok(Self::box_friction()),
            other => Err(SimError::UnknownFrictionModel(other)),
        }
    }
}
