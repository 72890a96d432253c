//! Contact-normal frame construction.

use nalgebra::{Rotation3, Unit, Vector3};

/// Rotation taking the direction of `from` onto the direction of `to`.
///
/// Parallel inputs give the identity. Antiparallel inputs give a half turn
/// about an axis perpendicular to `from`. Zero-length inputs give the
/// identity.
///
/// # Example
///
/// ```
/// use nalgebra::Vector3;
/// use sim_contact::align_vectors;
///
/// let r = align_vectors(&Vector3::x(), &Vector3::z());
/// assert!((r * Vector3::x() - Vector3::z()).norm() < 1e-12);
/// ```
#[must_use]
pub fn align_vectors(from: &Vector3<f64>, to: &Vector3<f64>) -> Rotation3<f64> {
    if let Some(r) = Rotation3::rotation_between(from, to) {
        return r;
    }
    // rotation_between only fails for antiparallel vectors.
    let axis = from.cross(&Vector3::x());
    let axis = if axis.norm_squared() > 1e-12 * from.norm_squared() {
        axis
    } else {
        from.cross(&Vector3::y())
    };
    Rotation3::from_axis_angle(&Unit::new_normalize(axis), std::f64::consts::PI)
}
