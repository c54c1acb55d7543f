//! Rotation quaternion and latitude/longitude projection.
//!
//! `Quat` is a thin wrapper over `nalgebra::UnitQuaternion<f64>` that adds
//! the operations the camera and charmap need (axis-angle construction,
//! rotated axes, spherical interpolation via `pow`) without reimplementing
//! quaternion algebra nalgebra already provides correctly.

use nalgebra::{UnitQuaternion, Vector3};

const RADIANS_IN_DEGREES: f64 = 180.0 / std::f64::consts::PI;
/// A magnitude used to stand in for "infinitely far along an axis" when
/// drawing axis markers, matching the original implementation's `GOOGOL`.
const AXIS_MAGNITUDE: f64 = 1e20;

/// A unit rotation quaternion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat(pub UnitQuaternion<f64>);

impl Quat {
    /// The identity rotation.
    pub fn identity() -> Self {
        Self(UnitQuaternion::identity())
    }

    /// Construct a rotation of `angle_degrees` about `axis`.
    pub fn from_axis_angle_degrees(axis: Vector3<f64>, angle_degrees: f64) -> Self {
        let angle_radians = angle_degrees / RADIANS_IN_DEGREES;
        match nalgebra::Unit::try_new(axis, 1e-12) {
            Some(unit_axis) => Self(UnitQuaternion::from_axis_angle(&unit_axis, angle_radians)),
            None => Self::identity(),
        }
    }

    /// Compose two rotations: `self` applied after `other`.
    pub fn mul(&self, other: &Quat) -> Quat {
        Quat(self.0 * other.0)
    }

    /// The inverse (conjugate) rotation.
    pub fn inverse(&self) -> Quat {
        Quat(self.0.inverse())
    }

    /// Rotate a single vector.
    pub fn rotate_vector(&self, v: Vector3<f64>) -> Vector3<f64> {
        self.0 * v
    }

    /// Rotate a batch of vectors.
    pub fn rotate_batch(&self, vs: &[Vector3<f64>]) -> Vec<Vector3<f64>> {
        vs.iter().map(|v| self.rotate_vector(*v)).collect()
    }

    /// Raise the rotation to a fractional power `x`, used for spherical
    /// interpolation between identity (`x = 0`) and the full rotation
    /// (`x = 1`).
    pub fn pow(&self, x: f64) -> Quat {
        Quat(self.0.powf(x))
    }

    /// The rotated forward, right, and up axes implied by this rotation,
    /// i.e. where +X, +Y, +Z point after rotating the observer.
    pub fn rotated_axes(&self) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
        let inv = self.inverse();
        (
            inv.rotate_vector(Vector3::x()),
            inv.rotate_vector(Vector3::y()),
            inv.rotate_vector(Vector3::z()),
        )
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::identity()
    }
}

/// Clamp a scalar away from zero on its own sign, to avoid dividing by
/// exactly zero while keeping the sign of vanishingly small components.
fn pad_plank_length(scalar: f64) -> f64 {
    if scalar < 0.0 {
        scalar.min(-1e-20)
    } else {
        scalar.max(1e-20)
    }
}

/// Project a single vector, relative to an observer at the origin looking
/// down +X, onto longitude/latitude in degrees. Returns `(0.0, 0.0)` for
/// the zero vector.
pub fn latlong_single(v: Vector3<f64>) -> (f64, f64) {
    let magnitude = v.norm();
    if magnitude == 0.0 {
        return (0.0, 0.0);
    }
    let mut theta = (v.y / pad_plank_length(v.x)).atan();
    if v.x < 0.0 {
        theta += std::f64::consts::PI;
    }
    let longitude = theta * RADIANS_IN_DEGREES * -1.0;
    let latitude = (v.z / pad_plank_length(magnitude)).asin() * RADIANS_IN_DEGREES;
    (longitude, latitude)
}

/// Project a batch of vectors; see [`latlong_single`].
pub fn latlong_batch(vs: &[Vector3<f64>]) -> Vec<(f64, f64)> {
    vs.iter().copied().map(latlong_single).collect()
}

/// Six points at very large magnitude along +/-X, +/-Y, +/-Z, used to draw
/// orientation axes on the charmap. Order: X+, X-, Y+, Y-, Z+, Z-.
pub fn unit_axis_points() -> [Vector3<f64>; 6] {
    [
        Vector3::new(AXIS_MAGNITUDE, 0.0, 0.0),
        Vector3::new(-AXIS_MAGNITUDE, 0.0, 0.0),
        Vector3::new(0.0, AXIS_MAGNITUDE, 0.0),
        Vector3::new(0.0, -AXIS_MAGNITUDE, 0.0),
        Vector3::new(0.0, 0.0, AXIS_MAGNITUDE),
        Vector3::new(0.0, 0.0, -AXIS_MAGNITUDE),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_rotation_is_noop() {
        let q = Quat::identity();
        let v = Vector3::new(1.0, 2.0, 3.0);
        assert!((q.rotate_vector(v) - v).norm() < 1e-12);
    }

    #[test]
    fn rotate_then_inverse_restores_vector() {
        let q = Quat::from_axis_angle_degrees(Vector3::z(), 37.0);
        let v = Vector3::new(1.0, 0.0, 0.0);
        let rotated = q.rotate_vector(v);
        let restored = q.inverse().rotate_vector(rotated);
        assert!((restored - v).norm() < 1e-9);
    }

    #[test]
    fn compose_yaw_pitch_roll_roundtrip() {
        let yaw = Quat::from_axis_angle_degrees(Vector3::z(), 20.0);
        let pitch = Quat::from_axis_angle_degrees(Vector3::y(), -10.0);
        let roll = Quat::from_axis_angle_degrees(Vector3::x(), 5.0);
        let forward = yaw.mul(&pitch).mul(&roll);

        let undo_roll = Quat::from_axis_angle_degrees(Vector3::x(), -5.0);
        let undo_pitch = Quat::from_axis_angle_degrees(Vector3::y(), 10.0);
        let undo_yaw = Quat::from_axis_angle_degrees(Vector3::z(), -20.0);
        let backward = undo_yaw.mul(&undo_pitch).mul(&undo_roll);

        let combined = backward.mul(&forward);
        assert!((combined.0.angle()).abs() < 1e-9);
    }

    #[test]
    fn latlong_zero_vector_is_origin() {
        assert_eq!(latlong_single(Vector3::zeros()), (0.0, 0.0));
    }

    #[test]
    fn latlong_forward_axis_is_origin() {
        let (lon, lat) = latlong_single(Vector3::new(100.0, 0.0, 0.0));
        assert!(lon.abs() < 1e-6);
        assert!(lat.abs() < 1e-6);
    }

    #[test]
    fn latlong_pure_y_is_ninety_degrees() {
        let (lon, _lat) = latlong_single(Vector3::new(0.0, 5.0, 0.0));
        assert!((lon - (-90.0)).abs() < 1e-6);
        let (lon, _lat) = latlong_single(Vector3::new(0.0, -5.0, 0.0));
        assert!((lon - 90.0).abs() < 1e-6);
    }

    #[test]
    fn latlong_pure_z_is_ninety_latitude() {
        let (_lon, lat) = latlong_single(Vector3::new(0.0, 0.0, 7.0));
        assert!((lat - 90.0).abs() < 1e-6);
    }

    #[test]
    fn pow_zero_is_identity() {
        let q = Quat::from_axis_angle_degrees(Vector3::z(), 90.0);
        let identity = q.pow(0.0);
        assert!(identity.0.angle().abs() < 1e-9);
    }

    #[test]
    fn pow_one_is_unchanged() {
        let q = Quat::from_axis_angle_degrees(Vector3::z(), 42.0);
        let same = q.pow(1.0);
        assert!((same.0.angle() - q.0.angle()).abs() < 1e-9);
    }

    #[test]
    fn unit_axis_points_cover_six_directions() {
        let points = unit_axis_points();
        assert_eq!(points.len(), 6);
        assert!(points[0].x > 0.0);
        assert!(points[1].x < 0.0);
    }
}
