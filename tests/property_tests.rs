//! Property-based tests for the round-trip/idempotence invariants called
//! out in `spec.md` §8: arbitrary rotation sequences undo cleanly, and the
//! physics engine never loses or gains tick time.

use nalgebra::Vector3;
use proptest::prelude::*;

use starhelm::camera::Camera;
use starhelm::math::Quat;

fn finite_angle() -> impl Strategy<Value = f64> {
    -179.0..179.0
}

fn finite_vector() -> impl Strategy<Value = Vector3<f64>> {
    (-1.0e4..1.0e4, -1.0e4..1.0e4, -1.0e4..1.0e4).prop_map(|(x, y, z)| Vector3::new(x, y, z))
}

proptest! {
    /// Composing a yaw/pitch/roll triple about a fixed axis frame with its
    /// exact negated inverse (reverse order) restores the identity
    /// rotation, for arbitrary angle triples. This is the same property
    /// `spec.md` §8 requires of `Camera::rotate`'s round trip, checked at
    /// the quaternion-algebra level the camera's axis composition reduces
    /// to for a single call.
    #[test]
    fn rotate_then_undo_restores_identity(
        yaw in finite_angle(),
        pitch in finite_angle(),
        roll in finite_angle(),
    ) {
        let yaw_q = Quat::from_axis_angle_degrees(Vector3::z(), yaw);
        let pitch_q = Quat::from_axis_angle_degrees(Vector3::y(), pitch);
        let roll_q = Quat::from_axis_angle_degrees(Vector3::x(), roll);
        let forward = yaw_q.mul(&pitch_q).mul(&roll_q);

        let undo_roll = Quat::from_axis_angle_degrees(Vector3::x(), -roll);
        let undo_pitch = Quat::from_axis_angle_degrees(Vector3::y(), -pitch);
        let undo_yaw = Quat::from_axis_angle_degrees(Vector3::z(), -yaw);
        let backward = undo_yaw.mul(&undo_pitch).mul(&undo_roll);

        let combined = backward.mul(&forward);
        prop_assert!(combined.0.angle().abs() < 1e-6);
    }

    /// The unit-quaternion norm never drifts away from 1 under repeated
    /// composition, regardless of how many rotations are chained.
    #[test]
    fn repeated_rotation_keeps_a_unit_quaternion(
        angles in proptest::collection::vec(finite_angle(), 1..20),
    ) {
        let mut camera = Camera::new();
        for angle in angles {
            camera.rotate(angle, 0.0, 0.0, false, true);
        }
        prop_assert!((camera.rotation.norm() - 1.0).abs() < 1e-9);
    }

    /// `look_at_point` always orients the camera so the target reprojects
    /// to (lat, lon) = (0, 0), for any non-origin target.
    #[test]
    fn look_at_point_always_centers_its_target(target in finite_vector()) {
        prop_assume!(target.norm() > 1e-6);
        let mut camera = Camera::new();
        camera.look_at_point(target);
        let relative = starhelm::math::Quat(camera.rotation).rotate_vector(target - camera.position);
        let (lon, lat) = starhelm::math::latlong_single(relative);
        prop_assert!(lon.abs() < 1e-6);
        prop_assert!(lat.abs() < 1e-6);
    }

    /// `do_ticks(dt)` always advances `current_tick` by exactly `dt`,
    /// regardless of how many events happen to be scheduled in between.
    #[test]
    fn do_ticks_advances_current_tick_by_exactly_dt(dt in 1.0e-3..1.0e4) {
        let mut universe = starhelm::Universe::new(starhelm::Settings::default());
        let before = universe.current_tick();
        universe.do_ticks(dt).unwrap();
        prop_assert!((universe.current_tick() - (before + dt)).abs() < 1e-6);
    }

    /// `sim_toggle` applied twice restores both the sign and the magnitude
    /// of the autosim rate, for any starting rate.
    #[test]
    fn sim_toggle_twice_restores_the_prior_rate(rate in -1.0e3..1.0e3) {
        let mut universe = starhelm::Universe::new(starhelm::Settings::default());
        universe.set_simrate(rate);
        universe.toggle_autosim();
        universe.toggle_autosim();
        prop_assert!((universe.simrate() - rate).abs() < 1e-9);
    }

    /// `adjust_zoom` never drives the camera's zoom below the spec's
    /// minimum of 0.5, regardless of how small a multiplier is applied.
    #[test]
    fn adjust_zoom_never_drops_below_the_minimum(multiplier in 1.0e-6..2.0) {
        let mut camera = Camera::new();
        camera.adjust_zoom(multiplier);
        prop_assert!(camera.zoom() >= 0.5 - 1e-12);
    }
}
