//! First-person camera: position, rotation, zoom, and follow/track.

use nalgebra::{UnitQuaternion, Vector3};

use crate::math::{latlong_single, Quat};
use crate::simulation::universe::Universe;

const MIN_ZOOM: f64 = 0.5;

/// A followed position producer: recomputed every frame via [`Camera::update`].
pub type FollowFn = Box<dyn Fn(&Universe) -> Vector3<f64>>;

/// A tracked-point producer. Receives the universe (to read `current_tick`
/// and object positions) so a swivel can compute its own elapsed fraction
/// without the camera needing to track simulation time itself.
pub type TrackFn = Box<dyn FnMut(&Universe) -> Vector3<f64>>;

pub struct Camera {
    pub position: Vector3<f64>,
    pub rotation: UnitQuaternion<f64>,
    zoom_level: f64,
    following: Option<FollowFn>,
    tracking: Option<TrackFn>,
    /// Set by a swivel's tracking closure once its elapsed fraction
    /// reaches 1, so `update` can clear `tracking` afterward.
    tracking_done: Option<std::rc::Rc<std::cell::Cell<bool>>>,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

impl Camera {
    pub fn new() -> Self {
        Self {
            position: Vector3::zeros(),
            rotation: UnitQuaternion::identity(),
            zoom_level: 1.0,
            following: None,
            tracking: None,
            tracking_done: None,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom_level
    }

    pub fn is_following(&self) -> bool {
        self.following.is_some()
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking.is_some()
    }

    pub fn follow(&mut self, callback: Option<FollowFn>) {
        self.following = callback;
    }

    pub fn track(&mut self, callback: Option<TrackFn>) {
        self.tracking = callback;
        self.tracking_done = None;
    }

    /// The rotated (forward, right, up) axes implied by the current
    /// rotation.
    pub fn current_axes(&self) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
        Quat(self.rotation).rotated_axes()
    }

    /// Apply `following`/`tracking` for this frame, reading world state
    /// from `universe` at call time rather than holding a reference to it.
    pub fn update(&mut self, universe: &Universe) {
        if let Some(follow) = &self.following {
            self.position = follow(universe);
        }
        if let Some(track) = &mut self.tracking {
            let target = track(universe);
            self.look_at_point_impl(target, false);
        }
        if self.tracking_done.as_ref().is_some_and(|done| done.get()) {
            self.tracking = None;
            self.tracking_done = None;
        }
    }

    /// Translate along the current forward axis, clearing `following`
    /// unless told not to.
    pub fn move_by(&mut self, distance: f64, disable_follow: bool) {
        let (forward, _, _) = self.current_axes();
        self.position += forward * distance;
        if disable_follow {
            self.following = None;
        }
    }

    /// Translate along the current right axis, clearing `following`
    /// unless told not to.
    pub fn strafe(&mut self, distance: f64, disable_follow: bool) {
        let (_, right, _) = self.current_axes();
        self.position += right * distance;
        if disable_follow {
            self.following = None;
        }
    }

    pub fn reset_zoom(&mut self) {
        self.zoom_level = 1.0;
    }

    pub fn reset_rotation(&mut self, disable_track: bool) {
        self.rotation = UnitQuaternion::identity();
        if disable_track {
            self.tracking = None;
        }
    }

    /// Compose the current rotation with axis-angle rotations built from
    /// the *current* right/up/forward axes, in that order, applying each
    /// of yaw, pitch, and roll that is non-zero.
    pub fn rotate(&mut self, yaw: f64, pitch: f64, roll: f64, zoom_scale: bool, keep_tracking: bool) {
        let (_, right, up) = self.current_axes();
        let (forward, _, _) = self.current_axes();
        let (yaw, pitch) = if zoom_scale {
            (yaw / self.zoom_level, pitch / self.zoom_level)
        } else {
            (yaw, pitch)
        };
        if yaw != 0.0 {
            let q = Quat::from_axis_angle_degrees(up, yaw);
            self.rotation = self.rotation * q.0;
        }
        if pitch != 0.0 {
            let q = Quat::from_axis_angle_degrees(right, pitch);
            self.rotation = self.rotation * q.0;
        }
        if roll != 0.0 {
            let q = Quat::from_axis_angle_degrees(forward, roll);
            self.rotation = self.rotation * q.0;
        }
        if !keep_tracking {
            self.tracking = None;
        }
    }

    pub fn flip(&mut self) {
        self.rotate(180.0, 0.0, 0.0, false, false);
        self.tracking = None;
    }

    pub fn adjust_zoom(&mut self, multiplier: f64) {
        self.zoom_level = (self.zoom_level * multiplier).max(MIN_ZOOM);
    }

    fn look_at_point_impl(&mut self, point: Vector3<f64>, disable_track: bool) {
        self.reset_rotation(disable_track);
        let relative = Quat(self.rotation).rotate_vector(point - self.position);
        let (longitude, latitude) = latlong_single(relative);
        self.rotate(longitude, 0.0, 0.0, false, true);
        self.rotate(0.0, latitude, 0.0, false, true);
        if disable_track {
            self.tracking = None;
        }
    }

    /// Reset rotation, then yaw/pitch so the forward axis points at `point`.
    pub fn look_at_point(&mut self, point: Vector3<f64>) {
        self.look_at_point_impl(point, true);
    }

    /// The camera's own latitude/longitude, i.e. where its forward axis
    /// points relative to the origin.
    pub fn lat_long(&self) -> (f64, f64) {
        let (forward, _, _) = self.current_axes();
        latlong_single(forward)
    }

    /// Install a tracking callback that, for elapsed fraction `r` in
    /// `[0, 1]`, orients the camera along `rot^s(r)` applied to the
    /// initial forward axis, where `rot` is the rotation that would look
    /// directly at `point` and `s` is the adjustable sigmoid parameterized
    /// by `smooth`. Once `r >= 1`, clears tracking.
    pub fn swivel_to_point(&mut self, point: Vector3<f64>, duration_ticks: f64, smooth: f64) {
        let start_rotation = self.rotation;
        let start_position = self.position;
        let relative = Quat(start_rotation).rotate_vector(point - start_position);
        let (longitude, latitude) = latlong_single(relative);
        let yaw_quat = {
            let (_, _, up) = Quat(start_rotation).rotated_axes();
            Quat::from_axis_angle_degrees(up, longitude)
        };
        let pitch_axis_rotation = start_rotation * yaw_quat.0;
        let pitch_quat = {
            let (_, right, _) = Quat(pitch_axis_rotation).rotated_axes();
            Quat::from_axis_angle_degrees(right, latitude)
        };
        let target_delta = Quat(yaw_quat.0 * pitch_quat.0);
        let mut start_tick: Option<f64> = None;
        let done = std::rc::Rc::new(std::cell::Cell::new(false));
        let done_handle = std::rc::Rc::clone(&done);

        self.track(Some(Box::new(move |universe: &Universe| {
            let now = universe.current_tick();
            let start = *start_tick.get_or_insert(now);
            let r = if duration_ticks <= 0.0 {
                1.0
            } else {
                ((now - start) / duration_ticks).clamp(0.0, 1.0)
            };
            if r >= 1.0 {
                done_handle.set(true);
            }
            let s = sigmoid(r, smooth);
            let interpolated = target_delta.pow(s);
            let rotation = start_rotation * interpolated.0;
            let (forward, _, _) = Quat(rotation).rotated_axes();
            start_position + forward * 1e10
        })));
        self.tracking_done = Some(done);
    }
}

/// Symmetric, bijective sigmoid on `[0, 1]`: `k -> 0` approaches the
/// identity, `k -> 1` approaches a hard step at 0.5.
pub fn sigmoid(r: f64, k: f64) -> f64 {
    let k = k.clamp(0.0, 1.0 - 1e-6);
    let p = 1.0 / (1.0 - k);
    let centered = r - 0.5;
    let sign = if centered < 0.0 { -1.0 } else { 1.0 };
    0.5 + sign * (centered.abs() * 2.0).powf(p) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjust_zoom_clamps_to_minimum() {
        let mut c = Camera::new();
        c.adjust_zoom(0.5);
        assert!((c.zoom() - 0.5).abs() < 1e-12);
        c.adjust_zoom(0.5);
        assert!((c.zoom() - MIN_ZOOM).abs() < 1e-12);
    }

    #[test]
    fn sigmoid_fixes_endpoints_and_midpoint() {
        for k in [0.0, 0.3, 0.7, 0.999999] {
            assert!((sigmoid(0.0, k) - 0.0).abs() < 1e-9);
            assert!((sigmoid(1.0, k) - 1.0).abs() < 1e-9);
            assert!((sigmoid(0.5, k) - 0.5).abs() < 1e-9);
        }
    }

    #[test]
    fn sigmoid_is_symmetric_about_half() {
        let k = 0.6;
        for r in [0.1, 0.25, 0.4] {
            let lower = sigmoid(r, k) - 0.0;
            let upper = 1.0 - sigmoid(1.0 - r, k);
            assert!((lower - upper).abs() < 1e-9);
        }
    }

    #[test]
    fn flip_adds_180_degrees_of_yaw() {
        let mut c = Camera::new();
        let before = c.lat_long();
        c.flip();
        let after = c.lat_long();
        let mut delta = (after.0 - before.0).abs();
        if delta > 180.0 {
            delta = 360.0 - delta;
        }
        assert!((delta - 180.0).abs() < 1e-6);
    }

    #[test]
    fn look_at_point_then_projecting_point_is_near_origin() {
        let mut c = Camera::new();
        let target = Vector3::new(3.0, -4.0, 5.0);
        c.look_at_point(target);
        let relative = Quat(c.rotation).rotate_vector(target - c.position);
        let (lon, lat) = latlong_single(relative);
        assert!(lon.abs() < 1e-6);
        assert!(lat.abs() < 1e-6);
    }
}
