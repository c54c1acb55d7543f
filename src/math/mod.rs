//! Vector and quaternion math shared by the camera and charmap.

pub mod quaternion;

pub use quaternion::{latlong_batch, latlong_single, unit_axis_points, Quat};
