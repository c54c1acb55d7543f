//! `starhelm` — a deterministic, tick-driven simulator of a 3D universe of
//! celestial bodies and powered ships, viewed through a quaternion camera
//! projected onto a character grid.
//!
//! The simulation core lives in [`simulation`]; [`camera`] and [`charmap`]
//! implement the 3D-to-character display pipeline; [`command`] is the
//! external-facing order/command dispatcher.

pub mod camera;
pub mod charmap;
pub mod command;
pub mod config;
pub mod error;
pub mod feedback;
pub mod markup;
pub mod math;
pub mod simulation;

pub use config::Settings;
pub use error::{Result, StarhelmError};
pub use simulation::object::{Object, ObjectKind, Oid};
pub use simulation::ship::{FleetId, Ship};
pub use simulation::universe::Universe;
