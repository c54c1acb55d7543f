//! The external-facing command surface: parsing a typed command-string
//! into positional/flag arguments ([`argspec`]) and dispatching it against
//! a registry of named handlers ([`dispatch`]).

pub mod argspec;
pub mod dispatch;

pub use argspec::{ArgSpec, Value};
pub use dispatch::Controller;
