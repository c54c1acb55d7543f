//! Crate-wide error type.
//!
//! Mirrors the error kinds enumerated in the simulator's error handling
//! design: argument validation, command-spec parsing, unknown commands,
//! and charmap-too-small are all recoverable and surfaced to the caller;
//! engine/array invariant violations are programmer errors and panic
//! instead of flowing through this type.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, StarhelmError>;

/// Errors raised by order/command handling, config loading, and display.
#[derive(Debug, Error)]
pub enum StarhelmError {
    /// An order or command argument failed validation (out-of-range oid,
    /// non-positive throttle, wrong vector shape, unknown fleet id, ...).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A command string could not be parsed against its declared `ArgSpec`.
    #[error("could not parse command arguments: {0}")]
    SpecParse(String),

    /// The dispatcher was asked to run a command name with no registered
    /// handler.
    #[error("unknown command: {0}")]
    UnknownCommand(String),

    /// The requested charmap size cannot fit the minimum 3x3 layout plus
    /// an optional status bar row.
    #[error("window too small for charmap: {width}x{height} (minimum 3x3)")]
    CharmapTooSmall { width: u16, height: u16 },

    /// Configuration file could not be read or written.
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file content could not be deserialized.
    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}
