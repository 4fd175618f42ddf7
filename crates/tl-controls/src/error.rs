//! Error types for control system operations.

use thiserror::Error;
use tl_core::TlError;

/// Result type for control system operations.
pub type ControlResult<T> = Result<T, ControlError>;

/// Errors that can occur in control system operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    /// Configuration rejected at construction time.
    #[error("Invalid configuration: {what}")]
    InvalidConfiguration { what: &'static str },

    /// A compute step was requested with a zero, negative or non-finite time step.
    #[error("Invalid time step: dt = {dt}")]
    InvalidTimeStep { dt: f64 },

    /// Non-finite input signal.
    #[error("Non-finite value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },
}

impl From<TlError> for ControlError {
    fn from(e: TlError) -> Self {
        match e {
            TlError::NonFinite { what, value } => ControlError::NonFinite { what, value },
            TlError::InvalidArg { what } => ControlError::InvalidConfiguration { what },
        }
    }
}
