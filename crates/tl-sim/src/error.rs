//! Error types for simulation operations.

use thiserror::Error;
use tl_controls::ControlError;
use tl_core::TlError;

/// Errors encountered while building or running a simulation.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid configuration: {what}")]
    InvalidConfiguration { what: &'static str },

    #[error("Invalid time step: dt = {dt}")]
    InvalidTimeStep { dt: f64 },

    #[error("Control error: {0}")]
    Control(#[from] ControlError),

    #[error("Numeric error: {0}")]
    Core(#[from] TlError),

    #[error("Worker thread panicked: {what}")]
    WorkerPanicked { what: &'static str },
}

pub type SimResult<T> = Result<T, SimError>;

pub(crate) fn check_dt(dt: f64) -> SimResult<f64> {
    if dt.is_finite() && dt > 0.0 {
        Ok(dt)
    } else {
        Err(SimError::InvalidTimeStep { dt })
    }
}
