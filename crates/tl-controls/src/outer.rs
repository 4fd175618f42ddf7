//! Outer control step between PID output and cooler parameter.
//!
//! The PID output is expressed in temperature-error units while the cooler
//! takes a dimensionless parameter, so the two are coupled only by sign.
//! Each step moves the parameter by a fixed increment, which makes this an
//! integrating bang-bang loop rather than a second PID.
//!
//! Sign convention: `error = setpoint - measured`. A positive output means the
//! process is colder than its target and the parameter is lowered (less
//! cooling); a negative output means it is too hot and the parameter is
//! raised. An output of exactly zero holds the parameter.

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Fixed-increment parameter adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterNudge {
    step: f64,
}

impl Default for ParameterNudge {
    fn default() -> Self {
        Self { step: 0.1 }
    }
}

impl ParameterNudge {
    pub fn new(step: f64) -> ControlResult<Self> {
        if !step.is_finite() || step <= 0.0 {
            return Err(ControlError::InvalidConfiguration {
                what: "nudge step must be finite and positive",
            });
        }
        Ok(Self { step })
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Next parameter given the current one and the PID output, clamped to `[0, 1]`.
    pub fn apply(&self, parameter: f64, output: f64) -> f64 {
        let next = if output > 0.0 {
            parameter - self.step
        } else if output < 0.0 {
            parameter + self.step
        } else {
            parameter
        };
        next.clamp(0.0, 1.0)
    }
}
