//! Setpoint schedules for outer loops that retarget the controller every step.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Seconds in one day.
pub const DAY_S: f64 = 86_400.0;

/// Target value as a function of time (seconds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum SetpointSchedule {
    /// Flat target.
    Constant { value: f64 },
    /// `mean + amplitude * cos(2π t / period)`.
    Diurnal {
        mean: f64,
        amplitude: f64,
        period: f64,
    },
}

impl Default for SetpointSchedule {
    /// Ambient-following day cycle between 16 °C and 26 °C, warmest at midnight.
    fn default() -> Self {
        Self::Diurnal {
            mean: 21.0,
            amplitude: 5.0,
            period: DAY_S,
        }
    }
}

impl SetpointSchedule {
    pub fn constant(value: f64) -> ControlResult<Self> {
        if !value.is_finite() {
            return Err(ControlError::InvalidConfiguration {
                what: "constant setpoint must be finite",
            });
        }
        Ok(Self::Constant { value })
    }

    pub fn diurnal(mean: f64, amplitude: f64, period: f64) -> ControlResult<Self> {
        if !mean.is_finite() || !amplitude.is_finite() {
            return Err(ControlError::InvalidConfiguration {
                what: "diurnal mean and amplitude must be finite",
            });
        }
        if !period.is_finite() || period <= 0.0 {
            return Err(ControlError::InvalidConfiguration {
                what: "diurnal period must be finite and positive",
            });
        }
        Ok(Self::Diurnal {
            mean,
            amplitude,
            period,
        })
    }

    /// Setpoint at time `t`.
    pub fn at(&self, t: f64) -> f64 {
        match *self {
            Self::Constant { value } => value,
            Self::Diurnal {
                mean,
                amplitude,
                period,
            } => mean + amplitude * (2.0 * PI * t / period).cos(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_schedule() {
        let s = SetpointSchedule::constant(27.0).unwrap();
        assert_eq!(s.at(0.0), 27.0);
        assert_eq!(s.at(1.0e6), 27.0);
        assert!(SetpointSchedule::constant(f64::NAN).is_err());
    }

    #[test]
    fn default_day_cycle() {
        let s = SetpointSchedule::default();
        assert!((s.at(0.0) - 26.0).abs() < 1e-12);
        assert!((s.at(DAY_S / 2.0) - 16.0).abs() < 1e-12);
        assert!((s.at(DAY_S / 4.0) - 21.0).abs() < 1e-9);
        assert!((s.at(DAY_S) - 26.0).abs() < 1e-9);
    }

    #[test]
    fn invalid_diurnal() {
        assert!(SetpointSchedule::diurnal(21.0, 5.0, 0.0).is_err());
        assert!(SetpointSchedule::diurnal(f64::INFINITY, 5.0, 10.0).is_err());
    }
}
