//! Staged cooler actuator.
//!
//! The cooler maps a bounded control parameter in `[0, 1]` onto a cooling rate
//! (°C/s, always negative). In the default staged curve the parameter is
//! quantized into five discrete levels, which models a pump that cannot
//! respond continuously to its command.

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Number of discrete cooling stages.
pub const STAGE_COUNT: usize = 5;

/// Shape of the parameter → rate mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoolingCurve {
    /// Five evenly spaced levels between the minimum and maximum rate.
    #[default]
    Staged,
    /// Unquantized linear interpolation between the minimum and maximum rate.
    Linear,
}

/// Cooler with a quantized cooling rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedCooler {
    control_parameter: f64,
    min_cooling_rate: f64,
    max_cooling_rate: f64,
    curve: CoolingCurve,
}

impl Default for StagedCooler {
    fn default() -> Self {
        Self {
            control_parameter: 0.0,
            min_cooling_rate: 3.0 / 60.0,
            max_cooling_rate: 35.0 / 60.0,
            curve: CoolingCurve::Staged,
        }
    }
}

impl StagedCooler {
    /// Create a cooler.
    ///
    /// # Arguments
    ///
    /// * `min_cooling_rate` - Rate magnitude at parameter 0 (°C/s, non-negative)
    /// * `max_cooling_rate` - Rate magnitude at parameter 1 (°C/s, at least `min_cooling_rate`)
    pub fn new(min_cooling_rate: f64, max_cooling_rate: f64) -> ControlResult<Self> {
        if !min_cooling_rate.is_finite() || !max_cooling_rate.is_finite() {
            return Err(ControlError::InvalidConfiguration {
                what: "cooling rates must be finite",
            });
        }
        if min_cooling_rate < 0.0 {
            return Err(ControlError::InvalidConfiguration {
                what: "min_cooling_rate must be non-negative",
            });
        }
        if min_cooling_rate > max_cooling_rate {
            return Err(ControlError::InvalidConfiguration {
                what: "min_cooling_rate must not exceed max_cooling_rate",
            });
        }
        Ok(Self {
            control_parameter: 0.0,
            min_cooling_rate,
            max_cooling_rate,
            curve: CoolingCurve::Staged,
        })
    }

    pub fn with_curve(mut self, curve: CoolingCurve) -> Self {
        self.curve = curve;
        self
    }

    /// Store a new control parameter.
    ///
    /// The raw value is kept; it is clamped into `[0, 1]` the next time the
    /// rate is read. NaN is stored as 0.
    pub fn set_parameter(&mut self, value: f64) {
        self.control_parameter = if value.is_nan() { 0.0 } else { value };
    }

    pub fn parameter(&self) -> f64 {
        self.control_parameter
    }

    pub fn min_cooling_rate(&self) -> f64 {
        self.min_cooling_rate
    }

    pub fn max_cooling_rate(&self) -> f64 {
        self.max_cooling_rate
    }

    pub fn curve(&self) -> CoolingCurve {
        self.curve
    }

    /// Stage index (0..STAGE_COUNT) the current parameter falls into.
    pub fn stage(&self) -> usize {
        let p = self.control_parameter;
        if p <= 0.0 {
            0
        } else if p < 1.0 / 3.0 {
            1
        } else if p < 2.0 / 3.0 {
            2
        } else if p < 1.0 {
            3
        } else {
            4
        }
    }

    /// Cooling rate produced by `stage` (negative).
    pub fn stage_rate(&self, stage: usize) -> f64 {
        let stage = stage.min(STAGE_COUNT - 1);
        let span = self.max_cooling_rate - self.min_cooling_rate;
        let level = self.min_cooling_rate + span * stage as f64 / (STAGE_COUNT - 1) as f64;
        -level
    }

    /// Current cooling rate (°C/s, never positive).
    ///
    /// Reading the rate clamps the stored parameter into `[0, 1]`.
    pub fn cooling_rate(&mut self) -> f64 {
        self.control_parameter = self.control_parameter.clamp(0.0, 1.0);
        match self.curve {
            CoolingCurve::Staged => self.stage_rate(self.stage()),
            CoolingCurve::Linear => {
                let span = self.max_cooling_rate - self.min_cooling_rate;
                -(self.min_cooling_rate + span * self.control_parameter)
            }
        }
    }
}
