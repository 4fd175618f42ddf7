//! Lag-response transmitter.

use serde::{Deserialize, Serialize};
use tl_core::ensure_finite;

use crate::error::{SimError, SimResult, check_dt};
use crate::model::Plant;

/// Process whose value integrates the driving signal scaled by `1 / lag_time`.
///
/// Update: `value += dt / lag_time * drive` (explicit Euler).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LagProcess {
    value: f64,
    lag_time: f64,
}

impl LagProcess {
    /// Create a new lag process.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` if `lag_time` is not finite and positive.
    pub fn new(initial_value: f64, lag_time: f64) -> SimResult<Self> {
        if !lag_time.is_finite() || lag_time <= 0.0 {
            return Err(SimError::InvalidConfiguration {
                what: "lag_time must be positive",
            });
        }
        Ok(Self {
            value: ensure_finite(initial_value, "initial value")?,
            lag_time,
        })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn lag_time(&self) -> f64 {
        self.lag_time
    }

    pub fn update(&mut self, drive: f64, dt: f64) -> SimResult<()> {
        let dt = check_dt(dt)?;
        let drive = ensure_finite(drive, "driving value")?;
        self.value += dt / self.lag_time * drive;
        Ok(())
    }
}

impl Plant for LagProcess {
    fn value(&self) -> f64 {
        self.value
    }

    fn update(&mut self, drive: f64, dt: f64) -> SimResult<()> {
        LagProcess::update(self, drive, dt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euler_step() {
        let mut p = LagProcess::new(1.0, 5.0).unwrap();
        p.update(10.0, 0.5).unwrap();
        assert!((p.value() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn invalid_lag_time() {
        assert!(matches!(
            LagProcess::new(0.0, 0.0),
            Err(SimError::InvalidConfiguration { .. })
        ));
        assert!(LagProcess::new(0.0, -1.0).is_err());
        assert!(LagProcess::new(0.0, f64::NAN).is_err());
    }

    #[test]
    fn invalid_update_inputs() {
        let mut p = LagProcess::new(0.0, 1.0).unwrap();
        assert!(matches!(
            p.update(1.0, 0.0),
            Err(SimError::InvalidTimeStep { .. })
        ));
        assert!(matches!(p.update(f64::NAN, 0.1), Err(SimError::Core(_))));
        assert_eq!(p.value(), 0.0);
    }
}
