//! Fixed-step synchronous simulation driver and result recording.

use serde::{Deserialize, Serialize};
use tl_controls::PidController;

use crate::error::{SimError, SimResult};
use crate::model::Plant;

/// Largest number of fixed steps a single run may take.
pub const MAX_STEPS: usize = u32::MAX as usize;

/// Records never reserve more than this many points up front.
pub(crate) const PREALLOCATE_LIMIT: usize = 1 << 20;

/// Options for simulation runs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    run_time: f64,
    delta_t: f64,
}

impl SimulationConfig {
    /// Create a configuration.
    ///
    /// # Arguments
    ///
    /// * `run_time` - Simulated duration (seconds, positive)
    /// * `delta_t` - Fixed time step (seconds, positive)
    pub fn new(run_time: f64, delta_t: f64) -> SimResult<Self> {
        if !run_time.is_finite() || run_time <= 0.0 {
            return Err(SimError::InvalidConfiguration {
                what: "run_time must be positive",
            });
        }
        if !delta_t.is_finite() || delta_t <= 0.0 {
            return Err(SimError::InvalidConfiguration {
                what: "delta_t must be positive",
            });
        }
        let steps = (run_time / delta_t).ceil();
        if !steps.is_finite() || steps > MAX_STEPS as f64 {
            return Err(SimError::InvalidConfiguration {
                what: "run_time / delta_t exceeds the step limit",
            });
        }
        Ok(Self { run_time, delta_t })
    }

    pub fn run_time(&self) -> f64 {
        self.run_time
    }

    pub fn delta_t(&self) -> f64 {
        self.delta_t
    }

    /// `ceil(run_time / delta_t)`, at most [`MAX_STEPS`].
    pub fn step_count(&self) -> usize {
        (self.run_time / self.delta_t).ceil() as usize
    }
}

/// Record of simulation results.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimRecord {
    /// Time points (seconds)
    pub t: Vec<f64>,
    /// Process value after the step taken at each time point
    pub x: Vec<f64>,
}

impl SimRecord {
    /// Reserve room for `n` points, capped at a fixed preallocation limit.
    pub fn with_capacity(n: usize) -> Self {
        let n = n.min(PREALLOCATE_LIMIT);
        Self {
            t: Vec::with_capacity(n),
            x: Vec::with_capacity(n),
        }
    }

    pub fn push(&mut self, t: f64, x: f64) {
        self.t.push(t);
        self.x.push(x);
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }

    /// `(time, value)` pairs in order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.t.iter().copied().zip(self.x.iter().copied())
    }

    pub fn last(&self) -> Option<(f64, f64)> {
        self.t.last().copied().zip(self.x.last().copied())
    }
}

/// Drive `plant` with `controller` for `config.step_count()` fixed steps.
///
/// Each step reads the plant value, computes the controller output, feeds
/// it straight back into the plant and records `(t, value)` before
/// advancing `t`.
pub fn run_sim<P: Plant>(
    plant: &mut P,
    controller: &mut PidController,
    config: &SimulationConfig,
) -> SimResult<SimRecord> {
    let steps = config.step_count();
    let dt = config.delta_t();

    let mut record = SimRecord::with_capacity(steps);
    let mut t = 0.0;
    for _ in 0..steps {
        let output = controller.compute(plant.value(), dt)?;
        plant.update(output, dt)?;
        record.push(t, plant.value());
        t += dt;
    }

    tracing::debug!(steps, final_value = plant.value(), "simulation complete");
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lag::LagProcess;
    use std::sync::Arc;
    use tl_controls::{NullSink, PidConfig};

    #[test]
    fn step_count_rounds_up() {
        assert_eq!(SimulationConfig::new(1.0, 0.3).unwrap().step_count(), 4);
        assert_eq!(SimulationConfig::new(2.0, 0.5).unwrap().step_count(), 4);
    }

    #[test]
    fn sim_config_invalid() {
        assert!(SimulationConfig::new(0.0, 0.1).is_err());
        assert!(SimulationConfig::new(1.0, 0.0).is_err());
        assert!(SimulationConfig::new(1.0, -0.1).is_err());
        assert!(SimulationConfig::new(f64::INFINITY, 0.1).is_err());
    }

    #[test]
    fn step_ratio_beyond_limit_is_rejected() {
        assert!(matches!(
            SimulationConfig::new(1.0e12, 1.0e-7),
            Err(SimError::InvalidConfiguration { .. })
        ));
        assert!(matches!(
            SimulationConfig::new(f64::MAX, f64::MIN_POSITIVE),
            Err(SimError::InvalidConfiguration { .. })
        ));

        let at_limit = SimulationConfig::new(MAX_STEPS as f64, 1.0).unwrap();
        assert_eq!(at_limit.step_count(), MAX_STEPS);
        assert!(SimulationConfig::new(MAX_STEPS as f64 + 1.0, 1.0).is_err());
    }

    #[test]
    fn record_preallocation_is_capped() {
        let record = SimRecord::with_capacity(MAX_STEPS);
        assert!(record.t.capacity() <= 2 * PREALLOCATE_LIMIT);
        assert!(record.is_empty());
    }

    #[test]
    fn records_time_before_advance() {
        let cfg = PidConfig::new(1.0, 0.0, 0.0, 10.0).unwrap();
        let mut pid = PidController::with_sink(cfg, Arc::new(NullSink));
        let mut plant = LagProcess::new(0.0, 1.0).unwrap();
        let sim = SimulationConfig::new(2.0, 0.5).unwrap();

        let record = run_sim(&mut plant, &mut pid, &sim).unwrap();
        assert_eq!(record.t, vec![0.0, 0.5, 1.0, 1.5]);
        // x1 = 0 + 0.5 * 10 = 5, x2 = 5 + 0.5 * 5 = 7.5, ...
        assert_eq!(record.x, vec![5.0, 7.5, 8.75, 9.375]);
        assert_eq!(record.last(), Some((1.5, 9.375)));
        assert_eq!(record.points().count(), 4);
    }
}
