//! Synchronous cooler-in-the-loop tank simulation.
//!
//! The PID works in temperature space while the cooler takes a parameter in
//! `[0, 1]`, so each step goes through the outer `ParameterNudge` instead of
//! feeding the PID output to the plant directly.

use serde::{Deserialize, Serialize};
use tl_controls::{ParameterNudge, PidController, SetpointSchedule, StagedCooler};
use tl_core::TemperatureUnit;

use crate::error::SimResult;
use crate::sim::{PREALLOCATE_LIMIT, SimulationConfig};
use crate::tank::ThermalTank;

/// Plant side of the cooled loop.
#[derive(Debug)]
pub struct CooledTank {
    pub tank: ThermalTank,
    pub cooler: StagedCooler,
    pub nudge: ParameterNudge,
    pub schedule: SetpointSchedule,
}

/// Time series produced by [`run_cooled_tank`].
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CooledRecord {
    pub t: Vec<f64>,
    pub temperature: Vec<f64>,
    pub target: Vec<f64>,
    /// Cooler parameter chosen after each step.
    pub parameter: Vec<f64>,
}

impl CooledRecord {
    fn with_capacity(n: usize) -> Self {
        let n = n.min(PREALLOCATE_LIMIT);
        Self {
            t: Vec::with_capacity(n),
            temperature: Vec::with_capacity(n),
            target: Vec::with_capacity(n),
            parameter: Vec::with_capacity(n),
        }
    }

    pub fn len(&self) -> usize {
        self.t.len()
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty()
    }
}

/// Run the cooled tank for `config.step_count()` fixed steps.
///
/// Per step: retarget the setpoint, push the current parameter into the
/// cooler, apply its rate as the tank's external heat, advance the tank,
/// run the PID on the new temperature and nudge the parameter.
pub fn run_cooled_tank(
    system: &mut CooledTank,
    controller: &mut PidController,
    config: &SimulationConfig,
) -> SimResult<CooledRecord> {
    let steps = config.step_count();
    let dt = config.delta_t();

    let mut record = CooledRecord::with_capacity(steps);
    let mut parameter = system.cooler.parameter();

    for i in 0..steps {
        let t = i as f64 * dt;
        let target = system.schedule.at(t);
        controller.set_setpoint(target)?;

        system.cooler.set_parameter(parameter);
        let rate = system.cooler.cooling_rate();
        system.tank.set_external_heat(rate);
        system.tank.update_temperature(dt)?;

        let temperature = system.tank.get_temperature(TemperatureUnit::Celsius);
        let output = controller.compute(temperature, dt)?;
        parameter = system.nudge.apply(system.cooler.parameter(), output);

        record.t.push(t);
        record.temperature.push(temperature);
        record.target.push(target);
        record.parameter.push(parameter);
    }

    tracing::debug!(
        steps,
        final_temperature = system.tank.temperature(),
        "cooled tank simulation complete"
    );
    Ok(record)
}
