//! Thermal tank integration and the cooler-in-the-loop driver.

use std::sync::Arc;

use tl_controls::{
    NullSink, ParameterNudge, PidConfig, PidController, SetpointSchedule, StagedCooler,
};
use tl_core::TemperatureUnit;
use tl_sim::{CooledTank, Plant, SimulationConfig, ThermalTank, ThermalTankConfig, run_cooled_tank};

fn quiet_tank(config: ThermalTankConfig) -> ThermalTank {
    ThermalTank::with_sink(config, Arc::new(NullSink)).unwrap()
}

#[test]
fn tank_matches_closed_form_without_disturbance() {
    let mut tank = quiet_tank(ThermalTankConfig {
        initial_temperature: 23.0,
        internal_heater_rate: 4.0 / 60.0,
        external_heat_rate: 5.0 / 60.0,
        disturbance_enabled: false,
        ..ThermalTankConfig::default()
    });

    let n = 120;
    for _ in 0..n {
        tank.update_temperature(1.0).unwrap();
    }

    let expected = 23.0 + n as f64 * (4.0 / 60.0 + 5.0 / 60.0);
    assert!((tank.temperature() - expected).abs() < 1e-9);
    assert_eq!(tank.history().len(), n);
    assert!((tank.get_temperature(TemperatureUnit::Kelvin) - (expected + 253.15)).abs() < 1e-9);
    // Disturbance disabled: elapsed time is not tracked
    assert_eq!(tank.elapsed_time(), 0.0);
}

#[test]
fn tank_as_plant_takes_drive_as_external_heat() {
    let mut tank = quiet_tank(ThermalTankConfig {
        internal_heater_rate: 0.0,
        disturbance_enabled: false,
        ..ThermalTankConfig::default()
    });
    Plant::update(&mut tank, -0.5, 2.0).unwrap();
    assert_eq!(tank.external_heat_rate(), -0.5);
    assert!((Plant::value(&tank) - 22.0).abs() < 1e-12);
}

#[test]
fn cooled_tank_tracks_diurnal_target() {
    let tank = quiet_tank(ThermalTankConfig {
        initial_temperature: 48.0,
        internal_heater_rate: 4.0 / 60.0,
        disturbance_enabled: false,
        ..ThermalTankConfig::default()
    });
    let mut system = CooledTank {
        tank,
        cooler: StagedCooler::new(3.0 / 60.0, 7.0 / 60.0).unwrap(),
        nudge: ParameterNudge::default(),
        schedule: SetpointSchedule::default(),
    };
    let cfg = PidConfig::new(10.0, 15.0, 15.0, 21.0)
        .unwrap()
        .with_conditional_integration(true);
    let mut pid = PidController::with_sink(cfg, Arc::new(NullSink));
    let sim = SimulationConfig::new(86_400.0, 1.0).unwrap();

    let record = run_cooled_tank(&mut system, &mut pid, &sim).expect("cooled run should succeed");
    assert_eq!(record.len(), 86_400);
    assert!(record.parameter.iter().all(|p| (0.0..=1.0).contains(p)));

    let worst = record
        .t
        .iter()
        .zip(record.temperature.iter().zip(&record.target))
        .filter(|(t, _)| **t >= 7200.0)
        .map(|(_, (temp, target))| (temp - target).abs())
        .fold(0.0, f64::max);
    assert!(worst < 0.5, "tracking error {worst} too large");

    // Midnight target is the warm end of the cycle
    assert!((record.target[0] - 26.0).abs() < 1e-12);
}
