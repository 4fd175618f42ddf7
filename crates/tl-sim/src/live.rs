//! Two-thread live driver.
//!
//! The plant thread owns the tank and the control thread owns the controller
//! and cooler. The only state they share is a pair of single-slot mailboxes:
//! readings flow plant → control, cooling-rate commands flow control → plant.
//! Both loops poll a [`StopSignal`] every iteration and hand their state back
//! when joined.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tl_controls::{
    ControlEvent, EventSink, ParameterNudge, PidConfig, PidController, ReportClock,
    SetpointSchedule, StagedCooler,
};
use tl_core::{Time, s, seconds, to_duration};

use crate::error::{SimError, SimResult};
use crate::mailbox::{Mailbox, Reading};
use crate::tank::{ThermalTank, ThermalTankConfig};

/// Cooperative shutdown flag shared by both loops.
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Pacing and outer-loop settings for a live run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveConfig {
    /// Plant step and control poll back-off
    pub dt: Time,
    /// Wall-clock interval between published readings
    pub report_interval: Time,
    pub nudge: ParameterNudge,
    pub schedule: SetpointSchedule,
    /// Added to reading timestamps before evaluating the schedule (seconds)
    pub schedule_offset_s: f64,
}

impl Default for LiveConfig {
    fn default() -> Self {
        Self {
            dt: s(1.0),
            report_interval: s(5.0),
            nudge: ParameterNudge::default(),
            schedule: SetpointSchedule::default(),
            schedule_offset_s: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Pacing {
    dt_s: f64,
    sleep: Duration,
    report_s: f64,
}

impl LiveConfig {
    fn pacing(&self) -> SimResult<Pacing> {
        let dt_s = seconds(self.dt);
        if !dt_s.is_finite() || dt_s <= 0.0 {
            return Err(SimError::InvalidConfiguration {
                what: "live dt must be positive",
            });
        }
        let report_s = seconds(self.report_interval);
        if !report_s.is_finite() || report_s <= 0.0 {
            return Err(SimError::InvalidConfiguration {
                what: "report_interval must be positive",
            });
        }
        if !self.schedule_offset_s.is_finite() {
            return Err(SimError::InvalidConfiguration {
                what: "schedule_offset_s must be finite",
            });
        }
        Ok(Pacing {
            dt_s,
            sleep: to_duration(self.dt)?,
            report_s,
        })
    }
}

/// Mailboxes connecting the two loops.
#[derive(Debug, Default)]
pub struct LiveChannels {
    pub readings: Mailbox<Reading>,
    /// Cooling rate (°C/s) for the plant to apply as external heat
    pub commands: Mailbox<f64>,
}

/// One control-side decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveSample {
    /// Reading timestamp (seconds since start)
    pub time: f64,
    pub measured: f64,
    pub target: f64,
    pub critical_temperature: f64,
    /// Cooler parameter after the nudge
    pub parameter: f64,
}

/// Plant loop: apply commands, step the tank, publish readings on schedule.
///
/// Returns the tank once `stop` is raised.
pub fn run_plant_loop(
    mut tank: ThermalTank,
    channels: &LiveChannels,
    config: &LiveConfig,
    stop: &StopSignal,
    sink: &dyn EventSink,
) -> SimResult<ThermalTank> {
    let pacing = config.pacing()?;
    let mut clock = ReportClock::new(pacing.report_s, 0.0)?;
    let start = Instant::now();

    while !stop.is_stopped() {
        if let Some(rate) = channels.commands.take() {
            tank.set_external_heat(rate);
        }
        tank.update_temperature(pacing.dt_s)?;

        let now = start.elapsed().as_secs_f64();
        if clock.should_report(now) {
            let reading = Reading {
                temperature: tank.temperature(),
                timestamp: now,
                critical_temperature: tank.critical_temperature(),
            };
            let overwrote = channels.readings.publish(reading).is_some();
            sink.emit(&ControlEvent::ReadingPublished {
                temperature: reading.temperature,
                timestamp: reading.timestamp,
                overwrote,
            });
            clock.advance(now);
        }

        thread::sleep(pacing.sleep);
    }

    Ok(tank)
}

/// Control loop: consume readings, retarget, run the PID and command the cooler.
///
/// The PID sees the report interval as its time step since that is the
/// nominal spacing between readings.
pub fn run_control_loop(
    controller: &mut PidController,
    cooler: &mut StagedCooler,
    channels: &LiveChannels,
    config: &LiveConfig,
    stop: &StopSignal,
    sink: &dyn EventSink,
) -> SimResult<Vec<LiveSample>> {
    let pacing = config.pacing()?;
    let mut samples = Vec::new();

    while !stop.is_stopped() {
        let Some(reading) = channels.readings.take() else {
            thread::sleep(pacing.sleep);
            continue;
        };
        sink.emit(&ControlEvent::ReadingConsumed {
            temperature: reading.temperature,
            timestamp: reading.timestamp,
        });

        let target = config
            .schedule
            .at(config.schedule_offset_s + reading.timestamp);
        controller.set_setpoint(target)?;
        let output = controller.compute(reading.temperature, pacing.report_s)?;

        cooler.set_parameter(config.nudge.apply(cooler.parameter(), output));
        let cooling_rate = cooler.cooling_rate();
        channels.commands.publish(cooling_rate);
        sink.emit(&ControlEvent::ActuatorNudged {
            output,
            parameter: cooler.parameter(),
            cooling_rate,
        });

        samples.push(LiveSample {
            time: reading.timestamp,
            measured: reading.temperature,
            target,
            critical_temperature: reading.critical_temperature,
            parameter: cooler.parameter(),
        });
    }

    Ok(samples)
}

/// Components moved into the live threads.
#[derive(Debug)]
pub struct LiveSystem {
    pub tank: ThermalTank,
    pub cooler: StagedCooler,
    pub controller: PidController,
}

impl LiveSystem {
    /// Hot tank with a strong heater under a bounded controller.
    ///
    /// Tank at 48 °C with a 50/60 °C/s heater and no disturbance, a cooler
    /// spanning 40/60 to 80/60 °C/s starting at full cooling, and a PID
    /// (20, 5, 0.5) with conditional integration and output bounds `[-10, 10]`.
    pub fn warm_tank(sink: Arc<dyn EventSink>) -> SimResult<Self> {
        let tank = ThermalTank::with_sink(
            ThermalTankConfig {
                initial_temperature: 48.0,
                internal_heater_rate: 50.0 / 60.0,
                disturbance_enabled: false,
                ..ThermalTankConfig::default()
            },
            Arc::clone(&sink),
        )?;
        let mut cooler = StagedCooler::new(40.0 / 60.0, 80.0 / 60.0)?;
        cooler.set_parameter(1.0);
        let config = PidConfig::new(20.0, 5.0, 0.5, 21.0)?
            .with_conditional_integration(true)
            .with_bounds(-10.0, 10.0)?;
        Ok(Self {
            tank,
            cooler,
            controller: PidController::with_sink(config, sink),
        })
    }
}

/// Components handed back after a live run.
#[derive(Debug)]
pub struct LiveOutcome {
    pub tank: ThermalTank,
    pub cooler: StagedCooler,
    pub controller: PidController,
    pub samples: Vec<LiveSample>,
}

type ControlParts = (PidController, StagedCooler, Vec<LiveSample>);

/// Handle to a running pair of live threads.
pub struct LiveHandle {
    stop: StopSignal,
    plant: JoinHandle<SimResult<ThermalTank>>,
    control: JoinHandle<SimResult<ControlParts>>,
}

impl LiveHandle {
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// True once both threads have exited, for example after a loop error.
    pub fn is_finished(&self) -> bool {
        self.plant.is_finished() && self.control.is_finished()
    }

    /// Raise the stop signal, wait for both threads and collect their state.
    pub fn stop_and_join(self) -> SimResult<LiveOutcome> {
        self.stop.stop();
        let plant = self
            .plant
            .join()
            .map_err(|_| SimError::WorkerPanicked { what: "plant" });
        let control = self
            .control
            .join()
            .map_err(|_| SimError::WorkerPanicked { what: "control" });

        let tank = plant??;
        let (controller, cooler, samples) = control??;
        tracing::info!(
            readings = samples.len(),
            final_temperature = tank.temperature(),
            "live run stopped"
        );
        Ok(LiveOutcome {
            tank,
            cooler,
            controller,
            samples,
        })
    }
}

/// Start the plant and control threads.
///
/// The tank starts under the cooler's current rate. A loop that fails raises
/// the stop signal so its partner exits too.
pub fn spawn_live(
    system: LiveSystem,
    config: LiveConfig,
    sink: Arc<dyn EventSink>,
) -> SimResult<LiveHandle> {
    config.pacing()?;

    let LiveSystem {
        mut tank,
        mut cooler,
        mut controller,
    } = system;
    tank.set_external_heat(cooler.cooling_rate());

    tracing::info!(
        dt_s = seconds(config.dt),
        report_s = seconds(config.report_interval),
        "live run started"
    );
    let channels = Arc::new(LiveChannels::default());
    let config = Arc::new(config);
    let stop = StopSignal::new();

    let plant = {
        let channels = Arc::clone(&channels);
        let config = Arc::clone(&config);
        let stop = stop.clone();
        let sink = Arc::clone(&sink);
        thread::spawn(move || {
            let result = run_plant_loop(tank, &channels, &config, &stop, sink.as_ref());
            if let Err(e) = &result {
                tracing::error!(error = %e, "plant loop failed");
                stop.stop();
            }
            result
        })
    };

    let control = {
        let stop = stop.clone();
        thread::spawn(move || {
            let result = run_control_loop(
                &mut controller,
                &mut cooler,
                &channels,
                &config,
                &stop,
                sink.as_ref(),
            );
            match result {
                Ok(samples) => Ok((controller, cooler, samples)),
                Err(e) => {
                    tracing::error!(error = %e, "control loop failed");
                    stop.stop();
                    Err(e)
                }
            }
        })
    };

    Ok(LiveHandle {
        stop,
        plant,
        control,
    })
}

/// Run the live threads for `duration` of wall time, then stop and join them.
pub fn run_live_for(
    system: LiveSystem,
    config: LiveConfig,
    sink: Arc<dyn EventSink>,
    duration: Duration,
) -> SimResult<LiveOutcome> {
    let handle = spawn_live(system, config, sink)?;
    thread::sleep(duration);
    handle.stop_and_join()
}
