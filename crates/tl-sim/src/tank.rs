//! Self-heating thermal tank.
//!
//! Lumped heat balance integrated with explicit Euler:
//! `T += (heater + disturbance) * dt + external * dt`, where the external
//! rate is set by whatever sits on the actuator side (typically a cooler,
//! so usually negative). A one-sided hysteresis alarm watches the
//! temperature against `CRITICAL_FRACTION * critical_temperature`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tl_controls::{ControlEvent, EventSink, TracingSink};
use tl_core::{TemperatureUnit, ensure_finite, ensure_positive, from_celsius};

use crate::error::{SimError, SimResult, check_dt};
use crate::model::Plant;

/// Fraction of the critical temperature at which the alarm trips.
pub const CRITICAL_FRACTION: f64 = 0.75;

/// Periodic square-pulse boost of the internal heater.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Disturbance {
    /// Repeat period (seconds).
    pub period: f64,
    /// Start of the active window within each period (seconds, inclusive).
    pub window_start: f64,
    /// End of the active window within each period (seconds, inclusive).
    pub window_end: f64,
    /// Heater increment while active (°C/s).
    pub increment: f64,
}

impl Default for Disturbance {
    /// Ten minutes of extra heat, from minute 25 to minute 35 of every hour.
    fn default() -> Self {
        Self {
            period: 3600.0,
            window_start: 25.0 * 60.0,
            window_end: 35.0 * 60.0,
            increment: 4.0 / 60.0,
        }
    }
}

impl Disturbance {
    pub fn new(period: f64, window_start: f64, window_end: f64, increment: f64) -> SimResult<Self> {
        let d = Self {
            period,
            window_start,
            window_end,
            increment,
        };
        d.validate()?;
        Ok(d)
    }

    fn validate(&self) -> SimResult<()> {
        ensure_positive(self.period, "disturbance period")?;
        if !self.window_start.is_finite()
            || !self.window_end.is_finite()
            || self.window_start < 0.0
            || self.window_start > self.window_end
        {
            return Err(SimError::InvalidConfiguration {
                what: "disturbance window must satisfy 0 <= start <= end",
            });
        }
        ensure_finite(self.increment, "disturbance increment")?;
        Ok(())
    }

    /// Whether the pulse is on at `elapsed` seconds.
    pub fn is_active(&self, elapsed: f64) -> bool {
        let phase = elapsed % self.period;
        phase >= self.window_start && phase <= self.window_end
    }
}

/// Construction parameters for [`ThermalTank`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThermalTankConfig {
    /// Starting temperature (°C).
    pub initial_temperature: f64,
    /// Internal heater rate (°C/s).
    pub internal_heater_rate: f64,
    /// Initial external heat rate (°C/s).
    pub external_heat_rate: f64,
    /// Critical temperature (°C).
    pub critical_temperature: f64,
    pub disturbance: Disturbance,
    pub disturbance_enabled: bool,
}

impl Default for ThermalTankConfig {
    fn default() -> Self {
        Self {
            initial_temperature: 23.0,
            internal_heater_rate: 2.0 / 60.0,
            external_heat_rate: 5.0 / 60.0,
            critical_temperature: 49.0,
            disturbance: Disturbance::default(),
            disturbance_enabled: true,
        }
    }
}

/// Thermal tank with an internal heater, external heat exchange and a critical-temperature alarm.
pub struct ThermalTank {
    temperature: f64,
    internal_heater_rate: f64,
    external_heat_rate: f64,
    critical_temperature: f64,
    critical_trigger: bool,
    disturbance: Disturbance,
    disturbance_enabled: bool,
    elapsed_time: f64,
    history: Vec<f64>,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for ThermalTank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThermalTank")
            .field("temperature", &self.temperature)
            .field("internal_heater_rate", &self.internal_heater_rate)
            .field("external_heat_rate", &self.external_heat_rate)
            .field("critical_temperature", &self.critical_temperature)
            .field("critical_trigger", &self.critical_trigger)
            .field("disturbance_enabled", &self.disturbance_enabled)
            .field("elapsed_time", &self.elapsed_time)
            .field("history_len", &self.history.len())
            .finish_non_exhaustive()
    }
}

impl ThermalTank {
    /// Create a tank that reports alarm transitions through `tracing`.
    pub fn new(config: ThermalTankConfig) -> SimResult<Self> {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    pub fn with_sink(config: ThermalTankConfig, sink: Arc<dyn EventSink>) -> SimResult<Self> {
        config.disturbance.validate()?;
        Ok(Self {
            temperature: ensure_finite(config.initial_temperature, "initial_temperature")?,
            internal_heater_rate: ensure_finite(
                config.internal_heater_rate,
                "internal_heater_rate",
            )?,
            external_heat_rate: ensure_finite(config.external_heat_rate, "external_heat_rate")?,
            critical_temperature: ensure_finite(
                config.critical_temperature,
                "critical_temperature",
            )?,
            critical_trigger: false,
            disturbance: config.disturbance,
            disturbance_enabled: config.disturbance_enabled,
            elapsed_time: 0.0,
            history: Vec::new(),
            sink,
        })
    }

    /// Advance the heat balance by `dt` seconds and append the result to the history.
    pub fn update_temperature(&mut self, dt: f64) -> SimResult<()> {
        let dt = check_dt(dt)?;

        let mut heater = self.internal_heater_rate;
        if self.disturbance_enabled {
            self.elapsed_time += dt;
            if self.disturbance.is_active(self.elapsed_time) {
                heater += self.disturbance.increment;
            }
        }

        self.temperature += heater * dt + self.external_heat_rate * dt;
        self.check_alarm();
        self.history.push(self.temperature);
        Ok(())
    }

    fn check_alarm(&mut self) {
        let threshold = self.critical_threshold();
        if self.temperature > threshold {
            if !self.critical_trigger {
                self.critical_trigger = true;
                self.sink.emit(&ControlEvent::CriticalEntered {
                    temperature: self.temperature,
                    threshold,
                    critical_temperature: self.critical_temperature,
                });
            }
        } else if self.critical_trigger {
            self.critical_trigger = false;
            self.sink.emit(&ControlEvent::CriticalCleared {
                temperature: self.temperature,
                threshold,
            });
        }
    }

    /// Set the external heat exchange rate (°C/s). Non-finite rates are ignored.
    pub fn set_external_heat(&mut self, rate: f64) {
        if rate.is_finite() {
            self.external_heat_rate = rate;
        }
    }

    pub fn external_heat_rate(&self) -> f64 {
        self.external_heat_rate
    }

    pub fn internal_heater_rate(&self) -> f64 {
        self.internal_heater_rate
    }

    pub fn set_temperature(&mut self, temperature: f64) -> SimResult<()> {
        self.temperature = ensure_finite(temperature, "temperature")?;
        Ok(())
    }

    pub fn get_temperature(&self, unit: TemperatureUnit) -> f64 {
        from_celsius(self.temperature, unit)
    }

    /// Temperature in °C.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn critical_temperature(&self) -> f64 {
        self.critical_temperature
    }

    /// Temperature above which the alarm is raised.
    pub fn critical_threshold(&self) -> f64 {
        CRITICAL_FRACTION * self.critical_temperature
    }

    pub fn is_critical(&self) -> bool {
        self.critical_trigger
    }

    /// Seconds of simulated time seen by the disturbance schedule.
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    /// One entry per `update_temperature` call.
    pub fn history(&self) -> &[f64] {
        &self.history
    }
}

impl Plant for ThermalTank {
    fn value(&self) -> f64 {
        self.temperature
    }

    /// The driving value is applied as the external heat rate.
    fn update(&mut self, drive: f64, dt: f64) -> SimResult<()> {
        self.external_heat_rate = ensure_finite(drive, "external heat rate")?;
        self.update_temperature(dt)
    }
}
