//! PID controller.
//!
//! One controller type with:
//! - Conditional integration (integral reset inside a deadband around the setpoint)
//! - Optional saturating output clamp
//! - Explicit, inspectable running state
//!
//! The error convention is `error = setpoint - process_value`, so a positive
//! output means the process sits below its target.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};
use crate::events::{ControlEvent, EventSink, TracingSink};

/// Fraction of `|setpoint|` inside which conditional integration resets the integral.
pub const DEFAULT_DEADBAND_FRACTION: f64 = 0.25;

fn finite(v: f64, what: &'static str) -> ControlResult<f64> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ControlError::InvalidConfiguration { what })
    }
}

/// Saturation limits for the controller output.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputBounds {
    lower: f64,
    upper: f64,
}

impl OutputBounds {
    /// Create output bounds. `lower == upper` is allowed and pins the output.
    pub fn new(lower: f64, upper: f64) -> ControlResult<Self> {
        if lower.is_nan() || upper.is_nan() {
            return Err(ControlError::InvalidConfiguration {
                what: "output bounds must not be NaN",
            });
        }
        if lower > upper {
            return Err(ControlError::InvalidConfiguration {
                what: "lower_bound must not exceed upper_bound",
            });
        }
        Ok(Self { lower, upper })
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn clamp(&self, v: f64) -> f64 {
        v.clamp(self.lower, self.upper)
    }
}

/// PID controller configuration.
///
/// Gains may be zero (which disables that term) but must be finite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PidConfig {
    k_p: f64,
    k_i: f64,
    k_d: f64,
    setpoint: f64,
    bounds: Option<OutputBounds>,
    conditional_integration: bool,
    integration_deadband_fraction: f64,
}

impl PidConfig {
    /// Create an unbounded configuration without conditional integration.
    ///
    /// # Arguments
    ///
    /// * `k_p` - Proportional gain
    /// * `k_i` - Integral gain
    /// * `k_d` - Derivative gain
    /// * `setpoint` - Initial target value
    pub fn new(k_p: f64, k_i: f64, k_d: f64, setpoint: f64) -> ControlResult<Self> {
        Ok(Self {
            k_p: finite(k_p, "k_p must be finite")?,
            k_i: finite(k_i, "k_i must be finite")?,
            k_d: finite(k_d, "k_d must be finite")?,
            setpoint: finite(setpoint, "setpoint must be finite")?,
            bounds: None,
            conditional_integration: false,
            integration_deadband_fraction: DEFAULT_DEADBAND_FRACTION,
        })
    }

    /// Enable saturating output clamping to `[lower, upper]`.
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> ControlResult<Self> {
        self.bounds = Some(OutputBounds::new(lower, upper)?);
        Ok(self)
    }

    pub fn with_conditional_integration(mut self, enabled: bool) -> Self {
        self.conditional_integration = enabled;
        self
    }

    /// Set the deadband as a fraction of `|setpoint|`.
    pub fn with_deadband_fraction(mut self, fraction: f64) -> ControlResult<Self> {
        if !fraction.is_finite() || fraction < 0.0 {
            return Err(ControlError::InvalidConfiguration {
                what: "integration_deadband_fraction must be finite and non-negative",
            });
        }
        self.integration_deadband_fraction = fraction;
        Ok(self)
    }

    pub fn k_p(&self) -> f64 {
        self.k_p
    }

    pub fn k_i(&self) -> f64 {
        self.k_i
    }

    pub fn k_d(&self) -> f64 {
        self.k_d
    }

    /// Convenience accessor for `(k_p, k_i, k_d)`.
    pub fn gains(&self) -> (f64, f64, f64) {
        (self.k_p, self.k_i, self.k_d)
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn bounds(&self) -> Option<OutputBounds> {
        self.bounds
    }

    pub fn conditional_integration(&self) -> bool {
        self.conditional_integration
    }

    pub fn integration_deadband_fraction(&self) -> f64 {
        self.integration_deadband_fraction
    }

    /// Half-width of the band around the setpoint where integration is suspended.
    pub fn deadband(&self) -> f64 {
        self.integration_deadband_fraction * self.setpoint.abs()
    }
}

/// PID controller state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PidState {
    /// Error seen on the previous step.
    pub previous_error: f64,
    /// Integral accumulator (sum of `error * dt`, before `k_i`).
    pub integral: f64,
    /// Last error rate `(error - previous_error) / dt`, before `k_d`.
    pub last_derivative: f64,
}

/// Per-step breakdown of a controller computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidTerms {
    pub error: f64,
    pub proportional: f64,
    pub integral: f64,
    pub derivative: f64,
    /// `proportional + integral + derivative`, before clamping.
    pub unclamped: f64,
    /// Value returned to the caller.
    pub output: f64,
}

impl PidTerms {
    pub fn saturated(&self) -> bool {
        self.output != self.unclamped
    }
}

/// Stateful PID controller.
pub struct PidController {
    config: PidConfig,
    state: PidState,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for PidController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PidController")
            .field("config", &self.config)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl PidController {
    /// Create a controller that reports steps through `tracing`.
    pub fn new(config: PidConfig) -> Self {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    pub fn with_sink(config: PidConfig, sink: Arc<dyn EventSink>) -> Self {
        Self {
            config,
            state: PidState::default(),
            sink,
        }
    }

    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    pub fn state(&self) -> &PidState {
        &self.state
    }

    pub fn setpoint(&self) -> f64 {
        self.config.setpoint
    }

    /// Swap in a new configuration. Running state is kept.
    pub fn configure(&mut self, config: PidConfig) {
        self.config = config;
    }

    /// Retarget the controller. Running state is kept.
    pub fn set_setpoint(&mut self, setpoint: f64) -> ControlResult<()> {
        self.config.setpoint = finite(setpoint, "setpoint must be finite")?;
        Ok(())
    }

    /// Zero the running state.
    pub fn reset(&mut self) {
        self.state = PidState::default();
    }

    /// Compute the controller output for one step.
    pub fn compute(&mut self, process_value: f64, dt: f64) -> ControlResult<f64> {
        self.compute_terms(process_value, dt).map(|terms| terms.output)
    }

    /// Compute one step and return the full term breakdown.
    ///
    /// A rejected call leaves the running state untouched.
    pub fn compute_terms(&mut self, process_value: f64, dt: f64) -> ControlResult<PidTerms> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(ControlError::InvalidTimeStep { dt });
        }
        let process_value = tl_core::ensure_finite(process_value, "process_value")?;

        let cfg = &self.config;
        let error = cfg.setpoint - process_value;

        let proportional = cfg.k_p * error;

        // Inside the deadband the history is discarded so a later divergence starts clean
        if cfg.conditional_integration && error.abs() <= cfg.deadband() {
            self.state.integral = 0.0;
        } else {
            self.state.integral += error * dt;
        }
        let integral = cfg.k_i * self.state.integral;

        let rate = (error - self.state.previous_error) / dt;
        let derivative = cfg.k_d * rate;

        let unclamped = proportional + integral + derivative;
        let output = match cfg.bounds {
            Some(bounds) => bounds.clamp(unclamped),
            None => unclamped,
        };

        self.state.previous_error = error;
        self.state.last_derivative = rate;

        let terms = PidTerms {
            error,
            proportional,
            integral,
            derivative,
            unclamped,
            output,
        };
        self.sink.emit(&ControlEvent::PidStep(terms));
        Ok(terms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RecordingSink;

    fn controller(config: PidConfig) -> PidController {
        PidController::new(config)
    }

    #[test]
    fn config_creation() {
        let cfg = PidConfig::new(0.3, 0.005, 0.05, 35.0).unwrap();
        assert_eq!(cfg.gains(), (0.3, 0.005, 0.05));
        assert_eq!(cfg.setpoint(), 35.0);
        assert_eq!(cfg.bounds(), None);
        assert!(!cfg.conditional_integration());
        assert_eq!(cfg.integration_deadband_fraction(), 0.25);
        assert!((cfg.deadband() - 8.75).abs() < 1e-12);
    }

    #[test]
    fn invalid_config_params() {
        assert!(PidConfig::new(f64::NAN, 0.0, 0.0, 1.0).is_err());
        assert!(PidConfig::new(1.0, f64::INFINITY, 0.0, 1.0).is_err());
        assert!(PidConfig::new(1.0, 0.0, 0.0, f64::NEG_INFINITY).is_err());

        let cfg = PidConfig::new(1.0, 0.0, 0.0, 1.0).unwrap();
        assert_eq!(
            cfg.clone().with_bounds(1.0, -1.0),
            Err(ControlError::InvalidConfiguration {
                what: "lower_bound must not exceed upper_bound",
            })
        );
        assert!(cfg.clone().with_bounds(f64::NAN, 1.0).is_err());
        assert!(cfg.clone().with_deadband_fraction(-0.1).is_err());
        assert!(cfg.with_bounds(2.0, 2.0).is_ok());
    }

    #[test]
    fn zero_gains_are_valid() {
        let mut pid = controller(PidConfig::new(0.0, 0.0, 0.0, 10.0).unwrap());
        assert_eq!(pid.compute(3.0, 0.1).unwrap(), 0.0);
    }

    #[test]
    fn proportional_only() {
        let mut pid = controller(PidConfig::new(2.0, 0.0, 0.0, 1.0).unwrap());
        let out = pid.compute(0.5, 0.1).unwrap();
        assert!((out - 1.0).abs() < 1e-12);
    }

    #[test]
    fn integral_accumulates_error_times_dt() {
        let mut pid = controller(PidConfig::new(0.0, 2.0, 0.0, 1.0).unwrap());
        for _ in 0..10 {
            pid.compute(0.0, 0.1).unwrap();
        }
        assert!((pid.state().integral - 1.0).abs() < 1e-12);
        let out = pid.compute(0.0, 0.1).unwrap();
        assert!((out - 2.2).abs() < 1e-12);
    }

    #[test]
    fn derivative_uses_previous_error() {
        let mut pid = controller(PidConfig::new(0.0, 0.0, 1.0, 0.0).unwrap());

        // previous_error starts at zero, so the first step sees the full jump
        let first = pid.compute(-1.0, 0.5).unwrap();
        assert!((first - 2.0).abs() < 1e-12);
        assert!((pid.state().last_derivative - 2.0).abs() < 1e-12);

        let second = pid.compute(-1.0, 0.5).unwrap();
        assert_eq!(second, 0.0);
        assert_eq!(pid.state().previous_error, 1.0);
    }

    #[test]
    fn zero_dt_is_rejected_without_touching_state() {
        let mut pid = controller(PidConfig::new(1.0, 1.0, 1.0, 5.0).unwrap());
        pid.compute(1.0, 0.1).unwrap();
        let before = *pid.state();

        assert_eq!(
            pid.compute(1.0, 0.0),
            Err(ControlError::InvalidTimeStep { dt: 0.0 })
        );
        assert!(pid.compute(1.0, -0.1).is_err());
        assert!(pid.compute(1.0, f64::NAN).is_err());
        assert_eq!(*pid.state(), before);
    }

    #[test]
    fn non_finite_process_value_is_rejected() {
        let mut pid = controller(PidConfig::new(1.0, 0.0, 0.0, 5.0).unwrap());
        assert!(matches!(
            pid.compute(f64::NAN, 0.1),
            Err(ControlError::NonFinite { .. })
        ));
    }

    #[test]
    fn output_clamping_is_silent() {
        let cfg = PidConfig::new(10.0, 0.0, 0.0, 10.0)
            .unwrap()
            .with_bounds(-1.0, 1.0)
            .unwrap();
        let mut pid = controller(cfg);

        let terms = pid.compute_terms(0.0, 0.1).unwrap();
        assert_eq!(terms.output, 1.0);
        assert_eq!(terms.unclamped, 100.0);
        assert!(terms.saturated());

        assert_eq!(pid.compute(20.0, 0.1).unwrap(), -1.0);
    }

    #[test]
    fn conditional_integration_resets_inside_deadband() {
        let cfg = PidConfig::new(0.0, 1.0, 0.0, 10.0)
            .unwrap()
            .with_conditional_integration(true);
        let mut pid = controller(cfg);

        // |error| = 5 > 2.5, accumulate
        pid.compute(5.0, 1.0).unwrap();
        pid.compute(5.0, 1.0).unwrap();
        assert_eq!(pid.state().integral, 10.0);

        // |error| = 2.5, on the edge of the deadband: reset
        let out = pid.compute(7.5, 1.0).unwrap();
        assert_eq!(pid.state().integral, 0.0);
        assert_eq!(out, 0.0);

        // Leaving the deadband starts from a clean accumulator
        pid.compute(0.0, 1.0).unwrap();
        assert_eq!(pid.state().integral, 10.0);
    }

    #[test]
    fn narrower_deadband_keeps_integrating() {
        let base = PidConfig::new(0.0, 1.0, 0.0, 10.0)
            .unwrap()
            .with_conditional_integration(true);
        let mut default_band = controller(base.clone());
        let mut narrow = controller(base.with_deadband_fraction(0.1).unwrap());
        assert!((narrow.config().deadband() - 1.0).abs() < 1e-12);

        // |error| = 2: inside 0.25 * 10, outside 0.1 * 10
        default_band.compute(8.0, 1.0).unwrap();
        narrow.compute(8.0, 1.0).unwrap();
        assert_eq!(default_band.state().integral, 0.0);
        assert_eq!(narrow.state().integral, 2.0);

        // |error| = 1 sits on the narrow edge and resets it too
        narrow.compute(9.0, 1.0).unwrap();
        assert_eq!(narrow.state().integral, 0.0);
    }

    #[test]
    fn previous_error_updates_inside_deadband() {
        let cfg = PidConfig::new(0.0, 1.0, 0.0, 10.0)
            .unwrap()
            .with_conditional_integration(true);
        let mut pid = controller(cfg);
        pid.compute(9.0, 1.0).unwrap();
        assert_eq!(pid.state().previous_error, 1.0);
    }

    #[test]
    fn constant_error_leaves_only_integral() {
        let mut pid = controller(PidConfig::new(1.0, 0.5, 2.0, 4.0).unwrap());
        pid.compute(0.0, 1.0).unwrap();
        pid.compute(0.0, 1.0).unwrap();

        // Moving onto the setpoint and holding it: derivative vanishes on the second hold step
        pid.compute(4.0, 1.0).unwrap();
        let held = pid.compute_terms(4.0, 1.0).unwrap();
        assert_eq!(held.proportional, 0.0);
        assert_eq!(held.derivative, 0.0);
        assert!((held.output - 0.5 * 8.0).abs() < 1e-12);
        assert!(held.output != 0.0);
    }

    #[test]
    fn retargeting_keeps_state() {
        let mut pid = controller(PidConfig::new(1.0, 1.0, 0.0, 1.0).unwrap());
        pid.compute(0.0, 1.0).unwrap();
        pid.set_setpoint(3.0).unwrap();
        assert_eq!(pid.setpoint(), 3.0);
        assert_eq!(pid.state().integral, 1.0);
        assert!(pid.set_setpoint(f64::NAN).is_err());

        pid.configure(PidConfig::new(2.0, 0.0, 0.0, 5.0).unwrap());
        assert_eq!(pid.config().gains(), (2.0, 0.0, 0.0));
        assert_eq!(pid.state().integral, 1.0);

        pid.reset();
        assert_eq!(*pid.state(), PidState::default());
    }

    #[test]
    fn each_step_emits_term_breakdown() {
        let sink = Arc::new(RecordingSink::new());
        let mut pid =
            PidController::with_sink(PidConfig::new(1.0, 0.0, 0.0, 2.0).unwrap(), sink.clone());

        pid.compute(1.0, 0.1).unwrap();
        let _ = pid.compute(1.0, 0.0);

        let events = sink.events();
        assert_eq!(events.len(), 1);
        match &events[0] {
            ControlEvent::PidStep(terms) => {
                assert_eq!(terms.error, 1.0);
                assert_eq!(terms.output, 1.0);
            }
            other => panic!("Expected PidStep, got {other:?}"),
        }
    }
}
