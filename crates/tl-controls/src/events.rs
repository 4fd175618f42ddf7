//! Structured telemetry events.
//!
//! Components report what they did through an injected [`EventSink`] instead
//! of printing. The default sink forwards to `tracing`; tests use
//! [`RecordingSink`] to assert on the event stream.

use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::controller::PidTerms;

/// A discrete observable event emitted by the control loop or the plant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ControlEvent {
    /// One controller step, with the per-term breakdown.
    PidStep(PidTerms),

    /// Tank temperature rose above the alarm threshold.
    CriticalEntered {
        temperature: f64,
        threshold: f64,
        critical_temperature: f64,
    },

    /// Tank temperature dropped back under the alarm threshold.
    CriticalCleared { temperature: f64, threshold: f64 },

    /// Outer loop moved the cooler parameter.
    ActuatorNudged {
        output: f64,
        parameter: f64,
        cooling_rate: f64,
    },

    /// Plant context placed a reading in the mailbox.
    ReadingPublished {
        temperature: f64,
        timestamp: f64,
        /// True when an unconsumed reading was overwritten.
        overwrote: bool,
    },

    /// Control context took a reading out of the mailbox.
    ReadingConsumed { temperature: f64, timestamp: f64 },
}

/// Destination for [`ControlEvent`]s.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &ControlEvent);
}

/// Forwards events to `tracing` with structured fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &ControlEvent) {
        match event {
            ControlEvent::PidStep(terms) => tracing::debug!(
                error = terms.error,
                proportional = terms.proportional,
                integral = terms.integral,
                derivative = terms.derivative,
                unclamped = terms.unclamped,
                output = terms.output,
                "pid step"
            ),
            ControlEvent::CriticalEntered {
                temperature,
                threshold,
                critical_temperature,
            } => tracing::warn!(
                temperature = *temperature,
                threshold = *threshold,
                critical_temperature = *critical_temperature,
                "tank temperature above critical threshold"
            ),
            ControlEvent::CriticalCleared {
                temperature,
                threshold,
            } => tracing::info!(
                temperature = *temperature,
                threshold = *threshold,
                "critical temperature warning cleared"
            ),
            ControlEvent::ActuatorNudged {
                output,
                parameter,
                cooling_rate,
            } => tracing::debug!(
                output = *output,
                parameter = *parameter,
                cooling_rate = *cooling_rate,
                "cooler parameter adjusted"
            ),
            ControlEvent::ReadingPublished {
                temperature,
                timestamp,
                overwrote,
            } => tracing::trace!(
                temperature = *temperature,
                timestamp = *timestamp,
                overwrote = *overwrote,
                "reading published"
            ),
            ControlEvent::ReadingConsumed {
                temperature,
                timestamp,
            } => tracing::trace!(
                temperature = *temperature,
                timestamp = *timestamp,
                "reading consumed"
            ),
        }
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &ControlEvent) {}
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ControlEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far.
    pub fn events(&self) -> Vec<ControlEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: &ControlEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
