//! Report cadence for producers that publish on a fixed interval.
//!
//! The clock is driven by elapsed seconds supplied by the caller, so the same
//! type serves wall-clock loops and deterministic tests.

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Tracks when the next report is due.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReportClock {
    /// Report interval in seconds.
    interval: f64,
    /// Time of next scheduled report.
    next_report_time: f64,
}

impl ReportClock {
    /// Create a new report clock.
    ///
    /// # Arguments
    ///
    /// * `interval` - Report interval in seconds (must be positive)
    /// * `initial_time` - Time the clock starts at; the first report is due one interval later
    pub fn new(interval: f64, initial_time: f64) -> ControlResult<Self> {
        if !interval.is_finite() || interval <= 0.0 {
            return Err(ControlError::InvalidConfiguration {
                what: "report interval must be finite and positive",
            });
        }
        Ok(Self {
            interval,
            next_report_time: initial_time + interval,
        })
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    /// Returns `true` if `current_time >= next_report_time`.
    pub fn should_report(&self, current_time: f64) -> bool {
        current_time >= self.next_report_time
    }

    /// Advance past `current_time`.
    ///
    /// Reports missed while the caller was late are skipped, not replayed.
    pub fn advance(&mut self, current_time: f64) {
        self.next_report_time += self.interval;
        if self.next_report_time <= current_time {
            let behind = ((current_time - self.next_report_time) / self.interval).floor() + 1.0;
            self.next_report_time += behind * self.interval;
        }
    }
}
