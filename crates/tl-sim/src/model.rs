//! Plant trait for processes driven directly by a controller output.

use crate::error::SimResult;

/// A simulated process with one observable value and one driving input.
///
/// The synchronous driver reads `value`, feeds it to the controller, and
/// hands the raw controller output back through `update`.
pub trait Plant {
    /// Current process value.
    fn value(&self) -> f64;

    /// Advance the process by `dt` under the given driving value.
    fn update(&mut self, drive: f64, dt: f64) -> SimResult<()>;
}
