//! Plant models and execution drivers for thermoloop.
//!
//! Provides:
//! - `Plant` trait for processes a controller can drive directly
//! - First-order lag transmitter and self-heating thermal tank
//! - Fixed-step synchronous drivers (direct and cooler-in-the-loop)
//! - Single-slot mailbox and a two-thread live driver with explicit shutdown

pub mod cooled;
pub mod error;
pub mod lag;
pub mod live;
pub mod mailbox;
pub mod model;
pub mod sim;
pub mod tank;

// Re-exports for public API
pub use cooled::{CooledRecord, CooledTank, run_cooled_tank};
pub use error::{SimError, SimResult};
pub use lag::LagProcess;
pub use live::{
    LiveChannels, LiveConfig, LiveHandle, LiveOutcome, LiveSample, LiveSystem, StopSignal,
    run_control_loop, run_live_for, run_plant_loop, spawn_live,
};
pub use mailbox::{Mailbox, Reading};
pub use model::Plant;
pub use sim::{MAX_STEPS, SimRecord, SimulationConfig, run_sim};
pub use tank::{CRITICAL_FRACTION, Disturbance, ThermalTank, ThermalTankConfig};
