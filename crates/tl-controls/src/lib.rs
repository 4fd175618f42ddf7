//! Control primitives for thermoloop.
//!
//! This crate holds everything that lives on the controller side of the loop:
//! the PID algorithm, the staged cooler it ultimately drives, the outer
//! bang-bang step that maps PID output onto the cooler parameter, setpoint
//! schedules, and the structured event stream used for telemetry.
//!
//! # Architecture
//!
//! - Configuration is a validated value object (`PidConfig`); running state is
//!   explicit and inspectable (`PidState`)
//! - Controllers and actuators never print; they emit `ControlEvent`s into an
//!   injected `EventSink`
//! - The PID output and the cooler parameter live in different physical spaces
//!   and are coupled only through `ParameterNudge`

pub mod actuator;
pub mod controller;
pub mod error;
pub mod events;
pub mod outer;
pub mod sampled;
pub mod schedule;

pub use actuator::{CoolingCurve, STAGE_COUNT, StagedCooler};
pub use controller::{OutputBounds, PidConfig, PidController, PidState, PidTerms};
pub use error::{ControlError, ControlResult};
pub use events::{ControlEvent, EventSink, NullSink, RecordingSink, TracingSink};
pub use outer::ParameterNudge;
pub use sampled::ReportClock;
pub use schedule::SetpointSchedule;
