//! tl-core: stable foundation for thermoloop.
//!
//! Contains:
//! - units (uom time quantities + temperature scale conversion)
//! - numeric (float validation helpers)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{TlError, TlResult};
pub use numeric::*;
pub use units::*;
