//! Single-slot mailbox shared between the plant and control threads.
//!
//! Publishing overwrites any unconsumed value (last write wins) and taking
//! empties the slot, so each published value is consumed at most once.

use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};

/// Temperature report published by the plant side.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Tank temperature (°C)
    pub temperature: f64,
    /// Plant time at which the reading was taken (seconds since start)
    pub timestamp: f64,
    pub critical_temperature: f64,
}

/// Thread-safe optional slot.
#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Mutex<Option<T>>,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Mailbox<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Store `value`, returning the unconsumed value it replaced.
    pub fn publish(&self, value: T) -> Option<T> {
        self.lock().replace(value)
    }

    /// Remove and return the current value, leaving the slot empty.
    pub fn take(&self) -> Option<T> {
        self.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    // A panicking holder cannot leave the slot half-written
    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
