//! Single-slot relay between two independently triggered hooks.

use std::sync::{Mutex, PoisonError};

/// Last-write-wins cell shared by a producer hook and its consumers.
///
/// Hook callbacks run on whatever thread the host uses for the intercepted
/// call, so the slot is guarded even though the producer and consumers of
/// the colour relay normally share the UI thread.
#[derive(Debug)]
pub struct RelaySlot<T> {
    value: Mutex<Option<T>>,
    sentinel: T,
}

impl<T: Copy + PartialEq> RelaySlot<T> {
    /// Empty slot. Writes equal to `sentinel` mean "unset" and are dropped.
    pub fn new(sentinel: T) -> Self {
        Self {
            value: Mutex::new(None),
            sentinel,
        }
    }

    /// Store `value` unless it is the sentinel. Returns whether it was stored.
    pub fn write(&self, value: T) -> bool {
        if value == self.sentinel {
            return false;
        }
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = Some(value);
        true
    }

    pub fn read(&self) -> Option<T> {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Navigation bar colour captured from the window, `0` meaning "not set".
pub type ColorRelay = RelaySlot<i32>;

impl Default for ColorRelay {
    fn default() -> Self {
        Self::new(0)
    }
}
