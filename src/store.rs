//! Shared storage for the most recent magnetometer reading.
//!
//! The store is written by exactly one acquisition context and may be read
//! from any number of others. Both sides take the same lock, so a reader sees
//! either the whole previous triple or the whole new one.
//!
//! ```rust
//! use hmc5883l::ReadingStore;
//!
//! static READINGS: ReadingStore = ReadingStore::new();
//!
//! let reading = READINGS.read();
//! assert!(!reading.valid);
//! ```

use core::cell::Cell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use crate::params::Gain;

/// One captured X/Y/Z sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    /// X-axis output.
    pub x: i16,
    /// Y-axis output.
    pub y: i16,
    /// Z-axis output.
    pub z: i16,
    /// `false` until the first successful capture after attach.
    pub valid: bool,
}

impl Reading {
    /// Zeroed, invalid reading.
    pub const ZERO: Self = Self {
        x: 0,
        y: 0,
        z: 0,
        valid: false,
    };

    /// Builds a valid reading from axis outputs.
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self {
            x,
            y,
            z,
            valid: true,
        }
    }

    /// Returns the axes as `[x, y, z]`.
    pub const fn axes(&self) -> [i16; 3] {
        [self.x, self.y, self.z]
    }

    /// Scales the axes to gauss for the gain active during capture.
    pub fn to_gauss(&self, gain: Gain) -> [f32; 3] {
        let scale = f32::from(gain.lsb_per_gauss());
        self.axes().map(|axis| f32::from(axis) / scale)
    }
}

impl Default for Reading {
    fn default() -> Self {
        Self::ZERO
    }
}

/// Lock-protected cell holding the latest [`Reading`].
pub struct ReadingStore {
    inner: Mutex<CriticalSectionRawMutex, Cell<Reading>>,
}

impl ReadingStore {
    /// Creates an empty store holding [`Reading::ZERO`].
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(Reading::ZERO)),
        }
    }

    /// Returns a consistent snapshot of the latest reading.
    pub fn read(&self) -> Reading {
        self.inner.lock(|cell| cell.get())
    }

    /// Replaces the stored reading in one locked step.
    pub(crate) fn publish(&self, reading: Reading) {
        self.inner.lock(|cell| cell.set(reading));
    }

    /// Drops back to [`Reading::ZERO`].
    pub(crate) fn reset(&self) {
        self.publish(Reading::ZERO);
    }
}

impl Default for ReadingStore {
    fn default() -> Self {
        Self::new()
    }
}
