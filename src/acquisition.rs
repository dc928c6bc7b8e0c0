//! Interrupt-driven acquisition.
//!
//! The platform's data-ready interrupt handler does not touch the bus. It only
//! posts to a [`DataReadySignal`]:
//!
//! ```rust,ignore
//! static DATA_READY: DataReadySignal = DataReadySignal::new();
//!
//! #[interrupt]
//! fn EXTI0() {
//!     DATA_READY.signal(());
//! }
//! ```
//!
//! A single acquisition context owns the [`Hmc5883l`] handle and consumes the
//! signal, either by polling [`Hmc5883l::service`] from a main loop or by
//! awaiting [`Hmc5883l::run`] in a task. Each notification runs one capture
//! cycle. Posts that arrive while a cycle is pending coalesce into one.
//!
//! Capture cycles are serialized by the `&mut` borrow of the handle. The
//! finished triple is published to the [`ReadingStore`](crate::ReadingStore)
//! in one locked step, so readers never see a mix of old and new axes.

use core::convert::Infallible;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;

use crate::device::Hmc5883l;
use crate::error::Result;
use crate::interface::Hmc5883lInterface;
use crate::log::{log_debug, log_error, log_trace};
use crate::registers::{REG_DATA_OUT, REG_STATUS, Status};
use crate::store::Reading;

/// Data-ready notification posted from interrupt context.
pub type DataReadySignal = Signal<CriticalSectionRawMutex, ()>;

/// Device status derived from one read of the `STATUS` register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceStatus {
    /// `STATUS.RDY`: a new sample is in the data output registers.
    pub data_ready: bool,
    /// `STATUS.LOCK`: the data output registers are locked.
    pub register_locked: bool,
}

impl DeviceStatus {
    /// Returns `true` when a capture may read the data registers.
    ///
    /// Requires both ready and locked.
    // TODO: confirm the ready-and-locked condition against the datasheet's lock semantics.
    pub const fn permits_capture(&self) -> bool {
        self.data_ready && self.register_locked
    }
}

impl From<Status> for DeviceStatus {
    fn from(status: Status) -> Self {
        Self {
            data_ready: status.data_ready(),
            register_locked: status.locked(),
        }
    }
}

/// Outcome of one capture cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Capture {
    /// A new reading was published.
    Captured(Reading),
    /// The status guard did not pass; the previous reading was kept.
    Skipped(DeviceStatus),
}

impl<'a, IFACE, CommE> Hmc5883l<'a, IFACE>
where
    IFACE: Hmc5883lInterface<Error = CommE>,
{
    /// Reads the `STATUS` register.
    pub fn read_device_status(&mut self) -> Result<DeviceStatus, CommE> {
        let raw = self.read_register(REG_STATUS)?;
        Ok(Status::from(raw).into())
    }

    /// Runs one capture cycle in response to a data-ready notification.
    ///
    /// When the status guard passes, the data register is read three times
    /// (X, then Y, then Z) and the result is published as a valid reading. Each
    /// axis holds the single byte returned by its read; use
    /// [`read_xyz_raw`](Self::read_xyz_raw) for full 16-bit outputs.
    ///
    /// A skipped cycle is not an error. A bus error aborts the cycle and leaves
    /// the published reading untouched.
    pub fn on_data_ready(&mut self) -> Result<Capture, CommE> {
        let status = self.read_device_status()?;
        if !status.permits_capture() {
            log_debug!("data not ready");
            return Ok(Capture::Skipped(status));
        }

        let x = self.read_register(REG_DATA_OUT)?;
        let y = self.read_register(REG_DATA_OUT)?;
        let z = self.read_register(REG_DATA_OUT)?;

        let reading = Reading::new(i16::from(x), i16::from(y), i16::from(z));
        self.readings.publish(reading);
        log_trace!("captured {} {} {}", reading.x, reading.y, reading.z);

        Ok(Capture::Captured(reading))
    }

    /// Runs a capture cycle if `signal` has a pending notification.
    ///
    /// Returns `Ok(None)` without bus traffic when nothing is pending.
    pub fn service(&mut self, signal: &DataReadySignal) -> Result<Option<Capture>, CommE> {
        match signal.try_take() {
            Some(()) => self.on_data_ready().map(Some),
            None => Ok(None),
        }
    }

    /// Waits for the next notification on `signal`, then runs one capture cycle.
    pub async fn wait_and_capture(&mut self, signal: &DataReadySignal) -> Result<Capture, CommE> {
        signal.wait().await;
        self.on_data_ready()
    }

    /// Acquisition task body: captures on every notification until a bus error.
    ///
    /// The error is returned so the owner can decide whether to re-attach.
    pub async fn run(&mut self, signal: &DataReadySignal) -> Result<Infallible, CommE> {
        loop {
            if let Err(err) = self.wait_and_capture(signal).await {
                log_error!("acquisition stopped on bus error");
                return Err(err);
            }
        }
    }
}
