//! Bus interface abstraction for the HMC5883L driver.

pub mod i2c;

pub use i2c::I2cInterface;

/// Abstraction over the low-level bus access required by the driver.
///
/// Implementations own the device address; every call targets the single
/// device the adapter was built for.
pub trait Hmc5883lInterface {
    /// Error type produced by the concrete bus implementation.
    type Error;

    /// Writes a single register.
    fn write_register(&mut self, register: u8, value: u8) -> core::result::Result<(), Self::Error>;

    /// Reads a single register.
    fn read_register(&mut self, register: u8) -> core::result::Result<u8, Self::Error>;

    /// Reads consecutive registers into the provided buffer.
    ///
    /// The device's internal address pointer auto-increments between bytes.
    fn read_many(&mut self, register: u8, buf: &mut [u8]) -> core::result::Result<(), Self::Error>;

    /// Classifies a transport error as a transient busy condition.
    ///
    /// Busy errors surface as [`Error::Busy`](crate::Error::Busy) and may be retried.
    /// The default treats every error as a hard failure.
    fn is_busy(error: &Self::Error) -> bool {
        let _ = error;
        false
    }
}
