//! Error handling primitives for the HMC5883L driver.

/// Crate-wide result type alias.
pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Error variants produced by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Any error reported by the underlying bus interface.
    Interface(E),
    /// The bus reported a transient busy condition. Safe to retry.
    Busy(E),
    /// A logical value lies outside the legal set of its register field.
    InvalidArgument,
    /// The operation is not wired to hardware.
    Unsupported,
    /// No device answered the identification read during attach.
    NoDevice(E),
    /// Identification registers did not read back as `"H43"`.
    DeviceIdMismatch([u8; 3]),
}

impl<E> Error<E> {
    /// Returns `true` when repeating the failed operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Busy(_))
    }
}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Self::Interface(err)
    }
}
