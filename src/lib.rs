#![cfg_attr(not(test), no_std)]
#![doc = include_str!("../README.md")]

mod error;
mod log;

pub mod acquisition;
pub mod codec;
pub mod config;
pub mod device;
pub mod interface;
pub mod params;
pub mod registers;
pub mod store;

pub use crate::acquisition::{Capture, DataReadySignal, DeviceStatus};
pub use crate::codec::Field;
pub use crate::config::SensorConfig;
pub use crate::device::Hmc5883l;
pub use crate::error::{Error, Result};
pub use crate::interface::{Hmc5883lInterface, I2cInterface};
pub use crate::store::{Reading, ReadingStore};

/// Fixed 7-bit I²C address of the HMC5883L.
pub const DEFAULT_I2C_ADDRESS: u8 = 0x1E;
