//! Register map definitions for the HMC5883L magnetometer.
#![allow(unused_parens)]

use modular_bitfield::prelude::*;

/// Register address of `CONFIG_A` (averaging, output rate, measurement bias).
pub const REG_CONFIG_A: u8 = 0x00;
/// Register address of `CONFIG_B` (gain).
pub const REG_CONFIG_B: u8 = 0x01;
/// Register address of `MODE`.
pub const REG_MODE: u8 = 0x02;
/// Register address of `DATA_OUT_X_MSB`, the first data output register.
pub const REG_DATA_OUT: u8 = 0x03;
/// Register address of `STATUS`.
pub const REG_STATUS: u8 = 0x09;
/// Register address of `IDENT_A`.
pub const REG_IDENT_A: u8 = 0x0A;
/// Register address of `IDENT_B`.
pub const REG_IDENT_B: u8 = 0x0B;
/// Register address of `IDENT_C`.
pub const REG_IDENT_C: u8 = 0x0C;

/// Expected contents of `IDENT_A..=IDENT_C`.
pub const EXPECTED_IDENT: [u8; 3] = *b"H43";

/// `CONFIG_A` bit 7 must always be written as zero.
pub const CONFIG_A_RESERVED_MASK: u8 = 0b1000_0000;

/// Bitfield representation of the `STATUS` register (address `0x09`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    // Data ready flag (bit 0).
    pub data_ready: bool,
    // Data output register lock (bit 1).
    pub locked: bool,
    #[skip]
    __: B6,
}

impl From<u8> for Status {
    fn from(value: u8) -> Self {
        Self::from_bytes([value])
    }
}

impl From<Status> for u8 {
    fn from(value: Status) -> Self {
        value.into_bytes()[0]
    }
}
