//! Declarative field table and pure register codec.
//!
//! Every configuration field is described once in [`FIELD_TABLE`]: the register
//! it lives in, its bit position and width, and the logical values it accepts.
//! [`encode`], [`decode`] and [`merge`] consult only that table, so auditing or
//! adding a field touches a single entry.
//!
//! Logical values are the numbers a user thinks in (an averaging count of `8`,
//! gain index `3`); codes are what the hardware stores (`0b11`, `0b011`). The
//! code of a logical value is its position in the field's legal set.

use crate::registers::{CONFIG_A_RESERVED_MASK, REG_CONFIG_A, REG_CONFIG_B, REG_MODE};

/// Logical configuration fields backed by bit-packed registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Field {
    /// Samples averaged per measurement output (`CONFIG_A[6:5]`).
    SampleAverage,
    /// Continuous-mode output data rate (`CONFIG_A[4:2]`).
    OutputRate,
    /// Measurement bias / self-test flow (`CONFIG_A[1:0]`).
    MeasurementBias,
    /// Gain index into the sensitivity table (`CONFIG_B[7:5]`).
    Gain,
    /// Operating mode (`MODE[1:0]`).
    Mode,
}

/// Location and legal values of one register field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Register address holding the field.
    pub register: u8,
    /// Position of the field's least significant bit.
    pub offset: u8,
    /// Field width in bits.
    pub width: u8,
    /// Legal logical values, indexed by their register code.
    pub legal: &'static [u8],
}

impl FieldSpec {
    /// Returns the in-register mask covering this field.
    pub const fn mask(&self) -> u8 {
        (((1u16 << self.width) - 1) as u8) << self.offset
    }
}

/// Field table indexed by [`Field`] declaration order.
pub static FIELD_TABLE: [FieldSpec; 5] = [
    FieldSpec {
        register: REG_CONFIG_A,
        offset: 5,
        width: 2,
        legal: &[1, 2, 4, 8],
    },
    FieldSpec {
        register: REG_CONFIG_A,
        offset: 2,
        width: 3,
        // Code 7 is reserved.
        legal: &[0, 1, 2, 3, 4, 5, 6],
    },
    FieldSpec {
        register: REG_CONFIG_A,
        offset: 0,
        width: 2,
        // Code 3 is reserved.
        legal: &[0, 1, 2],
    },
    FieldSpec {
        register: REG_CONFIG_B,
        offset: 5,
        width: 3,
        legal: &[0, 1, 2, 3, 4, 5, 6, 7],
    },
    FieldSpec {
        register: REG_MODE,
        offset: 0,
        width: 2,
        // Code 3 also selects idle on the device.
        legal: &[0, 1, 2],
    },
];

impl Field {
    /// All fields, in table order.
    pub const ALL: [Field; 5] = [
        Field::SampleAverage,
        Field::OutputRate,
        Field::MeasurementBias,
        Field::Gain,
        Field::Mode,
    ];

    /// Returns the table entry describing this field.
    pub fn spec(self) -> &'static FieldSpec {
        &FIELD_TABLE[self as usize]
    }

    /// Returns the register address holding this field.
    pub fn register(self) -> u8 {
        self.spec().register
    }
}

/// A logical value that has no encoding in its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InvalidValue {
    /// Field the value was meant for.
    pub field: Field,
    /// Rejected logical value.
    pub value: u8,
}

/// Encodes a logical value into its in-register bit position.
///
/// Bits outside the field are zero.
pub fn encode(field: Field, logical: u8) -> Result<u8, InvalidValue> {
    let spec = field.spec();
    let code = spec
        .legal
        .iter()
        .position(|&legal| legal == logical)
        .ok_or(InvalidValue {
            field,
            value: logical,
        })?;

    Ok((code as u8) << spec.offset)
}

/// Decodes the logical value of a field from a raw register byte.
///
/// Bits outside the field are ignored. Reserved codes decode to the nearest
/// defined value, the last entry of the legal set.
pub fn decode(field: Field, raw: u8) -> u8 {
    let spec = field.spec();
    let code = usize::from((raw & spec.mask()) >> spec.offset);
    spec.legal
        .get(code)
        .or(spec.legal.last())
        .copied()
        .unwrap_or_default()
}

/// Replaces one field inside a register byte, keeping every other field.
///
/// Reserved register bits are cleared.
pub fn merge(field: Field, current: u8, logical: u8) -> Result<u8, InvalidValue> {
    let spec = field.spec();
    let encoded = encode(field, logical)?;
    let mut cleared = current & !spec.mask();
    if spec.register == REG_CONFIG_A {
        cleared &= !CONFIG_A_RESERVED_MASK;
    }

    Ok(cleared | encoded)
}
