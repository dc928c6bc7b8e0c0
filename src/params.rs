//! Strongly typed parameter enumerations for the HMC5883L driver.
//!
//! Each enum names the legal settings of one register field and converts to and
//! from that field's logical value (see [`codec`](crate::codec)). Prefer these
//! types over raw integers to keep configuration values valid and explicit.
//!
//! # Examples
//!
//! ```rust
//! use hmc5883l::params::{Gain, OperatingMode, SampleAverage};
//!
//! let gain = Gain::Ga1_3;
//! assert_eq!(gain.lsb_per_gauss(), 1_090);
//! let _ = (SampleAverage::Eight, OperatingMode::Continuous);
//! ```

use crate::codec::{self, Field, InvalidValue};

/// A typed setting backed by one register field.
pub trait FieldValue: Copy + Sized {
    /// Field this setting is stored in.
    const FIELD: Field;

    /// Returns the logical value understood by the codec.
    fn logical(self) -> u8;

    /// Builds the setting from a logical value, if it is legal.
    fn from_logical(value: u8) -> Option<Self>;

    /// Decodes the setting from a raw register byte.
    ///
    /// Reserved codes resolve to the last legal setting, as in [`codec::decode`].
    fn from_register(raw: u8) -> Self;
}

macro_rules! last_variant {
    ($last:ident) => {
        Self::$last
    };
    ($head:ident, $($tail:ident),+) => {
        last_variant!($($tail),+)
    };
}

macro_rules! field_value {
    ($ty:ident, $field:expr, { $($variant:ident = $value:literal),+ $(,)? }) => {
        impl FieldValue for $ty {
            const FIELD: Field = $field;

            fn logical(self) -> u8 {
                match self {
                    $(Self::$variant => $value,)+
                }
            }

            fn from_logical(value: u8) -> Option<Self> {
                match value {
                    $($value => Some(Self::$variant),)+
                    _ => None,
                }
            }

            fn from_register(raw: u8) -> Self {
                Self::from_logical(codec::decode($field, raw))
                    .unwrap_or(last_variant!($($variant),+))
            }
        }

        impl TryFrom<u8> for $ty {
            type Error = InvalidValue;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                Self::from_logical(value).ok_or(InvalidValue {
                    field: $field,
                    value,
                })
            }
        }

        impl From<$ty> for u8 {
            fn from(value: $ty) -> Self {
                value.logical()
            }
        }
    };
}

/// Number of samples averaged per measurement output (`CONFIG_A.MA`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleAverage {
    /// One sample (default).
    One,
    /// Two samples.
    Two,
    /// Four samples.
    Four,
    /// Eight samples.
    Eight,
}

field_value!(SampleAverage, Field::SampleAverage, {
    One = 1,
    Two = 2,
    Four = 4,
    Eight = 8,
});

/// Continuous-mode output data rates (`CONFIG_A.DO`).
///
/// The eighth register code is reserved and has no variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputRate {
    /// 0.75 Hz.
    Hz0_75,
    /// 1.5 Hz.
    Hz1_5,
    /// 3 Hz.
    Hz3,
    /// 7.5 Hz.
    Hz7_5,
    /// 15 Hz (default).
    Hz15,
    /// 30 Hz.
    Hz30,
    /// 75 Hz.
    Hz75,
}

field_value!(OutputRate, Field::OutputRate, {
    Hz0_75 = 0,
    Hz1_5 = 1,
    Hz3 = 2,
    Hz7_5 = 3,
    Hz15 = 4,
    Hz30 = 5,
    Hz75 = 6,
});

impl OutputRate {
    /// Returns the output rate in hertz.
    pub const fn hz(self) -> f32 {
        match self {
            Self::Hz0_75 => 0.75,
            Self::Hz1_5 => 1.5,
            Self::Hz3 => 3.0,
            Self::Hz7_5 => 7.5,
            Self::Hz15 => 15.0,
            Self::Hz30 => 30.0,
            Self::Hz75 => 75.0,
        }
    }
}

/// Measurement flow selection (`CONFIG_A.MS`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeasurementBias {
    /// Normal measurement (default).
    Normal,
    /// Positive bias current applied across the sensor.
    Positive,
    /// Negative bias current applied across the sensor.
    Negative,
}

field_value!(MeasurementBias, Field::MeasurementBias, {
    Normal = 0,
    Positive = 1,
    Negative = 2,
});

/// Gain selection (`CONFIG_B.GN`), named by recommended field range in gauss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gain {
    /// ±0.88 Ga, 1370 LSB/Ga.
    Ga0_88,
    /// ±1.3 Ga, 1090 LSB/Ga (default).
    Ga1_3,
    /// ±1.9 Ga, 820 LSB/Ga.
    Ga1_9,
    /// ±2.5 Ga, 660 LSB/Ga.
    Ga2_5,
    /// ±4.0 Ga, 440 LSB/Ga.
    Ga4_0,
    /// ±4.7 Ga, 390 LSB/Ga.
    Ga4_7,
    /// ±5.6 Ga, 330 LSB/Ga.
    Ga5_6,
    /// ±8.1 Ga, 230 LSB/Ga.
    Ga8_1,
}

field_value!(Gain, Field::Gain, {
    Ga0_88 = 0,
    Ga1_3 = 1,
    Ga1_9 = 2,
    Ga2_5 = 3,
    Ga4_0 = 4,
    Ga4_7 = 5,
    Ga5_6 = 6,
    Ga8_1 = 7,
});

impl Gain {
    /// Returns the recommended sensor field range in gauss.
    pub const fn range_gauss(self) -> f32 {
        match self {
            Self::Ga0_88 => 0.88,
            Self::Ga1_3 => 1.3,
            Self::Ga1_9 => 1.9,
            Self::Ga2_5 => 2.5,
            Self::Ga4_0 => 4.0,
            Self::Ga4_7 => 4.7,
            Self::Ga5_6 => 5.6,
            Self::Ga8_1 => 8.1,
        }
    }

    /// Returns the output sensitivity in counts per gauss.
    pub const fn lsb_per_gauss(self) -> u16 {
        match self {
            Self::Ga0_88 => 1_370,
            Self::Ga1_3 => 1_090,
            Self::Ga1_9 => 820,
            Self::Ga2_5 => 660,
            Self::Ga4_0 => 440,
            Self::Ga4_7 => 390,
            Self::Ga5_6 => 330,
            Self::Ga8_1 => 230,
        }
    }
}

/// Operating modes (`MODE.MD`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OperatingMode {
    /// Continuous measurement at the configured output rate.
    Continuous,
    /// One measurement, then back to idle (default).
    Single,
    /// Idle.
    Idle,
}

field_value!(OperatingMode, Field::Mode, {
    Continuous = 0,
    Single = 1,
    Idle = 2,
});
