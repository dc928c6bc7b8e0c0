//! Configuration primitives for the HMC5883L driver.

use crate::codec::Field;
use crate::params::{FieldValue, Gain, MeasurementBias, OperatingMode, OutputRate, SampleAverage};

/// User-facing configuration for the HMC5883L sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorConfig {
    /// Samples averaged per output.
    pub sample_average: SampleAverage,
    /// Continuous-mode output data rate.
    pub output_rate: OutputRate,
    /// Measurement bias selection.
    pub measurement_bias: MeasurementBias,
    /// Gain selection.
    pub gain: Gain,
    /// Operating mode.
    pub mode: OperatingMode,
}

impl SensorConfig {
    /// Begins building a [`SensorConfig`] using the builder pattern.
    pub fn new() -> SensorConfigBuilder {
        SensorConfigBuilder::new()
    }

    /// Decodes a configuration from raw `CONFIG_A`, `CONFIG_B` and `MODE` bytes.
    ///
    /// Reserved codes decode to the last legal setting of their field.
    pub fn from_registers(config_a: u8, config_b: u8, mode: u8) -> Self {
        Self {
            sample_average: SampleAverage::from_register(config_a),
            output_rate: OutputRate::from_register(config_a),
            measurement_bias: MeasurementBias::from_register(config_a),
            gain: Gain::from_register(config_b),
            mode: OperatingMode::from_register(mode),
        }
    }

    /// Returns the logical value currently configured for `field`.
    pub fn logical(&self, field: Field) -> u8 {
        match field {
            Field::SampleAverage => self.sample_average.logical(),
            Field::OutputRate => self.output_rate.logical(),
            Field::MeasurementBias => self.measurement_bias.logical(),
            Field::Gain => self.gain.logical(),
            Field::Mode => self.mode.logical(),
        }
    }
}

/// Builder for [`SensorConfig`] allowing piecemeal construction.
#[derive(Debug, Clone, Copy)]
pub struct SensorConfigBuilder {
    config: SensorConfig,
}

impl SensorConfigBuilder {
    /// Creates a new builder seeded with [`SensorConfig::default()`].
    pub fn new() -> Self {
        Self {
            config: SensorConfig::default(),
        }
    }

    /// Overrides the number of averaged samples.
    pub fn sample_average(mut self, average: SampleAverage) -> Self {
        self.config.sample_average = average;
        self
    }

    /// Overrides the output data rate.
    pub fn output_rate(mut self, rate: OutputRate) -> Self {
        self.config.output_rate = rate;
        self
    }

    /// Overrides the measurement bias.
    pub fn measurement_bias(mut self, bias: MeasurementBias) -> Self {
        self.config.measurement_bias = bias;
        self
    }

    /// Overrides the gain.
    pub fn gain(mut self, gain: Gain) -> Self {
        self.config.gain = gain;
        self
    }

    /// Overrides the operating mode.
    pub fn mode(mut self, mode: OperatingMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Finalizes the builder and returns the [`SensorConfig`].
    pub fn build(self) -> SensorConfig {
        self.config
    }
}

impl Default for SensorConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for SensorConfig {
    /// Power-on register values from the datasheet.
    fn default() -> Self {
        Self {
            sample_average: SampleAverage::One,
            output_rate: OutputRate::Hz15,
            measurement_bias: MeasurementBias::Normal,
            gain: Gain::Ga1_3,
            mode: OperatingMode::Single,
        }
    }
}
