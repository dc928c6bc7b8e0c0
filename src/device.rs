//! High-level HMC5883L device driver implementation.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::codec::{self, Field};
use crate::config::SensorConfig;
use crate::error::{Error, Result};
use crate::interface::{Hmc5883lInterface, I2cInterface};
use crate::log::{log_debug, log_info, log_warn};
use crate::params::{FieldValue, Gain, MeasurementBias, OperatingMode, OutputRate, SampleAverage};
use crate::registers::{EXPECTED_IDENT, REG_CONFIG_A, REG_DATA_OUT, REG_IDENT_A};
use crate::self_test::{SelfTestReport, run_self_test};
use crate::store::{Reading, ReadingStore};

// Data output registers span X, Z, Y as MSB/LSB pairs.
const RAW_AXIS_BYTES: usize = 6;

/// Handle to one attached HMC5883L.
///
/// The handle owns the bus interface and borrows the [`ReadingStore`] that its
/// acquisition path publishes into. Readers keep their own `&ReadingStore` and
/// never need access to the handle.
pub struct Hmc5883l<'a, IFACE> {
    pub(crate) interface: IFACE,
    pub(crate) config: SensorConfig,
    pub(crate) readings: &'a ReadingStore,
}

impl<'a, IFACE> Hmc5883l<'a, IFACE> {
    // ==================================================================
    // == Ownership & Shared State ======================================
    // ==================================================================
    /// Provides mutable access to the underlying interface.
    pub fn interface_mut(&mut self) -> &mut IFACE {
        &mut self.interface
    }

    /// Returns the last configuration successfully written or read back.
    ///
    /// This is bookkeeping, not hardware truth; use
    /// [`read_config`](Self::read_config) to refresh it from the device.
    pub fn config(&self) -> &SensorConfig {
        &self.config
    }

    /// Returns the store this handle publishes readings into.
    pub fn readings(&self) -> &'a ReadingStore {
        self.readings
    }

    /// Returns a snapshot of the latest captured reading.
    pub fn reading(&self) -> Reading {
        self.readings.read()
    }
}

impl<'a, I2C> Hmc5883l<'a, I2cInterface<I2C>>
where
    I2C: I2c,
{
    // ==================================================================
    // == I2C Convenience Constructors ==================================
    // ==================================================================
    /// Attaches to a device at the default address (`0x1E`) on `i2c`.
    pub fn attach_i2c(i2c: I2C, readings: &'a ReadingStore) -> Result<Self, I2C::Error> {
        Self::attach(I2cInterface::default(i2c), readings)
    }

    /// Detaches the driver and returns the I²C bus.
    pub fn detach_i2c(self) -> I2C {
        self.detach().release()
    }
}

impl<'a, IFACE, CommE> Hmc5883l<'a, IFACE>
where
    IFACE: Hmc5883lInterface<Error = CommE>,
{
    // ==================================================================
    // == Lifecycle =====================================================
    // ==================================================================
    /// Attaches to the device behind `interface`.
    ///
    /// Performs one identification read to confirm a device answers, then
    /// resets `readings` to a zeroed, invalid reading. A failed read yields
    /// [`Error::NoDevice`] (or [`Error::Busy`] if the bus was contended).
    pub fn attach(mut interface: IFACE, readings: &'a ReadingStore) -> Result<Self, CommE> {
        let version = interface.read_register(REG_IDENT_A).map_err(|err| {
            if IFACE::is_busy(&err) {
                Error::Busy(err)
            } else {
                Error::NoDevice(err)
            }
        })?;
        log_debug!("HMC5883L identification byte {=u8:#x}", version);

        readings.reset();
        log_info!("HMC5883L attached");

        Ok(Self {
            interface,
            config: SensorConfig::default(),
            readings,
        })
    }

    /// Detaches the driver, resetting the reading store and returning the interface.
    pub fn detach(self) -> IFACE {
        self.readings.reset();
        log_info!("HMC5883L detached");
        self.interface
    }

    // ==================================================================
    // == Identification ================================================
    // ==================================================================
    /// Reads identification register A as an opaque diagnostic byte.
    pub fn version(&mut self) -> Result<u8, CommE> {
        self.read_register(REG_IDENT_A)
    }

    /// Verifies all three identification registers against `"H43"`.
    pub fn check_identity(&mut self) -> Result<(), CommE> {
        let mut ident = [0u8; 3];
        self.read_many(REG_IDENT_A, &mut ident)?;

        if ident != EXPECTED_IDENT {
            log_warn!("unexpected identification {:#x}", ident);
            return Err(Error::DeviceIdMismatch(ident));
        }

        Ok(())
    }

    // ==================================================================
    // == Whole Configuration ===========================================
    // ==================================================================
    /// Applies averaging, bias, gain and mode from `config`.
    ///
    /// The output rate cannot be written. A `config` whose rate differs from
    /// the one in `CONFIG_A` fails with [`Error::Unsupported`] before any write.
    pub fn configure(&mut self, config: SensorConfig) -> Result<(), CommE> {
        let current = self.read_register(REG_CONFIG_A)?;

        let device_rate = OutputRate::from_register(current);
        if device_rate != config.output_rate {
            log_warn!(
                "output rate {} requested, device fixed at {}",
                config.output_rate,
                device_rate
            );
            return Err(Error::Unsupported);
        }

        let updated = codec::merge(
            Field::SampleAverage,
            current,
            config.sample_average.logical(),
        )
        .and_then(|raw| codec::merge(Field::MeasurementBias, raw, config.measurement_bias.logical()))
        .map_err(|_| Error::InvalidArgument)?;

        if updated != current {
            self.write_register(REG_CONFIG_A, updated)?;
        }
        self.track_config_a(updated);

        self.set_gain(config.gain)?;
        self.set_mode(config.mode)?;
        Ok(())
    }

    /// Reads `CONFIG_A`, `CONFIG_B` and `MODE` and refreshes the tracked configuration.
    pub fn read_config(&mut self) -> Result<SensorConfig, CommE> {
        let mut raw = [0u8; 3];
        self.read_many(REG_CONFIG_A, &mut raw)?;

        self.config = SensorConfig::from_registers(raw[0], raw[1], raw[2]);
        Ok(self.config)
    }

    // ==================================================================
    // == Field Configuration ===========================================
    // ==================================================================
    /// Sets the gain. `CONFIG_B` holds only the gain, so it is written directly.
    pub fn set_gain(&mut self, gain: Gain) -> Result<(), CommE> {
        self.write_exclusive_field(gain)?;
        self.config.gain = gain;
        Ok(())
    }

    /// Reads the gain from `CONFIG_B`.
    pub fn gain(&mut self) -> Result<Gain, CommE> {
        self.read_field()
    }

    /// Sets the operating mode. `MODE` holds only the mode, so it is written directly.
    pub fn set_mode(&mut self, mode: OperatingMode) -> Result<(), CommE> {
        self.write_exclusive_field(mode)?;
        self.config.mode = mode;
        Ok(())
    }

    /// Reads the operating mode from `MODE`.
    pub fn mode(&mut self) -> Result<OperatingMode, CommE> {
        self.read_field()
    }

    /// Sets the measurement bias, preserving the other `CONFIG_A` fields.
    pub fn set_measurement_bias(&mut self, bias: MeasurementBias) -> Result<(), CommE> {
        self.update_config_a(bias)
    }

    /// Reads the measurement bias from `CONFIG_A`.
    pub fn measurement_bias(&mut self) -> Result<MeasurementBias, CommE> {
        self.read_field()
    }

    /// Sets the number of averaged samples, preserving the other `CONFIG_A` fields.
    pub fn set_sample_average(&mut self, average: SampleAverage) -> Result<(), CommE> {
        self.update_config_a(average)
    }

    /// Reads the number of averaged samples from `CONFIG_A`.
    pub fn sample_average(&mut self) -> Result<SampleAverage, CommE> {
        self.read_field()
    }

    /// Output rate writes are not wired to hardware.
    ///
    /// Always returns [`Error::Unsupported`] without touching the bus.
    pub fn set_output_rate(&mut self, rate: OutputRate) -> Result<(), CommE> {
        let _ = rate;
        Err(Error::Unsupported)
    }

    /// Reads the output rate from `CONFIG_A`.
    pub fn output_rate(&mut self) -> Result<OutputRate, CommE> {
        self.read_field()
    }

    /// Sets `field` from its raw logical value.
    ///
    /// Values outside the field's legal set fail with
    /// [`Error::InvalidArgument`] before any bus access.
    pub fn set_config(&mut self, field: Field, value: u8) -> Result<(), CommE> {
        match field {
            Field::SampleAverage => self.set_sample_average(Self::parse(value)?),
            Field::OutputRate => self.set_output_rate(Self::parse(value)?),
            Field::MeasurementBias => self.set_measurement_bias(Self::parse(value)?),
            Field::Gain => self.set_gain(Self::parse(value)?),
            Field::Mode => self.set_mode(Self::parse(value)?),
        }
    }

    /// Reads `field` from the device and returns its logical value.
    pub fn get_config(&mut self, field: Field) -> Result<u8, CommE> {
        let raw = self.read_register(field.register())?;
        Ok(codec::decode(field, raw))
    }

    // ==================================================================
    // == Polled Data Access & Self-Test ================================
    // ==================================================================
    /// Burst-reads the six data output registers and returns `[x, y, z]`.
    ///
    /// Does not touch the reading store. An axis that overflowed reads `-4096`.
    pub fn read_xyz_raw(&mut self) -> Result<[i16; 3], CommE> {
        let mut raw = [0u8; RAW_AXIS_BYTES];
        self.read_many(REG_DATA_OUT, &mut raw)?;

        let x = i16::from_be_bytes([raw[0], raw[1]]);
        let z = i16::from_be_bytes([raw[2], raw[3]]);
        let y = i16::from_be_bytes([raw[4], raw[5]]);

        Ok([x, y, z])
    }

    /// Executes the positive-bias self-test routine.
    pub fn run_self_test(&mut self, delay: &mut impl DelayNs) -> Result<SelfTestReport, CommE> {
        run_self_test(self, delay)
    }

    // ==================================================================
    // == Internal Bus Helpers ==========================================
    // ==================================================================
    fn bus_error(err: CommE) -> Error<CommE> {
        if IFACE::is_busy(&err) {
            Error::Busy(err)
        } else {
            Error::Interface(err)
        }
    }

    pub(crate) fn read_register(&mut self, register: u8) -> Result<u8, CommE> {
        self.interface
            .read_register(register)
            .map_err(Self::bus_error)
    }

    fn read_many(&mut self, register: u8, buf: &mut [u8]) -> Result<(), CommE> {
        self.interface
            .read_many(register, buf)
            .map_err(Self::bus_error)
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), CommE> {
        self.interface
            .write_register(register, value)
            .map_err(Self::bus_error)
    }

    fn read_field<V: FieldValue>(&mut self) -> Result<V, CommE> {
        let raw = self.read_register(V::FIELD.register())?;
        Ok(V::from_register(raw))
    }

    fn write_exclusive_field<V: FieldValue>(&mut self, value: V) -> Result<(), CommE> {
        let raw = codec::encode(V::FIELD, value.logical()).map_err(|_| Error::InvalidArgument)?;
        self.write_register(V::FIELD.register(), raw)
    }

    fn update_config_a<V: FieldValue>(&mut self, value: V) -> Result<(), CommE> {
        codec::encode(V::FIELD, value.logical()).map_err(|_| Error::InvalidArgument)?;

        let current = self.read_register(REG_CONFIG_A)?;
        let updated =
            codec::merge(V::FIELD, current, value.logical()).map_err(|_| Error::InvalidArgument)?;

        if updated != current {
            self.write_register(REG_CONFIG_A, updated)?;
        }

        self.track_config_a(updated);
        Ok(())
    }

    fn track_config_a(&mut self, config_a: u8) {
        let applied = SensorConfig::from_registers(config_a, 0, 0);
        self.config.sample_average = applied.sample_average;
        self.config.output_rate = applied.output_rate;
        self.config.measurement_bias = applied.measurement_bias;
    }

    fn parse<V: TryFrom<u8>>(value: u8) -> Result<V, CommE> {
        V::try_from(value).map_err(|_| Error::InvalidArgument)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::{REG_CONFIG_B, REG_MODE};
    use embedded_hal::i2c::ErrorKind;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};

    const ADDR: u8 = 0x1E;

    fn ident_read(version: u8) -> Transaction {
        Transaction::write_read(ADDR, vec![REG_IDENT_A], vec![version])
    }

    fn finish(driver: Hmc5883l<'_, I2cInterface<I2cMock>>) {
        driver.detach_i2c().done();
    }

    #[test]
    fn attach_reads_identification_and_resets_store() {
        let store = ReadingStore::new();
        store.publish(Reading::new(9, 9, 9));

        let i2c = I2cMock::new(&[ident_read(0x48)]);
        let driver = Hmc5883l::attach_i2c(i2c, &store).unwrap();

        assert_eq!(driver.reading(), Reading::ZERO);
        assert_eq!(*driver.config(), SensorConfig::default());
        finish(driver);
    }

    #[test]
    fn attach_without_answering_device_fails() {
        let store = ReadingStore::new();
        let expectations =
            [ident_read(0x00).with_error(ErrorKind::NoAcknowledge(
                embedded_hal::i2c::NoAcknowledgeSource::Address,
            ))];
        let mut i2c = I2cMock::new(&expectations);

        let result = Hmc5883l::attach_i2c(i2c.clone(), &store);
        assert!(matches!(result, Err(Error::NoDevice(_))));
        i2c.done();
    }

    #[test]
    fn attach_during_arbitration_loss_is_busy() {
        let store = ReadingStore::new();
        store.publish(Reading::new(5, 6, 7));
        let expectations = [ident_read(0x00).with_error(ErrorKind::ArbitrationLoss)];
        let mut i2c = I2cMock::new(&expectations);

        let error = match Hmc5883l::attach_i2c(i2c.clone(), &store) {
            Ok(_) => panic!("attach succeeded on a contended bus"),
            Err(error) => error,
        };
        assert_eq!(error, Error::Busy(ErrorKind::ArbitrationLoss));
        assert!(error.is_retryable());
        assert_eq!(store.read(), Reading::new(5, 6, 7));
        i2c.done();
    }

    #[test]
    fn check_identity_accepts_h43() {
        let store = ReadingStore::new();
        let i2c = I2cMock::new(&[
            ident_read(b'H'),
            Transaction::write_read(ADDR, vec![REG_IDENT_A], b"H43".to_vec()),
        ]);
        let mut driver = Hmc5883l::attach_i2c(i2c, &store).unwrap();

        driver.check_identity().unwrap();
        finish(driver);
    }

    #[test]
    fn check_identity_reports_mismatch() {
        let store = ReadingStore::new();
        let i2c = I2cMock::new(&[
            ident_read(b'H'),
            Transaction::write_read(ADDR, vec![REG_IDENT_A], vec![b'H', b'4', b'4']),
        ]);
        let mut driver = Hmc5883l::attach_i2c(i2c, &store).unwrap();

        assert_eq!(
            driver.check_identity(),
            Err(Error::DeviceIdMismatch(*b"H44"))
        );
        finish(driver);
    }

    #[test]
    fn set_mode_writes_mode_register() {
        let store = ReadingStore::new();
        let i2c = I2cMock::new(&[
            ident_read(0x48),
            Transaction::write(ADDR, vec![REG_MODE, 0x00]),
            Transaction::write_read(ADDR, vec![REG_MODE], vec![0x00]),
        ]);
        let mut driver = Hmc5883l::attach_i2c(i2c, &store).unwrap();

        driver.set_mode(OperatingMode::Continuous).unwrap();
        assert_eq!(driver.config().mode, OperatingMode::Continuous);
        assert_eq!(driver.mode().unwrap(), OperatingMode::Continuous);
        finish(driver);
    }

    #[test]
    fn busy_write_is_retryable_and_keeps_tracked_config() {
        let store = ReadingStore::new();
        let i2c = I2cMock::new(&[
            ident_read(0x48),
            Transaction::write(ADDR, vec![REG_CONFIG_B, 0xE0]).with_error(ErrorKind::ArbitrationLoss),
            Transaction::write(ADDR, vec![REG_CONFIG_B, 0xE0]).with_error(ErrorKind::Bus),
        ]);
        let mut driver = Hmc5883l::attach_i2c(i2c, &store).unwrap();

        let busy = driver.set_gain(Gain::Ga8_1).unwrap_err();
        assert_eq!(busy, Error::Busy(ErrorKind::ArbitrationLoss));
        assert!(busy.is_retryable());

        let hard = driver.set_gain(Gain::Ga8_1).unwrap_err();
        assert_eq!(hard, Error::Interface(ErrorKind::Bus));
        assert!(!hard.is_retryable());

        assert_eq!(driver.config().gain, Gain::Ga1_3);
        finish(driver);
    }

    #[test]
    fn measurement_bias_preserves_average_and_rate() {
        let store = ReadingStore::new();
        let i2c = I2cMock::new(&[
            ident_read(0x48),
            // 8 samples, 30 Hz, normal.
            Transaction::write_read(ADDR, vec![REG_CONFIG_A], vec![0b0111_0100]),
            Transaction::write(ADDR, vec![REG_CONFIG_A, 0b0111_0101]),
            Transaction::write_read(ADDR, vec![REG_CONFIG_A], vec![0b0111_0101]),
        ]);
        let mut driver = Hmc5883l::attach_i2c(i2c, &store).unwrap();

        driver.set_measurement_bias(MeasurementBias::Positive).unwrap();
        assert_eq!(driver.config().sample_average, SampleAverage::Eight);
        assert_eq!(driver.config().output_rate, OutputRate::Hz30);
        assert_eq!(driver.measurement_bias().unwrap(), MeasurementBias::Positive);
        finish(driver);
    }

    #[test]
    fn unchanged_config_a_is_not_rewritten() {
        let store = ReadingStore::new();
        let i2c = I2cMock::new(&[
            ident_read(0x48),
            Transaction::write_read(ADDR, vec![REG_CONFIG_A], vec![0x10]),
        ]);
        let mut driver = Hmc5883l::attach_i2c(i2c, &store).unwrap();

        driver.set_sample_average(SampleAverage::One).unwrap();
        finish(driver);
    }

    #[test]
    fn set_config_rejects_illegal_average_without_bus_traffic() {
        let store = ReadingStore::new();
        let i2c = I2cMock::new(&[ident_read(0x48)]);
        let mut driver = Hmc5883l::attach_i2c(i2c, &store).unwrap();

        for value in [0u8, 3, 5, 6, 7, 9, 12, 16, 255] {
            assert_eq!(
                driver.set_config(Field::SampleAverage, value),
                Err(Error::InvalidArgument)
            );
        }
        assert!(!Error::<ErrorKind>::InvalidArgument.is_retryable());
        finish(driver);
    }

    #[test]
    fn output_rate_is_unsupported_for_every_legal_rate() {
        let store = ReadingStore::new();
        let i2c = I2cMock::new(&[ident_read(0x48)]);
        let mut driver = Hmc5883l::attach_i2c(i2c, &store).unwrap();

        for rate in 0..=6u8 {
            assert_eq!(
                driver.set_config(Field::OutputRate, rate),
                Err(Error::Unsupported)
            );
        }
        assert_eq!(
            driver.set_config(Field::OutputRate, 7),
            Err(Error::InvalidArgument)
        );
        assert_eq!(driver.set_output_rate(OutputRate::Hz75), Err(Error::Unsupported));
        finish(driver);
    }

    #[test]
    fn get_config_decodes_field() {
        let store = ReadingStore::new();
        let i2c = I2cMock::new(&[
            ident_read(0x48),
            Transaction::write_read(ADDR, vec![REG_CONFIG_A], vec![0b0100_1000]),
            Transaction::write_read(ADDR, vec![REG_CONFIG_A], vec![0b0100_1000]),
        ]);
        let mut driver = Hmc5883l::attach_i2c(i2c, &store).unwrap();

        assert_eq!(driver.get_config(Field::SampleAverage).unwrap(), 4);
        assert_eq!(driver.get_config(Field::OutputRate).unwrap(), 2);
        finish(driver);
    }

    #[test]
    fn configure_applies_every_writable_field() {
        let store = ReadingStore::new();
        let i2c = I2cMock::new(&[
            ident_read(0x48),
            Transaction::write_read(ADDR, vec![REG_CONFIG_A], vec![0x10]),
            Transaction::write(ADDR, vec![REG_CONFIG_A, 0b0111_0010]),
            Transaction::write(ADDR, vec![REG_CONFIG_B, 0x40]),
            Transaction::write(ADDR, vec![REG_MODE, 0x00]),
        ]);
        let mut driver = Hmc5883l::attach_i2c(i2c, &store).unwrap();

        let config = SensorConfig::new()
            .sample_average(SampleAverage::Eight)
            .measurement_bias(MeasurementBias::Negative)
            .output_rate(OutputRate::Hz15)
            .gain(Gain::Ga1_9)
            .mode(OperatingMode::Continuous)
            .build();
        driver.configure(config).unwrap();

        assert_eq!(*driver.config(), config);
        finish(driver);
    }

    #[test]
    fn configure_with_different_rate_is_unsupported_and_writes_nothing() {
        let store = ReadingStore::new();
        let i2c = I2cMock::new(&[
            ident_read(0x48),
            // 1 sample, 15 Hz, normal.
            Transaction::write_read(ADDR, vec![REG_CONFIG_A], vec![0x10]),
        ]);
        let mut driver = Hmc5883l::attach_i2c(i2c, &store).unwrap();

        let config = SensorConfig::new()
            .sample_average(SampleAverage::Eight)
            .output_rate(OutputRate::Hz75)
            .gain(Gain::Ga4_7)
            .build();
        assert_eq!(driver.configure(config), Err(Error::Unsupported));
        assert_eq!(*driver.config(), SensorConfig::default());
        finish(driver);
    }

    #[test]
    fn read_config_refreshes_tracked_state() {
        let store = ReadingStore::new();
        let i2c = I2cMock::new(&[
            ident_read(0x48),
            Transaction::write_read(ADDR, vec![REG_CONFIG_A], vec![0x78, 0xA0, 0x00]),
        ]);
        let mut driver = Hmc5883l::attach_i2c(i2c, &store).unwrap();

        let config = driver.read_config().unwrap();
        assert_eq!(config.sample_average, SampleAverage::Eight);
        assert_eq!(config.output_rate, OutputRate::Hz75);
        assert_eq!(config.gain, Gain::Ga4_7);
        assert_eq!(config.mode, OperatingMode::Continuous);
        assert_eq!(*driver.config(), config);
        finish(driver);
    }

    #[test]
    fn read_xyz_raw_reorders_x_z_y() {
        let store = ReadingStore::new();
        let i2c = I2cMock::new(&[
            ident_read(0x48),
            Transaction::write_read(
                ADDR,
                vec![REG_DATA_OUT],
                vec![0x01, 0x00, 0xFF, 0x38, 0xF0, 0x00],
            ),
        ]);
        let mut driver = Hmc5883l::attach_i2c(i2c, &store).unwrap();

        assert_eq!(driver.read_xyz_raw().unwrap(), [256, -4096, -200]);
        assert_eq!(driver.reading(), Reading::ZERO);
        finish(driver);
    }
}
