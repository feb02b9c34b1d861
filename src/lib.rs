//! Driver for the Bosch BMP180 barometric pressure and temperature sensor.
//!
//! All compensation is done in integer fixed-point exactly as in the datasheet; only the
//! unit conversions in [`conversion`] use floating point.
#![cfg_attr(not(test), no_std)]
use embedded_hal::{delay::DelayNs, i2c::I2c};
use log::{debug, trace, warn};
mod calibration;
mod command;
mod config;
pub mod conversion;
mod error;
pub use calibration::{
    Calibration, CompensatedTemperature, Oversampling, TEMPERATURE_CONVERSION_US,
};
use command::{Command, Register};
pub use command::DEVICE_ADDRESS;
pub use config::{Config, DEFAULT_AVERAGING_SAMPLES};
pub use error::{ComputeError, DeviceError};

/// Settle time after bus bring-up in MICROSECONDS.
const BUS_INIT_SETTLE_US: u32 = 10;

pub struct Bmp180<I2C, D> {
    i2c: I2C,
    delay: D,
    config: Config,
    calibration: Option<Calibration>,
    // B5, shared between temperature and pressure compensation
    b5: Option<i32>,
}

impl<I2C, D> Bmp180<I2C, D>
where
    I2C: I2c,
    D: DelayNs,
{
    /// Create a new, uncalibrated session. Call [`Bmp180::init`] before reading.
    pub fn new(i2c: I2C, delay: D, config: Config) -> Result<Self, DeviceError<I2C::Error>> {
        if !config.is_valid() {
            return Err(DeviceError::InvalidConfig);
        }

        Ok(Self {
            i2c,
            delay,
            config,
            calibration: None,
            b5: None,
        })
    }

    /// Reads the factory calibration and takes one temperature reading so that the
    /// correction term is established before the first pressure reading.
    /// Only needs to be called once per session.
    pub fn init(&mut self) -> Result<(), DeviceError<I2C::Error>> {
        if !self.config.skip_bus_init {
            self.delay.delay_us(BUS_INIT_SETTLE_US);
        }

        let calibration = self.read_calibration()?;
        debug!("bmp180 calibration: {:?}", calibration);
        self.update_temperature(&calibration)?;
        self.calibration = Some(calibration);
        debug!("bmp180 ready, {:?}", self.config.oversampling);

        Ok(())
    }

    /// Install calibration coefficients obtained elsewhere, skipping the E2PROM read.
    ///
    /// No correction term exists afterwards; unless auto-update is enabled, take a
    /// temperature reading before reading pressure.
    pub fn with_calibration(mut self, calibration: Calibration) -> Self {
        self.calibration = Some(calibration);
        self.b5 = None;
        self
    }

    pub fn calibration(&self) -> Option<&Calibration> {
        self.calibration.as_ref()
    }

    /// The current correction term B5, if a temperature reading has been taken.
    pub fn correction_term(&self) -> Option<i32> {
        self.b5
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn oversampling(&self) -> Oversampling {
        self.config.oversampling
    }

    pub fn set_oversampling(&mut self, oversampling: Oversampling) {
        self.config.oversampling = oversampling;
    }

    /// Like [`Bmp180::set_oversampling`] for a raw level in 0..=3.
    pub fn set_oversampling_level(&mut self, level: u8) -> Result<(), DeviceError<I2C::Error>> {
        self.config.oversampling =
            Oversampling::try_from(level).map_err(DeviceError::InvalidOversampling)?;
        Ok(())
    }

    /// Temperature in 0.1 °C. Refreshes the correction term.
    pub fn temperature(&mut self) -> Result<i16, DeviceError<I2C::Error>> {
        let calibration = self.calibration.ok_or(DeviceError::Uncalibrated)?;
        Ok(self.update_temperature(&calibration)?.tenths)
    }

    pub fn celsius(&mut self) -> Result<f64, DeviceError<I2C::Error>> {
        Ok(conversion::celsius(self.temperature()?))
    }

    /// Pressure in Pa at the configured oversampling.
    pub fn pressure(&mut self) -> Result<i32, DeviceError<I2C::Error>> {
        self.pressure_with_oversampling(self.config.oversampling)
    }

    /// Pressure in Pa at the given oversampling, leaving the session setting untouched.
    pub fn pressure_with_oversampling(
        &mut self,
        oss: Oversampling,
    ) -> Result<i32, DeviceError<I2C::Error>> {
        let calibration = self.calibration.ok_or(DeviceError::Uncalibrated)?;

        if self.config.auto_update_temperature {
            self.update_temperature(&calibration)?;
        }

        let (up, b5) = if self.config.averaging_enabled {
            self.read_averaged(&calibration, oss)?
        } else {
            let b5 = self.b5.ok_or(DeviceError::NoCorrectionTerm)?;
            (self.read_raw_pressure(oss)?, b5)
        };

        calibration
            .compensate_pressure(up, oss, b5)
            .map_err(|e| {
                warn!("bmp180 pressure compensation failed: {:?}", e);
                e.into()
            })
    }

    pub fn hpa(&mut self) -> Result<f64, DeviceError<I2C::Error>> {
        Ok(conversion::hpa(self.pressure()?))
    }

    /// Altitude in meters from a fresh pressure reading, given the sea level pressure in hPa.
    pub fn altitude(&mut self, sea_level_hpa: f64) -> Result<f64, DeviceError<I2C::Error>> {
        Ok(conversion::altitude(self.hpa()?, sea_level_hpa))
    }

    /// Sea level pressure in hPa from a fresh pressure reading, given the altitude in meters.
    pub fn sea_level_pressure(&mut self, altitude_m: f64) -> Result<f64, DeviceError<I2C::Error>> {
        Ok(conversion::sea_level_pressure(self.hpa()?, altitude_m))
    }

    /// Destroy the session and hand back the bus and delay.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    /// Reads one raw temperature sample and makes its B5 the current correction term.
    fn update_temperature(
        &mut self,
        calibration: &Calibration,
    ) -> Result<CompensatedTemperature, DeviceError<I2C::Error>> {
        let ut = self.read_raw_temperature()?;
        let temperature = calibration.compensate_temperature(ut).map_err(|e| {
            warn!("bmp180 temperature compensation failed, ut={}: {:?}", ut, e);
            e
        })?;
        trace!("ut={} b5={} t={}", ut, temperature.b5, temperature.tenths);
        self.b5 = Some(temperature.b5);

        Ok(temperature)
    }

    /// N x {raw pressure, temperature}, returning the mean raw pressure and mean B5.
    /// The mean B5 also becomes the current correction term.
    fn read_averaged(
        &mut self,
        calibration: &Calibration,
        oss: Oversampling,
    ) -> Result<(i32, i32), DeviceError<I2C::Error>> {
        let samples = self.config.averaging_samples;
        let mut sum_up: i64 = 0;
        let mut sum_b5: i64 = 0;

        for _ in 0..samples {
            sum_up += self.read_raw_pressure(oss)? as i64;
            sum_b5 += self.update_temperature(calibration)?.b5 as i64;
        }

        let up = (sum_up / samples as i64) as i32;
        let b5 = (sum_b5 / samples as i64) as i32;
        trace!("averaged {} samples: up={} b5={}", samples, up, b5);
        self.b5 = Some(b5);

        Ok((up, b5))
    }

    fn read_calibration(&mut self) -> Result<Calibration, DeviceError<I2C::Error>> {
        let mut buf = [0u8; Calibration::LEN];
        let base = Register::Calibration.value();
        for (i, word) in buf.chunks_exact_mut(2).enumerate() {
            self.read_registers(base + 2 * i as u8, word)?;
        }

        Ok(Calibration::from_bytes(&buf))
    }

    fn read_raw_temperature(&mut self) -> Result<u16, DeviceError<I2C::Error>> {
        self.write_register(Register::Control, Command::ConvertTemperature.value())?;
        self.delay.delay_us(TEMPERATURE_CONVERSION_US);

        let mut buf = [0u8; 2];
        self.read_registers(Register::Data.value(), &mut buf)?;

        Ok(u16::from_be_bytes(buf))
    }

    fn read_raw_pressure(&mut self, oss: Oversampling) -> Result<i32, DeviceError<I2C::Error>> {
        self.write_register(Register::Control, Command::ConvertPressure(oss).value())?;
        self.delay.delay_ms(oss.conversion_time_ms());

        // MSB, LSB, XLSB into the low 24 bits
        let mut buf = [0u8; 4];
        self.read_registers(Register::Data.value(), &mut buf[1..])?;
        let up = i32::from_be_bytes(buf) >> (8 - oss.level());
        trace!("up={} ({:?})", up, oss);

        Ok(up)
    }

    /// Start, address+W, register, data, stop.
    fn write_register(
        &mut self,
        register: Register,
        value: u8,
    ) -> Result<(), DeviceError<I2C::Error>> {
        self.i2c
            .write(DEVICE_ADDRESS, &[register.value(), value])
            .map_err(DeviceError::I2c)
    }

    /// Start, address+W, register, repeated start, address+R, `buf.len()` bytes with
    /// the last one NACKed, stop.
    fn read_registers(
        &mut self,
        register: u8,
        buf: &mut [u8],
    ) -> Result<(), DeviceError<I2C::Error>> {
        self.i2c
            .write_read(DEVICE_ADDRESS, &[register], buf)
            .map_err(DeviceError::I2c)
    }
}
