use crate::calibration::Oversampling;

/// 7-bit bus address. On the wire this becomes 0xEE for writes and 0xEF for reads.
pub const DEVICE_ADDRESS: u8 = 0x77;

/// Register map of the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Register {
    /// First of 22 calibration bytes (AC1 MSB).
    Calibration,
    Control,
    /// Conversion result, MSB / LSB / XLSB.
    Data,
}

impl Register {
    pub fn value(&self) -> u8 {
        match *self {
            Register::Calibration => 0xAA,
            Register::Control => 0xF4,
            Register::Data => 0xF6,
        }
    }
}

/// Commands accepted by the control register.
pub enum Command {
    ConvertTemperature,
    ConvertPressure(Oversampling),
}

impl Command {
    pub fn value(&self) -> u8 {
        match self {
            Command::ConvertTemperature => 0x2E,
            Command::ConvertPressure(oss) => 0x34 | (oss.level() << 6),
        }
    }
}
