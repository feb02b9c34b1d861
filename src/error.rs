/// Faults raised by the fixed-point compensation formulas.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ComputeError {
    /// `X1 + MD` in the temperature formula or `B4` in the pressure formula was zero.
    DivisionByZero,
    /// The compensated temperature does not fit in 0.1 °C as `i16`.
    OutOfRange,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceError<E> {
    I2c(E),
    Compute(ComputeError),
    Uncalibrated,
    /// A pressure read was attempted before any temperature compensation produced B5.
    NoCorrectionTerm,
    InvalidOversampling(u8),
    InvalidConfig,
}

impl<E> From<ComputeError> for DeviceError<E> {
    fn from(error: ComputeError) -> Self {
        DeviceError::Compute(error)
    }
}
