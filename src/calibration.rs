use crate::error::ComputeError;

/// Maximum temperature conversion time in MICROSECONDS.
pub const TEMPERATURE_CONVERSION_US: u32 = 4_500;

/// Pressure oversampling setting, `oss` in the datasheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Oversampling {
    UltraLowPower,
    Standard,
    HighResolution,
    UltraHighResolution,
}

impl Oversampling {
    pub fn level(&self) -> u8 {
        match *self {
            Oversampling::UltraLowPower => 0,
            Oversampling::Standard => 1,
            Oversampling::HighResolution => 2,
            Oversampling::UltraHighResolution => 3,
        }
    }

    /// Gets the maximum pressure conversion delay in MILLISECONDS.
    pub fn conversion_time_ms(&self) -> u32 {
        // 4.5 / 7.5 / 13.5 / 25.5 ms rounded up
        2 + (3 << self.level())
    }
}

impl TryFrom<u8> for Oversampling {
    /// The rejected level.
    type Error = u8;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        match level {
            0 => Ok(Oversampling::UltraLowPower),
            1 => Ok(Oversampling::Standard),
            2 => Ok(Oversampling::HighResolution),
            3 => Ok(Oversampling::UltraHighResolution),
            other => Err(other),
        }
    }
}

/// Result of a temperature compensation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CompensatedTemperature {
    /// Correction term B5, input to the pressure formula.
    pub b5: i32,
    /// Temperature in 0.1 °C.
    pub tenths: i16,
}

/// Factory calibration data read from the E2PROM
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    pub ac1: i16,
    pub ac2: i16,
    pub ac3: i16,
    /// The only unsigned coefficient.
    pub ac4: u16,
    pub ac5: i16,
    pub ac6: i16,
    pub b1: i16,
    pub b2: i16,
    /// Read for completeness, unused by the compensation formulas.
    pub mb: i16,
    pub mc: i16,
    pub md: i16,
}

impl Calibration {
    /// Number of calibration bytes, 2 per coefficient.
    pub const LEN: usize = 22;

    /// Decodes the big-endian coefficient block in device order
    /// AC1, AC2, AC3, AC4, AC5, AC6, B1, B2, MB, MC, MD.
    pub fn from_bytes(buf: &[u8; Self::LEN]) -> Calibration {
        let word = |i: usize| [buf[2 * i], buf[2 * i + 1]];
        Calibration {
            ac1: i16::from_be_bytes(word(0)),
            ac2: i16::from_be_bytes(word(1)),
            ac3: i16::from_be_bytes(word(2)),
            ac4: u16::from_be_bytes(word(3)),
            ac5: i16::from_be_bytes(word(4)),
            ac6: i16::from_be_bytes(word(5)),
            b1: i16::from_be_bytes(word(6)),
            b2: i16::from_be_bytes(word(7)),
            mb: i16::from_be_bytes(word(8)),
            mc: i16::from_be_bytes(word(9)),
            md: i16::from_be_bytes(word(10)),
        }
    }

    /// True temperature from the raw temperature `ut`.
    ///
    /// Also returns B5, which every following pressure compensation needs.
    pub fn compensate_temperature(&self, ut: u16) -> Result<CompensatedTemperature, ComputeError> {
        let x1 = (ut as i32 - self.ac6 as i32).wrapping_mul(self.ac5 as i32) >> 15;
        let divisor = x1.wrapping_add(self.md as i32);
        if divisor == 0 {
            return Err(ComputeError::DivisionByZero);
        }
        let x2 = floor_div((self.mc as i32) << 11, divisor);
        let b5 = x1.wrapping_add(x2);
        let tenths =
            i16::try_from(b5.wrapping_add(8) >> 4).map_err(|_| ComputeError::OutOfRange)?;

        Ok(CompensatedTemperature { b5, tenths })
    }

    /// True pressure in Pa from the raw pressure `up` taken at `oss`, using correction term `b5`.
    pub fn compensate_pressure(
        &self,
        up: i32,
        oss: Oversampling,
        b5: i32,
    ) -> Result<i32, ComputeError> {
        let oss = oss.level() as u32;

        let b6 = b5.wrapping_sub(4000);
        let b6_sq = b6.wrapping_mul(b6) >> 12;
        let x1 = (self.b2 as i32).wrapping_mul(b6_sq) >> 11;
        let x2 = (self.ac2 as i32).wrapping_mul(b6) >> 11;
        let x3 = x1.wrapping_add(x2);
        let b3 = ((self.ac1 as i32).wrapping_mul(4).wrapping_add(x3) << oss).wrapping_add(2) >> 2;

        let x1 = (self.ac3 as i32).wrapping_mul(b6) >> 13;
        let x2 = (self.b1 as i32).wrapping_mul(b6_sq) >> 16;
        let x3 = x1.wrapping_add(x2).wrapping_add(2) >> 2;
        let b4 = (self.ac4 as u32).wrapping_mul(x3.wrapping_add(32768) as u32) >> 15;
        if b4 == 0 {
            return Err(ComputeError::DivisionByZero);
        }

        let b7 = (up as u32).wrapping_sub(b3 as u32).wrapping_mul(50000 >> oss);
        let mut p = if b7 < 0x8000_0000 {
            (b7 * 2) / b4
        } else {
            (b7 / b4).wrapping_mul(2)
        } as i32;

        let x1 = (p >> 8).wrapping_mul(p >> 8);
        let x1 = x1.wrapping_mul(3038) >> 16;
        let x2 = (-7357_i32).wrapping_mul(p) >> 16;
        p = p.wrapping_add(x1.wrapping_add(x2).wrapping_add(3791) >> 4);

        Ok(p)
    }
}

/// Integer division rounding toward negative infinity, consistent with `>>` on negative values.
fn floor_div(n: i32, d: i32) -> i32 {
    let q = n.wrapping_div(d);
    if n.wrapping_rem(d) != 0 && (n < 0) != (d < 0) {
        q - 1
    } else {
        q
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Coefficients of the datasheet's worked example.
    pub(crate) const DATASHEET: Calibration = Calibration {
        ac1: 408,
        ac2: -72,
        ac3: -14383,
        ac4: 32741,
        ac5: 32757,
        ac6: 23153,
        b1: 6190,
        b2: 4,
        mb: -32768,
        mc: -8711,
        md: 2868,
    };

    pub(crate) fn datasheet_bytes() -> [u8; Calibration::LEN] {
        let c = DATASHEET;
        let mut buf = [0u8; Calibration::LEN];
        let words = [
            c.ac1 as u16,
            c.ac2 as u16,
            c.ac3 as u16,
            c.ac4,
            c.ac5 as u16,
            c.ac6 as u16,
            c.b1 as u16,
            c.b2 as u16,
            c.mb as u16,
            c.mc as u16,
            c.md as u16,
        ];
        for (i, w) in words.iter().enumerate() {
            buf[2 * i..2 * i + 2].copy_from_slice(&w.to_be_bytes());
        }
        buf
    }

    #[test]
    fn check_decode_order_and_signedness() {
        let calibration = Calibration::from_bytes(&datasheet_bytes());
        assert_eq!(calibration, DATASHEET);

        // AC4 above i16::MAX must stay positive
        let mut buf = [0u8; Calibration::LEN];
        buf[6] = 0x80;
        buf[7] = 0x01;
        buf[0] = 0xFF;
        buf[1] = 0xFE;
        let calibration = Calibration::from_bytes(&buf);
        assert_eq!(calibration.ac4, 0x8001);
        assert_eq!(calibration.ac1, -2);
    }

    #[test]
    fn check_temp_compensation() {
        let temp = DATASHEET.compensate_temperature(27898).unwrap();
        assert_eq!(temp.b5, 2399);
        assert_eq!(temp.tenths, 150);
    }

    #[test]
    fn check_pressure_compensation() {
        let pressure = DATASHEET
            .compensate_pressure(23843, Oversampling::UltraLowPower, 2399)
            .unwrap();
        assert_eq!(pressure, 69964);
    }

    #[test]
    fn check_temperature_division_by_zero() {
        let calibration = Calibration {
            md: 0,
            ..DATASHEET
        };
        // UT == AC6 gives X1 == 0
        assert_eq!(
            calibration.compensate_temperature(DATASHEET.ac6 as u16),
            Err(ComputeError::DivisionByZero)
        );
    }

    #[test]
    fn check_temperature_out_of_range() {
        // tiny divisor blows X2 up to MC << 11
        let calibration = Calibration {
            ac5: 0,
            md: 1,
            mc: -32768,
            ..DATASHEET
        };
        assert_eq!(
            calibration.compensate_temperature(27898),
            Err(ComputeError::OutOfRange)
        );
    }

    #[test]
    fn check_pressure_division_by_zero() {
        let calibration = Calibration {
            ac4: 0,
            ..DATASHEET
        };
        assert_eq!(
            calibration.compensate_pressure(23843, Oversampling::UltraLowPower, 2399),
            Err(ComputeError::DivisionByZero)
        );
    }

    #[test]
    fn check_negative_shifts_are_arithmetic() {
        assert_eq!((-515012071_i32) >> 16, -7859);
        assert_eq!(floor_div(-17840128, 7611), -2344);
        assert_eq!(floor_div(17840128, 7611), 2343);
        assert_eq!(floor_div(-8, 4), -2);
    }

    #[test]
    fn check_conversion_time_increases_with_oversampling() {
        let times: [u32; 4] = [0u8, 1, 2, 3]
            .map(|l| Oversampling::try_from(l).unwrap().conversion_time_ms());
        assert_eq!(times, [5, 8, 14, 26]);
        assert!(times.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn check_oversampling_range() {
        assert_eq!(Oversampling::try_from(3), Ok(Oversampling::UltraHighResolution));
        assert_eq!(Oversampling::try_from(4), Err(4));
    }
}
