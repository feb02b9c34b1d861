//! Unit conversions and barometric estimates over compensated readings.

/// Exponent of the international barometric formula.
const BAROMETRIC_EXPONENT: f64 = 5.255;
/// Altitude scale of the barometric formula, in meters.
const ALTITUDE_SCALE_M: f64 = 44330.0;

/// Compensated temperature (0.1 °C) to degrees Celsius.
pub fn celsius(tenths: i16) -> f64 {
    tenths as f64 / 10.0
}

/// Compensated pressure (Pa) to hectopascal.
pub fn hpa(pascal: i32) -> f64 {
    pascal as f64 / 100.0
}

/// Altitude in meters for a pressure `hpa`, given the current sea level pressure in hPa
/// (e.g. from the local METAR).
pub fn altitude(hpa: f64, sea_level_hpa: f64) -> f64 {
    ALTITUDE_SCALE_M * (1.0 - libm::pow(hpa / sea_level_hpa, 1.0 / BAROMETRIC_EXPONENT))
}

/// Sea level pressure in hPa for a pressure `hpa` measured at `altitude_m` meters.
pub fn sea_level_pressure(hpa: f64, altitude_m: f64) -> f64 {
    hpa * libm::pow(1.0 - altitude_m / ALTITUDE_SCALE_M, -BAROMETRIC_EXPONENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_units() {
        assert_eq!(celsius(150), 15.0);
        assert_eq!(celsius(-15), -1.5);
        assert_eq!(hpa(69964), 699.64);
    }

    #[test]
    fn check_altitude_at_sea_level() {
        assert!(altitude(1013.25, 1013.25).abs() < 1e-9);
        // lower pressure is higher up
        assert!(altitude(899.0, 1013.25) > 900.0);
        assert!(altitude(1030.0, 1013.25) < 0.0);
    }

    #[test]
    fn check_altitude_round_trip() {
        for &h in &[300.0, 699.64, 850.5, 1013.25, 1050.0] {
            for &p in &[980.0, 1013.25, 1040.0] {
                let a = altitude(h, p);
                let back = sea_level_pressure(h, a);
                assert!((back - p).abs() < 1e-6, "h={} p={} back={}", h, p, back);
            }
        }
    }
}
