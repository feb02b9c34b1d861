use crate::calibration::Oversampling;

/// Samples averaged by default when averaging is enabled.
pub const DEFAULT_AVERAGING_SAMPLES: u16 = 50;

/// Session configuration, fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    pub oversampling: Oversampling,
    /// Average `averaging_samples` raw pressure and B5 values per pressure read.
    pub averaging_enabled: bool,
    pub averaging_samples: u16,
    /// Take a temperature reading before every pressure reading so B5 is current.
    pub auto_update_temperature: bool,
    /// The bus was brought up by someone else; don't wait for it to settle in `init`.
    pub skip_bus_init: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            oversampling: Oversampling::UltraHighResolution,
            averaging_enabled: false,
            averaging_samples: DEFAULT_AVERAGING_SAMPLES,
            auto_update_temperature: true,
            skip_bus_init: true,
        }
    }
}

impl Config {
    pub fn with_oversampling(mut self, oversampling: Oversampling) -> Self {
        self.oversampling = oversampling;
        self
    }

    pub fn with_averaging(mut self, samples: u16) -> Self {
        self.averaging_enabled = true;
        self.averaging_samples = samples;
        self
    }

    pub fn with_auto_update_temperature(mut self, enabled: bool) -> Self {
        self.auto_update_temperature = enabled;
        self
    }

    pub fn with_skip_bus_init(mut self, skip: bool) -> Self {
        self.skip_bus_init = skip;
        self
    }

    pub(crate) fn is_valid(&self) -> bool {
        !self.averaging_enabled || self.averaging_samples > 0
    }
}
