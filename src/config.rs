use thiserror_no_std::Error;

/// Transducer output at the bottom of its pressure range (V).
pub const DEFAULT_MIN_VOLTAGE: f32 = 0.5;
/// Transducer output at the top of its pressure range (V).
pub const DEFAULT_MAX_VOLTAGE: f32 = 4.5;
/// ADC reference voltage (V).
pub const DEFAULT_REFERENCE_VOLTAGE: f32 = 5.0;
/// ADC precision in bits.
pub const DEFAULT_PRECISION: u32 = 10;

/// Calibration parameters for a `PressureTransducer`.
///
/// - `min_pressure`: The pressure reported at `min_voltage`, in whatever unit the caller uses
/// - `max_pressure`: The pressure reported at `max_voltage`
/// - `min_voltage`: The transducer output at `min_pressure` (V)
/// - `max_voltage`: The transducer output at `max_pressure` (V)
/// - `reference_voltage`: The voltage corresponding to the largest value possible for the ADC (V)
/// - `precision`: The precision of the ADC in bits (eg. for 10-bit precision, use `10`)
/// - `validity_threshold`: A fraction in `[0, 1]` controlling how far outside
///   `min_voltage..=max_voltage` a reading may fall before it is rejected
///   instead of clamped
///
/// The threshold has no default and must always be supplied.
///
/// # Examples
///
/// ```
/// use pressure_transducer::Config;
///
/// // 0-100 PSI transducer with the usual 0.5-4.5 V output, on a 3.3 V 12-bit ADC
/// let config = Config {
///     reference_voltage: 3.3,
///     precision: 12,
///     ..Config::new(0.0, 100.0, 0.2)
/// };
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    pub min_pressure: f32,
    pub max_pressure: f32,
    pub min_voltage: f32,
    pub max_voltage: f32,
    pub reference_voltage: f32,
    pub precision: u32,
    pub validity_threshold: f32,
}

impl Config {
    /// Returns a config for a transducer spanning `min_pressure..=max_pressure`,
    /// with the default voltage window, reference voltage and precision.
    pub const fn new(min_pressure: f32, max_pressure: f32, validity_threshold: f32) -> Self {
        Self {
            min_pressure,
            max_pressure,
            min_voltage: DEFAULT_MIN_VOLTAGE,
            max_voltage: DEFAULT_MAX_VOLTAGE,
            reference_voltage: DEFAULT_REFERENCE_VOLTAGE,
            precision: DEFAULT_PRECISION,
            validity_threshold,
        }
    }

    /// Largest raw sample the ADC can produce, `2^precision - 1`.
    ///
    /// Only meaningful for a precision in `1..=32`.
    pub fn adc_resolution(&self) -> u32 {
        u32::MAX >> (32 - self.precision.clamp(1, 32))
    }

    /// Checks the parameters that the conversion divides by or compares against.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (min, max) = (self.min_voltage, self.max_voltage);
        if !(min.is_finite() && max.is_finite() && max > min) {
            return Err(ConfigError::VoltageRange { min, max });
        }

        let (min, max) = (self.min_pressure, self.max_pressure);
        if !(min.is_finite() && max.is_finite() && max != min) {
            return Err(ConfigError::PressureRange { min, max });
        }

        if !(self.reference_voltage.is_finite() && self.reference_voltage > 0.0) {
            return Err(ConfigError::ReferenceVoltage(self.reference_voltage));
        }

        if !(1..=32).contains(&self.precision) {
            return Err(ConfigError::Precision(self.precision));
        }

        if !(0.0..=1.0).contains(&self.validity_threshold) {
            return Err(ConfigError::ValidityThreshold(self.validity_threshold));
        }

        Ok(())
    }
}

/// Reasons a `Config` cannot be turned into a `Calibration`.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigError {
    /// `max_voltage` must be finite and strictly greater than `min_voltage`
    #[error("voltage range [{min}, {max}] is empty or not finite")]
    VoltageRange { min: f32, max: f32 },

    /// The pressure range must be finite and have a non-zero span
    #[error("pressure range [{min}, {max}] has no span or is not finite")]
    PressureRange { min: f32, max: f32 },

    /// The reference voltage must be finite and positive
    #[error("reference voltage {0} must be positive")]
    ReferenceVoltage(f32),

    /// The precision must be between 1 and 32 bits
    #[error("ADC precision of {0} bits is not supported")]
    Precision(u32),

    /// The threshold must lie in `[0, 1]`
    #[error("validity threshold {0} is outside [0, 1]")]
    ValidityThreshold(f32),
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::VoltageRange { min, max } => {
                defmt::write!(fmt, "voltage range [{}, {}] is empty or not finite", min, max)
            }
            Self::PressureRange { min, max } => {
                defmt::write!(fmt, "pressure range [{}, {}] has no span", min, max)
            }
            Self::ReferenceVoltage(v) => defmt::write!(fmt, "reference voltage {} invalid", v),
            Self::Precision(bits) => defmt::write!(fmt, "unsupported precision {} bits", bits),
            Self::ValidityThreshold(t) => defmt::write!(fmt, "validity threshold {} invalid", t),
        }
    }
}
