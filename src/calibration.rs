use crate::config::{Config, ConfigError};

/// Which end of the calibrated voltage window a reading fell beyond.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bound {
    Lower,
    Upper,
}

/// A voltage sample classified against a `Calibration`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reading {
    /// The voltage was inside the calibrated window.
    InRange { voltage: f32, pressure: f32 },
    /// The voltage was outside the window but within tolerance, so the
    /// pressure was pinned to the end of the range at `bound`.
    Clamped {
        voltage: f32,
        pressure: f32,
        bound: Bound,
    },
    /// The voltage was too far beyond `bound` to be trusted. This usually
    /// means a disconnected sensor, a wiring fault or a saturated ADC.
    Invalid { voltage: f32, bound: Bound },
}

impl Reading {
    /// The pressure, or `None` if the reading was rejected.
    pub fn pressure(&self) -> Option<f32> {
        match *self {
            Reading::InRange { pressure, .. } | Reading::Clamped { pressure, .. } => Some(pressure),
            Reading::Invalid { .. } => None,
        }
    }

    /// The voltage that produced this reading, before any clamping.
    pub fn voltage(&self) -> f32 {
        match *self {
            Reading::InRange { voltage, .. }
            | Reading::Clamped { voltage, .. }
            | Reading::Invalid { voltage, .. } => voltage,
        }
    }

    pub fn is_valid(&self) -> bool {
        !matches!(self, Reading::Invalid { .. })
    }
}

/// Coefficients derived from a `Config`.
///
/// Everything the read path needs is computed here once, so converting a
/// sample is a multiply-add and a couple of comparisons.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    adc_to_voltage: f32,
    slope: f32,
    offset: f32,
    min_voltage: f32,
    max_voltage: f32,
    lower_validity_bound: f32,
    upper_validity_bound: f32,
}

impl Calibration {
    /// Validates `config` and derives the conversion coefficients from it.
    ///
    /// # Examples
    ///
    /// ```
    /// use pressure_transducer::{Calibration, Config};
    ///
    /// let calibration = Calibration::new(&Config::new(0.0, 100.0, 0.2)).unwrap();
    ///
    /// assert_eq!(calibration.pressure(2.5), Some(50.0));
    /// ```
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let threshold = config.validity_threshold;
        let slope = (config.max_pressure - config.min_pressure)
            / (config.max_voltage - config.min_voltage);

        Ok(Self {
            adc_to_voltage: config.reference_voltage / config.adc_resolution() as f32,
            slope,
            offset: config.min_pressure - config.min_voltage * slope,
            min_voltage: config.min_voltage,
            max_voltage: config.max_voltage,
            lower_validity_bound: config.min_voltage * (1.0 - threshold),
            upper_validity_bound: config.max_voltage * (1.0 - threshold)
                + config.reference_voltage * threshold,
        })
    }

    /// Converts a raw ADC sample to volts.
    pub fn voltage(&self, raw: u32) -> f32 {
        raw as f32 * self.adc_to_voltage
    }

    /// Classifies `voltage` and converts it to a pressure, clamping small
    /// excursions beyond the calibrated window and rejecting large ones.
    pub fn reading(&self, voltage: f32) -> Reading {
        if voltage < self.min_voltage {
            if voltage < self.lower_validity_bound {
                return Reading::Invalid {
                    voltage,
                    bound: Bound::Lower,
                };
            }

            Reading::Clamped {
                voltage,
                pressure: self.linear(self.min_voltage),
                bound: Bound::Lower,
            }
        } else if voltage > self.max_voltage {
            if voltage > self.upper_validity_bound {
                return Reading::Invalid {
                    voltage,
                    bound: Bound::Upper,
                };
            }

            Reading::Clamped {
                voltage,
                pressure: self.linear(self.max_voltage),
                bound: Bound::Upper,
            }
        } else {
            Reading::InRange {
                voltage,
                pressure: self.linear(voltage),
            }
        }
    }

    /// Returns the pressure for `voltage`, or `None` if it is out of tolerance.
    pub fn pressure(&self, voltage: f32) -> Option<f32> {
        self.reading(voltage).pressure()
    }

    /// Returns the smallest pressure that can be returned by
    /// [`pressure`](Calibration::pressure).
    pub fn min_pressure(&self) -> f32 {
        let (low, high) = self.pressure_at_bounds();
        low.min(high)
    }

    /// Returns the largest pressure that can be returned by
    /// [`pressure`](Calibration::pressure).
    pub fn max_pressure(&self) -> f32 {
        let (low, high) = self.pressure_at_bounds();
        low.max(high)
    }

    pub fn adc_to_voltage(&self) -> f32 {
        self.adc_to_voltage
    }

    pub fn slope(&self) -> f32 {
        self.slope
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Voltage below which a reading is rejected rather than clamped.
    pub fn lower_validity_bound(&self) -> f32 {
        self.lower_validity_bound
    }

    /// Voltage above which a reading is rejected rather than clamped.
    pub fn upper_validity_bound(&self) -> f32 {
        self.upper_validity_bound
    }

    fn pressure_at_bounds(&self) -> (f32, f32) {
        (self.linear(self.min_voltage), self.linear(self.max_voltage))
    }

    fn linear(&self, voltage: f32) -> f32 {
        voltage * self.slope + self.offset
    }
}
