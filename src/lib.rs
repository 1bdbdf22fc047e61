//! A driver for analog pressure transducers read through an
//! [`embedded-hal`](embedded_hal) ADC.
//!
//! Transducers of this kind output a voltage that is linear in pressure
//! over a calibrated window, typically 0.5 V to 4.5 V. A
//! [`PressureTransducer`] samples the ADC, converts the sample to volts
//! and maps the voltage onto the pressure range. Readings slightly
//! outside the window are clamped; readings far outside it (a broken
//! wire, a saturated ADC) are rejected.
//!
//! # Features
//!
//! - `log`: log clamped and rejected readings through the `log` facade
//! - `defmt`: log through `defmt` and implement `defmt::Format` for the public types
//! - `std`: implement `std::error::Error` for [`ConfigError`]

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

mod calibration;
mod config;

pub use calibration::{Bound, Calibration, Reading};
pub use config::{
    Config, ConfigError, DEFAULT_MAX_VOLTAGE, DEFAULT_MIN_VOLTAGE, DEFAULT_PRECISION,
    DEFAULT_REFERENCE_VOLTAGE,
};

use embedded_hal::adc::{Channel, OneShot};

/// Error returned by the ADC while sampling a transducer.
pub type Error<Adc, ADC, Word, Pin> = nb::Error<<Adc as OneShot<ADC, Word, Pin>>::Error>;

#[derive(Debug)]
pub struct PressureTransducer<Pin> {
    pin: Pin,
    calibration: Calibration,
}

impl<Pin> PressureTransducer<Pin> {
    /// Returns a transducer reading from `pin`, calibrated by `config`.
    ///
    /// `pin` must already be configured as an analog input, which HALs
    /// express by only implementing [`Channel`] for pins in analog mode.
    /// Returns an error if `config` is malformed (see [`Config::validate`]).
    ///
    /// # Examples
    ///
    /// ```
    /// use pressure_transducer::{Config, PressureTransducer};
    /// # use embedded_hal_mock::adc::MockChan0;
    /// #
    /// # let pin = MockChan0 {};
    ///
    /// let transducer = PressureTransducer::new(pin, Config::new(0.0, 100.0, 0.2));
    ///
    /// assert!(transducer.is_ok());
    /// ```
    pub fn new<ADC>(pin: Pin, config: Config) -> Result<Self, ConfigError>
    where
        Pin: Channel<ADC>,
    {
        let calibration = Calibration::new(&config)?;

        trace!(
            "pressure transducer: slope {}, offset {}, valid voltage {}..{}",
            calibration.slope(),
            calibration.offset(),
            calibration.lower_validity_bound(),
            calibration.upper_validity_bound(),
        );

        Ok(Self { pin, calibration })
    }

    /// Destroys the transducer and returns the `Pin`.
    pub fn free(self) -> Pin {
        self.pin
    }

    /// Returns the identifier of the ADC channel the transducer is wired to.
    pub fn channel<ADC>(&self) -> Pin::ID
    where
        Pin: Channel<ADC>,
    {
        Pin::channel()
    }

    /// Returns the coefficients derived from the config at construction.
    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Samples the ADC and returns the raw value, unvalidated.
    ///
    /// # Examples
    ///
    /// ```
    /// use pressure_transducer::{Config, PressureTransducer};
    /// # use embedded_hal_mock::adc::{Mock, MockChan0, Transaction};
    /// #
    /// # let expectations: [Transaction<u16>; 1] = [Transaction::read(0, 512)];
    /// # let mut adc = Mock::new(&expectations);
    /// # let pin = MockChan0 {};
    ///
    /// let mut transducer = PressureTransducer::new(pin, Config::new(0.0, 100.0, 0.2)).unwrap();
    ///
    /// assert_eq!(transducer.read_raw(&mut adc), Ok(512));
    /// ```
    pub fn read_raw<Adc, ADC, Word>(
        &mut self,
        adc: &mut Adc,
    ) -> Result<Word, Error<Adc, ADC, Word, Pin>>
    where
        Pin: Channel<ADC>,
        Adc: OneShot<ADC, Word, Pin>,
    {
        adc.read(&mut self.pin)
    }

    /// Samples the ADC and returns the voltage at the pin (V).
    pub fn read_voltage<Adc, ADC, Word>(
        &mut self,
        adc: &mut Adc,
    ) -> Result<f32, Error<Adc, ADC, Word, Pin>>
    where
        Word: Into<u32>,
        Pin: Channel<ADC>,
        Adc: OneShot<ADC, Word, Pin>,
    {
        let raw = self.read_raw(adc)?;

        Ok(self.calibration.voltage(raw.into()))
    }

    /// Samples the ADC and classifies the result, reporting whether the
    /// pressure was clamped or the reading rejected.
    pub fn read<Adc, ADC, Word>(
        &mut self,
        adc: &mut Adc,
    ) -> Result<Reading, Error<Adc, ADC, Word, Pin>>
    where
        Word: Into<u32>,
        Pin: Channel<ADC>,
        Adc: OneShot<ADC, Word, Pin>,
    {
        let voltage = self.read_voltage(adc)?;
        let reading = self.calibration.reading(voltage);

        match reading {
            Reading::Clamped { voltage, .. } => {
                debug!("pressure transducer: clamped {} V", voltage)
            }
            Reading::Invalid { voltage, .. } => {
                warn!("pressure transducer: rejected {} V", voltage)
            }
            Reading::InRange { .. } => {}
        }

        Ok(reading)
    }

    /// Samples the ADC and returns the pressure. If the voltage falls too
    /// far outside the calibrated window, returns `Ok(None)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use pressure_transducer::{Config, PressureTransducer};
    /// # use embedded_hal_mock::adc::{Mock, MockChan0, Transaction};
    /// #
    /// # let expectations: [Transaction<u16>; 2] = [
    /// #     Transaction::read(0, 614),
    /// #     Transaction::read(0, 0),
    /// # ];
    /// # let mut adc = Mock::new(&expectations);
    /// # let pin = MockChan0 {};
    ///
    /// // 0-100 bar over 0.5-4.5 V on a 5 V 10-bit ADC
    /// let mut transducer = PressureTransducer::new(pin, Config::new(0.0, 100.0, 0.2)).unwrap();
    ///
    /// // With the voltage at 3.0 V, the pressure is 62.5 bar
    /// let pressure = transducer.read_pressure(&mut adc).unwrap().unwrap();
    /// assert!((pressure - 62.5).abs() < 0.1);
    ///
    /// // 0 V means the sensor is disconnected
    /// assert_eq!(transducer.read_pressure(&mut adc), Ok(None));
    /// ```
    pub fn read_pressure<Adc, ADC, Word>(
        &mut self,
        adc: &mut Adc,
    ) -> Result<Option<f32>, Error<Adc, ADC, Word, Pin>>
    where
        Word: Into<u32>,
        Pin: Channel<ADC>,
        Adc: OneShot<ADC, Word, Pin>,
    {
        Ok(self.read(adc)?.pressure())
    }

    /// Returns the smallest value that can be returned by
    /// [`read_pressure`](PressureTransducer::read_pressure).
    pub fn min_pressure(&self) -> f32 {
        self.calibration.min_pressure()
    }

    /// Returns the largest value that can be returned by
    /// [`read_pressure`](PressureTransducer::read_pressure).
    pub fn max_pressure(&self) -> f32 {
        self.calibration.max_pressure()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::{
        adc::{Mock, MockChan0, Transaction},
        common::Generic,
        MockError,
    };
    use std::io::ErrorKind;

    fn config() -> Config {
        Config::new(0.0, 100.0, 0.2)
    }

    fn transducer(config: Config) -> PressureTransducer<MockChan0> {
        let pin = MockChan0 {};
        PressureTransducer::new(pin, config).unwrap()
    }

    fn adc(expectations: &[Transaction<u16>]) -> Generic<Transaction<u16>> {
        Mock::new(expectations)
    }

    fn read_pressure(config: Config, value: u16) -> Option<f32> {
        let mut transducer = transducer(config);
        let expectations = [Transaction::read(0, value)];
        let mut adc = adc(&expectations);

        let pressure = transducer.read_pressure(&mut adc).unwrap();
        adc.done();
        pressure
    }

    fn assert_pressure(value: u16, expected: f32) {
        let pressure = read_pressure(config(), value).unwrap();
        assert!(
            (pressure - expected).abs() < 1e-3,
            "raw {value}: expected {expected}, got {pressure}"
        );
    }

    #[test]
    fn rejects_invalid_config() {
        let pin = MockChan0 {};
        let config = Config {
            min_voltage: 4.5,
            max_voltage: 4.5,
            ..config()
        };

        assert!(matches!(
            PressureTransducer::new(pin, config),
            Err(ConfigError::VoltageRange { .. })
        ));
    }

    #[test]
    fn channel() {
        assert_eq!(transducer(config()).channel(), 0);
    }

    #[test]
    fn free() {
        let MockChan0 {} = transducer(config()).free();
    }

    #[test]
    fn raw() {
        let mut transducer = transducer(config());
        let mut adc = adc(&[Transaction::read(0, 0), Transaction::read(0, 1023)]);

        assert_eq!(transducer.read_raw(&mut adc), Ok(0));
        assert_eq!(transducer.read_raw(&mut adc), Ok(1023));
        adc.done();
    }

    #[test]
    fn voltage() {
        let mut transducer = transducer(config());
        let mut adc = adc(&[
            Transaction::read(0, 0),
            Transaction::read(0, 512),
            Transaction::read(0, 1023),
        ]);

        assert_eq!(transducer.read_voltage(&mut adc), Ok(0.0));
        let voltage = transducer.read_voltage(&mut adc).unwrap();
        assert!((voltage - 512.0 * 5.0 / 1023.0).abs() < 1e-5);
        let voltage = transducer.read_voltage(&mut adc).unwrap();
        assert!((voltage - 5.0).abs() < 1e-5);
        adc.done();
    }

    #[test]
    fn voltage_is_stable_for_a_stable_sample() {
        let mut transducer = transducer(config());
        let mut adc = adc(&[Transaction::read(0, 300), Transaction::read(0, 300)]);

        let first = transducer.read_voltage(&mut adc).unwrap();
        let second = transducer.read_voltage(&mut adc).unwrap();

        assert_eq!(first, second);
        adc.done();
    }

    #[test]
    fn interpolates() {
        assert_pressure(512, 50.061);
        assert_pressure(307, 25.012);
        assert_pressure(818, 87.451);
    }

    #[test]
    fn clamps_near_the_rails() {
        // 0.4985 V and 0.4008 V, both above the 0.4 V lower bound
        assert_pressure(102, 0.0);
        assert_pressure(82, 0.0);
        // 4.5015 V and 4.5992 V, both below the 4.6 V upper bound
        assert_pressure(921, 100.0);
        assert_pressure(941, 100.0);
    }

    #[test]
    fn outside_range() {
        assert_eq!(read_pressure(config(), 0), None);
        assert_eq!(read_pressure(config(), 81), None);
        assert_eq!(read_pressure(config(), 942), None);
        assert_eq!(read_pressure(config(), 1023), None);
    }

    #[test]
    fn wider_threshold_tolerates_more() {
        let config = Config::new(0.0, 100.0, 0.5);

        // lower bound 0.25 V, upper bound 4.75 V
        assert_eq!(read_pressure(config, 51), None);
        assert_eq!(read_pressure(config, 52), Some(0.0));
        assert_eq!(read_pressure(config, 971), Some(100.0));
        assert_eq!(read_pressure(config, 972), None);
    }

    #[test]
    fn read_classifies() {
        let mut transducer = transducer(config());
        let mut adc = adc(&[
            Transaction::read(0, 512),
            Transaction::read(0, 941),
            Transaction::read(0, 0),
        ]);

        assert!(matches!(
            transducer.read(&mut adc),
            Ok(Reading::InRange { .. })
        ));
        assert!(matches!(
            transducer.read(&mut adc),
            Ok(Reading::Clamped {
                bound: Bound::Upper,
                ..
            })
        ));
        assert_eq!(
            transducer.read(&mut adc),
            Ok(Reading::Invalid {
                voltage: 0.0,
                bound: Bound::Lower
            })
        );
        adc.done();
    }

    #[test]
    fn twelve_bit_adc() {
        let config = Config {
            reference_voltage: 3.3,
            precision: 12,
            ..Config::new(0.0, 10.0, 0.2)
        };

        // 2.5 V at 3.3 V full scale
        let pressure = read_pressure(config, 3102).unwrap();
        assert!((pressure - 5.0).abs() < 1e-2);
        // full scale is still inside the 0.5-4.5 V window
        let pressure = read_pressure(config, 4095).unwrap();
        assert!((pressure - 7.0).abs() < 1e-3);
    }

    #[test]
    fn error() {
        let mut adc =
            adc(&[Transaction::read(0, 0).with_error(MockError::Io(ErrorKind::InvalidData))]);
        assert!(transducer(config()).read_pressure(&mut adc).is_err());
    }

    #[test]
    fn min_pressure() {
        assert_eq!(transducer(config()).min_pressure(), 0.0);
        assert_eq!(transducer(Config::new(100.0, 0.0, 0.2)).min_pressure(), 0.0);
    }

    #[test]
    fn max_pressure() {
        assert_eq!(transducer(config()).max_pressure(), 100.0);
        assert_eq!(transducer(Config::new(100.0, 0.0, 0.2)).max_pressure(), 100.0);
    }
}
