use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard sea-level pressure used when a reading carries no pressure.
pub const STANDARD_PRESSURE_HPA: f64 = 1013.25;

/// One set of readings published by a weather station.
///
/// Values are not range-checked. A station replaces its measurement on every
/// update instead of mutating it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Degrees Celsius.
    pub temperature: f64,
    /// Relative humidity, percent.
    pub humidity: f64,
    /// Hectopascal.
    pub pressure: f64,
}

impl Measurement {
    pub fn new(temperature: f64, humidity: f64, pressure: f64) -> Self {
        Self { temperature, humidity, pressure }
    }

    /// Reading without a barometer: pressure is [`STANDARD_PRESSURE_HPA`].
    pub fn at_sea_level(temperature: f64, humidity: f64) -> Self {
        Self::new(temperature, humidity, STANDARD_PRESSURE_HPA)
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} °C, {:.1} %, {:.1} hPa",
            self.temperature, self.humidity, self.pressure
        )
    }
}
