//! Temperature/humidity sensing.
//!
//! The controller reads the sensor through [`ClimateSensor`], which mirrors
//! the usual driver surface: independent humidity and temperature reads that
//! may each come back empty. [`read_climate`] folds the pair into a validated
//! [`ClimateReading`] and derives the heat index.

pub mod dht;
pub mod heat_index;

pub use heat_index::heat_index_celsius;

/// Capability interface over the temperature/humidity sensor.
pub trait ClimateSensor {
    /// Prepares the sensor bus. Called once per episode before the first read.
    fn begin(&mut self) {}

    /// Relative humidity in percent, or `None` when no reading is available.
    fn read_humidity(&mut self) -> Option<f32>;

    /// Temperature in degrees Celsius, or `None` when no reading is available.
    fn read_temperature(&mut self) -> Option<f32>;
}

/// One validated sensor sample.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClimateReading {
    pub humidity: f32,
    pub temperature: f32,
    pub heat_index: f32,
}

/// Reads humidity then temperature and validates both.
///
/// Returns `None` when either value is missing or NaN; the heat index is only
/// computed for valid pairs.
pub fn read_climate<S>(sensor: &mut S) -> Option<ClimateReading>
where
    S: ClimateSensor + ?Sized,
{
    let humidity = sensor.read_humidity();
    let temperature = sensor.read_temperature();

    let humidity = humidity.filter(|value| !value.is_nan())?;
    let temperature = temperature.filter(|value| !value.is_nan())?;

    Some(ClimateReading {
        humidity,
        temperature,
        heat_index: heat_index_celsius(temperature, humidity),
    })
}
