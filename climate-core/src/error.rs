//! Error taxonomy of the climate journal.
//!
//! Validation and not-found errors are recoverable: the intent is aborted
//! before any write and the user may retry with corrected input. Store
//! failures carry the underlying `anyhow` context.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ClimateError>;

#[derive(Debug, Error)]
pub enum ClimateError {
    #[error("City name must not be blank")]
    BlankCityName,

    #[error("City type must not be blank")]
    BlankCityType,

    #[error("Temperature {0} is outside the allowed range -50..=50")]
    TemperatureOutOfRange(f64),

    #[error("Unknown month '{0}'")]
    UnknownMonth(String),

    #[error("Unknown season '{0}'")]
    UnknownSeason(String),

    #[error("Unknown unit '{0}'. Supported units: celsius, fahrenheit, kelvin.")]
    UnknownUnit(String),

    #[error("City '{0}' already exists")]
    DuplicateCity(String),

    #[error("City '{0}' not found")]
    CityNotFound(String),

    #[error("No city selected")]
    NoCitySelected,

    #[error("Store error: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl ClimateError {
    /// Message suitable for showing to the user as-is.
    pub fn user_message(&self) -> &'static str {
        match self {
            ClimateError::BlankCityName => "City name cannot be empty.",
            ClimateError::BlankCityType => "City type cannot be empty.",
            ClimateError::TemperatureOutOfRange(_) => "Temperature must be between -50 and 50.",
            ClimateError::UnknownMonth(_) => "Invalid month.",
            ClimateError::UnknownSeason(_) => "Invalid season.",
            ClimateError::UnknownUnit(_) => "Unit must be Celsius, Fahrenheit or Kelvin.",
            ClimateError::DuplicateCity(_) => "A city with this name already exists.",
            ClimateError::CityNotFound(_) => "City not found.",
            ClimateError::NoCitySelected => "Select a city first.",
            ClimateError::Store(_) => "Could not access local storage. Please try again.",
        }
    }

    /// Validation and not-found errors, as opposed to store failures.
    pub fn is_user_error(&self) -> bool {
        !matches!(self, ClimateError::Store(_))
    }
}
