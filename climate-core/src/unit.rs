use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

use crate::error::ClimateError;

/// Display unit for temperatures. Readings are always stored in Celsius.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
    Kelvin,
}

impl TemperatureUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "celsius",
            TemperatureUnit::Fahrenheit => "fahrenheit",
            TemperatureUnit::Kelvin => "kelvin",
        }
    }

    pub const fn all() -> &'static [TemperatureUnit] {
        &[TemperatureUnit::Celsius, TemperatureUnit::Fahrenheit, TemperatureUnit::Kelvin]
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "°C",
            TemperatureUnit::Fahrenheit => "°F",
            TemperatureUnit::Kelvin => "K",
        }
    }

    /// Converts a Celsius value into this unit.
    pub fn convert(&self, celsius: f64) -> f64 {
        match self {
            TemperatureUnit::Celsius => celsius,
            TemperatureUnit::Fahrenheit => celsius * 9.0 / 5.0 + 32.0,
            TemperatureUnit::Kelvin => celsius + 273.15,
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TemperatureUnit {
    type Error = ClimateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        match lower.as_str() {
            "celsius" | "c" | "°c" | "цельсий" => Ok(TemperatureUnit::Celsius),
            "fahrenheit" | "f" | "°f" | "фаренгейт" => Ok(TemperatureUnit::Fahrenheit),
            "kelvin" | "k" | "кельвин" => Ok(TemperatureUnit::Kelvin),
            _ => Err(ClimateError::UnknownUnit(value.to_string())),
        }
    }
}

/// Renders a Celsius value in `unit` with one decimal place, e.g. `"78.8°F"`.
pub fn format_temperature(celsius: f64, unit: TemperatureUnit) -> String {
    let value = round_tenths(unit.convert(celsius));
    format!("{value:.1}{}", unit.suffix())
}

// Half away from zero, so 273.15 shows as 273.2. Adding 0.0 folds -0.0 into 0.0.
fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0 + 0.0
}
