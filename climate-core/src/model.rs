use serde::{Deserialize, Serialize};

use crate::calendar::{Month, Season};

/// A named location owning zero or more monthly readings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: i64,
    pub name: String,
    pub city_type: String,
}

/// One monthly reading of a city, in Celsius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub id: i64,
    pub city_id: i64,
    pub month: Month,
    pub celsius: f64,
    pub season: Season,
}

impl Temperature {
    /// Same reading with a new value; the season follows the month.
    pub fn with_celsius(&self, celsius: f64) -> Self {
        Self { celsius, season: self.month.season(), ..self.clone() }
    }
}

/// A reading that has not been stored yet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewTemperature {
    pub city_id: i64,
    pub month: Month,
    pub celsius: f64,
}

impl NewTemperature {
    pub fn new(city_id: i64, month: Month, celsius: f64) -> Self {
        Self { city_id, month, celsius }
    }

    pub fn season(&self) -> Season {
        self.month.season()
    }

    pub(crate) fn into_temperature(self, id: i64) -> Temperature {
        Temperature {
            id,
            city_id: self.city_id,
            month: self.month,
            celsius: self.celsius,
            season: self.season(),
        }
    }
}
