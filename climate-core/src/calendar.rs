use chrono::{Datelike, Local};
use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

use crate::error::ClimateError;

/// Calendar month of a reading.
///
/// The canonical label is the Russian month name, which is also what the
/// store persists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const fn all() -> &'static [Month] {
        &[
            Month::January,
            Month::February,
            Month::March,
            Month::April,
            Month::May,
            Month::June,
            Month::July,
            Month::August,
            Month::September,
            Month::October,
            Month::November,
            Month::December,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Month::January => "Январь",
            Month::February => "Февраль",
            Month::March => "Март",
            Month::April => "Апрель",
            Month::May => "Май",
            Month::June => "Июнь",
            Month::July => "Июль",
            Month::August => "Август",
            Month::September => "Сентябрь",
            Month::October => "Октябрь",
            Month::November => "Ноябрь",
            Month::December => "Декабрь",
        }
    }

    fn english(&self) -> &'static str {
        match self {
            Month::January => "january",
            Month::February => "february",
            Month::March => "march",
            Month::April => "april",
            Month::May => "may",
            Month::June => "june",
            Month::July => "july",
            Month::August => "august",
            Month::September => "september",
            Month::October => "october",
            Month::November => "november",
            Month::December => "december",
        }
    }

    /// Fixed month to season mapping.
    pub fn season(&self) -> Season {
        match self {
            Month::December | Month::January | Month::February => Season::Winter,
            Month::March | Month::April | Month::May => Season::Spring,
            Month::June | Month::July | Month::August => Season::Summer,
            Month::September | Month::October | Month::November => Season::Autumn,
        }
    }

    /// 1-based month number.
    pub fn number(&self) -> u32 {
        Month::all().iter().position(|m| m == self).map_or(1, |i| i as u32 + 1)
    }

    pub fn from_number(number: u32) -> Option<Month> {
        let index = usize::try_from(number.checked_sub(1)?).ok()?;
        Month::all().get(index).copied()
    }

    /// Month of the local clock.
    pub fn current() -> Month {
        Month::from_number(Local::now().month()).unwrap_or(Month::January)
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Month {
    type Error = ClimateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        Month::all()
            .iter()
            .copied()
            .find(|m| {
                m.as_str().to_lowercase() == lower
                    || m.english() == lower
                    || (lower.chars().count() == 3 && m.english().starts_with(&lower))
            })
            .ok_or_else(|| ClimateError::UnknownMonth(value.to_string()))
    }
}

/// One of the four three-month groupings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Autumn,
}

impl Season {
    pub const fn all() -> &'static [Season] {
        &[Season::Winter, Season::Spring, Season::Summer, Season::Autumn]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Winter => "Зима",
            Season::Spring => "Весна",
            Season::Summer => "Лето",
            Season::Autumn => "Осень",
        }
    }

    pub fn months(&self) -> [Month; 3] {
        match self {
            Season::Winter => [Month::December, Month::January, Month::February],
            Season::Spring => [Month::March, Month::April, Month::May],
            Season::Summer => [Month::June, Month::July, Month::August],
            Season::Autumn => [Month::September, Month::October, Month::November],
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Season {
    type Error = ClimateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.trim().to_lowercase();

        match lower.as_str() {
            "зима" | "winter" => Ok(Season::Winter),
            "весна" | "spring" => Ok(Season::Spring),
            "лето" | "summer" => Ok(Season::Summer),
            "осень" | "autumn" | "fall" => Ok(Season::Autumn),
            _ => Err(ClimateError::UnknownSeason(value.to_string())),
        }
    }
}
