//! Core library for the `climate` journal.
//!
//! This crate defines:
//! - Shared domain models (cities, monthly readings, months and seasons)
//! - City classification, seasonal averaging and unit formatting
//! - Abstraction over the persistence layer, with SQLite and in-memory stores
//! - The engine holding the user's selection and publishing snapshots
//! - Configuration handling
//!
//! It is used by `climate-cli`, but any other front end can drive
//! [`ClimateEngine`] the same way.

pub mod aggregate;
pub mod calendar;
pub mod city_type;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod seed;
pub mod store;
pub mod unit;

pub use calendar::{Month, Season};
pub use config::Config;
pub use engine::{ClimateEngine, SeasonAverage, Snapshot};
pub use error::ClimateError;
pub use model::{City, NewTemperature, Temperature};
pub use store::{MemoryStore, SqliteStore, WeatherStore, open_store};
pub use unit::{TemperatureUnit, format_temperature};
