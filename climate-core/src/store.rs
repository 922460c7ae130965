use async_trait::async_trait;
use std::{fmt::Debug, path::Path, sync::Arc};

use crate::{
    calendar::{Month, Season},
    model::{City, NewTemperature, Temperature},
};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

/// Persistence gateway for cities and their monthly readings.
///
/// Every write is a single-row atomic operation. Deleting a city removes
/// all of its readings, and a city holds at most one reading per month.
#[async_trait]
pub trait WeatherStore: Send + Sync + Debug {
    /// Stores a new city and returns it with its generated id.
    async fn insert_city(&self, name: &str, city_type: &str) -> anyhow::Result<City>;

    async fn update_city(&self, city: &City) -> anyhow::Result<()>;

    /// Removes the city together with all of its readings.
    async fn delete_city(&self, city: &City) -> anyhow::Result<()>;

    async fn get_all_cities(&self) -> anyhow::Result<Vec<City>>;

    async fn get_city_by_name(&self, name: &str) -> anyhow::Result<Option<City>>;

    async fn get_city_by_id(&self, id: i64) -> anyhow::Result<Option<City>>;

    /// Fails if the city is unknown or already has a reading for that month.
    async fn insert_temperature(&self, temperature: &NewTemperature)
    -> anyhow::Result<Temperature>;

    async fn update_temperature(&self, temperature: &Temperature) -> anyhow::Result<()>;

    async fn delete_temperature(&self, temperature: &Temperature) -> anyhow::Result<()>;

    async fn get_temperatures_by_city_and_season(
        &self,
        city_id: i64,
        season: Season,
    ) -> anyhow::Result<Vec<Temperature>>;

    async fn get_temperatures_by_city(&self, city_id: i64) -> anyhow::Result<Vec<Temperature>>;

    /// The reading for `(city_id, month)`, used to decide insert versus update.
    async fn get_temperature(
        &self,
        city_id: i64,
        month: Month,
    ) -> anyhow::Result<Option<Temperature>>;
}

/// Opens the SQLite store at `path`, or an in-memory store when `path` is `None`.
pub fn open_store(path: Option<&Path>) -> anyhow::Result<Arc<dyn WeatherStore>> {
    let store: Arc<dyn WeatherStore> = match path {
        Some(path) => Arc::new(SqliteStore::open(path)?),
        None => Arc::new(MemoryStore::new()),
    };

    Ok(store)
}
