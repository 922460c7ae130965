use anyhow::{Result, anyhow};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    calendar::{Month, Season},
    model::{City, NewTemperature, Temperature},
};

use super::WeatherStore;

/// In-process store with the same semantics as [`super::SqliteStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    cities: Vec<City>,
    temperatures: Vec<Temperature>,
    last_city_id: i64,
    last_temperature_id: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WeatherStore for MemoryStore {
    async fn insert_city(&self, name: &str, city_type: &str) -> Result<City> {
        let mut tables = self.inner.lock().await;

        tables.last_city_id += 1;
        let city = City {
            id: tables.last_city_id,
            name: name.to_string(),
            city_type: city_type.to_string(),
        };
        tables.cities.push(city.clone());

        debug!(id = city.id, name, "city inserted");
        Ok(city)
    }

    async fn update_city(&self, city: &City) -> Result<()> {
        let mut tables = self.inner.lock().await;

        if let Some(existing) = tables.cities.iter_mut().find(|c| c.id == city.id) {
            *existing = city.clone();
        }
        Ok(())
    }

    async fn delete_city(&self, city: &City) -> Result<()> {
        let mut tables = self.inner.lock().await;

        tables.cities.retain(|c| c.id != city.id);
        tables.temperatures.retain(|t| t.city_id != city.id);
        Ok(())
    }

    async fn get_all_cities(&self) -> Result<Vec<City>> {
        Ok(self.inner.lock().await.cities.clone())
    }

    async fn get_city_by_name(&self, name: &str) -> Result<Option<City>> {
        let tables = self.inner.lock().await;
        Ok(tables.cities.iter().find(|c| c.name == name).cloned())
    }

    async fn get_city_by_id(&self, id: i64) -> Result<Option<City>> {
        let tables = self.inner.lock().await;
        Ok(tables.cities.iter().find(|c| c.id == id).cloned())
    }

    async fn insert_temperature(&self, temperature: &NewTemperature) -> Result<Temperature> {
        let mut tables = self.inner.lock().await;

        if !tables.cities.iter().any(|c| c.id == temperature.city_id) {
            return Err(anyhow!("City with id {} does not exist", temperature.city_id));
        }
        if tables
            .temperatures
            .iter()
            .any(|t| t.city_id == temperature.city_id && t.month == temperature.month)
        {
            return Err(anyhow!(
                "City with id {} already has a reading for {}",
                temperature.city_id,
                temperature.month
            ));
        }

        tables.last_temperature_id += 1;
        let stored = temperature.into_temperature(tables.last_temperature_id);
        tables.temperatures.push(stored.clone());

        Ok(stored)
    }

    async fn update_temperature(&self, temperature: &Temperature) -> Result<()> {
        let mut tables = self.inner.lock().await;

        if let Some(existing) = tables.temperatures.iter_mut().find(|t| t.id == temperature.id) {
            *existing = temperature.clone();
        }
        Ok(())
    }

    async fn delete_temperature(&self, temperature: &Temperature) -> Result<()> {
        let mut tables = self.inner.lock().await;
        tables.temperatures.retain(|t| t.id != temperature.id);
        Ok(())
    }

    async fn get_temperatures_by_city_and_season(
        &self,
        city_id: i64,
        season: Season,
    ) -> Result<Vec<Temperature>> {
        let tables = self.inner.lock().await;

        Ok(tables
            .temperatures
            .iter()
            .filter(|t| t.city_id == city_id && t.season == season)
            .cloned()
            .collect())
    }

    async fn get_temperatures_by_city(&self, city_id: i64) -> Result<Vec<Temperature>> {
        let tables = self.inner.lock().await;
        Ok(tables.temperatures.iter().filter(|t| t.city_id == city_id).cloned().collect())
    }

    async fn get_temperature(&self, city_id: i64, month: Month) -> Result<Option<Temperature>> {
        let tables = self.inner.lock().await;

        Ok(tables.temperatures.iter().find(|t| t.city_id == city_id && t.month == month).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ids_are_generated_in_sequence() {
        let store = MemoryStore::new();

        let a = store.insert_city("Kazan", "Medium").await.unwrap();
        let b = store.insert_city("Tver", "Small").await.unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert_eq!(store.get_city_by_id(2).await.unwrap(), Some(b));
    }

    #[tokio::test]
    async fn deleting_city_cascades_to_readings() {
        let store = MemoryStore::new();
        let kazan = store.insert_city("Kazan", "Medium").await.unwrap();
        let tver = store.insert_city("Tver", "Small").await.unwrap();

        for month in [Month::January, Month::July, Month::October] {
            store.insert_temperature(&NewTemperature::new(kazan.id, month, 1.0)).await.unwrap();
        }
        store.insert_temperature(&NewTemperature::new(tver.id, Month::July, 20.0)).await.unwrap();

        store.delete_city(&kazan).await.unwrap();

        assert!(store.get_temperatures_by_city(kazan.id).await.unwrap().is_empty());
        assert_eq!(store.get_temperatures_by_city(tver.id).await.unwrap().len(), 1);
        assert_eq!(store.get_city_by_name("Kazan").await.unwrap(), None);
    }

    #[tokio::test]
    async fn second_reading_for_same_month_is_rejected() {
        let store = MemoryStore::new();
        let kazan = store.insert_city("Kazan", "Medium").await.unwrap();

        let reading = NewTemperature::new(kazan.id, Month::July, 25.0);
        store.insert_temperature(&reading).await.unwrap();

        assert!(store.insert_temperature(&reading).await.is_err());
    }

    #[tokio::test]
    async fn reading_for_missing_city_is_rejected() {
        let store = MemoryStore::new();

        let err = store
            .insert_temperature(&NewTemperature::new(42, Month::May, 10.0))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("does not exist"));
    }

    #[tokio::test]
    async fn readings_are_filtered_by_season() {
        let store = MemoryStore::new();
        let kazan = store.insert_city("Kazan", "Medium").await.unwrap();

        for (month, value) in [(Month::June, 18.0), (Month::July, 25.0), (Month::December, -9.0)] {
            store.insert_temperature(&NewTemperature::new(kazan.id, month, value)).await.unwrap();
        }

        let summer =
            store.get_temperatures_by_city_and_season(kazan.id, Season::Summer).await.unwrap();
        assert_eq!(summer.len(), 2);
        assert!(summer.iter().all(|t| t.season == Season::Summer));

        let july = store.get_temperature(kazan.id, Month::July).await.unwrap().unwrap();
        store.update_temperature(&july.with_celsius(30.0)).await.unwrap();
        let july = store.get_temperature(kazan.id, Month::July).await.unwrap().unwrap();
        assert_eq!(july.celsius, 30.0);

        store.delete_temperature(&july).await.unwrap();
        assert_eq!(store.get_temperature(kazan.id, Month::July).await.unwrap(), None);
    }
}
