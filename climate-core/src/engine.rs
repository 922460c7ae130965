//! Selection state and orchestration of the climate journal.
//!
//! [`ClimateEngine`] answers "what is the average temperature of city X in
//! season Y, shown in unit Z". It owns the current selection, talks to the
//! injected [`WeatherStore`] and publishes a fresh [`Snapshot`] after every
//! intent that changes what the user sees.
//!
//! Intents take `&mut self`, so they run in the order they are issued.

use serde::Serialize;
use std::{collections::BTreeSet, convert::TryFrom, sync::Arc};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::{
    aggregate::{average, is_valid_reading},
    calendar::{Month, Season},
    city_type::effective_city_type,
    error::{ClimateError, Result},
    model::{City, NewTemperature, Temperature},
    seed::seed_if_empty,
    store::WeatherStore,
    unit::{TemperatureUnit, format_temperature},
};

/// Placeholder shown while no season is selected.
pub const AVERAGE_PLACEHOLDER: &str = "Average temperature";
/// Shown when the selected season has no readings.
pub const NO_DATA: &str = "No data";

/// Average of the selected city and season.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", content = "celsius", rename_all = "snake_case")]
pub enum SeasonAverage {
    NotSelected,
    NoData,
    Celsius(f64),
}

impl SeasonAverage {
    pub fn display(&self, unit: TemperatureUnit) -> String {
        match self {
            SeasonAverage::NotSelected => AVERAGE_PLACEHOLDER.to_string(),
            SeasonAverage::NoData => NO_DATA.to_string(),
            SeasonAverage::Celsius(celsius) => format_temperature(*celsius, unit),
        }
    }

    pub fn celsius(&self) -> Option<f64> {
        match self {
            SeasonAverage::Celsius(celsius) => Some(*celsius),
            _ => None,
        }
    }
}

/// Everything the UI renders, published after each state change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// All cities, with their types resolved.
    pub cities: Vec<City>,
    pub selected_city: Option<City>,
    pub city_type: Option<String>,
    /// Seasons that have at least one reading for the selected city.
    pub seasons: Vec<Season>,
    pub selected_season: Option<Season>,
    pub unit: TemperatureUnit,
    pub average: SeasonAverage,
    pub average_text: String,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            cities: Vec::new(),
            selected_city: None,
            city_type: None,
            seasons: Vec::new(),
            selected_season: None,
            unit: TemperatureUnit::default(),
            average: SeasonAverage::NotSelected,
            average_text: AVERAGE_PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug)]
pub struct ClimateEngine {
    store: Arc<dyn WeatherStore>,
    cities: Vec<City>,
    selected_city: Option<City>,
    city_type: Option<String>,
    seasons: Vec<Season>,
    selected_season: Option<Season>,
    unit: TemperatureUnit,
    average: SeasonAverage,
    updates: watch::Sender<Snapshot>,
}

impl ClimateEngine {
    pub fn new(store: Arc<dyn WeatherStore>, unit: TemperatureUnit) -> Self {
        let (updates, _) = watch::channel(Snapshot { unit, ..Snapshot::default() });

        Self {
            store,
            cities: Vec::new(),
            selected_city: None,
            city_type: None,
            seasons: Vec::new(),
            selected_season: None,
            unit,
            average: SeasonAverage::NotSelected,
            updates,
        }
    }

    /// Seeds demo data into an empty store when `seed` is set, then loads the city list.
    pub async fn start(&mut self, seed: bool) -> Result<()> {
        if seed {
            seed_if_empty(self.store.as_ref()).await?;
        }
        self.refresh_cities().await
    }

    /// Receiver that observes every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.updates.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.updates.borrow().clone()
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn selected_city(&self) -> Option<&City> {
        self.selected_city.as_ref()
    }

    pub fn selected_season(&self) -> Option<Season> {
        self.selected_season
    }

    pub fn seasons(&self) -> &[Season] {
        &self.seasons
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    pub fn average(&self) -> SeasonAverage {
        self.average
    }

    pub fn average_text(&self) -> String {
        self.average.display(self.unit)
    }

    /// Reloads the city list, resolving each city's type.
    pub async fn refresh_cities(&mut self) -> Result<()> {
        self.cities = self
            .store
            .get_all_cities()
            .await?
            .into_iter()
            .map(|city| City { city_type: effective_city_type(&city), ..city })
            .collect();

        let selection_gone = self
            .selected_city
            .as_ref()
            .is_some_and(|selected| !self.cities.iter().any(|c| c.id == selected.id));
        if selection_gone {
            self.clear_selection();
        }

        self.publish();
        Ok(())
    }

    /// Selects the city called `name` and resets the season choice.
    ///
    /// On `CityNotFound` the previous selection is kept.
    pub async fn select_city(&mut self, name: &str) -> Result<()> {
        let city = match self.city(name).await {
            Ok(city) => city,
            Err(e) => {
                if matches!(e, ClimateError::CityNotFound(_)) {
                    warn!(name, "selected city not found");
                }
                return Err(e);
            }
        };

        let seasons = self.seasons_for(city.id).await?;

        self.city_type = Some(effective_city_type(&city));
        self.selected_city = Some(city);
        self.seasons = seasons;
        self.selected_season = None;
        self.average = SeasonAverage::NotSelected;

        self.publish();
        Ok(())
    }

    /// Selects a season of the selected city and computes its average.
    ///
    /// On error the previous season and average stay selected.
    pub async fn select_season(&mut self, name: &str) -> Result<()> {
        let Some(city) = &self.selected_city else {
            return Err(ClimateError::NoCitySelected);
        };
        let season = Season::try_from(name)?;

        let average = self.season_average(city, season).await?;
        self.selected_season = Some(season);
        self.average = average;

        self.publish();
        Ok(())
    }

    /// Changes the display unit. The cached average is re-rendered, not re-queried.
    pub fn set_unit(&mut self, unit: TemperatureUnit) {
        self.unit = unit;
        self.publish();
    }

    /// Distinct seasons that have readings for `city_id`, in calendar order.
    pub async fn seasons_for(&self, city_id: i64) -> Result<Vec<Season>> {
        let seasons: BTreeSet<Season> = self
            .store
            .get_temperatures_by_city(city_id)
            .await?
            .into_iter()
            .map(|t| t.season)
            .collect();

        Ok(seasons.into_iter().collect())
    }

    /// All readings of the city called `name`, in calendar order.
    pub async fn readings(&self, name: &str) -> Result<Vec<Temperature>> {
        let city = self.city(name).await?;

        let mut readings = self.store.get_temperatures_by_city(city.id).await?;
        readings.sort_by_key(|t| t.month);
        Ok(readings)
    }

    /// Adds a city. Names are unique, so a second city with the same name is rejected.
    pub async fn add_city(&mut self, name: &str, city_type: &str) -> Result<City> {
        let (name, city_type) = validate_city_fields(name, city_type)?;

        if self.store.get_city_by_name(name).await?.is_some() {
            return Err(ClimateError::DuplicateCity(name.to_string()));
        }

        let city = self.store.insert_city(name, city_type).await?;
        info!(id = city.id, name, city_type, "city added");

        self.refresh_cities().await?;
        Ok(city)
    }

    /// Renames or reclassifies an existing city.
    pub async fn update_city(&mut self, city: &City) -> Result<()> {
        let (name, city_type) = validate_city_fields(&city.name, &city.city_type)?;

        if self.store.get_city_by_id(city.id).await?.is_none() {
            return Err(ClimateError::CityNotFound(city.name.clone()));
        }
        let taken = self.store.get_city_by_name(name).await?.is_some_and(|c| c.id != city.id);
        if taken {
            return Err(ClimateError::DuplicateCity(name.to_string()));
        }

        let updated = City { id: city.id, name: name.to_string(), city_type: city_type.to_string() };
        self.store.update_city(&updated).await?;
        info!(id = updated.id, name, city_type, "city updated");

        if self.selected_city.as_ref().is_some_and(|c| c.id == updated.id) {
            self.city_type = Some(effective_city_type(&updated));
            self.selected_city = Some(updated);
        }

        self.refresh_cities().await
    }

    /// Records the reading of `city_name` for `month`, replacing any existing one.
    pub async fn add_temperature(
        &mut self,
        city_name: &str,
        month: &str,
        celsius: f64,
    ) -> Result<Temperature> {
        if city_name.trim().is_empty() {
            return Err(ClimateError::BlankCityName);
        }
        if !is_valid_reading(celsius) {
            return Err(ClimateError::TemperatureOutOfRange(celsius));
        }
        let month = Month::try_from(month)?;
        let city = self.city(city_name).await?;

        let stored = match self.store.get_temperature(city.id, month).await? {
            Some(existing) => {
                let updated = existing.with_celsius(celsius);
                self.store.update_temperature(&updated).await?;
                info!(city = %city.name, %month, celsius, "temperature updated");
                updated
            }
            None => {
                let inserted =
                    self.store.insert_temperature(&NewTemperature::new(city.id, month, celsius)).await?;
                info!(city = %city.name, %month, celsius, "temperature added");
                inserted
            }
        };

        if self.selected_city.as_ref().is_some_and(|c| c.id == city.id) {
            let seasons = self.seasons_for(city.id).await?;
            let average = match self.selected_season {
                Some(season) if season == stored.season => {
                    Some(self.season_average(&city, season).await?)
                }
                _ => None,
            };

            self.seasons = seasons;
            if let Some(average) = average {
                self.average = average;
            }
            self.publish();
        }

        Ok(stored)
    }

    /// Deletes `city` and its readings. Clears the selection if it was selected.
    pub async fn delete_city(&mut self, city: &City) -> Result<()> {
        self.store.delete_city(city).await?;
        info!(id = city.id, name = %city.name, "city deleted");

        if self.selected_city.as_ref().is_some_and(|c| c.id == city.id) {
            self.clear_selection();
        }

        self.refresh_cities().await
    }

    pub async fn delete_city_by_name(&mut self, name: &str) -> Result<City> {
        let city = self.city(name).await?;
        self.delete_city(&city).await?;
        Ok(city)
    }

    /// Stored city called `name`, with its type as stored. Surrounding whitespace is ignored.
    pub async fn city(&self, name: &str) -> Result<City> {
        self.store
            .get_city_by_name(name.trim())
            .await?
            .ok_or_else(|| ClimateError::CityNotFound(name.to_string()))
    }

    /// Average of `city` in `season`. Reads the store but leaves the selection untouched.
    async fn season_average(&self, city: &City, season: Season) -> Result<SeasonAverage> {
        let readings: Vec<f64> = self
            .store
            .get_temperatures_by_city_and_season(city.id, season)
            .await?
            .iter()
            .map(|t| t.celsius)
            .collect();

        let average = match average(&readings) {
            Some(celsius) => {
                info!(city = %city.name, %season, average = celsius, "seasonal average computed");
                SeasonAverage::Celsius(celsius)
            }
            None => {
                info!(city = %city.name, %season, "no readings for season");
                SeasonAverage::NoData
            }
        };

        Ok(average)
    }

    fn clear_selection(&mut self) {
        self.selected_city = None;
        self.city_type = None;
        self.seasons.clear();
        self.selected_season = None;
        self.average = SeasonAverage::NotSelected;
    }

    fn publish(&self) {
        let snapshot = Snapshot {
            cities: self.cities.clone(),
            selected_city: self.selected_city.clone(),
            city_type: self.city_type.clone(),
            seasons: self.seasons.clone(),
            selected_season: self.selected_season,
            unit: self.unit,
            average: self.average,
            average_text: self.average_text(),
        };

        debug!(average = %snapshot.average_text, "snapshot published");
        self.updates.send_replace(snapshot);
    }
}

fn validate_city_fields<'a>(name: &'a str, city_type: &'a str) -> Result<(&'a str, &'a str)> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ClimateError::BlankCityName);
    }

    let city_type = city_type.trim();
    if city_type.is_empty() {
        return Err(ClimateError::BlankCityType);
    }

    Ok((name, city_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, SqliteStore};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Delegates to a `MemoryStore`, but the seasonal query fails while `broken` is set.
    #[derive(Debug, Default)]
    struct FlakySeasonStore {
        inner: MemoryStore,
        broken: AtomicBool,
    }

    #[async_trait]
    impl WeatherStore for FlakySeasonStore {
        async fn insert_city(&self, name: &str, city_type: &str) -> anyhow::Result<City> {
            self.inner.insert_city(name, city_type).await
        }

        async fn update_city(&self, city: &City) -> anyhow::Result<()> {
            self.inner.update_city(city).await
        }

        async fn delete_city(&self, city: &City) -> anyhow::Result<()> {
            self.inner.delete_city(city).await
        }

        async fn get_all_cities(&self) -> anyhow::Result<Vec<City>> {
            self.inner.get_all_cities().await
        }

        async fn get_city_by_name(&self, name: &str) -> anyhow::Result<Option<City>> {
            self.inner.get_city_by_name(name).await
        }

        async fn get_city_by_id(&self, id: i64) -> anyhow::Result<Option<City>> {
            self.inner.get_city_by_id(id).await
        }

        async fn insert_temperature(
            &self,
            temperature: &NewTemperature,
        ) -> anyhow::Result<Temperature> {
            self.inner.insert_temperature(temperature).await
        }

        async fn update_temperature(&self, temperature: &Temperature) -> anyhow::Result<()> {
            self.inner.update_temperature(temperature).await
        }

        async fn delete_temperature(&self, temperature: &Temperature) -> anyhow::Result<()> {
            self.inner.delete_temperature(temperature).await
        }

        async fn get_temperatures_by_city_and_season(
            &self,
            city_id: i64,
            season: Season,
        ) -> anyhow::Result<Vec<Temperature>> {
            if self.broken.load(Ordering::SeqCst) {
                anyhow::bail!("disk I/O error");
            }
            self.inner.get_temperatures_by_city_and_season(city_id, season).await
        }

        async fn get_temperatures_by_city(&self, city_id: i64) -> anyhow::Result<Vec<Temperature>> {
            self.inner.get_temperatures_by_city(city_id).await
        }

        async fn get_temperature(
            &self,
            city_id: i64,
            month: Month,
        ) -> anyhow::Result<Option<Temperature>> {
            self.inner.get_temperature(city_id, month).await
        }
    }

    fn engine_with(store: Arc<dyn WeatherStore>) -> ClimateEngine {
        ClimateEngine::new(store, TemperatureUnit::Celsius)
    }

    async fn engine() -> ClimateEngine {
        let mut engine = engine_with(Arc::new(MemoryStore::new()));
        engine.start(false).await.unwrap();
        engine
    }

    #[tokio::test]
    async fn summer_average_in_celsius_and_fahrenheit() {
        let mut engine = engine_with(Arc::new(SqliteStore::open_in_memory().unwrap()));
        engine.start(false).await.unwrap();

        engine.add_city("Москва", "Large").await.unwrap();
        engine.add_temperature("Москва", "Июль", 25.0).await.unwrap();
        engine.add_temperature("Москва", "Август", 27.0).await.unwrap();

        engine.select_city("Москва").await.unwrap();
        engine.select_season("Лето").await.unwrap();

        assert_eq!(engine.average(), SeasonAverage::Celsius(26.0));
        assert_eq!(engine.average_text(), "26.0°C");

        engine.set_unit(TemperatureUnit::Fahrenheit);
        assert_eq!(engine.average_text(), "78.8°F");
        assert_eq!(engine.snapshot().average_text, "78.8°F");
    }

    #[tokio::test]
    async fn selecting_another_city_resets_season() {
        let mut engine = engine().await;
        engine.add_city("Moscow", "Large").await.unwrap();
        engine.add_city("Kazan", "Medium").await.unwrap();

        engine.add_temperature("Moscow", "July", 25.0).await.unwrap();
        engine.add_temperature("Moscow", "January", -10.0).await.unwrap();
        engine.add_temperature("Kazan", "October", 6.0).await.unwrap();

        engine.select_city("Moscow").await.unwrap();
        assert_eq!(engine.seasons(), &[Season::Winter, Season::Summer]);
        engine.select_season("Summer").await.unwrap();
        assert_eq!(engine.selected_season(), Some(Season::Summer));

        engine.select_city("Kazan").await.unwrap();

        assert_eq!(engine.selected_season(), None);
        assert_eq!(engine.seasons(), &[Season::Autumn]);
        assert_eq!(engine.average(), SeasonAverage::NotSelected);
        assert_eq!(engine.average_text(), AVERAGE_PLACEHOLDER);
        assert_eq!(engine.snapshot().city_type.as_deref(), Some("Medium"));
    }

    #[tokio::test]
    async fn repeated_month_updates_in_place() {
        let store = Arc::new(MemoryStore::new());
        let mut engine = engine_with(store.clone());
        let city = engine.add_city("Kazan", "Medium").await.unwrap();

        engine.add_temperature("Kazan", "July", 25.0).await.unwrap();
        engine.add_temperature("Kazan", "July", 30.0).await.unwrap();

        let readings = store.get_temperatures_by_city(city.id).await.unwrap();
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].month, Month::July);
        assert_eq!(readings[0].celsius, 30.0);
    }

    #[tokio::test]
    async fn deleting_city_removes_its_readings() {
        let store = Arc::new(MemoryStore::new());
        let mut engine = engine_with(store.clone());

        for name in ["A", "B", "C", "D", "E"] {
            engine.add_city(name, "Small").await.unwrap();
        }
        for month in ["Jan", "Feb", "Mar"] {
            engine.add_temperature("E", month, 1.0).await.unwrap();
        }
        let fifth = store.get_city_by_id(5).await.unwrap().unwrap();
        assert_eq!(store.get_temperatures_by_city(5).await.unwrap().len(), 3);

        engine.delete_city(&fifth).await.unwrap();

        assert!(store.get_temperatures_by_city(5).await.unwrap().is_empty());
        assert_eq!(engine.cities().len(), 4);
    }

    #[tokio::test]
    async fn deleting_selected_city_clears_selection() {
        let mut engine = engine().await;
        engine.add_city("Kazan", "Medium").await.unwrap();
        engine.add_temperature("Kazan", "May", 14.0).await.unwrap();
        engine.select_city("Kazan").await.unwrap();
        engine.select_season("Весна").await.unwrap();

        engine.delete_city_by_name("Kazan").await.unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.selected_city, None);
        assert_eq!(snapshot.selected_season, None);
        assert!(snapshot.seasons.is_empty());
        assert!(snapshot.cities.is_empty());
        assert_eq!(snapshot.average, SeasonAverage::NotSelected);
    }

    #[tokio::test]
    async fn validation_errors_abort_without_writes() {
        let store = Arc::new(MemoryStore::new());
        let mut engine = engine_with(store.clone());

        assert!(matches!(engine.add_city("  ", "Large").await, Err(ClimateError::BlankCityName)));
        assert!(matches!(engine.add_city("Kazan", "").await, Err(ClimateError::BlankCityType)));
        assert!(store.get_all_cities().await.unwrap().is_empty());

        engine.add_city("Kazan", "Medium").await.unwrap();

        assert!(matches!(
            engine.add_temperature("Kazan", "July", 50.5).await,
            Err(ClimateError::TemperatureOutOfRange(v)) if v == 50.5
        ));
        assert!(matches!(
            engine.add_temperature("Kazan", "July", -51.0).await,
            Err(ClimateError::TemperatureOutOfRange(_))
        ));
        assert!(matches!(
            engine.add_temperature("Kazan", "Smarch", 10.0).await,
            Err(ClimateError::UnknownMonth(_))
        ));
        assert!(matches!(
            engine.add_temperature("Tver", "July", 10.0).await,
            Err(ClimateError::CityNotFound(_))
        ));
        assert!(matches!(
            engine.add_temperature("", "July", 10.0).await,
            Err(ClimateError::BlankCityName)
        ));

        let kazan = store.get_city_by_name("Kazan").await.unwrap().unwrap();
        assert!(store.get_temperatures_by_city(kazan.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_city_keeps_previous_selection() {
        let mut engine = engine().await;
        engine.add_city("Kazan", "Medium").await.unwrap();
        engine.select_city("Kazan").await.unwrap();

        let err = engine.select_city("Atlantis").await.unwrap_err();

        assert!(matches!(err, ClimateError::CityNotFound(ref n) if n == "Atlantis"));
        assert_eq!(engine.selected_city().map(|c| c.name.as_str()), Some("Kazan"));
    }

    #[tokio::test]
    async fn season_requires_selected_city() {
        let mut engine = engine().await;

        let err = engine.select_season("Лето").await.unwrap_err();

        assert!(matches!(err, ClimateError::NoCitySelected));
        assert_eq!(engine.selected_season(), None);
    }

    #[tokio::test]
    async fn unknown_season_is_rejected() {
        let mut engine = engine().await;
        engine.add_city("Kazan", "Medium").await.unwrap();
        engine.select_city("Kazan").await.unwrap();

        let err = engine.select_season("Monsoon").await.unwrap_err();
        assert!(matches!(err, ClimateError::UnknownSeason(_)));
    }

    #[tokio::test]
    async fn season_without_readings_is_no_data() {
        let mut engine = engine().await;
        engine.add_city("Kazan", "Medium").await.unwrap();
        engine.add_temperature("Kazan", "July", 0.0).await.unwrap();
        engine.select_city("Kazan").await.unwrap();

        engine.select_season("Winter").await.unwrap();
        assert_eq!(engine.average(), SeasonAverage::NoData);
        assert_eq!(engine.average_text(), NO_DATA);

        engine.select_season("Summer").await.unwrap();
        assert_eq!(engine.average(), SeasonAverage::Celsius(0.0));
        assert_eq!(engine.average_text(), "0.0°C");
    }

    #[tokio::test]
    async fn new_reading_refreshes_displayed_average() {
        let mut engine = engine().await;
        engine.add_city("Kazan", "Medium").await.unwrap();
        engine.add_temperature("Kazan", "June", 20.0).await.unwrap();
        engine.select_city("Kazan").await.unwrap();
        engine.select_season("Summer").await.unwrap();
        assert_eq!(engine.average_text(), "20.0°C");

        engine.add_temperature("Kazan", "August", 24.0).await.unwrap();
        assert_eq!(engine.average_text(), "22.0°C");

        engine.add_temperature("Kazan", "December", -8.0).await.unwrap();
        assert_eq!(engine.average_text(), "22.0°C");
        assert_eq!(engine.seasons(), &[Season::Winter, Season::Summer]);
    }

    #[tokio::test]
    async fn unit_change_reformats_cached_average() {
        let store = Arc::new(MemoryStore::new());
        let mut engine = engine_with(store.clone());
        let city = engine.add_city("Kazan", "Medium").await.unwrap();
        engine.add_temperature("Kazan", "July", 0.0).await.unwrap();
        engine.select_city("Kazan").await.unwrap();
        engine.select_season("Summer").await.unwrap();

        // Changing the store behind the engine's back shows the value is not re-read.
        let july = store.get_temperature(city.id, Month::July).await.unwrap().unwrap();
        store.update_temperature(&july.with_celsius(40.0)).await.unwrap();

        engine.set_unit(TemperatureUnit::Kelvin);
        assert_eq!(engine.average_text(), "273.2K");
    }

    #[tokio::test]
    async fn city_list_resolves_types() {
        let mut engine = engine().await;
        engine.add_city("москва", "Village").await.unwrap();
        engine.add_city("Kazan", "Medium").await.unwrap();

        let types: Vec<_> = engine.cities().iter().map(|c| c.city_type.as_str()).collect();
        assert_eq!(types, ["Large", "Medium"]);
    }

    #[tokio::test]
    async fn update_city_refreshes_selection() {
        let mut engine = engine().await;
        let mut city = engine.add_city("Kazan", "Medium").await.unwrap();
        engine.select_city("Kazan").await.unwrap();

        city.city_type = "Large".into();
        engine.update_city(&city).await.unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.city_type.as_deref(), Some("Large"));
        assert_eq!(snapshot.cities[0].city_type, "Large");

        city.name = " ".into();
        assert!(matches!(engine.update_city(&city).await, Err(ClimateError::BlankCityName)));
    }

    #[tokio::test]
    async fn subscribers_see_published_snapshots() {
        let mut engine = engine().await;
        let mut updates = engine.subscribe();

        engine.add_city("Kazan", "Medium").await.unwrap();

        assert!(updates.has_changed().unwrap());
        let snapshot = updates.borrow_and_update().clone();
        assert_eq!(snapshot.cities.len(), 1);

        engine.set_unit(TemperatureUnit::Fahrenheit);
        assert!(updates.has_changed().unwrap());
        assert_eq!(updates.borrow_and_update().unit, TemperatureUnit::Fahrenheit);
    }

    #[tokio::test]
    async fn start_seeds_demo_cities() {
        let mut engine = engine_with(Arc::new(MemoryStore::new()));
        engine.start(true).await.unwrap();

        assert_eq!(engine.cities().len(), 3);

        engine.select_city("Москва").await.unwrap();
        assert_eq!(engine.seasons(), Season::all());

        let readings = engine.readings("Москва").await.unwrap();
        let months: Vec<_> = readings.iter().map(|t| t.month).collect();
        assert_eq!(months, Month::all());
    }

    #[tokio::test]
    async fn failed_season_read_keeps_previous_selection() {
        let store = Arc::new(FlakySeasonStore::default());
        let mut engine = engine_with(store.clone());
        engine.add_city("Kazan", "Medium").await.unwrap();
        engine.add_temperature("Kazan", "June", 20.0).await.unwrap();
        engine.add_temperature("Kazan", "January", -12.0).await.unwrap();
        engine.select_city("Kazan").await.unwrap();
        engine.select_season("Summer").await.unwrap();

        store.broken.store(true, Ordering::SeqCst);
        let err = engine.select_season("Winter").await.unwrap_err();

        assert!(matches!(err, ClimateError::Store(_)));
        assert_eq!(engine.selected_season(), Some(Season::Summer));
        assert_eq!(engine.average_text(), "20.0°C");

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.selected_season, engine.selected_season());
        assert_eq!(snapshot.average, engine.average());

        engine.set_unit(TemperatureUnit::Fahrenheit);
        let snapshot = engine.snapshot();
        assert_eq!(snapshot.selected_season, Some(Season::Summer));
        assert_eq!(snapshot.average_text, "68.0°F");
    }

    #[tokio::test]
    async fn failed_recompute_after_new_reading_keeps_state_consistent() {
        let store = Arc::new(FlakySeasonStore::default());
        let mut engine = engine_with(store.clone());
        engine.add_city("Kazan", "Medium").await.unwrap();
        engine.add_temperature("Kazan", "June", 20.0).await.unwrap();
        engine.select_city("Kazan").await.unwrap();
        engine.select_season("Summer").await.unwrap();

        store.broken.store(true, Ordering::SeqCst);
        assert!(engine.add_temperature("Kazan", "December", -8.0).await.is_ok());
        assert!(engine.add_temperature("Kazan", "July", 30.0).await.is_err());

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.seasons, engine.seasons());
        assert_eq!(snapshot.average, engine.average());
        assert_eq!(engine.average_text(), "20.0°C");
    }

    #[tokio::test]
    async fn lookups_ignore_surrounding_whitespace() {
        let mut engine = engine().await;
        engine.add_city("  Kazan  ", "Medium").await.unwrap();

        assert_eq!(engine.cities()[0].name, "Kazan");

        engine.select_city(" Kazan ").await.unwrap();
        assert_eq!(engine.selected_city().map(|c| c.name.as_str()), Some("Kazan"));

        let reading = engine.add_temperature(" Kazan ", "July", 22.0).await.unwrap();
        assert_eq!(reading.celsius, 22.0);
        assert_eq!(engine.city("\tKazan\n").await.unwrap().name, "Kazan");
    }

    #[tokio::test]
    async fn duplicate_city_names_are_rejected() {
        let store = Arc::new(MemoryStore::new());
        let mut engine = engine_with(store.clone());
        engine.add_city("Kazan", "Medium").await.unwrap();
        let tver = engine.add_city("Tver", "Small").await.unwrap();

        let err = engine.add_city(" Kazan ", "Large").await.unwrap_err();
        assert!(matches!(err, ClimateError::DuplicateCity(ref n) if n == "Kazan"));
        assert!(err.is_user_error());
        assert_eq!(store.get_all_cities().await.unwrap().len(), 2);

        let renamed = City { name: "Kazan".into(), ..tver.clone() };
        let err = engine.update_city(&renamed).await.unwrap_err();
        assert!(matches!(err, ClimateError::DuplicateCity(_)));

        let reclassified = City { city_type: "Medium".into(), ..tver };
        engine.update_city(&reclassified).await.unwrap();
    }

    #[tokio::test]
    async fn refresh_drops_selection_of_city_deleted_elsewhere() {
        let store = Arc::new(MemoryStore::new());
        let mut engine = engine_with(store.clone());
        let kazan = engine.add_city("Kazan", "Medium").await.unwrap();
        engine.add_city("Tver", "Small").await.unwrap();
        engine.add_temperature("Kazan", "July", 25.0).await.unwrap();
        engine.select_city("Kazan").await.unwrap();
        engine.select_season("Summer").await.unwrap();

        store.delete_city(&kazan).await.unwrap();
        engine.refresh_cities().await.unwrap();

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.selected_city, None);
        assert_eq!(snapshot.city_type, None);
        assert_eq!(snapshot.selected_season, None);
        assert!(snapshot.seasons.is_empty());
        assert_eq!(snapshot.average, SeasonAverage::NotSelected);
        assert_eq!(snapshot.cities.len(), 1);
    }
}
