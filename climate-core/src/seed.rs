//! First-run demo data.

use rand::RngExt;
use tracing::info;

use crate::{
    calendar::Month,
    model::NewTemperature,
    store::WeatherStore,
};

/// Sample cities inserted into an empty store.
pub const DEMO_CITIES: &[(&str, &str)] =
    &[("Москва", "Large"), ("Санкт-Петербург", "Large"), ("Новосибирск", "Medium")];

/// Upper bound (exclusive) of the random offset added to each base value.
pub const JITTER: f64 = 5.0;

/// Lower end of the synthetic reading range for `month`.
pub fn base_celsius(month: Month) -> f64 {
    match month {
        Month::January => -10.0,
        Month::February => -5.0,
        Month::March => 0.0,
        Month::April => 10.0,
        Month::May => 15.0,
        Month::June => 20.0,
        Month::July => 25.0,
        Month::August => 22.0,
        Month::September => 17.0,
        Month::October => 10.0,
        Month::November => 5.0,
        Month::December => -5.0,
    }
}

/// Fills an empty store with [`DEMO_CITIES`] and twelve readings each.
///
/// Returns `false` without touching the store when any city already exists.
pub async fn seed_if_empty(store: &dyn WeatherStore) -> anyhow::Result<bool> {
    if !store.get_all_cities().await?.is_empty() {
        return Ok(false);
    }

    for (name, city_type) in DEMO_CITIES {
        let city = store.insert_city(name, city_type).await?;

        for month in Month::all() {
            let celsius = base_celsius(*month) + rand::rng().random_range(0.0..JITTER);
            store.insert_temperature(&NewTemperature::new(city.id, *month, celsius)).await?;
        }
    }

    info!(cities = DEMO_CITIES.len(), "seeded demo data");
    Ok(true)
}
