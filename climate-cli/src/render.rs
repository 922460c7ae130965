//! Human-readable output.

use std::fmt::Write;

use climate_core::{City, Season, Snapshot, Temperature, TemperatureUnit, format_temperature};

pub fn cities(cities: &[City]) -> String {
    if cities.is_empty() {
        return "No cities yet. Add one with `climate add-city <name> <type>`.\n".to_string();
    }

    let width = cities.iter().map(|c| c.name.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for city in cities {
        let _ = writeln!(out, "{:<width$}  {}", city.name, city.city_type);
    }
    out
}

pub fn seasons(seasons: &[Season]) -> String {
    if seasons.is_empty() {
        return "No readings for this city.\n".to_string();
    }

    seasons.iter().map(|s| format!("{s}\n")).collect()
}

pub fn reading(celsius: f64) -> String {
    format_temperature(celsius, TemperatureUnit::Celsius)
}

pub fn readings(readings: &[Temperature]) -> String {
    if readings.is_empty() {
        return "No readings for this city.\n".to_string();
    }

    let mut out = String::new();
    for t in readings {
        let _ = writeln!(out, "{:<10} {:>8}  {}", t.month.as_str(), reading(t.celsius), t.season);
    }
    out
}

pub fn snapshot(snapshot: &Snapshot) -> String {
    let mut out = String::new();

    match &snapshot.selected_city {
        Some(city) => {
            let city_type = snapshot.city_type.as_deref().unwrap_or(&city.city_type);
            let _ = writeln!(out, "City:    {} ({city_type})", city.name);
        }
        None => {
            let _ = writeln!(out, "City:    -");
        }
    }

    let season = snapshot.selected_season.map_or_else(|| "-".to_string(), |s| s.to_string());
    let _ = writeln!(out, "Season:  {season}");
    let _ = writeln!(out, "Unit:    {}", snapshot.unit);
    let _ = writeln!(out, "Average: {}", snapshot.average_text);

    out
}
