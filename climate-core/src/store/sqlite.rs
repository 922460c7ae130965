use anyhow::{Context, Result};
use async_trait::async_trait;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::{convert::TryFrom, path::Path};
use tokio::sync::Mutex;
use tracing::debug;

use crate::{
    calendar::{Month, Season},
    model::{City, NewTemperature, Temperature},
};

use super::WeatherStore;

const SCHEMA_VERSION: i32 = 1;

/// SQLite-backed store.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

/// Raw `temperatures` row before month/season labels are parsed.
type TemperatureRow = (i64, i64, String, f64, String);

impl SqliteStore {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create database directory: {}", parent.display())
            })?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;

        Self::with_connection(conn)
    }

    /// Private database that lives as long as the store.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }
}

fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")
        .context("Failed to enable foreign keys")?;

    conn.execute("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)", [])?;

    let version: i32 = conn
        .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| row.get(0))
        .optional()?
        .unwrap_or(0);

    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS cities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            type TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS temperatures (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            city_id INTEGER NOT NULL REFERENCES cities(id) ON DELETE CASCADE,
            month TEXT NOT NULL,
            temperature REAL NOT NULL,
            season TEXT NOT NULL,
            UNIQUE (city_id, month)
        );

        CREATE INDEX IF NOT EXISTS idx_cities_name ON cities(name);
        CREATE INDEX IF NOT EXISTS idx_temperatures_city_season ON temperatures(city_id, season);",
    )
    .context("Failed to initialize schema")?;

    if version < SCHEMA_VERSION {
        conn.execute("DELETE FROM schema_version", [])?;
        conn.execute("INSERT INTO schema_version (version) VALUES (?1)", params![SCHEMA_VERSION])?;
    }

    Ok(())
}

fn city_from_row(row: &Row<'_>) -> rusqlite::Result<City> {
    Ok(City { id: row.get(0)?, name: row.get(1)?, city_type: row.get(2)? })
}

fn temperature_row(row: &Row<'_>) -> rusqlite::Result<TemperatureRow> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
}

fn temperature_from_row((id, city_id, month, celsius, season): TemperatureRow) -> Result<Temperature> {
    let month = Month::try_from(month.as_str())
        .with_context(|| format!("Corrupt month in temperature row {id}"))?;
    let season = Season::try_from(season.as_str())
        .with_context(|| format!("Corrupt season in temperature row {id}"))?;

    Ok(Temperature { id, city_id, month, celsius, season })
}

const TEMPERATURE_COLUMNS: &str = "id, city_id, month, temperature, season";

#[async_trait]
impl WeatherStore for SqliteStore {
    async fn insert_city(&self, name: &str, city_type: &str) -> Result<City> {
        let conn = self.conn.lock().await;

        conn.execute("INSERT INTO cities (name, type) VALUES (?1, ?2)", params![name, city_type])
            .context("Failed to insert city")?;
        let id = conn.last_insert_rowid();

        debug!(id, name, "city inserted");
        Ok(City { id, name: name.to_string(), city_type: city_type.to_string() })
    }

    async fn update_city(&self, city: &City) -> Result<()> {
        let conn = self.conn.lock().await;

        conn.execute(
            "UPDATE cities SET name = ?1, type = ?2 WHERE id = ?3",
            params![city.name, city.city_type, city.id],
        )
        .context("Failed to update city")?;

        Ok(())
    }

    async fn delete_city(&self, city: &City) -> Result<()> {
        let conn = self.conn.lock().await;

        let removed = conn
            .execute("DELETE FROM cities WHERE id = ?1", params![city.id])
            .context("Failed to delete city")?;

        debug!(id = city.id, removed, "city deleted");
        Ok(())
    }

    async fn get_all_cities(&self) -> Result<Vec<City>> {
        let conn = self.conn.lock().await;

        let cities = conn
            .prepare("SELECT id, name, type FROM cities ORDER BY id")?
            .query_map([], city_from_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to load cities")?;

        Ok(cities)
    }

    async fn get_city_by_name(&self, name: &str) -> Result<Option<City>> {
        let conn = self.conn.lock().await;

        let city = conn
            .query_row(
                "SELECT id, name, type FROM cities WHERE name = ?1 ORDER BY id LIMIT 1",
                params![name],
                city_from_row,
            )
            .optional()
            .context("Failed to look up city by name")?;

        Ok(city)
    }

    async fn get_city_by_id(&self, id: i64) -> Result<Option<City>> {
        let conn = self.conn.lock().await;

        let city = conn
            .query_row("SELECT id, name, type FROM cities WHERE id = ?1", params![id], city_from_row)
            .optional()
            .context("Failed to look up city by id")?;

        Ok(city)
    }

    async fn insert_temperature(&self, temperature: &NewTemperature) -> Result<Temperature> {
        let conn = self.conn.lock().await;

        conn.execute(
            "INSERT INTO temperatures (city_id, month, temperature, season) VALUES (?1, ?2, ?3, ?4)",
            params![
                temperature.city_id,
                temperature.month.as_str(),
                temperature.celsius,
                temperature.season().as_str(),
            ],
        )
        .with_context(|| {
            format!(
                "Failed to insert {} reading for city {}",
                temperature.month, temperature.city_id
            )
        })?;

        Ok(temperature.into_temperature(conn.last_insert_rowid()))
    }

    async fn update_temperature(&self, temperature: &Temperature) -> Result<()> {
        let conn = self.conn.lock().await;

        conn.execute(
            "UPDATE temperatures SET city_id = ?1, month = ?2, temperature = ?3, season = ?4
             WHERE id = ?5",
            params![
                temperature.city_id,
                temperature.month.as_str(),
                temperature.celsius,
                temperature.season.as_str(),
                temperature.id,
            ],
        )
        .context("Failed to update temperature")?;

        Ok(())
    }

    async fn delete_temperature(&self, temperature: &Temperature) -> Result<()> {
        let conn = self.conn.lock().await;

        conn.execute("DELETE FROM temperatures WHERE id = ?1", params![temperature.id])
            .context("Failed to delete temperature")?;

        Ok(())
    }

    async fn get_temperatures_by_city_and_season(
        &self,
        city_id: i64,
        season: Season,
    ) -> Result<Vec<Temperature>> {
        let conn = self.conn.lock().await;

        let rows = conn
            .prepare(&format!(
                "SELECT {TEMPERATURE_COLUMNS} FROM temperatures
                 WHERE city_id = ?1 AND season = ?2 ORDER BY id"
            ))?
            .query_map(params![city_id, season.as_str()], temperature_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to load temperatures for season")?;

        rows.into_iter().map(temperature_from_row).collect()
    }

    async fn get_temperatures_by_city(&self, city_id: i64) -> Result<Vec<Temperature>> {
        let conn = self.conn.lock().await;

        let rows = conn
            .prepare(&format!(
                "SELECT {TEMPERATURE_COLUMNS} FROM temperatures WHERE city_id = ?1 ORDER BY id"
            ))?
            .query_map(params![city_id], temperature_row)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to load temperatures for city")?;

        rows.into_iter().map(temperature_from_row).collect()
    }

    async fn get_temperature(&self, city_id: i64, month: Month) -> Result<Option<Temperature>> {
        let conn = self.conn.lock().await;

        let row = conn
            .query_row(
                &format!(
                    "SELECT {TEMPERATURE_COLUMNS} FROM temperatures WHERE city_id = ?1 AND month = ?2"
                ),
                params![city_id, month.as_str()],
                temperature_row,
            )
            .optional()
            .context("Failed to look up temperature")?;

        row.map(temperature_from_row).transpose()
    }
}
