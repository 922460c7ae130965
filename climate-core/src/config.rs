use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::unit::TemperatureUnit;

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// database_path = "/home/me/climate.db"
/// default_unit = "fahrenheit"
/// seed_demo_data = false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// SQLite file; the platform data directory is used when absent.
    pub database_path: Option<PathBuf>,

    /// Unit selected at startup, e.g. "celsius".
    pub default_unit: Option<String>,

    /// Whether an empty store gets demo cities on startup. Defaults to true.
    pub seed_demo_data: Option<bool>,
}

impl Config {
    /// Return the default unit as a strongly-typed TemperatureUnit.
    pub fn default_unit(&self) -> Result<TemperatureUnit> {
        match self.default_unit.as_deref() {
            None => Ok(TemperatureUnit::default()),
            Some(s) => TemperatureUnit::try_from(s).context(
                "Invalid default_unit in config.\n\
                 Hint: run `climate configure` to pick one of celsius, fahrenheit, kelvin.",
            ),
        }
    }

    /// Store default unit as string.
    pub fn set_default_unit(&mut self, unit: TemperatureUnit) {
        self.default_unit = Some(unit.as_str().to_string());
    }

    pub fn seed_demo_data(&self) -> bool {
        self.seed_demo_data.unwrap_or(true)
    }

    /// Configured database file, or `climate.db` in the platform data directory.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::project_dirs()?.data_dir().join("climate.db")),
        }
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            // First run: no config file, return empty.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "climate-journal", "climate")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_unit_is_celsius_when_not_set() {
        let cfg = Config::default();
        assert_eq!(cfg.default_unit().unwrap(), TemperatureUnit::Celsius);
        assert!(cfg.seed_demo_data());
    }

    #[test]
    fn set_default_unit_roundtrips() {
        let mut cfg = Config::default();

        cfg.set_default_unit(TemperatureUnit::Kelvin);

        assert_eq!(cfg.default_unit.as_deref(), Some("kelvin"));
        assert_eq!(cfg.default_unit().unwrap(), TemperatureUnit::Kelvin);
    }

    #[test]
    fn invalid_default_unit_errors_with_hint() {
        let cfg = Config { default_unit: Some("rankine".into()), ..Config::default() };

        let err = cfg.default_unit().unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("Invalid default_unit"));
        assert!(msg.contains("rankine"));
    }

    #[test]
    fn parses_toml_file_contents() {
        let cfg = Config::from_toml(
            r#"
            database_path = "/tmp/climate.db"
            default_unit = "fahrenheit"
            seed_demo_data = false
            "#,
        )
        .unwrap();

        assert_eq!(cfg.database_path().unwrap(), PathBuf::from("/tmp/climate.db"));
        assert_eq!(cfg.default_unit().unwrap(), TemperatureUnit::Fahrenheit);
        assert!(!cfg.seed_demo_data());
    }

    #[test]
    fn empty_toml_is_default_config() {
        let cfg = Config::from_toml("").unwrap();
        assert!(cfg.database_path.is_none());
        assert!(cfg.default_unit.is_none());
    }

    #[test]
    fn serializes_back_to_toml() {
        let mut cfg = Config::default();
        cfg.set_default_unit(TemperatureUnit::Fahrenheit);

        let text = toml::to_string_pretty(&cfg).unwrap();
        let parsed = Config::from_toml(&text).unwrap();
        assert_eq!(parsed.default_unit().unwrap(), TemperatureUnit::Fahrenheit);
    }
}
