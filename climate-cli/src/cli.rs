use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use climate_core::{ClimateEngine, Config, Month, TemperatureUnit, open_store};
use inquire::{Confirm, Select, Text};
use tracing::debug;

use crate::{browse, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "climate", version, about = "Seasonal temperature journal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// SQLite database file; overrides the configured path.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Keep everything in memory for this run.
    #[arg(long, global = true, conflicts_with = "db")]
    pub memory: bool,

    /// Do not insert demo cities into an empty database.
    #[arg(long, global = true)]
    pub no_seed: bool,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List all cities with their types.
    Cities,

    /// Add a city. Names are unique.
    AddCity {
        name: String,

        /// Classification, e.g. "Large" or "Medium".
        city_type: String,
    },

    /// Rename or reclassify a city.
    EditCity {
        name: String,

        #[arg(long)]
        rename: Option<String>,

        #[arg(long = "type")]
        city_type: Option<String>,
    },

    /// Delete a city and all of its readings.
    DeleteCity {
        name: String,

        /// Skip the confirmation prompt.
        #[arg(short, long)]
        yes: bool,
    },

    /// Record the temperature of a city for a month, replacing an existing reading.
    AddTemp {
        city: String,

        /// Celsius, between -50 and 50.
        #[arg(allow_negative_numbers = true)]
        celsius: f64,

        /// Month name, e.g. "July" or "Июль"; defaults to the current month.
        #[arg(long)]
        month: Option<String>,
    },

    /// List the seasons that have readings for a city.
    Seasons { city: String },

    /// List all readings of a city.
    Readings { city: String },

    /// Show the average temperature of a city for a season.
    Show {
        city: String,

        season: String,

        /// celsius, fahrenheit or kelvin; defaults to the configured unit.
        #[arg(long)]
        unit: Option<String>,

        /// Print the full snapshot as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Browse cities and seasons interactively.
    Browse,

    /// Edit the configuration interactively.
    Configure,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;

        let command = match self.command {
            Command::Configure => return configure(config),
            command => command,
        };

        let path = if self.memory {
            None
        } else {
            Some(match self.db {
                Some(path) => path,
                None => config.database_path()?,
            })
        };
        let mut engine = open_engine(&config, path, !self.no_seed).await?;

        match command {
            Command::Cities => {
                print!("{}", render::cities(engine.cities()));
            }
            Command::AddCity { name, city_type } => {
                let city = engine.add_city(&name, &city_type).await?;
                println!("Added {} ({})", city.name, city.city_type);
            }
            Command::EditCity { name, rename, city_type } => {
                let mut city = engine.city(&name).await?;

                if let Some(rename) = rename {
                    city.name = rename;
                }
                if let Some(city_type) = city_type {
                    city.city_type = city_type;
                }

                engine.update_city(&city).await?;
                println!("Updated {}", city.name);
            }
            Command::DeleteCity { name, yes } => {
                let confirmed = yes
                    || Confirm::new(&format!("Delete {name} and all of its readings?"))
                        .with_default(false)
                        .prompt()?;

                if confirmed {
                    let city = engine.delete_city_by_name(&name).await?;
                    println!("Deleted {}", city.name);
                } else {
                    println!("Nothing deleted");
                }
            }
            Command::AddTemp { city, celsius, month } => {
                let month = month.unwrap_or_else(|| Month::current().as_str().to_string());
                let reading = engine.add_temperature(&city, &month, celsius).await?;
                println!(
                    "{city}: {} {} ({})",
                    reading.month,
                    render::reading(reading.celsius),
                    reading.season
                );
            }
            Command::Seasons { city } => {
                engine.select_city(&city).await?;
                print!("{}", render::seasons(engine.seasons()));
            }
            Command::Readings { city } => {
                let readings = engine.readings(&city).await?;
                print!("{}", render::readings(&readings));
            }
            Command::Show { city, season, unit, json } => {
                if let Some(unit) = unit {
                    engine.set_unit(TemperatureUnit::try_from(unit.as_str())?);
                }
                engine.select_city(&city).await?;
                engine.select_season(&season).await?;

                let snapshot = engine.snapshot();
                if json {
                    println!("{}", serde_json::to_string_pretty(&snapshot)?);
                } else {
                    print!("{}", render::snapshot(&snapshot));
                }
            }
            Command::Browse => browse::run(&mut engine).await?,
            Command::Configure => configure(config)?,
        }

        Ok(())
    }
}

/// Opens the store at `path` (in memory when `None`) and loads the city list.
async fn open_engine(
    config: &Config,
    path: Option<PathBuf>,
    seed: bool,
) -> anyhow::Result<ClimateEngine> {
    debug!(?path, "opening store");

    let store = open_store(path.as_deref())?;
    let mut engine = ClimateEngine::new(store, config.default_unit()?);
    engine.start(seed && config.seed_demo_data()).await?;

    Ok(engine)
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let current = config.default_unit()?;
    let mut units = TemperatureUnit::all().to_vec();
    units.sort_by_key(|u| *u != current);

    let unit = Select::new("Default unit:", units).prompt()?;
    config.set_default_unit(unit);

    let default_path = config.database_path()?;
    let path = Text::new("Database file:")
        .with_default(&default_path.display().to_string())
        .prompt()?;
    config.database_path = Some(PathBuf::from(path.trim()));

    let seed = Confirm::new("Insert demo cities into an empty database?")
        .with_default(config.seed_demo_data())
        .prompt()?;
    config.seed_demo_data = Some(seed);

    config.save()?;
    let path = Config::config_file_path().context("Config saved, but its path is unknown")?;
    println!("Configuration saved to {}", path.display());

    Ok(())
}
