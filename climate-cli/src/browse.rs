//! Interactive session: pick a city, a season and a unit, and edit the data.

use std::fmt;

use climate_core::{ClimateEngine, ClimateError, Month, Season, TemperatureUnit};
use inquire::{Confirm, CustomType, InquireError, Select, Text};

use crate::render;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    SelectCity,
    SelectSeason,
    ChangeUnit,
    AddCity,
    AddTemperature,
    DeleteCity,
    Quit,
}

impl Action {
    const ALL: [Action; 7] = [
        Action::SelectCity,
        Action::SelectSeason,
        Action::ChangeUnit,
        Action::AddCity,
        Action::AddTemperature,
        Action::DeleteCity,
        Action::Quit,
    ];
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::SelectCity => "Select city",
            Action::SelectSeason => "Select season",
            Action::ChangeUnit => "Change unit",
            Action::AddCity => "Add city",
            Action::AddTemperature => "Add temperature",
            Action::DeleteCity => "Delete city",
            Action::Quit => "Quit",
        })
    }
}

pub async fn run(engine: &mut ClimateEngine) -> anyhow::Result<()> {
    loop {
        println!();
        print!("{}", render::snapshot(&engine.snapshot()));

        let action = match Select::new("What next?", Action::ALL.to_vec()).prompt() {
            Ok(action) => action,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(e) => return Err(e.into()),
        };

        if action == Action::Quit {
            break;
        }

        match step(engine, action).await {
            Ok(()) => {}
            Err(StepError::Climate(e)) if e.is_user_error() => println!("{}", e.user_message()),
            Err(StepError::Prompt(InquireError::OperationCanceled)) => {}
            Err(StepError::Prompt(InquireError::OperationInterrupted)) => break,
            Err(StepError::Climate(e)) => return Err(e.into()),
            Err(StepError::Prompt(e)) => return Err(e.into()),
        }
    }

    Ok(())
}

#[derive(Debug)]
enum StepError {
    Climate(ClimateError),
    Prompt(InquireError),
}

impl From<ClimateError> for StepError {
    fn from(e: ClimateError) -> Self {
        StepError::Climate(e)
    }
}

impl From<InquireError> for StepError {
    fn from(e: InquireError) -> Self {
        StepError::Prompt(e)
    }
}

async fn step(engine: &mut ClimateEngine, action: Action) -> Result<(), StepError> {
    match action {
        Action::SelectCity => {
            let names = city_names(engine);
            if names.is_empty() {
                println!("No cities yet.");
                return Ok(());
            }

            let name = Select::new("City:", names).prompt()?;
            engine.select_city(&name).await?;
        }
        Action::SelectSeason => {
            if engine.selected_city().is_none() {
                return Err(ClimateError::NoCitySelected.into());
            }
            let seasons: Vec<Season> = engine.seasons().to_vec();
            if seasons.is_empty() {
                println!("No readings for this city.");
                return Ok(());
            }

            let season = Select::new("Season:", seasons).prompt()?;
            engine.select_season(season.as_str()).await?;
        }
        Action::ChangeUnit => {
            let unit = Select::new("Unit:", TemperatureUnit::all().to_vec()).prompt()?;
            engine.set_unit(unit);
        }
        Action::AddCity => {
            let name = Text::new("City name:").prompt()?;
            let city_type = Text::new("City type:").prompt()?;
            engine.add_city(&name, &city_type).await?;
        }
        Action::AddTemperature => {
            let names = city_names(engine);
            if names.is_empty() {
                println!("No cities yet.");
                return Ok(());
            }

            let city = Select::new("City:", names).prompt()?;
            let month = Select::new("Month:", Month::all().to_vec())
                .with_starting_cursor(Month::current().number() as usize - 1)
                .prompt()?;
            let celsius = CustomType::<f64>::new("Temperature, °C:")
                .with_error_message("Enter a number")
                .prompt()?;

            let reading = engine.add_temperature(&city, month.as_str(), celsius).await?;
            println!("Saved {} {}", reading.month, render::reading(reading.celsius));
        }
        Action::DeleteCity => {
            let names = city_names(engine);
            if names.is_empty() {
                println!("No cities yet.");
                return Ok(());
            }

            let name = Select::new("Delete city:", names).prompt()?;
            let confirmed = Confirm::new(&format!("Delete {name} and all of its readings?"))
                .with_default(false)
                .prompt()?;

            if confirmed {
                engine.delete_city_by_name(&name).await?;
            }
        }
        Action::Quit => {}
    }

    Ok(())
}

fn city_names(engine: &ClimateEngine) -> Vec<String> {
    engine.cities().iter().map(|c| c.name.clone()).collect()
}
