use anyhow::{Context, Result, anyhow};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use climate_core::{
    Config, Location, PredictionRequest, discomfort, historical_error, providers_from_config,
};
use inquire::{CustomType, Text};
use tracing::debug;

use crate::output;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "climate", version, about = "Climatological day outlook")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Interactively set the history range, forecast window and timeouts.
    Configure,

    /// Print the path of the config file.
    ConfigPath,

    /// Show the outlook for a point and date.
    Predict {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,

        #[arg(allow_negative_numbers = true)]
        longitude: f64,

        /// Target date as YYYY-MM-DD; if absent, means "today".
        #[arg(long)]
        date: Option<String>,

        /// Print the full response as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Compute the discomfort index for one set of conditions.
    Discomfort {
        /// Air temperature in °C.
        #[arg(allow_negative_numbers = true)]
        temperature: f64,

        /// Relative humidity in percent.
        humidity: f64,

        /// Wind speed in m/s.
        wind: f64,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Configure => configure(),
            Command::ConfigPath => {
                println!("{}", Config::config_file_path()?.display());
                Ok(())
            }
            Command::Predict { latitude, longitude, date, json } => {
                predict(latitude, longitude, date.as_deref(), json).await
            }
            Command::Discomfort { temperature, humidity, wind } => {
                println!("{:.1}", discomfort(temperature, humidity, wind));
                Ok(())
            }
        }
    }
}

async fn predict(latitude: f64, longitude: f64, date: Option<&str>, json: bool) -> Result<()> {
    let today = Local::now().date_naive();
    let target_date = match date {
        Some(s) => parse_date(s)?,
        None => today,
    };

    let config = Config::load()?;
    debug!(?config, "loaded configuration");

    let request = PredictionRequest { location: Location { latitude, longitude }, target_date };
    let predictor = providers_from_config(&config);

    let response = match predictor.predict(&request, today).await {
        Ok(response) => response,
        Err(err) => {
            return match historical_error(&err) {
                Some(kind) => Err(anyhow!(
                    "{kind}.\nHint: check the coordinates, or widen the range with `climate configure`."
                )),
                None => Err(err),
            };
        }
    };

    if json {
        let text = serde_json::to_string_pretty(&response)
            .context("Failed to serialize prediction to JSON")?;
        println!("{text}");
    } else {
        print!("{}", output::Report(&response));
    }

    Ok(())
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{s}', expected YYYY-MM-DD"))
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    config.history.start_year = CustomType::<i32>::new("First year of historical record:")
        .with_default(config.history.start_year)
        .prompt()?;

    let end = Text::new("Last year of historical record (empty = current year):")
        .with_initial_value(&config.history.end_year.map(|y| y.to_string()).unwrap_or_default())
        .prompt()?;
    config.history.end_year = parse_optional_year(&end)?;
    config.history.year_range(Local::now().date_naive())?;

    config.forecast.window_days = CustomType::<u32>::new("Forecast window in days:")
        .with_default(config.forecast.window_days)
        .prompt()?;

    config.timeouts.history_secs = CustomType::<u64>::new("Historical fetch timeout (seconds):")
        .with_default(config.timeouts.history_secs)
        .prompt()?;

    config.timeouts.forecast_secs = CustomType::<u64>::new("Forecast fetch timeout (seconds):")
        .with_default(config.timeouts.forecast_secs)
        .prompt()?;

    config.timeouts.air_quality_secs =
        CustomType::<u64>::new("Air-quality fetch timeout (seconds):")
            .with_default(config.timeouts.air_quality_secs)
            .prompt()?;

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}

fn parse_optional_year(s: &str) -> Result<Option<i32>> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i32>()
        .map(Some)
        .with_context(|| format!("Invalid year '{trimmed}'"))
}
