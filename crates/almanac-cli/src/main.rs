mod cli;
mod display;

use std::path::Path;
use std::process;
use std::sync::Arc;

use almanac_core::{AppError, Config, NetworkError};
use almanac_weather::{
    ConnectivityProbe, DailyReading, FixedConnectivity, RequestOutcome, SqliteWeatherStore,
    SystemConnectivity, VisualCrossingClient, WeatherQueryCoordinator, WeatherSource,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use clap::Parser;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    almanac_core::init(cli.verbose);

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<AppError>() {
            Some(AppError::Weather(weather)) => eprintln!("{}", weather.user_message()),
            Some(app) => eprintln!("Error: {} ({})", app.user_message(), app),
            None => eprintln!("Error: {e:#}"),
        }
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let (config, validation) = Config::load_validated(cli.config.as_deref())?;

    let outcome = match cli.command {
        Command::Config => {
            let config_path = match cli.config {
                Some(path) => path,
                None => Config::config_path()?,
            };
            print_config(&config_path, &config, &validation.warnings);
            return Ok(());
        }
        Command::Day { location, date } => {
            let coordinator = build_coordinator(&config, true)?;
            coordinator.request_single_date(&location, &date).await
        }
        Command::Range {
            location,
            first,
            end,
        } => {
            let coordinator = build_coordinator(&config, true)?;
            match end {
                Some(end) => coordinator.request_range(&location, &first, &end).await,
                None => coordinator.request_year_ending(&location, &first).await,
            }
        }
        Command::Cached { date } => {
            let coordinator = build_coordinator(&config, false)?;
            coordinator.request_from_cache(&date).await
        }
    };

    print_outcome(outcome, cli.json)
}

/// Wire the coordinator from config. Cache-only commands skip the HTTP client
/// so they work without an API key.
fn build_coordinator(config: &Config, remote: bool) -> Result<WeatherQueryCoordinator> {
    let source: Arc<dyn WeatherSource> = if remote {
        Arc::new(VisualCrossingClient::from_config(&config.weather).map_err(AppError::from)?)
    } else {
        Arc::new(NoRemote)
    };

    let database_path = config.database_path();
    let store = SqliteWeatherStore::open(&database_path)
        .map_err(AppError::from)
        .with_context(|| format!("Failed to open weather cache at {}", database_path.display()))?;

    let probe: Arc<dyn ConnectivityProbe> = if config.network.check_connectivity {
        Arc::new(SystemConnectivity)
    } else {
        Arc::new(FixedConnectivity::online())
    };

    Ok(WeatherQueryCoordinator::new(source, Arc::new(store), probe))
}

fn print_outcome(outcome: RequestOutcome, json: bool) -> Result<()> {
    let outcome = outcome.map_err(AppError::from)?;
    if json {
        println!("{}", display::render_json(&outcome)?);
    } else {
        println!("{}", display::render_text(&outcome));
    }
    Ok(())
}

fn print_config(
    config_path: &Path,
    config: &Config,
    warnings: &[almanac_core::config::ConfigValidationError],
) {
    let database_path = config.database_path();
    println!("Config file:   {}", config_path.display());
    println!("Weather cache: {}", database_path.display());
    println!("API base URL:  {}", config.weather.api_base_url);
    println!(
        "API key:       {}",
        if config.weather.effective_api_key().is_some() {
            "set"
        } else {
            "not set"
        }
    );
    for warning in warnings {
        println!("Warning: {}", warning);
    }
}

/// Stands in for the HTTP client on cache-only commands.
struct NoRemote;

#[async_trait]
impl WeatherSource for NoRemote {
    async fn fetch_day(
        &self,
        _location: &str,
        _date: NaiveDate,
    ) -> Result<DailyReading, NetworkError> {
        Err(NetworkError::ConnectionFailed(
            "remote lookups are disabled for this command".to_string(),
        ))
    }

    async fn fetch_range(
        &self,
        _location: &str,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Vec<DailyReading>, NetworkError> {
        Err(NetworkError::ConnectionFailed(
            "remote lookups are disabled for this command".to_string(),
        ))
    }
}
