use std::path::PathBuf;
use std::process::ExitCode;

use chrono::{Days, Local, NaiveDate};
use clap::{Parser, Subcommand};
use futures::future::join_all;
use plantguard::{
    ClimaCellProvider, CoordinatesResolver, DailyForecast, HttpClient, OpenDataSoftResolver,
    PlantGuardConfig, PlantGuardError, daily_summary, forecast_for_zip_code, telemetry,
};
use tracing::info;

/// Zip code geocoding and daily weather forecasts for plant care
#[derive(Debug, Parser)]
#[command(name = "plantguard", version, about)]
struct Cli {
    /// Path to a TOML config file
    #[arg(long, global = true, env = "PLANTGUARD_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve a zip code to coordinates
    Coordinates { zip_code: String },
    /// Show the daily forecast for one or more zip codes
    Forecast {
        #[arg(required = true)]
        zip_codes: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match PlantGuardConfig::load_from_path(cli.config.clone()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            return ExitCode::FAILURE;
        }
    };
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    telemetry::init_tracing(&config.logging);

    match run(cli.command, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: &PlantGuardConfig) -> plantguard::Result<()> {
    let http = HttpClient::with_retry(&config.http)
        .map_err(|e| PlantGuardError::config(e.to_string()))?;

    match command {
        Command::Coordinates { zip_code } => {
            let resolver = OpenDataSoftResolver::new(&config.coordinates, http);
            let coordinates = resolver.resolve(&zip_code).await?;
            println!("{zip_code}: {coordinates}");
        }
        Command::Forecast { zip_codes } => {
            info!(count = zip_codes.len(), "Fetching forecasts");
            let results = join_all(
                zip_codes
                    .iter()
                    .map(|zip_code| zip_forecast(config, &http, zip_code)),
            )
            .await;

            let today = Local::now().date_naive();
            let mut first_error = None;
            for (zip_code, result) in zip_codes.iter().zip(results) {
                match result {
                    Ok(days) => print_forecast(zip_code, today, &days),
                    Err(e) => {
                        eprintln!("{zip_code}: {}", e.user_message());
                        first_error.get_or_insert(e);
                    }
                }
            }
            if let Some(e) = first_error {
                return Err(e);
            }
        }
    }
    Ok(())
}

async fn zip_forecast(
    config: &PlantGuardConfig,
    http: &HttpClient,
    zip_code: &str,
) -> plantguard::Result<Vec<DailyForecast>> {
    let provider = forecast_for_zip_code(config, http, zip_code).await?;
    info!(
        zip_code,
        provider = ClimaCellProvider::NAME,
        coordinates = %provider.coordinates(),
        "Resolved"
    );
    Ok(daily_summary(&provider).await?)
}

fn print_forecast(zip_code: &str, today: NaiveDate, days: &[DailyForecast]) {
    println!("Forecast for {zip_code}");
    for day in days {
        let date = u64::try_from(day.day)
            .ok()
            .and_then(|offset| today.checked_add_days(Days::new(offset)))
            .map_or_else(|| format!("day {}", day.day), |date| date.to_string());
        println!(
            "  {date}  rain {:>9}  temp {:>18}  wind {:>9}",
            day.format_precipitation(),
            day.format_temperature(),
            day.format_wind()
        );
    }
}
