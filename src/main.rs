//! Application entry point for the `minemetrics` ETL pipeline.
//!
//! This binary orchestrates the full startup sequence for a metrics run:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Parsing the CLI subcommand and its two input paths
//! - Constructing the weather client and the configured destination sink
//! - Running the pipeline and reporting the outcome with a non-zero exit
//!   on any fatal error
//!
//! # Environment Variables
//! - `DATABASE_URL` (**required**) – PostgreSQL connection string
//! - `DB_POOL_MAX` (optional) – maximum number of DB connections (default: 5)
//! - `ETL_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `ETL_SPAN_EVENTS` (optional) – span event mode for tracing
//! - `WEATHER_*` (optional) – weather endpoint, site coordinates, timezone,
//!   and request timeout (see `config.rs`)
use std::{env, io::IsTerminal, time::Instant};

use anyhow::Result;
use clap::Parser;
use dotenvy::dotenv;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use minemetrics::cli::{Cli, Command};
use minemetrics::{config, create_sink, Pipeline, WeatherClient};

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    init_tracing();
    dotenv().ok();

    let cli = Cli::parse();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    match cli.command {
        Command::EtlProduction {
            production_dump,
            sensors_csv,
        } => {
            let started = Instant::now();

            let weather = WeatherClient::new(cfg.weather.clone())?;
            let sink = create_sink(&cfg)?;
            let mut pipeline = Pipeline::new(weather, sink, cfg.metrics_table.clone());

            let rows = pipeline.run(&production_dump, &sensors_csv).await?;

            tracing::info!(
                "Run complete: {} rows written in {:.2?}",
                rows,
                started.elapsed()
            );
        }
    }

    Ok(())
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// This function configures the [`tracing_subscriber`] with:
/// - Log target, file, and line number output enabled
/// - Color output controlled by TTY detection and `FORCE_COLOR` env var:
///   - `FORCE_COLOR=1|true|yes`: force colors on
///   - `FORCE_COLOR=0|false|no`: force colors off
///   - unset or other values: auto-detect TTY
/// - Span event emission mode controlled by the `ETL_SPAN_EVENTS` env var:
///   - `"full"`       : emit ENTER, EXIT, and CLOSE events with timing
///   - `"enter_exit"` : emit ENTER and EXIT only
///   - unset or other values: emit CLOSE events only (default)
/// - Log level controlled by the `ETL_LOG_LEVEL` env var
///
/// This should be called once at application startup before any logging
/// or tracing macros are invoked. It installs the subscriber globally
/// for the lifetime of the process.
fn init_tracing() {
    // ---
    let span_events = match env::var("ETL_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    // Determine if we should use colors
    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    // Use RUST_LOG if available, otherwise fall back to ETL_LOG_LEVEL
    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("ETL_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
