#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Terminal dashboard for wilderness-safety intelligence.
//!
//! Mounts a [`Dashboard`] for the configured location, runs the initial
//! refresh and prints the results. With `--interactive` it then offers a
//! menu to refresh, change location, edit the capability profile or switch
//! theme.
//!
//! Uses `indicatif-log-bridge` (via [`wildsafe_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and the refresh bar never fight for the terminal.

mod config;
mod interactive;
mod render;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use wildsafe_cli_utils::IndicatifProgress;
use wildsafe_intel::geolocation::spawn_locate;
use wildsafe_intel::{
    Collaborator, Dashboard, FixedLocation, GeolocationProvider, IpGeolocation, Orchestrator,
    RefreshEvent, null_progress,
};
use wildsafe_intel_models::{Coordinates, ThemeMode};

use crate::config::Config;

/// Wilderness-safety intelligence for a location.
#[derive(Parser)]
#[command(name = "wildsafe")]
#[command(about = "Wilderness-safety intelligence for a location")]
struct Cli {
    /// Location to scan (overrides the config file).
    #[arg(long)]
    location: Option<String>,

    /// Theme: NIGHT, SUNRISE, RAIN, FIRE or EARTH.
    #[arg(long)]
    theme: Option<ThemeMode>,

    /// Enable fire-mode (same as `--theme FIRE`).
    #[arg(long)]
    fire: bool,

    /// Latitude of the user's position.
    #[arg(long, requires = "lng", allow_negative_numbers = true)]
    lat: Option<f64>,

    /// Longitude of the user's position.
    #[arg(long, requires = "lat", allow_negative_numbers = true)]
    lng: Option<f64>,

    /// Skip the IP geolocation lookup.
    #[arg(long)]
    no_geolocate: bool,

    /// Open the interactive menu after the initial refresh.
    #[arg(long, short)]
    interactive: bool,

    /// Print results as JSON instead of the dashboard.
    #[arg(long)]
    json: bool,

    /// Path to a config file (default: `wildsafe.toml` if present).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = wildsafe_cli_utils::init_logger();
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    let theme = if cli.fire {
        ThemeMode::Fire
    } else {
        cli.theme.unwrap_or(config.theme)
    };
    let location = cli.location.clone().unwrap_or_else(|| config.location.clone());

    let provider = wildsafe_ai::providers::create_provider_from_env().await?;
    let models = provider.default_models().with_env_overrides();
    log::info!(
        "Using {} (fast: {}, reasoning: {})",
        provider.name(),
        models.fast,
        models.reasoning
    );
    let collaborator = Collaborator::new(Arc::from(provider), models);

    let dashboard = Arc::new(Dashboard::new(theme, config.user(), location));

    let geolocation: Option<Arc<dyn GeolocationProvider>> = match (cli.lat, cli.lng) {
        (Some(latitude), Some(longitude)) => {
            let fixed = FixedLocation(Coordinates {
                latitude,
                longitude,
            });
            spawn_locate(Arc::new(fixed), Arc::clone(&dashboard)).await?;
            None
        }
        _ if config.geolocate && !cli.no_geolocate => Some(Arc::new(IpGeolocation::default())),
        _ => None,
    };

    let progress = if cli.json {
        null_progress()
    } else {
        IndicatifProgress::refresh_bar(&multi)
    };
    let (events_tx, events_rx) = mpsc::channel(16);
    let orchestrator = Orchestrator::new(collaborator, Arc::clone(&dashboard))
        .with_progress(progress)
        .with_events(events_tx);
    let events = tokio::spawn(log_events(events_rx, dashboard));

    if let Some(outcome) = orchestrator.mount(geolocation).await {
        log::debug!("Initial refresh: {outcome:?}");
    }
    print_dashboard(&orchestrator, cli.json)?;

    if cli.interactive {
        interactive::run(&orchestrator, cli.json).await?;
    }

    orchestrator.unmount();
    drop(orchestrator);
    events.await?;

    Ok(())
}

/// Logs cycle milestones as they happen, so weather shows up before the
/// slower guidance call returns.
async fn log_events(mut events: mpsc::Receiver<RefreshEvent>, dashboard: Arc<Dashboard>) {
    while let Some(event) = events.recv().await {
        match event {
            RefreshEvent::WeatherReady => {
                if let Some(weather) = dashboard.snapshot().report.weather {
                    log::info!(
                        "{}: {}°C, {}",
                        weather.location_name,
                        weather.temperature_c,
                        weather.condition
                    );
                }
            }
            RefreshEvent::Finished(outcome) => log::debug!("Refresh finished: {outcome:?}"),
            RefreshEvent::Started | RefreshEvent::DerivedReady | RefreshEvent::FireAlertsReady => {
                log::trace!("Refresh event: {event:?}");
            }
        }
    }
}

fn print_dashboard(orchestrator: &Orchestrator, json: bool) -> Result<(), serde_json::Error> {
    let state = orchestrator.dashboard().snapshot();
    if json {
        println!("{}", render::render_json(&state)?);
    } else {
        println!("{}", render::render_dashboard(&state));
    }
    Ok(())
}
