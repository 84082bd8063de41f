//! Engine binary for the Waypath itinerary planner.
//!
//! Wires the sample catalog, a scripted context source, and the planning
//! service together, then walks one simulated traveler through a day and
//! prints the resulting trip as JSON.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `WAYPATH_CONFIG` or `waypath-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the sample city catalog
//! 4. Script the day's context (weather and crowds)
//! 5. Create the planner and the planning service
//! 6. Run the simulated traveler
//! 7. Sweep idle sessions and print the trip summary

mod error;
mod traveler;

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;
use waypath_catalog::{ScheduledContext, sample_city};
use waypath_core::config::PlannerConfig;
use waypath_core::planner::Planner;
use waypath_core::service::PlannerService;
use waypath_types::{Setting, Weather};

use crate::error::AppError;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step or the simulated trip fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = config_path();
    let (config, from_file) = load_config(&config_path)?;

    // 2. Initialize structured logging. RUST_LOG wins over the config.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("waypath-engine starting");
    if from_file {
        info!(path = %config_path.display(), "Configuration loaded");
    } else {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        coherence_enabled = config.coherence.enabled,
        preference_weight = config.weights.preference,
        efficiency_weight = config.weights.efficiency,
        contextual_weight = config.weights.contextual,
        idle_timeout_minutes = config.session.idle_timeout_minutes,
        "Planner settings"
    );

    let traveler_config = traveler::load_traveler_config(&config_path)?;
    info!(
        seed = traveler_config.seed,
        max_stops = traveler_config.max_stops,
        choice_pool = traveler_config.choice_pool,
        total_minutes = traveler_config.total_minutes,
        budget = %traveler_config.budget,
        "Traveler configuration loaded"
    );

    // 3. Build the sample city.
    let (catalog, ids) = sample_city().map_err(AppError::from)?;
    let sheltered = catalog
        .iter()
        .filter(|l| l.setting == Setting::Indoor)
        .count();
    info!(
        central_station = %ids.central_station,
        locations = catalog.len(),
        sheltered,
        "Sample city built"
    );

    // 4. Script the day's context.
    let mut context = ScheduledContext::new(Weather::Clear)
        .with_crowd(ids.observation_tower, 0.8)
        .with_crowd(ids.riverside_market, 0.6);
    if let Some(minute) = traveler_config.rain_from_minute {
        context = context.with_weather_from(minute, Weather::Rain);
        info!(from_trip_minute = minute, "Rain scheduled");
    }

    // 5. Create the planner and service.
    let planner = Planner::new(Arc::new(catalog), Arc::new(context), config);
    let service = PlannerService::new(Arc::new(planner));
    info!("Planning service ready");

    // 6. Run the simulated traveler.
    let summary = traveler::simulate_trip(&service, &ids, &traveler_config).await?;

    // 7. Sweep and report.
    let expired = service.expire_idle().await;
    info!(
        stops = summary.stops.len(),
        elapsed_minutes = summary.elapsed_minutes,
        spent = %summary.spent,
        expired_sessions = expired.len(),
        "waypath-engine shutdown complete"
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).map_err(AppError::from)?
    );

    Ok(())
}

/// Path of the config file: `WAYPATH_CONFIG` if set, otherwise
/// `waypath-config.yaml` in the working directory.
fn config_path() -> PathBuf {
    std::env::var_os("WAYPATH_CONFIG")
        .map_or_else(|| PathBuf::from("waypath-config.yaml"), PathBuf::from)
}

/// Load the planner configuration, falling back to defaults when the file
/// does not exist. The flag reports whether the file was read.
fn load_config(path: &std::path::Path) -> Result<(PlannerConfig, bool), AppError> {
    if path.exists() {
        Ok((PlannerConfig::from_file(path)?, true))
    } else {
        Ok((PlannerConfig::default(), false))
    }
}
