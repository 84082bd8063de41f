//! A simulated traveler that walks a session through a whole day.
//!
//! The traveler opens a session at the sample city's central station,
//! previews and snapshots a lattice, edits it the way a user would, and
//! then repeatedly asks for the ranked shortlist and commits one of the
//! top picks at random. Choices come from a seeded [`StdRng`], so a given
//! seed always produces the same trip.

use std::collections::BTreeMap;
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;
use waypath_catalog::SampleLocationIds;
use waypath_core::planner::CycleOutcome;
use waypath_core::service::{NewSession, PlannerService};
use waypath_types::{
    LocationId, PathChange, Purpose, SessionId, Snapshot, TransportMode, TravelerCondition,
    TripConstraints, UserProfile,
};

use crate::error::AppError;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Configuration for the simulated traveler, read from the `traveler`
/// section of `waypath-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TravelerConfig {
    /// Seed for the traveler's choices.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Most stops the traveler will make.
    #[serde(default = "default_max_stops")]
    pub max_stops: usize,

    /// How many of the top-ranked candidates the traveler picks among.
    #[serde(default = "default_choice_pool")]
    pub choice_pool: usize,

    /// Length of the trip in minutes.
    #[serde(default = "default_total_minutes")]
    pub total_minutes: u32,

    /// Admission budget for the day.
    #[serde(default = "default_budget")]
    pub budget: Decimal,

    /// Local minute of the day the trip starts at.
    #[serde(default = "default_start_minute_of_day")]
    pub start_minute_of_day: u32,

    /// Furthest single hop the traveler accepts, in km.
    #[serde(default = "default_max_distance_km")]
    pub max_distance_km: f64,

    /// Trip minute from which it rains. No rain when absent.
    #[serde(default = "default_rain_from_minute")]
    pub rain_from_minute: Option<u32>,

    /// Weight of each travel purpose.
    #[serde(default = "default_purposes")]
    pub purposes: BTreeMap<Purpose, f64>,
}

impl Default for TravelerConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            max_stops: default_max_stops(),
            choice_pool: default_choice_pool(),
            total_minutes: default_total_minutes(),
            budget: default_budget(),
            start_minute_of_day: default_start_minute_of_day(),
            max_distance_km: default_max_distance_km(),
            rain_from_minute: default_rain_from_minute(),
            purposes: default_purposes(),
        }
    }
}

const fn default_seed() -> u64 {
    7
}

const fn default_max_stops() -> usize {
    6
}

const fn default_choice_pool() -> usize {
    3
}

const fn default_total_minutes() -> u32 {
    600
}

fn default_budget() -> Decimal {
    Decimal::from(120)
}

const fn default_start_minute_of_day() -> u32 {
    540
}

const fn default_max_distance_km() -> f64 {
    15.0
}

#[allow(clippy::unnecessary_wraps)]
const fn default_rain_from_minute() -> Option<u32> {
    Some(240)
}

fn default_purposes() -> BTreeMap<Purpose, f64> {
    BTreeMap::from([
        (Purpose::Culture, 0.8),
        (Purpose::Food, 0.6),
        (Purpose::Leisure, 0.5),
        (Purpose::Photography, 0.3),
    ])
}

/// Load the traveler configuration from the config file at `path`.
///
/// Reads only the `traveler` section. A missing file or section yields
/// the defaults.
pub fn load_traveler_config(path: &Path) -> Result<TravelerConfig, AppError> {
    if !path.exists() {
        return Ok(TravelerConfig::default());
    }
    let contents = std::fs::read_to_string(path).map_err(|e| AppError::Traveler {
        message: format!("failed to read config file: {e}"),
    })?;
    parse_traveler_config(&contents)
}

/// Extract the traveler configuration from a full config document.
fn parse_traveler_config(yaml: &str) -> Result<TravelerConfig, AppError> {
    let raw: serde_yml::Value = serde_yml::from_str(yaml).map_err(|e| AppError::Traveler {
        message: format!("failed to parse config YAML: {e}"),
    })?;
    match raw.get("traveler") {
        Some(section) => {
            serde_yml::from_value(section.clone()).map_err(|e| AppError::Traveler {
                message: format!("failed to parse traveler config: {e}"),
            })
        }
        None => Ok(TravelerConfig::default()),
    }
}

// -----------------------------------------------------------------------
// Trip
// -----------------------------------------------------------------------

/// One committed stop.
#[derive(Debug, Clone, Serialize)]
pub struct Stop {
    /// Where the traveler went.
    pub location_id: LocationId,
    /// Its name.
    pub name: String,
    /// How they got there.
    pub mode: TransportMode,
    /// Rank of the pick in the shortlist, 0-based.
    pub rank: usize,
    /// Final score at the time of the choice.
    pub final_score: f64,
    /// Trip minutes used once the visit ends.
    pub elapsed_minutes: u32,
}

/// What the simulated day produced.
#[derive(Debug, Clone, Serialize)]
pub struct TripSummary {
    /// The session the trip ran in.
    pub session_id: SessionId,
    /// The plan frozen before the first move.
    pub initial_plan: Option<Snapshot>,
    /// How the edited preview differed from the frozen plan.
    pub plan_changes: Vec<PathChange>,
    /// Stops in order.
    pub stops: Vec<Stop>,
    /// Trip minutes used.
    pub elapsed_minutes: u32,
    /// Admission money spent.
    pub spent: Decimal,
    /// Condition at the end of the day.
    pub condition: TravelerCondition,
}

/// Run a whole day for one simulated traveler.
pub async fn simulate_trip(
    service: &PlannerService,
    ids: &SampleLocationIds,
    config: &TravelerConfig,
) -> Result<TripSummary, AppError> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let session_id = service
        .create_session(NewSession {
            origin: ids.central_station,
            constraints: TripConstraints {
                total_minutes: config.total_minutes,
                total_budget: config.budget,
                start_minute_of_day: config.start_minute_of_day,
                max_distance_km: config.max_distance_km,
            },
            profile: UserProfile {
                purposes: config.purposes.clone(),
                ..UserProfile::default()
            },
            condition: None,
            weights: None,
        })
        .await?;

    let (initial_plan, plan_changes) = preview_and_edit(service, session_id).await?;

    let mut stops = Vec::new();
    for step in 0..config.max_stops {
        let outcome = service
            .ranked_candidates(session_id, Some(config.choice_pool.max(1)))
            .await?;
        let candidates = match outcome {
            CycleOutcome::Ranked(candidates) if !candidates.is_empty() => candidates,
            _ => {
                info!(step, "No feasible next stop, the day is over");
                break;
            }
        };
        let rank = rng.random_range(0..candidates.len());
        let Some(choice) = candidates.get(rank) else {
            break;
        };

        let state = service
            .transition(session_id, choice.location.id, choice.primary.mode)
            .await?;
        info!(
            step,
            rank,
            location = %choice.location.name,
            mode = ?choice.primary.mode,
            final_score = choice.scores.final_score,
            correction = choice.scores.correction,
            elapsed_minutes = state.elapsed_minutes,
            spent = %state.spent,
            "Traveler moved"
        );
        stops.push(Stop {
            location_id: choice.location.id,
            name: choice.location.name.clone(),
            mode: choice.primary.mode,
            rank,
            final_score: choice.scores.final_score,
            elapsed_minutes: state.elapsed_minutes,
        });
    }

    let state = service.state(session_id).await?;
    service.close_session(session_id).await;
    Ok(TripSummary {
        session_id,
        initial_plan,
        plan_changes,
        stops,
        elapsed_minutes: state.elapsed_minutes,
        spent: state.spent,
        condition: state.condition,
    })
}

/// Preview a lattice, freeze its leading path, then follow the runner-up
/// at the first step and push the rest back, and report what moved.
async fn preview_and_edit(
    service: &PlannerService,
    session_id: SessionId,
) -> Result<(Option<Snapshot>, Vec<PathChange>), AppError> {
    let lattice = service.preview_lattice(session_id, None, None).await?;
    let Some(last_row) = lattice.rows.iter().rposition(|row| !row.points.is_empty()) else {
        return Ok((None, Vec::new()));
    };
    let snapshot = service
        .snapshot(session_id, last_row, 0, "leading path")
        .await?;
    info!(
        rows = lattice.rows.len(),
        confidence = snapshot.confidence,
        "Initial plan frozen"
    );

    if lattice.cell(0, 1).is_some() {
        service.switch_alternative(session_id, 0, 1).await?;
    }
    if last_row > 0 {
        service.delay_lattice(session_id, 1, 20, "long lunch").await?;
    }
    let changes = service.diff_snapshot(session_id, snapshot.id).await?;
    info!(changes = changes.len(), "Edited preview compared with the frozen plan");
    Ok((Some(snapshot), changes))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use rust_decimal_macros::dec;
    use waypath_catalog::{ScheduledContext, sample_city};
    use waypath_core::config::PlannerConfig;
    use waypath_core::planner::Planner;
    use waypath_types::Weather;

    use super::*;

    fn service() -> (PlannerService, SampleLocationIds) {
        let (catalog, ids) = sample_city().unwrap();
        let context = ScheduledContext::new(Weather::Clear).with_weather_from(240, Weather::Rain);
        let planner = Planner::new(Arc::new(catalog), Arc::new(context), PlannerConfig::default());
        (PlannerService::new(Arc::new(planner)), ids)
    }

    #[test]
    fn traveler_section_is_optional() {
        let config = parse_traveler_config("logging:\n  level: debug\n").unwrap();
        assert_eq!(config, TravelerConfig::default());
    }

    #[test]
    fn traveler_section_overrides_defaults() {
        let yaml = "traveler:\n  seed: 99\n  budget: 40\n  rain_from_minute: null\n  purposes:\n    Food: 1.0\n";
        let config = parse_traveler_config(yaml).unwrap();
        assert_eq!(config.seed, 99);
        assert_eq!(config.budget, dec!(40));
        assert_eq!(config.rain_from_minute, None);
        assert_eq!(config.purposes.len(), 1);
        assert_eq!(config.choice_pool, default_choice_pool());
    }

    #[test]
    fn malformed_section_is_reported() {
        let result = parse_traveler_config("traveler:\n  seed: lots\n");
        assert!(matches!(result, Err(AppError::Traveler { .. })));
    }

    #[tokio::test]
    async fn simulated_day_respects_the_trip_bounds() {
        let (service, ids) = service();
        let config = TravelerConfig::default();
        let summary = simulate_trip(&service, &ids, &config).await.unwrap();

        assert!(summary.elapsed_minutes <= config.total_minutes);
        assert!(summary.spent <= config.budget);
        assert!(summary.stops.len() <= config.max_stops);
        let unique: BTreeSet<LocationId> = summary.stops.iter().map(|s| s.location_id).collect();
        assert_eq!(unique.len(), summary.stops.len());
        assert!(!unique.contains(&ids.central_station));
        assert!(summary.stops.iter().all(|s| s.rank < config.choice_pool));
        assert!(service.registry().is_empty().await);
    }

    #[tokio::test]
    async fn same_seed_same_trip() {
        let config = TravelerConfig::default();
        let (first_service, first_ids) = service();
        let first = simulate_trip(&first_service, &first_ids, &config).await.unwrap();
        let (second_service, second_ids) = service();
        let second = simulate_trip(&second_service, &second_ids, &config).await.unwrap();

        let names = |s: &TripSummary| s.stops.iter().map(|stop| stop.name.clone()).collect::<Vec<_>>();
        assert_eq!(names(&first), names(&second));
    }
}
