//! Spatial/temporal feasibility filter.
//!
//! Builds the set of locations the traveler could go to next from the
//! current [`TravelState`]. A location is feasible when at least one
//! transit mode passes every gate:
//!
//! 1. **Time** -- travel plus visit fits in the remaining trip time.
//! 2. **Distance** -- the straight-line hop is within the distance limit
//!    and the route is at most `max_detour_ratio` times that hop.
//! 3. **Open and not overcrowded** -- the venue is open at the projected
//!    arrival and its crowd level is within the threshold.
//! 4. **Cost** -- the admission fits in the remaining budget.
//!
//! Visited locations (the origin included) are never proposed again.
//! Failing locations are dropped, not scored. An empty set is a valid
//! result.
//!
//! When the context source fails or reports a stale observation, static
//! opening hours still apply, the crowd gate is skipped, and the candidate
//! carries a note saying so.

use std::collections::BTreeMap;

use tracing::debug;
use waypath_catalog::{ContextSource, LocationCatalog, estimate_edges, haversine_km};
use waypath_types::{ContextSignals, Location, LocationId, TransitEdge, TransportMode, TravelState};

use crate::clock::TripClock;
use crate::config::PlannerConfig;
use crate::error::{CollaboratorError, EngineError};

/// Slack on the detour comparison for float noise.
const DETOUR_EPSILON: f64 = 1e-9;

/// Why a location or one of its edges failed the gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rejection {
    /// Already in the visit history.
    Visited,
    /// Straight-line hop beyond the distance limit.
    TooFar,
    /// Admission exceeds the remaining budget.
    OverBudget,
    /// No mode covers the hop.
    NoMode,
    /// Route distance exceeds the detour limit.
    Detour,
    /// Travel plus visit does not fit in the remaining time.
    OutOfTime,
    /// Closed at the projected arrival.
    Closed,
    /// Crowd level over the threshold at the projected arrival.
    Crowded,
}

/// What the context source said about a candidate at its primary arrival.
#[derive(Debug, Clone, PartialEq)]
pub enum ContextView {
    /// A fresh observation.
    Observed(ContextSignals),
    /// No usable observation.
    Unavailable(CollaboratorError),
}

impl ContextView {
    /// The observation, if there is one.
    pub const fn signals(&self) -> Option<&ContextSignals> {
        match self {
            Self::Observed(signals) => Some(signals),
            Self::Unavailable(_) => None,
        }
    }
}

/// A location that passed the gates, with every passing edge.
#[derive(Debug, Clone, PartialEq)]
pub struct FeasibleCandidate {
    /// The location.
    pub location: Location,
    /// Fastest passing edge (ties broken by mode order).
    pub primary: TransitEdge,
    /// Every passing edge, in mode order.
    pub edges: Vec<TransitEdge>,
    /// Context at the primary arrival.
    pub context: ContextView,
    /// Remarks for the explanation.
    pub notes: Vec<String>,
}

impl FeasibleCandidate {
    /// The passing edge for `mode`, if any.
    pub fn edge(&self, mode: TransportMode) -> Option<&TransitEdge> {
        self.edges.iter().find(|e| e.mode == mode)
    }
}

/// Every feasible next location from one state.
///
/// Records the position and elapsed time it was computed for, so a
/// transition can tell when the set no longer matches the state.
#[derive(Debug, Clone, PartialEq)]
pub struct FeasibleSet {
    /// Location the set was computed from.
    pub origin: LocationId,
    /// Elapsed trip minutes when it was computed.
    pub elapsed_minutes: u32,
    /// Feasible candidates in location ID order.
    pub candidates: Vec<FeasibleCandidate>,
}

impl FeasibleSet {
    /// Whether no location is feasible.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Number of feasible locations.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// The candidate for `location`, if it is feasible.
    pub fn get(&self, location: LocationId) -> Option<&FeasibleCandidate> {
        self.candidates.iter().find(|c| c.location.id == location)
    }

    /// Whether the set was computed for `state`'s position and time.
    pub fn matches(&self, state: &TravelState) -> bool {
        self.origin == state.current_location && self.elapsed_minutes == state.elapsed_minutes
    }
}

/// Build the feasible set for `state`.
///
/// # Errors
///
/// Returns [`EngineError::Catalog`] if the catalog cannot be queried.
pub fn build_feasible_set(
    state: &TravelState,
    catalog: &dyn LocationCatalog,
    context: &dyn ContextSource,
    config: &PlannerConfig,
) -> Result<FeasibleSet, EngineError> {
    let origin = catalog.location(state.current_location)?;
    let max_km = config
        .feasibility
        .max_distance_km
        .min(state.constraints.max_distance_km);
    let pool = catalog.locations_near(origin.coordinate, max_km)?;

    let clock = TripClock::new(state.constraints.start_minute_of_day);
    let mut candidates = Vec::new();
    let mut rejected: BTreeMap<Rejection, u32> = BTreeMap::new();

    for location in pool {
        match check_location(state, &origin, location, context, config, clock, max_km) {
            Ok(candidate) => candidates.push(candidate),
            Err(reason) => {
                let count = rejected.entry(reason).or_insert(0);
                *count = count.saturating_add(1);
            }
        }
    }

    debug!(
        origin = %state.current_location,
        elapsed_minutes = state.elapsed_minutes,
        feasible = candidates.len(),
        rejected = ?rejected,
        "Feasible set built"
    );

    Ok(FeasibleSet {
        origin: state.current_location,
        elapsed_minutes: state.elapsed_minutes,
        candidates,
    })
}

/// Run every gate for one location.
fn check_location(
    state: &TravelState,
    origin: &Location,
    location: Location,
    context: &dyn ContextSource,
    config: &PlannerConfig,
    clock: TripClock,
    max_km: f64,
) -> Result<FeasibleCandidate, Rejection> {
    if state.has_visited(location.id) {
        return Err(Rejection::Visited);
    }
    let direct_km = haversine_km(origin.coordinate, location.coordinate);
    if direct_km > max_km {
        return Err(Rejection::TooFar);
    }
    if location.admission > state.remaining_budget() {
        return Err(Rejection::OverBudget);
    }

    let edges = estimate_edges(direct_km, state.elapsed_minutes, &config.transit);
    if edges.is_empty() {
        return Err(Rejection::NoMode);
    }

    let mut passing: Vec<(TransitEdge, ContextView)> = Vec::new();
    let mut first_failure = Rejection::NoMode;
    for edge in edges {
        match check_edge(state, &location, &edge, context, config, clock) {
            Ok(view) => passing.push((edge, view)),
            Err(reason) => {
                if first_failure == Rejection::NoMode {
                    first_failure = reason;
                }
            }
        }
    }

    let Some((primary, view)) = passing
        .iter()
        .min_by_key(|(edge, _)| (edge.travel_minutes, edge.mode))
        .cloned()
    else {
        return Err(first_failure);
    };

    let mut notes = Vec::new();
    if let ContextView::Unavailable(err) = &view {
        notes.push(format!("crowd and closure not checked: {err}"));
    }

    Ok(FeasibleCandidate {
        location,
        primary,
        edges: passing.into_iter().map(|(edge, _)| edge).collect(),
        context: view,
        notes,
    })
}

/// Run the per-edge gates (detour, time, open, crowd).
fn check_edge(
    state: &TravelState,
    location: &Location,
    edge: &TransitEdge,
    context: &dyn ContextSource,
    config: &PlannerConfig,
    clock: TripClock,
) -> Result<ContextView, Rejection> {
    let detour_limit = config.feasibility.max_detour_ratio * edge.direct_km + DETOUR_EPSILON;
    if edge.route_km > detour_limit {
        return Err(Rejection::Detour);
    }

    let needed = edge
        .travel_minutes
        .checked_add(location.visit_minutes)
        .ok_or(Rejection::OutOfTime)?;
    if needed > state.remaining_minutes() {
        return Err(Rejection::OutOfTime);
    }

    if let Some(hours) = location.opening_hours
        && !hours.is_open_at(clock.minute_of_day(edge.arrival_minute))
    {
        return Err(Rejection::Closed);
    }

    let view = observe(context, location, edge.arrival_minute, config);
    if let ContextView::Observed(signals) = &view {
        if signals.closed {
            return Err(Rejection::Closed);
        }
        if signals.crowd_level > config.feasibility.crowd_threshold {
            return Err(Rejection::Crowded);
        }
    }
    Ok(view)
}

/// Ask the context source about `location` at `trip_minute`, applying the
/// staleness tolerance.
pub fn observe(
    context: &dyn ContextSource,
    location: &Location,
    trip_minute: u32,
    config: &PlannerConfig,
) -> ContextView {
    let limit = config.context.max_staleness_minutes;
    match context.signals(location, trip_minute) {
        Ok(signals) if signals.age_minutes > limit => {
            ContextView::Unavailable(CollaboratorError::Stale {
                age_minutes: signals.age_minutes,
                limit_minutes: limit,
            })
        }
        Ok(signals) => ContextView::Observed(signals),
        Err(source) => ContextView::Unavailable(CollaboratorError::Context { source }),
    }
}
