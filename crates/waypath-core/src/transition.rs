//! Committing a move.
//!
//! A transition is only accepted if it appears in the feasible set most
//! recently computed for the exact state being moved from. The new state
//! is built on the side and returned; the caller swaps it in. On any error
//! the old state is untouched.

use rust_decimal::Decimal;
use tracing::info;
use waypath_types::{LocationId, TransportMode, TravelState};

use crate::condition::{ConditionModel, VisitRecord};
use crate::error::EngineError;
use crate::feasibility::FeasibleSet;

/// Move the traveler to `location` by `mode`.
///
/// Elapsed time grows by the edge's travel time plus the visit length.
/// Spent money grows by the admission. Transit fares are informational
/// and not charged against the budget.
///
/// # Errors
///
/// Returns [`EngineError::InfeasibleTransition`] if the feasible set was
/// computed for a different state, does not contain `location`, or has no
/// edge for `mode`, or if the move would break the time or budget bound.
/// Returns [`EngineError::ArithmeticOverflow`] if time or money overflows.
pub fn apply_transition(
    state: &TravelState,
    feasible: &FeasibleSet,
    location: LocationId,
    mode: TransportMode,
    condition: &dyn ConditionModel,
) -> Result<TravelState, EngineError> {
    let refuse = |reason: &str| EngineError::InfeasibleTransition {
        location,
        mode,
        reason: String::from(reason),
    };

    if !feasible.matches(state) {
        return Err(refuse("feasible set is out of date for this state"));
    }
    let candidate = feasible
        .get(location)
        .ok_or_else(|| refuse("location is not in the feasible set"))?;
    let edge = candidate
        .edge(mode)
        .ok_or_else(|| refuse("mode is not feasible for this location"))?;

    let elapsed = state
        .elapsed_minutes
        .checked_add(edge.travel_minutes)
        .and_then(|m| m.checked_add(candidate.location.visit_minutes))
        .ok_or_else(|| EngineError::overflow("elapsed minutes"))?;
    if elapsed > state.constraints.total_minutes {
        return Err(refuse("visit would exceed the trip time"));
    }

    let spent: Decimal = state
        .spent
        .checked_add(candidate.location.admission)
        .ok_or_else(|| EngineError::overflow("spent budget"))?;
    if spent > state.constraints.total_budget {
        return Err(refuse("admission would exceed the budget"));
    }

    let after = condition.after_visit(
        &state.condition,
        &VisitRecord {
            location: &candidate.location,
            edge,
            elapsed_after: elapsed,
            total_minutes: state.constraints.total_minutes,
        },
    );

    let mut history = state.history.clone();
    history.push(location);

    info!(
        to = %candidate.location.name,
        ?mode,
        elapsed_minutes = elapsed,
        spent = %spent,
        "Transition applied"
    );

    Ok(TravelState {
        current_location: location,
        elapsed_minutes: elapsed,
        spent,
        history,
        condition: after.clamped(),
        constraints: state.constraints.clone(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;
    use waypath_catalog::{ScheduledContext, sample_city};
    use waypath_types::{TravelerCondition, TripConstraints, Weather};

    use super::*;
    use crate::condition::HeuristicConditionModel;
    use crate::config::PlannerConfig;
    use crate::feasibility::build_feasible_set;

    fn start(origin: LocationId) -> TravelState {
        TravelState::start(
            origin,
            TripConstraints {
                total_minutes: 480,
                total_budget: dec!(100),
                start_minute_of_day: 540,
                max_distance_km: 50.0,
            },
            TravelerCondition::fresh(),
        )
    }

    #[test]
    fn transition_adds_exact_time_and_money() {
        let (catalog, ids) = sample_city().unwrap();
        let state = start(ids.central_station);
        let context = ScheduledContext::new(Weather::Clear);
        let set = build_feasible_set(&state, &catalog, &context, &PlannerConfig::default()).unwrap();
        let museum = set.get(ids.city_museum).unwrap();
        let edge = museum.primary.clone();
        let model = HeuristicConditionModel::default();

        let next = apply_transition(&state, &set, ids.city_museum, edge.mode, &model).unwrap();
        assert_eq!(
            next.elapsed_minutes,
            edge.travel_minutes + museum.location.visit_minutes
        );
        assert_eq!(next.spent, dec!(40));
        assert_eq!(next.current_location, ids.city_museum);
        assert_eq!(next.history, vec![ids.central_station, ids.city_museum]);
        assert!(next.condition.physical_energy < state.condition.physical_energy);
    }

    #[test]
    fn unknown_destination_is_refused() {
        let (catalog, ids) = sample_city().unwrap();
        let state = start(ids.central_station);
        let context = ScheduledContext::new(Weather::Clear);
        let set = build_feasible_set(&state, &catalog, &context, &PlannerConfig::default()).unwrap();
        // Closed at 09:00.
        let result = apply_transition(
            &state,
            &set,
            ids.jazz_bar,
            TransportMode::Taxi,
            &HeuristicConditionModel::default(),
        );
        assert!(matches!(result, Err(EngineError::InfeasibleTransition { .. })));
    }

    #[test]
    fn stale_feasible_set_is_refused() {
        let (catalog, ids) = sample_city().unwrap();
        let state = start(ids.central_station);
        let context = ScheduledContext::new(Weather::Clear);
        let set = build_feasible_set(&state, &catalog, &context, &PlannerConfig::default()).unwrap();
        let model = HeuristicConditionModel::default();
        let mode = set.get(ids.old_temple).unwrap().primary.mode;
        let moved = apply_transition(&state, &set, ids.old_temple, mode, &model).unwrap();

        let museum_mode = set.get(ids.city_museum).unwrap().primary.mode;
        let result = apply_transition(&moved, &set, ids.city_museum, museum_mode, &model);
        assert!(matches!(result, Err(EngineError::InfeasibleTransition { .. })));
    }

    #[test]
    fn mode_outside_the_set_is_refused() {
        let (catalog, ids) = sample_city().unwrap();
        let state = start(ids.central_station);
        let context = ScheduledContext::new(Weather::Clear);
        let set = build_feasible_set(&state, &catalog, &context, &PlannerConfig::default()).unwrap();
        // The museum is about half a kilometre away: too short for the subway.
        let result = apply_transition(
            &state,
            &set,
            ids.city_museum,
            TransportMode::Subway,
            &HeuristicConditionModel::default(),
        );
        assert!(matches!(result, Err(EngineError::InfeasibleTransition { .. })));
    }
}
