//! Decision-space lattice: a preview of several future steps at once.
//!
//! Row `y` holds up to `alternatives` ranked options for step `y`. To get
//! from row `y` to row `y + 1` the builder provisionally takes the best
//! option of row `y` on a simulated copy of the state, so every row is
//! conditioned on the previous row's best guess. This is a single-path
//! lookahead, not a branching search: it costs `steps` scoring cycles
//! rather than `alternatives ^ steps`.
//!
//! A step with no feasible option yields an empty row, and every later
//! row is empty too. The live session state is never touched.
//!
//! The helpers here edit an existing lattice without rescoring it:
//! following a different alternative, and shifting rows in time after a
//! disruption. Neither recomputes the rows that depend on the edited one;
//! preview again for that.

use tracing::{debug, info};
use waypath_types::{
    Adjustment, Candidate, DecisionPoint, Lattice, NodeStatus, TimelineNode, TravelState,
    UserProfile,
};

use crate::config::LayerWeights;
use crate::error::EngineError;
use crate::planner::Planner;
use crate::transition::apply_transition;

/// Build a `steps x alternatives` lattice from `state`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidConstraint`] for malformed weights or a
/// zero-sized grid, and propagates catalog failures.
pub async fn build_lattice(
    planner: &Planner,
    state: &TravelState,
    profile: &UserProfile,
    weights: &LayerWeights,
    steps: usize,
    alternatives: usize,
) -> Result<Lattice, EngineError> {
    if steps == 0 || alternatives == 0 {
        return Err(EngineError::invalid(
            "lattice needs at least one step and one alternative",
        ));
    }
    weights.validate()?;

    let mut rows = Vec::with_capacity(steps);
    let mut simulated = Some(state.clone());
    let mut start_minute = state.elapsed_minutes;

    for y in 0..steps {
        let Some(current) = simulated.take() else {
            rows.push(TimelineNode {
                y,
                start_minute,
                points: Vec::new(),
                selected_x: None,
            });
            continue;
        };
        start_minute = current.elapsed_minutes;

        let eval = planner
            .evaluate(&current, profile, weights, alternatives)
            .await?;
        let ranked = eval.outcome.candidates();
        let points: Vec<DecisionPoint> = ranked
            .iter()
            .enumerate()
            .map(|(x, candidate)| decision_point(y, x, candidate))
            .collect();

        if let Some(best) = ranked.first() {
            simulated = Some(apply_transition(
                &current,
                &eval.feasible,
                best.location.id,
                best.primary.mode,
                planner.condition_model(),
            )?);
        }

        debug!(y, start_minute, options = points.len(), "Lattice row built");
        rows.push(TimelineNode {
            y,
            start_minute,
            selected_x: if points.is_empty() { None } else { Some(0) },
            points,
        });
    }

    info!(
        steps,
        alternatives,
        filled_rows = rows.iter().filter(|r| !r.points.is_empty()).count(),
        "Lattice built"
    );
    Ok(Lattice { rows })
}

fn decision_point(y: usize, x: usize, candidate: &Candidate) -> DecisionPoint {
    DecisionPoint {
        y,
        x,
        location_id: candidate.location.id,
        location_name: candidate.location.name.clone(),
        mode: candidate.primary.mode,
        arrival_minute: candidate.primary.arrival_minute,
        visit_minutes: candidate.location.visit_minutes,
        scores: candidate.scores.clone(),
        status: if x == 0 {
            NodeStatus::Selected
        } else {
            NodeStatus::Alternative
        },
        adjustment: None,
    }
}

/// Make row `y` follow alternative `x`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidCell`] if there is no cell at `(y, x)`.
pub fn switch_alternative(lattice: &mut Lattice, y: usize, x: usize) -> Result<(), EngineError> {
    let row = lattice
        .rows
        .get_mut(y)
        .ok_or(EngineError::InvalidCell { y, x })?;
    if row.switch_to(x) {
        Ok(())
    } else {
        Err(EngineError::InvalidCell { y, x })
    }
}

/// Move `node` to depart at `new_start_minute`, shifting every option's
/// arrival by the same amount and marking it adjusted.
///
/// The first adjustment's original arrival is kept across repeated
/// adjustments.
pub fn apply_adjustment(node: &TimelineNode, new_start_minute: u32, reason: &str) -> TimelineNode {
    let later = new_start_minute >= node.start_minute;
    let shift = new_start_minute.abs_diff(node.start_minute);
    let points = node
        .points
        .iter()
        .map(|point| {
            let arrival = if later {
                point.arrival_minute.saturating_add(shift)
            } else {
                point.arrival_minute.saturating_sub(shift)
            };
            let original_minute = point
                .adjustment
                .as_ref()
                .map_or(point.arrival_minute, |a| a.original_minute);
            DecisionPoint {
                arrival_minute: arrival,
                status: NodeStatus::Adjusted,
                adjustment: Some(Adjustment {
                    original_minute,
                    reason: String::from(reason),
                }),
                ..point.clone()
            }
        })
        .collect();
    TimelineNode {
        y: node.y,
        start_minute: new_start_minute,
        points,
        selected_x: node.selected_x,
    }
}

/// Delay rows `y..` by `minutes`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidCell`] if row `y` does not exist and
/// [`EngineError::ArithmeticOverflow`] if a start minute overflows.
pub fn delay_from(
    lattice: &Lattice,
    y: usize,
    minutes: u32,
    reason: &str,
) -> Result<Lattice, EngineError> {
    if y >= lattice.rows.len() {
        return Err(EngineError::InvalidCell { y, x: 0 });
    }
    let rows = lattice
        .rows
        .iter()
        .map(|row| -> Result<TimelineNode, EngineError> {
            if row.y < y {
                return Ok(row.clone());
            }
            let start = row
                .start_minute
                .checked_add(minutes)
                .ok_or_else(|| EngineError::overflow("delayed start minute"))?;
            Ok(apply_adjustment(row, start, reason))
        })
        .collect::<Result<Vec<_>, _>>()?;
    info!(from_row = y, minutes, reason, "Lattice delayed");
    Ok(Lattice { rows })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use rust_decimal_macros::dec;
    use waypath_catalog::{ScheduledContext, sample_city};
    use waypath_types::{TravelerCondition, TripConstraints, Weather};

    use super::*;
    use crate::config::PlannerConfig;

    fn planner_and_state(minutes: u32) -> (Planner, TravelState) {
        let (catalog, ids) = sample_city().unwrap();
        let planner = Planner::new(
            Arc::new(catalog),
            Arc::new(ScheduledContext::new(Weather::Clear)),
            PlannerConfig::default(),
        );
        let state = TravelState::start(
            ids.central_station,
            TripConstraints {
                total_minutes: minutes,
                total_budget: dec!(200),
                start_minute_of_day: 540,
                max_distance_km: 50.0,
            },
            TravelerCondition::fresh(),
        );
        (planner, state)
    }

    #[tokio::test]
    async fn rows_follow_the_provisional_best_pick() {
        let (planner, state) = planner_and_state(600);
        let lattice = build_lattice(
            &planner,
            &state,
            &UserProfile::default(),
            &LayerWeights::default(),
            3,
            3,
        )
        .await
        .unwrap();
        assert_eq!(lattice.rows.len(), 3);
        let first = lattice.cell(0, 0).unwrap();
        assert_eq!(first.status, NodeStatus::Selected);
        let second_row = lattice.rows.get(1).unwrap();
        // Row 1 departs once the row-0 pick has been visited.
        assert_eq!(
            second_row.start_minute,
            first.arrival_minute + first.visit_minutes
        );
        assert!(second_row.points.iter().all(|p| p.location_id != first.location_id));
        // The live state is untouched.
        assert_eq!(state.elapsed_minutes, 0);
    }

    #[tokio::test]
    async fn empty_rows_propagate() {
        // Twenty minutes is not enough for any visit.
        let (planner, state) = planner_and_state(20);
        let lattice = build_lattice(
            &planner,
            &state,
            &UserProfile::default(),
            &LayerWeights::default(),
            3,
            2,
        )
        .await
        .unwrap();
        assert_eq!(lattice.rows.len(), 3);
        assert!(lattice.rows.iter().all(|r| r.points.is_empty() && r.selected_x.is_none()));
    }

    #[tokio::test]
    async fn zero_sized_grid_is_rejected() {
        let (planner, state) = planner_and_state(600);
        let result = build_lattice(
            &planner,
            &state,
            &UserProfile::default(),
            &LayerWeights::default(),
            0,
            3,
        )
        .await;
        assert!(matches!(result, Err(EngineError::InvalidConstraint { .. })));
    }

    #[tokio::test]
    async fn switching_and_delaying() {
        let (planner, state) = planner_and_state(600);
        let mut lattice = build_lattice(
            &planner,
            &state,
            &UserProfile::default(),
            &LayerWeights::default(),
            2,
            3,
        )
        .await
        .unwrap();

        switch_alternative(&mut lattice, 0, 1).unwrap();
        let row = lattice.rows.first().unwrap();
        assert_eq!(row.selected_x, Some(1));
        assert_eq!(lattice.cell(0, 1).unwrap().status, NodeStatus::Selected);
        assert_eq!(lattice.cell(0, 0).unwrap().status, NodeStatus::Alternative);
        assert!(matches!(
            switch_alternative(&mut lattice, 0, 9),
            Err(EngineError::InvalidCell { y: 0, x: 9 })
        ));

        let before = lattice.cell(1, 0).unwrap().arrival_minute;
        let delayed = delay_from(&lattice, 1, 30, "bus strike").unwrap();
        let moved = delayed.cell(1, 0).unwrap();
        assert_eq!(moved.arrival_minute, before + 30);
        assert_eq!(moved.status, NodeStatus::Adjusted);
        assert_eq!(moved.adjustment.as_ref().unwrap().original_minute, before);
        // Row 0 is untouched.
        assert_eq!(delayed.rows.first(), lattice.rows.first());
    }

    #[test]
    fn repeated_adjustment_keeps_first_original() {
        let point = DecisionPoint {
            y: 0,
            x: 0,
            location_id: waypath_types::LocationId::new(),
            location_name: String::from("museum"),
            mode: waypath_types::TransportMode::Walk,
            arrival_minute: 110,
            visit_minutes: 60,
            scores: waypath_types::ScoreBreakdown {
                preference: Some(0.5),
                efficiency: Some(0.5),
                contextual: Some(0.5),
                semantic: None,
                causal: None,
                base: 0.5,
                correction: 0.0,
                final_score: 0.5,
            },
            status: NodeStatus::Selected,
            adjustment: None,
        };
        let node = TimelineNode {
            y: 0,
            start_minute: 100,
            points: vec![point],
            selected_x: Some(0),
        };
        let later = apply_adjustment(&node, 130, "late train");
        let earlier = apply_adjustment(&later, 90, "caught up");
        let cell = earlier.points.first().unwrap();
        assert_eq!(earlier.start_minute, 90);
        assert_eq!(cell.arrival_minute, 100);
        let adjustment = cell.adjustment.as_ref().unwrap();
        assert_eq!(adjustment.original_minute, 110);
        assert_eq!(adjustment.reason, "caught up");
        assert!(delay_from(&Lattice::default(), 0, 10, "none").is_err());
    }
}
