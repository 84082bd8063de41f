//! One scoring cycle: feasibility, base layers, coherence, fusion, ranking.
//!
//! The [`Planner`] holds the collaborators (catalog, context source,
//! optional reasoning collaborator, condition model) behind trait objects
//! and the configuration. It holds no per-session data; sessions pass the
//! state, profile, and weights they want evaluated.
//!
//! A cycle never mutates the state. Reasoning estimates are prefetched for
//! every candidate concurrently before scoring starts, so a slow
//! collaborator costs at most one timeout per cycle.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};
use waypath_catalog::{ContextSource, LocationCatalog};
use waypath_types::{Candidate, TravelState, UserProfile};

use crate::clock::TripClock;
use crate::coherence::{self, VisitHistory};
use crate::condition::{ConditionModel, HeuristicConditionModel};
use crate::config::{LayerWeights, PlannerConfig};
use crate::error::EngineError;
use crate::feasibility::{FeasibleSet, build_feasible_set};
use crate::fusion::{LayerResult, fuse, rank};
use crate::reasoning::{EstimateMap, ReasoningCollaborator, ReasoningRequest, prefetch_estimates};
use crate::scoring::{BaseLayer, LayerInput, ScoringLayer};

/// Result of one scoring cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Ranked candidates, best first, at most `top_k` of them.
    Ranked(Vec<Candidate>),
    /// Nothing is reachable within the remaining time and budget.
    NoFeasibleCandidates,
}

impl CycleOutcome {
    /// The ranked candidates (empty when nothing is feasible).
    pub fn candidates(&self) -> &[Candidate] {
        match self {
            Self::Ranked(candidates) => candidates.as_slice(),
            Self::NoFeasibleCandidates => &[],
        }
    }
}

/// A cycle's outcome together with the feasible set it was ranked from.
#[derive(Debug, Clone, PartialEq)]
pub struct StepEvaluation {
    /// What to show the traveler.
    pub outcome: CycleOutcome,
    /// The set a transition must be validated against.
    pub feasible: FeasibleSet,
}

/// The stateless scoring pipeline.
pub struct Planner {
    /// Location data.
    catalog: Arc<dyn LocationCatalog>,
    /// Weather, crowds, and closures.
    context: Arc<dyn ContextSource>,
    /// Optional second opinion for the coherence layer.
    reasoner: Option<Arc<dyn ReasoningCollaborator>>,
    /// Condition updates on transition.
    condition: Arc<dyn ConditionModel>,
    /// Tunables.
    config: PlannerConfig,
}

impl std::fmt::Debug for Planner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Planner")
            .field("has_reasoner", &self.reasoner.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Planner {
    /// Create a planner with the heuristic condition model and no
    /// reasoning collaborator.
    pub fn new(
        catalog: Arc<dyn LocationCatalog>,
        context: Arc<dyn ContextSource>,
        config: PlannerConfig,
    ) -> Self {
        let condition = Arc::new(HeuristicConditionModel::new(config.condition.clone()));
        Self {
            catalog,
            context,
            reasoner: None,
            condition,
            config,
        }
    }

    /// Consult `reasoner` in the coherence layer.
    #[must_use]
    pub fn with_reasoner(mut self, reasoner: Arc<dyn ReasoningCollaborator>) -> Self {
        self.reasoner = Some(reasoner);
        self
    }

    /// Replace the condition model.
    #[must_use]
    pub fn with_condition_model(mut self, model: Arc<dyn ConditionModel>) -> Self {
        self.condition = model;
        self
    }

    /// The configuration.
    pub const fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// The location catalog.
    pub fn catalog(&self) -> &dyn LocationCatalog {
        self.catalog.as_ref()
    }

    /// The condition model.
    pub fn condition_model(&self) -> &dyn ConditionModel {
        self.condition.as_ref()
    }

    /// Build the feasible set for `state`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Catalog`] if the catalog fails.
    pub fn feasible_set(&self, state: &TravelState) -> Result<FeasibleSet, EngineError> {
        build_feasible_set(state, self.catalog.as_ref(), self.context.as_ref(), &self.config)
    }

    /// Resolve the visits the coherence layer looks at.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Catalog`] if a visited location is unknown.
    pub fn visit_history(&self, state: &TravelState) -> Result<VisitHistory, EngineError> {
        let window = self.config.coherence.history_window.saturating_add(1);
        let skip = state.history.len().saturating_sub(window);
        let mut history = VisitHistory::default();
        for (i, id) in state.history.iter().enumerate() {
            let location = self.catalog.location(*id)?;
            history.regions.push(location.region.clone());
            if i >= skip {
                history.recent.push(location);
            }
        }
        Ok(history)
    }

    /// Run one full cycle for `state`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConstraint`] for malformed weights and
    /// [`EngineError::Catalog`] if the catalog fails. Collaborator failures
    /// are not errors; they show up in the explanations.
    pub async fn evaluate(
        &self,
        state: &TravelState,
        profile: &UserProfile,
        weights: &LayerWeights,
        top_k: usize,
    ) -> Result<StepEvaluation, EngineError> {
        weights.validate()?;
        let feasible = self.feasible_set(state)?;
        if feasible.is_empty() {
            info!(
                location = %state.current_location,
                elapsed_minutes = state.elapsed_minutes,
                remaining_budget = %state.remaining_budget(),
                "No feasible candidates"
            );
            return Ok(StepEvaluation {
                outcome: CycleOutcome::NoFeasibleCandidates,
                feasible,
            });
        }

        let history = self.visit_history(state)?;
        let clock = TripClock::new(state.constraints.start_minute_of_day);
        let estimates = self.prefetch(&feasible, &history, state, clock).await;

        let candidates = self.score(&feasible, state, profile, weights, &history, estimates.as_ref());
        let ranked = rank(candidates, top_k);

        info!(
            location = %state.current_location,
            feasible = feasible.len(),
            returned = ranked.len(),
            "Scoring cycle complete"
        );
        Ok(StepEvaluation {
            outcome: CycleOutcome::Ranked(ranked),
            feasible,
        })
    }

    /// Ask the reasoning collaborator about every candidate, if there is
    /// one and the coherence layer is on.
    async fn prefetch(
        &self,
        feasible: &FeasibleSet,
        history: &VisitHistory,
        state: &TravelState,
        clock: TripClock,
    ) -> Option<EstimateMap> {
        let reasoner = self.reasoner.as_ref()?;
        if !self.config.coherence.enabled {
            return None;
        }
        let recent_visits = history.recent_names();
        let requests = feasible
            .candidates
            .iter()
            .map(|c| ReasoningRequest {
                location_id: c.location.id,
                location_name: c.location.name.clone(),
                category: c.location.category,
                setting: c.location.setting,
                recent_visits: recent_visits.clone(),
                weather: c.context.signals().map(|s| s.weather),
                local_time: clock.format(c.primary.arrival_minute),
                condition: state.condition,
            })
            .collect();
        let timeout = Duration::from_millis(self.config.coherence.reasoning_timeout_ms);
        debug!(candidates = feasible.len(), ?timeout, "Prefetching reasoning estimates");
        Some(prefetch_estimates(reasoner.as_ref(), requests, timeout).await)
    }

    /// Score every feasible candidate (unranked).
    fn score(
        &self,
        feasible: &FeasibleSet,
        state: &TravelState,
        profile: &UserProfile,
        weights: &LayerWeights,
        history: &VisitHistory,
        estimates: Option<&EstimateMap>,
    ) -> Vec<Candidate> {
        let clock = TripClock::new(state.constraints.start_minute_of_day);
        feasible
            .candidates
            .iter()
            .map(|candidate| {
                let input = LayerInput {
                    state,
                    profile,
                    candidate,
                    clock,
                };
                let layers: Vec<LayerResult> = BaseLayer::ALL
                    .iter()
                    .map(|layer| (*layer, layer.score(&input)))
                    .collect();
                let outcome = coherence::evaluate(
                    candidate,
                    history,
                    &state.condition,
                    clock,
                    &self.config.coherence,
                    estimates.and_then(|map| map.get(&candidate.location.id)),
                );
                debug!(
                    location = %candidate.location.name,
                    coherence = ?outcome.status,
                    correction = outcome.correction,
                    "Candidate scored"
                );
                fuse(candidate.clone(), &layers, weights, outcome)
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;
    use waypath_catalog::{ScheduledContext, UnavailableContext, sample_city};
    use waypath_types::{LayerKind, LayerStatus, TravelerCondition, TripConstraints, Weather};

    use super::*;
    use crate::error::CollaboratorError;
    use crate::reasoning::{FixedReasoner, ReasoningEstimate};
    use futures::future::BoxFuture;

    struct BrokenReasoner;

    impl ReasoningCollaborator for BrokenReasoner {
        fn estimate(
            &self,
            _request: ReasoningRequest,
        ) -> BoxFuture<'_, Result<ReasoningEstimate, CollaboratorError>> {
            Box::pin(async {
                Err(CollaboratorError::Reasoning {
                    message: String::from("model overloaded"),
                })
            })
        }
    }

    /// Answers `NaN` about one location and a sound estimate otherwise.
    struct GarbledReasoner {
        target: waypath_types::LocationId,
    }

    impl ReasoningCollaborator for GarbledReasoner {
        fn estimate(
            &self,
            request: ReasoningRequest,
        ) -> BoxFuture<'_, Result<ReasoningEstimate, CollaboratorError>> {
            let semantic = if request.location_id == self.target {
                f64::NAN
            } else {
                0.5
            };
            Box::pin(async move {
                Ok(ReasoningEstimate {
                    semantic,
                    causal: 0.5,
                })
            })
        }
    }

    fn setup(context: Arc<dyn ContextSource>) -> (Planner, TravelState) {
        let (catalog, ids) = sample_city().unwrap();
        let planner = Planner::new(Arc::new(catalog), context, PlannerConfig::default());
        let state = TravelState::start(
            ids.central_station,
            TripConstraints {
                total_minutes: 480,
                total_budget: dec!(200),
                start_minute_of_day: 540,
                max_distance_km: 50.0,
            },
            TravelerCondition::fresh(),
        );
        (planner, state)
    }

    #[tokio::test]
    async fn ranked_list_is_sorted_and_bounded() {
        let (planner, state) = setup(Arc::new(ScheduledContext::new(Weather::Clear)));
        let eval = planner
            .evaluate(&state, &UserProfile::default(), &LayerWeights::default(), 3)
            .await
            .unwrap();
        let ranked = eval.outcome.candidates();
        assert_eq!(ranked.len(), 3);
        for pair in ranked.windows(2) {
            if let [a, b] = pair {
                assert!(a.scores.final_score >= b.scores.final_score);
            }
        }
        assert!(ranked.iter().all(|c| c.explanation.layers.len() == 4));
        assert!(eval.feasible.len() >= ranked.len());
    }

    #[tokio::test]
    async fn malformed_weights_are_rejected() {
        let (planner, state) = setup(Arc::new(ScheduledContext::new(Weather::Clear)));
        let weights = LayerWeights {
            preference: 0.9,
            efficiency: 0.9,
            contextual: 0.9,
        };
        let result = planner
            .evaluate(&state, &UserProfile::default(), &weights, 5)
            .await;
        assert!(matches!(result, Err(EngineError::InvalidConstraint { .. })));
    }

    #[tokio::test]
    async fn unavailable_context_degrades_contextual_layer() {
        let (planner, state) = setup(Arc::new(UnavailableContext::new("weather feed down")));
        let eval = planner
            .evaluate(&state, &UserProfile::default(), &LayerWeights::default(), 5)
            .await
            .unwrap();
        let first = eval.outcome.candidates().first().unwrap();
        let contextual = first
            .explanation
            .layers
            .iter()
            .find(|r| r.layer == LayerKind::Contextual)
            .unwrap();
        assert_eq!(contextual.status, LayerStatus::Degraded);
        // No weather, so the coherence layer cannot run either.
        let coherence = first.explanation.layers.last().unwrap();
        assert_eq!(coherence.status, LayerStatus::Skipped);
    }

    #[tokio::test]
    async fn failing_reasoner_skips_coherence_but_still_ranks() {
        let (planner, state) = setup(Arc::new(ScheduledContext::new(Weather::Clear)));
        let planner = planner.with_reasoner(Arc::new(BrokenReasoner));
        let eval = planner
            .evaluate(&state, &UserProfile::default(), &LayerWeights::default(), 5)
            .await
            .unwrap();
        let ranked = eval.outcome.candidates();
        assert_eq!(ranked.len(), 5);
        for c in ranked {
            assert_eq!(c.scores.final_score.to_bits(), c.scores.base.to_bits());
            let coherence = c.explanation.layers.last().unwrap();
            assert_eq!(coherence.status, LayerStatus::Skipped);
        }
    }

    #[tokio::test]
    async fn non_finite_estimate_skips_coherence_for_that_candidate() {
        let (planner, state) = setup(Arc::new(ScheduledContext::new(Weather::Clear)));
        let plain = planner
            .evaluate(&state, &UserProfile::default(), &LayerWeights::default(), 20)
            .await
            .unwrap();
        let target = plain.outcome.candidates().last().unwrap().location.id;

        let planner = planner.with_reasoner(Arc::new(GarbledReasoner { target }));
        let eval = planner
            .evaluate(&state, &UserProfile::default(), &LayerWeights::default(), 20)
            .await
            .unwrap();
        let ranked = eval.outcome.candidates();
        assert!(ranked.iter().all(|c| c.scores.final_score.is_finite()));
        assert_ne!(ranked.first().unwrap().location.id, target);
        for pair in ranked.windows(2) {
            if let [a, b] = pair {
                assert!(a.scores.final_score >= b.scores.final_score);
            }
        }

        let garbled = ranked.iter().find(|c| c.location.id == target).unwrap();
        assert_eq!(garbled.scores.final_score.to_bits(), garbled.scores.base.to_bits());
        assert_eq!(
            garbled.explanation.layers.last().unwrap().status,
            LayerStatus::Skipped
        );
        let others_applied = ranked
            .iter()
            .filter(|c| c.location.id != target)
            .all(|c| c.explanation.layers.last().unwrap().status == LayerStatus::Applied);
        assert!(others_applied);
    }

    #[tokio::test]
    async fn optimistic_reasoner_never_lowers_a_correction() {
        let (planner, state) = setup(Arc::new(ScheduledContext::new(Weather::Clear)));
        let plain = planner
            .evaluate(&state, &UserProfile::default(), &LayerWeights::default(), 20)
            .await
            .unwrap();
        let planner = planner.with_reasoner(Arc::new(FixedReasoner::new(1.0, 1.0)));
        let boosted = planner
            .evaluate(&state, &UserProfile::default(), &LayerWeights::default(), 20)
            .await
            .unwrap();
        for a in plain.outcome.candidates() {
            let b = boosted
                .outcome
                .candidates()
                .iter()
                .find(|b| b.location.id == a.location.id)
                .unwrap();
            assert!(b.scores.correction >= a.scores.correction - 1e-12);
        }
    }

    #[tokio::test]
    async fn history_window_keeps_recent_visits_and_all_regions() {
        let (catalog, ids) = sample_city().unwrap();
        let mut config = PlannerConfig::default();
        config.coherence.history_window = 1;
        let planner = Planner::new(
            Arc::new(catalog),
            Arc::new(ScheduledContext::new(Weather::Clear)),
            config,
        );
        let mut state = TravelState::start(
            ids.central_station,
            TripConstraints {
                total_minutes: 480,
                total_budget: dec!(200),
                start_minute_of_day: 540,
                max_distance_km: 50.0,
            },
            TravelerCondition::fresh(),
        );
        state.history.push(ids.city_museum);
        state.history.push(ids.river_promenade);
        state.current_location = ids.river_promenade;
        let history = planner.visit_history(&state).unwrap();
        assert_eq!(history.recent.len(), 2);
        assert_eq!(history.regions.len(), 3);
        assert_eq!(history.previous().map(|l| l.id), Some(ids.river_promenade));
    }
}
