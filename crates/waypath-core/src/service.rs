//! The outward-facing planning service.
//!
//! [`PlannerService`] ties the [`Planner`] to the [`SessionRegistry`] and
//! exposes the session-level operations: create a session, rank the next
//! candidates, preview a lattice, commit a transition, and take or compare
//! snapshots. Every operation locks its session for its whole duration, so
//! two transitions on one session never interleave.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};
use waypath_types::{
    Lattice, LocationId, PathChange, SessionId, Snapshot, SnapshotId, TransportMode,
    TravelState, TravelerCondition, TripConstraints, UserProfile, MINUTES_PER_DAY,
};

use crate::config::LayerWeights;
use crate::error::EngineError;
use crate::lattice::{build_lattice, delay_from, switch_alternative};
use crate::planner::{CycleOutcome, Planner};
use crate::session::{Session, SessionRegistry};
use crate::snapshot::{diff_snapshot, take_snapshot};
use crate::transition::apply_transition;

/// Everything needed to open a session.
#[derive(Debug, Clone)]
pub struct NewSession {
    /// Where the trip starts.
    pub origin: LocationId,
    /// Time, budget, and distance bounds.
    pub constraints: TripConstraints,
    /// The traveler's preferences.
    pub profile: UserProfile,
    /// Starting condition; fresh when `None`.
    pub condition: Option<TravelerCondition>,
    /// Layer weights; the configured defaults when `None`.
    pub weights: Option<LayerWeights>,
}

/// Session-level planning operations.
#[derive(Debug)]
pub struct PlannerService {
    /// The scoring pipeline shared by every session.
    planner: Arc<Planner>,
    /// Live sessions.
    registry: SessionRegistry,
}

impl PlannerService {
    /// Create a service around `planner`.
    pub fn new(planner: Arc<Planner>) -> Self {
        let registry = SessionRegistry::new(planner.config().session.idle_timeout_minutes);
        Self { planner, registry }
    }

    /// The underlying planner.
    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    /// The session registry.
    pub const fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Open a session.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConstraint`] for malformed constraints,
    /// profile, or weights, and [`EngineError::Catalog`] if the origin is
    /// unknown.
    pub async fn create_session(&self, request: NewSession) -> Result<SessionId, EngineError> {
        validate_constraints(&request.constraints)?;
        validate_profile(&request.profile)?;
        let weights = request.weights.unwrap_or(self.planner.config().weights);
        weights.validate()?;
        self.planner.catalog().location(request.origin)?;

        let state = TravelState::start(
            request.origin,
            request.constraints,
            request.condition.unwrap_or_else(TravelerCondition::fresh),
        );
        let session = Session::new(request.profile, weights, state, Utc::now());
        Ok(self.registry.insert(session).await)
    }

    /// Rank the next candidates for a session. The feasible set behind the
    /// ranking becomes the one the next transition is checked against.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SessionNotFound`] for an unknown or expired
    /// session and propagates planner errors.
    pub async fn ranked_candidates(
        &self,
        id: SessionId,
        top_k: Option<usize>,
    ) -> Result<CycleOutcome, EngineError> {
        let handle = self.registry.get(id, Utc::now()).await?;
        let mut session = handle.lock().await;
        let top_k = top_k.unwrap_or(self.planner.config().session.default_top_k);
        let eval = self
            .planner
            .evaluate(&session.state, &session.profile, &session.weights, top_k)
            .await?;
        session.last_feasible = Some(eval.feasible);
        Ok(eval.outcome)
    }

    /// Preview a lattice from the session's current state and keep it as
    /// the session's working lattice.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SessionNotFound`] for an unknown or expired
    /// session and propagates lattice errors.
    pub async fn preview_lattice(
        &self,
        id: SessionId,
        steps: Option<usize>,
        alternatives: Option<usize>,
    ) -> Result<Lattice, EngineError> {
        let handle = self.registry.get(id, Utc::now()).await?;
        let mut session = handle.lock().await;
        let config = &self.planner.config().session;
        let lattice = build_lattice(
            &self.planner,
            &session.state,
            &session.profile,
            &session.weights,
            steps.unwrap_or(config.lattice_steps),
            alternatives.unwrap_or(config.lattice_alternatives),
        )
        .await?;
        session.lattice = Some(lattice.clone());
        Ok(lattice)
    }

    /// Move the traveler to `location` by `mode`.
    ///
    /// The move must be in the feasible set from the last
    /// [`Self::ranked_candidates`] call. On success the state is replaced
    /// and the feasible set and lattice are discarded. On failure nothing
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InfeasibleTransition`] if the move was not
    /// offered, and [`EngineError::SessionNotFound`] for an unknown session.
    pub async fn transition(
        &self,
        id: SessionId,
        location: LocationId,
        mode: TransportMode,
    ) -> Result<TravelState, EngineError> {
        let handle = self.registry.get(id, Utc::now()).await?;
        let mut session = handle.lock().await;
        let Some(feasible) = session.last_feasible.as_ref() else {
            warn!(session_id = %id, "Transition without a computed feasible set");
            return Err(EngineError::InfeasibleTransition {
                location,
                mode,
                reason: String::from("no feasible set has been computed"),
            });
        };
        let next = apply_transition(
            &session.state,
            feasible,
            location,
            mode,
            self.planner.condition_model(),
        )?;
        session.state = next.clone();
        session.last_feasible = None;
        session.lattice = None;
        Ok(next)
    }

    /// Freeze the working lattice's path ending at `(y, x)`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidCell`] if there is no working lattice
    /// or no such cell, and [`EngineError::RepeatedLocation`] if the path
    /// visits a location twice.
    pub async fn snapshot(
        &self,
        id: SessionId,
        y: usize,
        x: usize,
        message: &str,
    ) -> Result<Snapshot, EngineError> {
        let handle = self.registry.get(id, Utc::now()).await?;
        let mut session = handle.lock().await;
        let lattice = session
            .lattice
            .as_ref()
            .ok_or(EngineError::InvalidCell { y, x })?;
        let snapshot = take_snapshot(lattice, y, x, id, message)?;
        session.snapshots.push(snapshot.clone());
        Ok(snapshot)
    }

    /// Every snapshot of a session, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SessionNotFound`] for an unknown session.
    pub async fn snapshots(&self, id: SessionId) -> Result<Vec<Snapshot>, EngineError> {
        let handle = self.registry.get(id, Utc::now()).await?;
        let session = handle.lock().await;
        Ok(session.snapshots.clone())
    }

    /// Compare a snapshot with the working lattice. Without a working
    /// lattice every step reports as dropped.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SnapshotNotFound`] if the session has no such
    /// snapshot.
    pub async fn diff_snapshot(
        &self,
        id: SessionId,
        snapshot_id: SnapshotId,
    ) -> Result<Vec<PathChange>, EngineError> {
        let handle = self.registry.get(id, Utc::now()).await?;
        let session = handle.lock().await;
        let snapshot = session
            .snapshots
            .iter()
            .find(|s| s.id == snapshot_id)
            .ok_or(EngineError::SnapshotNotFound(snapshot_id))?;
        let empty = Lattice::default();
        Ok(diff_snapshot(snapshot, session.lattice.as_ref().unwrap_or(&empty)))
    }

    /// Make row `y` of the working lattice follow alternative `x`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidCell`] if there is no working lattice
    /// or no such cell.
    pub async fn switch_alternative(
        &self,
        id: SessionId,
        y: usize,
        x: usize,
    ) -> Result<Lattice, EngineError> {
        let handle = self.registry.get(id, Utc::now()).await?;
        let mut session = handle.lock().await;
        let lattice = session
            .lattice
            .as_mut()
            .ok_or(EngineError::InvalidCell { y, x })?;
        switch_alternative(lattice, y, x)?;
        Ok(lattice.clone())
    }

    /// Delay the working lattice from row `y` on by `minutes`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidCell`] if there is no working lattice
    /// or no row `y`.
    pub async fn delay_lattice(
        &self,
        id: SessionId,
        y: usize,
        minutes: u32,
        reason: &str,
    ) -> Result<Lattice, EngineError> {
        let handle = self.registry.get(id, Utc::now()).await?;
        let mut session = handle.lock().await;
        let lattice = session
            .lattice
            .as_ref()
            .ok_or(EngineError::InvalidCell { y, x: 0 })?;
        let delayed = delay_from(lattice, y, minutes, reason)?;
        session.lattice = Some(delayed.clone());
        Ok(delayed)
    }

    /// Replace the session's layer weights. The feasible set survives
    /// (it does not depend on weights); the lattice does not.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConstraint`] for malformed weights.
    pub async fn set_weights(&self, id: SessionId, weights: LayerWeights) -> Result<(), EngineError> {
        weights.validate()?;
        let handle = self.registry.get(id, Utc::now()).await?;
        let mut session = handle.lock().await;
        session.weights = weights;
        session.lattice = None;
        info!(session_id = %id, ?weights, "Session weights updated");
        Ok(())
    }

    /// The session's live state.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SessionNotFound`] for an unknown session.
    pub async fn state(&self, id: SessionId) -> Result<TravelState, EngineError> {
        let handle = self.registry.get(id, Utc::now()).await?;
        let session = handle.lock().await;
        Ok(session.state.clone())
    }

    /// Close a session. Returns whether it existed.
    pub async fn close_session(&self, id: SessionId) -> bool {
        self.registry.remove(id).await
    }

    /// Drop every session idle past the timeout.
    pub async fn expire_idle(&self) -> Vec<SessionId> {
        self.registry.expire_idle(Utc::now()).await
    }
}

fn validate_constraints(constraints: &TripConstraints) -> Result<(), EngineError> {
    if constraints.total_minutes == 0 {
        return Err(EngineError::invalid("trip time must be positive"));
    }
    if constraints.total_budget < Decimal::ZERO {
        return Err(EngineError::invalid("budget must not be negative"));
    }
    if constraints.start_minute_of_day >= MINUTES_PER_DAY {
        return Err(EngineError::invalid("start time must be within the day"));
    }
    if !constraints.max_distance_km.is_finite() || constraints.max_distance_km <= 0.0 {
        return Err(EngineError::invalid("distance limit must be positive and finite"));
    }
    Ok(())
}

fn validate_profile(profile: &UserProfile) -> Result<(), EngineError> {
    let unit = 0.0..=1.0;
    if !unit.contains(&profile.avoid_crowds) {
        return Err(EngineError::invalid("avoid_crowds must be within [0, 1]"));
    }
    if let Some((purpose, _)) = profile.purposes.iter().find(|(_, w)| !unit.contains(*w)) {
        return Err(EngineError::invalid(format!(
            "weight for {purpose:?} must be within [0, 1]"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;
    use waypath_catalog::{SampleLocationIds, ScheduledContext, sample_city};
    use waypath_types::Weather;

    use super::*;
    use crate::config::PlannerConfig;

    fn service() -> (PlannerService, SampleLocationIds) {
        let (catalog, ids) = sample_city().unwrap();
        let planner = Planner::new(
            Arc::new(catalog),
            Arc::new(ScheduledContext::new(Weather::Clear)),
            PlannerConfig::default(),
        );
        (PlannerService::new(Arc::new(planner)), ids)
    }

    fn request(origin: LocationId) -> NewSession {
        NewSession {
            origin,
            constraints: TripConstraints {
                total_minutes: 480,
                total_budget: dec!(150),
                start_minute_of_day: 540,
                max_distance_km: 50.0,
            },
            profile: UserProfile::default(),
            condition: None,
            weights: None,
        }
    }

    #[tokio::test]
    async fn invalid_requests_are_rejected() {
        let (svc, ids) = service();
        let mut bad = request(ids.central_station);
        bad.constraints.total_minutes = 0;
        assert!(matches!(
            svc.create_session(bad).await,
            Err(EngineError::InvalidConstraint { .. })
        ));

        let mut bad = request(ids.central_station);
        bad.constraints.total_budget = dec!(-1);
        assert!(svc.create_session(bad).await.is_err());

        let mut bad = request(ids.central_station);
        bad.profile.avoid_crowds = 2.0;
        assert!(svc.create_session(bad).await.is_err());

        assert!(matches!(
            svc.create_session(request(LocationId::new())).await,
            Err(EngineError::Catalog { .. })
        ));
    }

    #[tokio::test]
    async fn transition_requires_a_ranking_first() {
        let (svc, ids) = service();
        let id = svc.create_session(request(ids.central_station)).await.unwrap();
        let result = svc.transition(id, ids.city_museum, TransportMode::Walk).await;
        assert!(matches!(result, Err(EngineError::InfeasibleTransition { .. })));
    }

    #[tokio::test]
    async fn full_step_cycle() {
        let (svc, ids) = service();
        let id = svc.create_session(request(ids.central_station)).await.unwrap();

        let outcome = svc.ranked_candidates(id, Some(3)).await.unwrap();
        let pick = outcome.candidates().first().unwrap().clone();
        let state = svc
            .transition(id, pick.location.id, pick.primary.mode)
            .await
            .unwrap();
        assert_eq!(state.current_location, pick.location.id);
        assert_eq!(svc.state(id).await.unwrap(), state);

        // The feasible set was consumed; repeating the move is refused.
        let again = svc.transition(id, pick.location.id, pick.primary.mode).await;
        assert!(matches!(again, Err(EngineError::InfeasibleTransition { .. })));
        assert_eq!(svc.state(id).await.unwrap(), state);
    }

    #[tokio::test]
    async fn snapshots_and_diffs() {
        let (svc, ids) = service();
        let id = svc.create_session(request(ids.central_station)).await.unwrap();

        assert!(matches!(
            svc.snapshot(id, 0, 0, "too early").await,
            Err(EngineError::InvalidCell { .. })
        ));

        let lattice = svc.preview_lattice(id, Some(2), Some(2)).await.unwrap();
        assert_eq!(lattice.rows.len(), 2);
        let snap = svc.snapshot(id, 1, 0, "morning plan").await.unwrap();
        assert_eq!(snap.path.len(), 2);
        assert_eq!(svc.snapshots(id).await.unwrap().len(), 1);
        assert!(svc.diff_snapshot(id, snap.id).await.unwrap().is_empty());

        svc.delay_lattice(id, 0, 20, "late start").await.unwrap();
        let changes = svc.diff_snapshot(id, snap.id).await.unwrap();
        assert_eq!(changes.len(), 2);

        assert!(matches!(
            svc.diff_snapshot(id, SnapshotId::new()).await,
            Err(EngineError::SnapshotNotFound(_))
        ));
    }

    #[tokio::test]
    async fn closed_session_is_gone() {
        let (svc, ids) = service();
        let id = svc.create_session(request(ids.central_station)).await.unwrap();
        assert!(svc.close_session(id).await);
        assert!(matches!(
            svc.state(id).await,
            Err(EngineError::SessionNotFound(_))
        ));
    }
}
