//! Progressive decision-space engine for the Waypath itinerary planner.
//!
//! The engine builds an itinerary one stop at a time. Each cycle it works
//! out which locations are feasible from the traveler's current state,
//! scores them on preference, efficiency, and situational context, adds a
//! coherence correction for how well each would continue the trip so far,
//! and returns a ranked, explained shortlist. The caller reports the
//! traveler's choice and the session moves to the new state.
//!
//! # Modules
//!
//! - [`clock`] -- Trip minutes to local time of day and meal windows.
//! - [`coherence`] -- Semantic flow and causal strength correction layer.
//! - [`condition`] -- [`ConditionModel`] trait and the heuristic default.
//! - [`config`] -- Configuration loading from `waypath-config.yaml`.
//! - [`error`] -- Engine and collaborator error types.
//! - [`experience`] -- What visiting each category is like.
//! - [`feasibility`] -- Time, distance, opening, crowd, and cost gates.
//! - [`fusion`] -- Weighted fusion with degradation, and ranking.
//! - [`lattice`] -- Multi-step lookahead preview and its edit helpers.
//! - [`planner`] -- One scoring cycle over the collaborators.
//! - [`reasoning`] -- Optional [`ReasoningCollaborator`] with timeouts.
//! - [`scoring`] -- The base layers behind [`ScoringLayer`].
//! - [`service`] -- Session-level operations ([`PlannerService`]).
//! - [`session`] -- Sessions, the registry, and the expiry rule.
//! - [`snapshot`] -- Frozen lattice paths and diffs.
//! - [`transition`] -- Committing a move.
//!
//! [`ConditionModel`]: condition::ConditionModel
//! [`ReasoningCollaborator`]: reasoning::ReasoningCollaborator
//! [`ScoringLayer`]: scoring::ScoringLayer
//! [`PlannerService`]: service::PlannerService

pub mod clock;
pub mod coherence;
pub mod condition;
pub mod config;
pub mod error;
pub mod experience;
pub mod feasibility;
pub mod fusion;
pub mod lattice;
pub mod planner;
pub mod reasoning;
pub mod scoring;
pub mod service;
pub mod session;
pub mod snapshot;
pub mod transition;
