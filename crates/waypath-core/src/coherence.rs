//! Coherence correction layer.
//!
//! Adds a bounded correction `F = delta * S_sem + epsilon * C_causal` on
//! top of the fused base score, so the itinerary reads as a story rather
//! than a list of independently good stops.
//!
//! # Semantic flow (`S_sem`, in `[-1, 1]`)
//!
//! `0.4 * content + 0.3 * intensity + 0.3 * state fit`:
//!
//! - **content** -- how naturally the candidate's kind of experience
//!   follows the previous one, minus aesthetic fatigue for repeating a
//!   category, plus a bonus for swapping between indoor and outdoor.
//! - **intensity** -- whether the candidate's physical demand suits the
//!   traveler's remaining energy.
//! - **state fit** -- hunger, mood, and attention against what the
//!   candidate offers.
//!
//! # Causal strength (`C_causal`, in `[0, 1]`)
//!
//! Mean strength of the causal links present between the situation and
//! the candidate: environment (weather against setting), meal time,
//! recovery (tired traveler, gentle venue), sequence (what naturally
//! follows the previous stop), and region tension (novelty, continuity,
//! or doubling back). Weather is required; without it the layer is
//! skipped.
//!
//! When a [`crate::reasoning::ReasoningCollaborator`] is configured, its
//! estimates are blended with the rule values. If it fails for a
//! candidate, the correction is skipped for that candidate.

use waypath_types::{LayerStatus, Location, Setting, TravelerCondition, Weather};

use crate::clock::TripClock;
use crate::config::CoherenceConfig;
use crate::error::CollaboratorError;
use crate::experience::{ExperienceKind, flow_between, profile_of};
use crate::feasibility::FeasibleCandidate;
use crate::reasoning::ReasoningEstimate;

/// Recent visits needed by the coherence rules.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisitHistory {
    /// The last few visited locations, oldest first. The last entry is the
    /// current location.
    pub recent: Vec<Location>,
    /// Region of every visit in order, the origin included.
    pub regions: Vec<Option<String>>,
}

impl VisitHistory {
    /// The current location, if known.
    pub fn previous(&self) -> Option<&Location> {
        self.recent.last()
    }

    /// Names of recent visits, oldest first.
    pub fn recent_names(&self) -> Vec<String> {
        self.recent.iter().map(|l| l.name.clone()).collect()
    }

    /// How many separate stays the traveler has had in `region`.
    fn stays_in(&self, region: &str) -> usize {
        let mut stays = 0_usize;
        let mut inside = false;
        for r in &self.regions {
            let here = r.as_deref() == Some(region);
            if here && !inside {
                stays = stays.saturating_add(1);
            }
            inside = here;
        }
        stays
    }

    /// The region of the current location.
    fn current_region(&self) -> Option<&str> {
        self.regions.last().and_then(|r| r.as_deref())
    }
}

/// What the coherence layer did for one candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct CoherenceOutcome {
    /// Applied or skipped.
    pub status: LayerStatus,
    /// Semantic flow used, if applied.
    pub semantic: Option<f64>,
    /// Causal strength used, if applied.
    pub causal: Option<f64>,
    /// The correction added to the base score (0 unless applied).
    pub correction: f64,
    /// Why it was skipped.
    pub note: Option<String>,
}

impl CoherenceOutcome {
    fn skipped(note: String) -> Self {
        Self {
            status: LayerStatus::Skipped,
            semantic: None,
            causal: None,
            correction: 0.0,
            note: Some(note),
        }
    }
}

/// Evaluate the coherence correction for one candidate.
///
/// `estimate` is the reasoning collaborator's answer for this candidate,
/// or `None` when no collaborator is configured.
pub fn evaluate(
    candidate: &FeasibleCandidate,
    history: &VisitHistory,
    condition: &TravelerCondition,
    clock: TripClock,
    config: &CoherenceConfig,
    estimate: Option<&Result<ReasoningEstimate, CollaboratorError>>,
) -> CoherenceOutcome {
    if !config.enabled {
        return CoherenceOutcome::skipped(String::from("coherence correction disabled"));
    }
    let Some(rule_causal) = causal_strength(candidate, history, condition, clock) else {
        return CoherenceOutcome::skipped(String::from(
            "causal inputs missing: no weather observation",
        ));
    };
    let rule_semantic = semantic_flow(&candidate.location, history, condition);

    let (semantic, causal) = match estimate {
        None => (rule_semantic, rule_causal),
        Some(Ok(est)) if !est.is_finite() => {
            return CoherenceOutcome::skipped(String::from(
                "reasoning collaborator returned a non-finite estimate",
            ));
        }
        Some(Ok(est)) => {
            let b = config.reasoning_blend.clamp(0.0, 1.0);
            (
                b.mul_add(est.semantic, (1.0 - b) * rule_semantic),
                b.mul_add(est.causal, (1.0 - b) * rule_causal),
            )
        }
        Some(Err(err)) => {
            return CoherenceOutcome::skipped(format!("reasoning collaborator unavailable: {err}"));
        }
    };

    CoherenceOutcome {
        status: LayerStatus::Applied,
        semantic: Some(semantic),
        causal: Some(causal),
        correction: config.delta.mul_add(semantic, config.epsilon * causal),
        note: None,
    }
}

// ---------------------------------------------------------------------------
// Semantic flow
// ---------------------------------------------------------------------------

/// Semantic flow `S_sem` of visiting `candidate` next, in `[-1, 1]`.
pub fn semantic_flow(
    candidate: &Location,
    history: &VisitHistory,
    condition: &TravelerCondition,
) -> f64 {
    let content = content_flow(candidate, history);
    let intensity = intensity_fit(candidate, condition);
    let state = state_fit(candidate, condition);
    0.3f64
        .mul_add(state, 0.4f64.mul_add(content, 0.3 * intensity))
        .clamp(-1.0, 1.0)
}

fn content_flow(candidate: &Location, history: &VisitHistory) -> f64 {
    let kind = profile_of(candidate.category).kind;
    let Some(previous) = history.previous() else {
        return 0.1;
    };

    let mut score = flow_between(profile_of(previous.category).kind, kind);
    if previous.category == candidate.category {
        score -= 0.3;
    }
    let earlier = history.recent.len().saturating_sub(1);
    let repeats = history
        .recent
        .iter()
        .take(earlier)
        .filter(|l| l.category == candidate.category)
        .count();
    score -= 0.15 * f64::from(u32::try_from(repeats).unwrap_or(u32::MAX));
    if previous.setting.alternates_with(candidate.setting) {
        score += 0.2;
    }
    score.clamp(-1.0, 1.0)
}

fn intensity_fit(candidate: &Location, condition: &TravelerCondition) -> f64 {
    let demand = profile_of(candidate.category).intensity;
    let energy = condition.physical_energy;
    if energy >= 0.7 {
        0.6f64.mul_add(demand, 0.2)
    } else if energy >= 0.4 {
        0.5 - (demand - 0.5).abs()
    } else {
        1.2f64.mul_add(-demand, 0.4)
    }
}

fn state_fit(candidate: &Location, condition: &TravelerCondition) -> f64 {
    let profile = profile_of(candidate.category);
    let mut fit = 0.0;
    if profile.kind == ExperienceKind::Culinary {
        if condition.satiety < 0.3 {
            fit += 0.8;
        } else if condition.satiety > 0.8 {
            fit -= 0.4;
        }
    }
    if condition.mood < 0.4 && profile.kind == ExperienceKind::Relaxing {
        fit += 0.5;
    }
    if condition.mental_energy < 0.3 && profile.kind == ExperienceKind::Static {
        fit -= 0.4;
    }
    if profile.intensity > condition.physical_energy {
        fit -= 0.5 * (profile.intensity - condition.physical_energy);
    }
    fit.clamp(-1.0, 1.0)
}

// ---------------------------------------------------------------------------
// Causal strength
// ---------------------------------------------------------------------------

/// Causal strength `C_causal` of visiting `candidate` next, in `[0, 1]`.
///
/// Returns `None` when the candidate has no weather observation.
pub fn causal_strength(
    candidate: &FeasibleCandidate,
    history: &VisitHistory,
    condition: &TravelerCondition,
    clock: TripClock,
) -> Option<f64> {
    let weather = candidate.context.signals()?.weather;
    let location = &candidate.location;
    let profile = profile_of(location.category);

    let mut links: Vec<f64> = vec![environment_link(location, weather)];

    if profile.kind == ExperienceKind::Culinary {
        links.push(if clock.is_meal_time(candidate.primary.arrival_minute) {
            0.9
        } else {
            0.4
        });
    }

    if condition.physical_energy < 0.4 {
        links.push(if profile.intensity <= 0.3 { 0.9 } else { 0.2 });
    }

    if let Some(previous) = history.previous() {
        let follows = matches!(
            (profile_of(previous.category).kind, profile.kind),
            (
                ExperienceKind::Culinary,
                ExperienceKind::Static | ExperienceKind::Dynamic
            ) | (
                ExperienceKind::Dynamic,
                ExperienceKind::Relaxing | ExperienceKind::Culinary
            )
        );
        if follows {
            links.push(0.7);
        }
    }

    if let Some(region) = location.region.as_deref() {
        links.push(if history.current_region() == Some(region) {
            0.7
        } else {
            match history.stays_in(region) {
                0 => 0.8,
                1 => 0.4,
                _ => 0.2,
            }
        });
    }

    let count = f64::from(u32::try_from(links.len()).unwrap_or(u32::MAX));
    Some((links.iter().sum::<f64>() / count).clamp(0.0, 1.0))
}

fn environment_link(location: &Location, weather: Weather) -> f64 {
    match (location.setting, weather) {
        (Setting::Indoor, w) if w.is_wet() => 0.9,
        (Setting::Outdoor, w) if w.is_wet() => 0.2,
        (Setting::Mixed, w) if w.is_wet() => 0.5,
        (Setting::Indoor, Weather::Heat) => 0.8,
        (Setting::Outdoor, Weather::Heat) => 0.3,
        (Setting::Outdoor, Weather::Clear) => 0.8,
        _ => 0.6,
    }
}
