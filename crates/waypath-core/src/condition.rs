//! Traveler condition model, applied once per transition.
//!
//! The model is a parameterized heuristic with two drivers:
//!
//! - **Time**: every hour in transit or on a visit drains physical energy
//!   and satiety. Walking drains more than riding. Demanding venues drain
//!   more than gentle ones.
//! - **Activity**: meals restore satiety and a little energy; meals and
//!   relaxing stops restore mental energy; attentive venues (museums,
//!   sights) drain it. Mood follows the quality of the visit.
//!
//! Time pressure is the share of the trip already used. Every value is
//! clamped to `[0, 1]` after the update.

use waypath_types::{Location, TransitEdge, TransportMode, TravelerCondition};

use crate::config::ConditionConfig;
use crate::experience::{ExperienceKind, profile_of};

/// Everything a condition model may look at for one completed hop and
/// visit.
#[derive(Debug, Clone, Copy)]
pub struct VisitRecord<'a> {
    /// The location visited.
    pub location: &'a Location,
    /// How the traveler got there.
    pub edge: &'a TransitEdge,
    /// Trip minutes used once the visit ends.
    pub elapsed_after: u32,
    /// Total trip minutes.
    pub total_minutes: u32,
}

/// Updates the traveler's condition after a visit.
pub trait ConditionModel: Send + Sync {
    /// Condition after the hop and visit in `visit`.
    fn after_visit(&self, before: &TravelerCondition, visit: &VisitRecord<'_>)
    -> TravelerCondition;
}

/// The default time- and activity-based model.
#[derive(Debug, Clone, Default)]
pub struct HeuristicConditionModel {
    /// Rates.
    config: ConditionConfig,
}

impl HeuristicConditionModel {
    /// Create a model with the given rates.
    pub const fn new(config: ConditionConfig) -> Self {
        Self { config }
    }
}

impl ConditionModel for HeuristicConditionModel {
    fn after_visit(
        &self,
        before: &TravelerCondition,
        visit: &VisitRecord<'_>,
    ) -> TravelerCondition {
        let c = &self.config;
        let profile = profile_of(visit.location.category);
        let travel_hours = f64::from(visit.edge.travel_minutes) / 60.0;
        let visit_hours = f64::from(visit.location.visit_minutes) / 60.0;

        let walking = if visit.edge.mode == TransportMode::Walk {
            c.walking_fatigue_factor
        } else {
            1.0
        };
        let mut physical = before.physical_energy
            - c.travel_fatigue_per_hour * travel_hours * walking
            - c.visit_fatigue_per_hour * visit_hours * (0.5 + profile.intensity);

        let attention = match profile.kind {
            ExperienceKind::Static => 1.5,
            ExperienceKind::Dynamic | ExperienceKind::Social => 1.0,
            ExperienceKind::Culinary | ExperienceKind::Relaxing => 0.3,
        };
        let mut mental = before.mental_energy - c.mental_fatigue_per_hour * visit_hours * attention;

        let mut satiety = before.satiety - c.hunger_per_hour * (travel_hours + visit_hours);

        if profile.kind == ExperienceKind::Culinary {
            satiety += c.meal_satiety;
            physical += c.meal_energy;
        }
        if matches!(
            profile.kind,
            ExperienceKind::Culinary | ExperienceKind::Relaxing
        ) {
            mental += c.rest_recovery;
        }

        let quality = visit.location.quality;
        let mut mood =
            before.mood + c.mood_per_rating_point * (quality.rating - 2.5) * quality.confidence;
        if physical < 0.2 {
            mood -= 0.1;
        }

        let time_pressure = if visit.total_minutes == 0 {
            1.0
        } else {
            f64::from(visit.elapsed_after) / f64::from(visit.total_minutes)
        };

        TravelerCondition {
            physical_energy: physical,
            mental_energy: mental,
            mood,
            satiety,
            time_pressure,
        }
        .clamped()
    }
}
