//! Base scoring layers: preference, efficiency, contextual.
//!
//! Every layer implements [`ScoringLayer`] and produces a score in
//! `[0, 1]` for one feasible candidate. The set of layers is fixed, so they
//! are carried as the tagged [`BaseLayer`] enum rather than trait objects.
//! A layer that cannot run (its inputs are missing) returns a
//! [`LayerError`]; fusion then degrades that layer for the candidate and
//! redistributes its weight.
//!
//! # Preference
//!
//! `0.5 * purpose + 0.2 * pace + 0.15 * budget fit + 0.15 * quality`.
//!
//! # Efficiency
//!
//! `0.4 * distance + 0.4 * time + 0.2 * budget headroom`, on the primary
//! edge. Distance efficiency penalizes detours, time efficiency is
//! `exp(-hours / 2)`.
//!
//! # Contextual
//!
//! Mean of weather suitability, crowd comfort, and time-of-day fit at the
//! projected arrival.

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use waypath_types::{
    BudgetTier, Category, LayerKind, Setting, TimeOfDay, TravelState, UserProfile, Weather,
};

use crate::clock::TripClock;
use crate::experience::profile_of;
use crate::feasibility::{ContextView, FeasibleCandidate};

/// Everything a base layer may look at.
#[derive(Debug, Clone, Copy)]
pub struct LayerInput<'a> {
    /// The traveler's current state.
    pub state: &'a TravelState,
    /// The traveler's preferences.
    pub profile: &'a UserProfile,
    /// The candidate being scored.
    pub candidate: &'a FeasibleCandidate,
    /// Trip clock.
    pub clock: TripClock,
}

/// Why a layer could not score a candidate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LayerError {
    /// A required input is missing.
    #[error("missing input: {what}")]
    MissingInput {
        /// Which input.
        what: String,
    },
}

/// A scoring capability.
pub trait ScoringLayer {
    /// Which layer this is.
    fn kind(&self) -> LayerKind;

    /// Score the candidate in `[0, 1]`.
    fn score(&self, input: &LayerInput<'_>) -> Result<f64, LayerError>;
}

/// The three base layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseLayer {
    /// Fit with stated preferences.
    Preference,
    /// Spatial and temporal efficiency.
    Efficiency,
    /// Weather, crowds, and time of day.
    Contextual,
}

impl BaseLayer {
    /// All base layers in fusion order.
    pub const ALL: [Self; 3] = [Self::Preference, Self::Efficiency, Self::Contextual];
}

impl ScoringLayer for BaseLayer {
    fn kind(&self) -> LayerKind {
        match self {
            Self::Preference => LayerKind::Preference,
            Self::Efficiency => LayerKind::Efficiency,
            Self::Contextual => LayerKind::Contextual,
        }
    }

    fn score(&self, input: &LayerInput<'_>) -> Result<f64, LayerError> {
        let raw = match self {
            Self::Preference => Ok(preference_score(input)),
            Self::Efficiency => Ok(efficiency_score(input)),
            Self::Contextual => contextual_score(input),
        }?;
        Ok(raw.clamp(0.0, 1.0))
    }
}

// ---------------------------------------------------------------------------
// Preference
// ---------------------------------------------------------------------------

/// Preference fit of the candidate.
pub fn preference_score(input: &LayerInput<'_>) -> f64 {
    let location = &input.candidate.location;
    let profile = profile_of(location.category);

    let purpose = profile
        .purposes
        .iter()
        .map(|&p| input.profile.purpose_weight(p))
        .fold(0.0_f64, f64::max);

    let pace = match input.profile.pace.distance(profile.pace) {
        0 => 1.0,
        1 => 0.5,
        _ => 0.2,
    };

    let budget = budget_fit(location.admission, input.profile.budget_tier);

    let q = location.quality;
    // Low-confidence ratings are pulled toward the midpoint.
    let quality = q.confidence.mul_add(q.rating / 5.0, (1.0 - q.confidence) * 0.5);

    0.15f64.mul_add(
        quality,
        0.15f64.mul_add(budget, 0.5f64.mul_add(purpose, 0.2 * pace)),
    )
}

/// Highest admission a tier is comfortable with.
fn tier_cap(tier: BudgetTier) -> Decimal {
    match tier {
        BudgetTier::Low => Decimal::new(20, 0),
        BudgetTier::Medium => Decimal::new(60, 0),
        BudgetTier::High => Decimal::new(150, 0),
        BudgetTier::Luxury => Decimal::new(500, 0),
    }
}

/// 1.0 within the tier cap, falling linearly to 0.0 at twice the cap.
fn budget_fit(admission: Decimal, tier: BudgetTier) -> f64 {
    let cap = tier_cap(tier);
    if admission <= cap {
        return 1.0;
    }
    let over = admission.checked_sub(cap).unwrap_or(Decimal::MAX);
    let ratio = over
        .checked_div(cap)
        .and_then(|r| r.to_f64())
        .unwrap_or(1.0);
    (1.0 - ratio).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Efficiency
// ---------------------------------------------------------------------------

/// Spatial and temporal efficiency of reaching the candidate.
pub fn efficiency_score(input: &LayerInput<'_>) -> f64 {
    let edge = &input.candidate.primary;

    let distance = if edge.direct_km <= f64::EPSILON {
        1.0
    } else {
        (1.0 - (edge.route_km - edge.direct_km) / edge.direct_km).clamp(0.0, 1.0)
    };

    let hours = f64::from(edge.travel_minutes) / 60.0;
    let time = (-hours / 2.0).exp();

    let remaining = input.state.remaining_budget();
    let admission = input.candidate.location.admission;
    let headroom = if remaining.is_zero() {
        if admission.is_zero() { 1.0 } else { 0.0 }
    } else {
        admission
            .checked_div(remaining)
            .and_then(|r| r.to_f64())
            .map_or(0.0, |share| (1.0 - share).clamp(0.0, 1.0))
    };

    0.2f64.mul_add(headroom, 0.4f64.mul_add(distance, 0.4 * time))
}

// ---------------------------------------------------------------------------
// Contextual
// ---------------------------------------------------------------------------

/// Situational suitability of the candidate at arrival.
///
/// # Errors
///
/// Returns [`LayerError::MissingInput`] when no context observation is
/// available.
pub fn contextual_score(input: &LayerInput<'_>) -> Result<f64, LayerError> {
    let signals = match &input.candidate.context {
        ContextView::Observed(signals) => signals,
        ContextView::Unavailable(err) => {
            return Err(LayerError::MissingInput {
                what: format!("context ({err})"),
            });
        }
    };
    let location = &input.candidate.location;
    let arrival = input.candidate.primary.arrival_minute;

    let weather = weather_fit(location.setting, signals.weather);
    let crowd = 1.0 - signals.crowd_level.clamp(0.0, 1.0) * input.profile.avoid_crowds.clamp(0.0, 1.0);
    let time = time_of_day_fit(
        location.category,
        input.clock.time_of_day(arrival),
        input.clock.is_meal_time(arrival),
    );

    Ok((weather + crowd + time) / 3.0)
}

/// How pleasant a setting is in the given weather.
pub const fn weather_fit(setting: Setting, weather: Weather) -> f64 {
    match (setting, weather) {
        (Setting::Indoor, Weather::Clear) => 0.7,
        (Setting::Indoor, Weather::Cloudy) => 0.8,
        (Setting::Indoor, Weather::Heat) => 0.9,
        (Setting::Indoor, _) => 1.0,
        (Setting::Outdoor, Weather::Clear) => 1.0,
        (Setting::Outdoor, Weather::Cloudy) => 0.8,
        (Setting::Outdoor, Weather::Heat) => 0.5,
        (Setting::Outdoor, Weather::Rain) => 0.2,
        (Setting::Outdoor, Weather::Snow) => 0.3,
        (Setting::Outdoor, Weather::Storm) => 0.0,
        (Setting::Mixed, Weather::Clear | Weather::Cloudy) => 0.8,
        (Setting::Mixed, Weather::Heat) => 0.7,
        (Setting::Mixed, Weather::Rain | Weather::Snow) => 0.6,
        (Setting::Mixed, Weather::Storm) => 0.4,
    }
}

/// How well a category suits a time of day.
pub const fn time_of_day_fit(category: Category, band: TimeOfDay, meal_time: bool) -> f64 {
    match category {
        Category::Dining => {
            if meal_time {
                1.0
            } else {
                0.5
            }
        }
        Category::Entertainment => match band {
            TimeOfDay::Evening | TimeOfDay::Night => 1.0,
            TimeOfDay::Afternoon => 0.6,
            TimeOfDay::Morning | TimeOfDay::Midday => 0.4,
        },
        Category::Attraction => match band {
            TimeOfDay::Morning | TimeOfDay::Afternoon => 1.0,
            TimeOfDay::Midday => 0.8,
            TimeOfDay::Evening => 0.6,
            TimeOfDay::Night => 0.3,
        },
        Category::Shopping => match band {
            TimeOfDay::Afternoon | TimeOfDay::Evening => 1.0,
            TimeOfDay::Midday => 0.8,
            TimeOfDay::Morning => 0.6,
            TimeOfDay::Night => 0.4,
        },
        Category::TransportHub => 0.5,
        Category::Other => 0.6,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use rust_decimal_macros::dec;
    use waypath_types::{
        ContextSignals, Coordinate, Location, LocationId, Pace, Purpose, QualityRecord,
        TransitEdge, TransportMode, TravelerCondition, TripConstraints,
    };

    use super::*;
    use crate::error::CollaboratorError;

    fn state(budget: Decimal) -> TravelState {
        TravelState::start(
            LocationId::new(),
            TripConstraints {
                total_minutes: 480,
                total_budget: budget,
                start_minute_of_day: 540,
                max_distance_km: 50.0,
            },
            TravelerCondition::fresh(),
        )
    }

    fn candidate(category: Category, setting: Setting, admission: Decimal) -> FeasibleCandidate {
        let edge = TransitEdge {
            mode: TransportMode::Taxi,
            direct_km: 2.0,
            route_km: 2.6,
            travel_minutes: 6,
            fare: dec!(19.5),
            arrival_minute: 6,
        };
        FeasibleCandidate {
            location: Location {
                id: LocationId::new(),
                name: String::from("spot"),
                coordinate: Coordinate::new(0.0, 0.0),
                category,
                setting,
                address: String::new(),
                contact: None,
                admission,
                visit_minutes: 60,
                quality: QualityRecord {
                    rating: 4.5,
                    confidence: 1.0,
                    review_count: 500,
                },
                opening_hours: None,
                region: None,
            },
            primary: edge.clone(),
            edges: vec![edge],
            context: ContextView::Observed(ContextSignals {
                weather: Weather::Clear,
                crowd_level: 0.2,
                closed: false,
                age_minutes: 0,
            }),
            notes: Vec::new(),
        }
    }

    fn culture_lover() -> UserProfile {
        UserProfile {
            purposes: BTreeMap::from([(Purpose::Culture, 0.9), (Purpose::Food, 0.3)]),
            pace: Pace::Slow,
            budget_tier: BudgetTier::Medium,
            avoid_crowds: 0.5,
        }
    }

    fn input<'a>(
        state: &'a TravelState,
        profile: &'a UserProfile,
        candidate: &'a FeasibleCandidate,
    ) -> LayerInput<'a> {
        LayerInput {
            state,
            profile,
            candidate,
            clock: TripClock::new(540),
        }
    }

    #[test]
    fn preference_favours_matching_purpose() {
        let s = state(dec!(500));
        let p = culture_lover();
        let museum = candidate(Category::Attraction, Setting::Indoor, dec!(20));
        let arcade = candidate(Category::Entertainment, Setting::Indoor, dec!(20));
        let museum_score = BaseLayer::Preference.score(&input(&s, &p, &museum)).unwrap();
        let arcade_score = BaseLayer::Preference.score(&input(&s, &p, &arcade)).unwrap();
        assert!(museum_score > arcade_score);
    }

    #[test]
    fn budget_fit_falls_off_above_tier() {
        assert!((budget_fit(dec!(30), BudgetTier::Medium) - 1.0).abs() < 1e-9);
        assert!((budget_fit(dec!(90), BudgetTier::Medium) - 0.5).abs() < 1e-9);
        assert!(budget_fit(dec!(200), BudgetTier::Medium).abs() < 1e-9);
    }

    #[test]
    fn efficiency_penalizes_detour_and_time() {
        let s = state(dec!(500));
        let p = culture_lover();
        let mut straight = candidate(Category::Attraction, Setting::Indoor, dec!(0));
        straight.primary.route_km = 2.0;
        let winding = candidate(Category::Attraction, Setting::Indoor, dec!(0));
        let a = BaseLayer::Efficiency.score(&input(&s, &p, &straight)).unwrap();
        let b = BaseLayer::Efficiency.score(&input(&s, &p, &winding)).unwrap();
        assert!(a > b);

        let mut slow = straight.clone();
        slow.primary.travel_minutes = 90;
        let c = BaseLayer::Efficiency.score(&input(&s, &p, &slow)).unwrap();
        assert!(a > c);
    }

    #[test]
    fn efficiency_rewards_budget_headroom() {
        let s = state(dec!(100));
        let p = culture_lover();
        let free = candidate(Category::Attraction, Setting::Indoor, dec!(0));
        let dear = candidate(Category::Attraction, Setting::Indoor, dec!(90));
        let a = BaseLayer::Efficiency.score(&input(&s, &p, &free)).unwrap();
        let b = BaseLayer::Efficiency.score(&input(&s, &p, &dear)).unwrap();
        assert!(a > b);
    }

    #[test]
    fn rain_favours_indoor() {
        let s = state(dec!(500));
        let p = culture_lover();
        let mut indoor = candidate(Category::Attraction, Setting::Indoor, dec!(0));
        let mut outdoor = candidate(Category::Attraction, Setting::Outdoor, dec!(0));
        let rain = ContextView::Observed(ContextSignals {
            weather: Weather::Rain,
            crowd_level: 0.2,
            closed: false,
            age_minutes: 0,
        });
        indoor.context = rain.clone();
        outdoor.context = rain;
        let a = BaseLayer::Contextual.score(&input(&s, &p, &indoor)).unwrap();
        let b = BaseLayer::Contextual.score(&input(&s, &p, &outdoor)).unwrap();
        assert!(a > b);
    }

    #[test]
    fn contextual_without_context_is_an_error() {
        let s = state(dec!(500));
        let p = culture_lover();
        let mut c = candidate(Category::Attraction, Setting::Indoor, dec!(0));
        c.context = ContextView::Unavailable(CollaboratorError::Reasoning {
            message: String::from("down"),
        });
        assert!(matches!(
            BaseLayer::Contextual.score(&input(&s, &p, &c)),
            Err(LayerError::MissingInput { .. })
        ));
    }

    #[test]
    fn scores_stay_in_unit_range() {
        let s = state(dec!(0));
        let p = UserProfile::default();
        let c = candidate(Category::Other, Setting::Mixed, dec!(0));
        for layer in BaseLayer::ALL {
            let v = layer.score(&input(&s, &p, &c)).unwrap();
            assert!((0.0..=1.0).contains(&v), "{layer:?} gave {v}");
        }
    }
}
