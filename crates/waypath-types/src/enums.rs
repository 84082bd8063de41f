//! Enumeration types for the Waypath itinerary engine.
//!
//! Location classification, transit modes, environmental conditions,
//! traveler preference vocabulary, and the status tags used by ranking
//! explanations and the decision lattice.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

/// The kind of place a [`crate::Location`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Category {
    /// Sights, museums, parks, landmarks.
    Attraction,
    /// Restaurants, cafes, food halls.
    Dining,
    /// Malls, markets, boutiques.
    Shopping,
    /// Theatres, arcades, live venues, nightlife.
    Entertainment,
    /// Stations and terminals.
    TransportHub,
    /// Anything the catalog could not classify.
    Other,
}

impl Category {
    /// The setting a location of this category usually has when the
    /// catalog record does not say.
    pub const fn typical_setting(self) -> Setting {
        match self {
            Self::Attraction => Setting::Mixed,
            Self::Dining | Self::Shopping | Self::Entertainment | Self::TransportHub => {
                Setting::Indoor
            }
            Self::Other => Setting::Outdoor,
        }
    }
}

/// Whether a visit happens under a roof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Setting {
    /// Fully sheltered.
    Indoor,
    /// Fully exposed to the weather.
    Outdoor,
    /// Partly sheltered (e.g. a temple compound, a zoo).
    Mixed,
}

impl Setting {
    /// Whether moving from `self` to `next` swaps between indoor and outdoor.
    pub const fn alternates_with(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Indoor, Self::Outdoor) | (Self::Outdoor, Self::Indoor)
        )
    }
}

// ---------------------------------------------------------------------------
// Transit
// ---------------------------------------------------------------------------

/// A way of getting from one location to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum TransportMode {
    /// On foot.
    Walk,
    /// Public bus.
    Bus,
    /// Metro or subway.
    Subway,
    /// Taxi or ride-hail.
    Taxi,
}

impl TransportMode {
    /// Every mode, in tie-break order.
    pub const ALL: [Self; 4] = [Self::Walk, Self::Bus, Self::Subway, Self::Taxi];
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Weather reported by the contextual data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Weather {
    /// Sunny or clear skies.
    Clear,
    /// Overcast, dry.
    Cloudy,
    /// Rain or showers.
    Rain,
    /// Snowfall.
    Snow,
    /// Thunderstorm or high wind.
    Storm,
    /// Uncomfortably hot.
    Heat,
}

impl Weather {
    /// Whether this weather makes being outdoors unpleasant because of
    /// precipitation.
    pub const fn is_wet(self) -> bool {
        matches!(self, Self::Rain | Self::Snow | Self::Storm)
    }
}

/// Coarse band of the local clock, used for time-of-day fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum TimeOfDay {
    /// 06:00 to 11:00.
    Morning,
    /// 11:00 to 14:00.
    Midday,
    /// 14:00 to 17:00.
    Afternoon,
    /// 17:00 to 21:00.
    Evening,
    /// 21:00 to 06:00.
    Night,
}

// ---------------------------------------------------------------------------
// Traveler preferences
// ---------------------------------------------------------------------------

/// A reason for travelling, weighted in the [`crate::UserProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Purpose {
    /// History, art, museums.
    Culture,
    /// Relaxed sightseeing and strolling.
    Leisure,
    /// Thrills and physical activity.
    Adventure,
    /// Scenic spots worth photographing.
    Photography,
    /// Eating and drinking.
    Food,
    /// Buying things.
    Shopping,
    /// Resting between activities.
    Rest,
    /// Evening entertainment.
    Nightlife,
}

/// How quickly the traveler likes to move through a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Pace {
    /// Long, unhurried visits.
    Slow,
    /// Balanced.
    Medium,
    /// Many short stops.
    Fast,
}

impl Pace {
    /// Distance between two paces on the slow-to-fast scale (0, 1, or 2).
    pub const fn distance(self, other: Self) -> u8 {
        let a = self as u8;
        let b = other as u8;
        a.abs_diff(b)
    }
}

/// Spending tier the traveler is comfortable with for a single admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum BudgetTier {
    /// Free or cheap.
    Low,
    /// Moderate.
    Medium,
    /// Comfortable.
    High,
    /// No practical limit.
    Luxury,
}

// ---------------------------------------------------------------------------
// Ranking and lattice status
// ---------------------------------------------------------------------------

/// One of the scoring layers a candidate passes through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum LayerKind {
    /// Fit with the traveler's stated preferences.
    Preference,
    /// Spatial and temporal efficiency of getting there.
    Efficiency,
    /// Weather, crowding, and time-of-day suitability.
    Contextual,
    /// Narrative coherence correction against the visit history.
    Coherence,
}

/// How a scoring layer contributed to a candidate's final score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum LayerStatus {
    /// The layer ran and its score was used.
    Applied,
    /// The layer could not run; its weight was redistributed.
    Degraded,
    /// The layer was not applied (disabled, or its inputs were missing).
    Skipped,
}

/// Status of a single cell of the decision lattice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum NodeStatus {
    /// The pick the row currently follows.
    Selected,
    /// A ranked alternative the traveler could switch to.
    Alternative,
    /// Time was shifted after the lattice was built.
    Adjusted,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pace_distance_is_symmetric() {
        assert_eq!(Pace::Slow.distance(Pace::Fast), 2);
        assert_eq!(Pace::Fast.distance(Pace::Slow), 2);
        assert_eq!(Pace::Medium.distance(Pace::Slow), 1);
        assert_eq!(Pace::Medium.distance(Pace::Medium), 0);
    }

    #[test]
    fn only_indoor_outdoor_swaps_alternate() {
        assert!(Setting::Indoor.alternates_with(Setting::Outdoor));
        assert!(Setting::Outdoor.alternates_with(Setting::Indoor));
        assert!(!Setting::Mixed.alternates_with(Setting::Outdoor));
        assert!(!Setting::Indoor.alternates_with(Setting::Indoor));
    }

    #[test]
    fn wet_weather() {
        assert!(Weather::Rain.is_wet());
        assert!(Weather::Storm.is_wet());
        assert!(!Weather::Heat.is_wet());
        assert!(!Weather::Clear.is_wet());
    }

    #[test]
    fn category_serializes_as_variant_name() {
        let json = serde_json::to_string(&Category::TransportHub).unwrap_or_default();
        assert_eq!(json, "\"TransportHub\"");
    }
}
