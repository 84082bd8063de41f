//! Core entity structs: locations, traveler profile and condition, travel
//! state, transit edges, and contextual signals.
//!
//! Time is counted in whole minutes and money in [`Decimal`], so adding a
//! visit to a [`TravelState`] never drifts.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{BudgetTier, Category, Pace, Purpose, Setting, TransportMode, Weather};
use crate::ids::LocationId;

/// Minutes in a day.
pub const MINUTES_PER_DAY: u32 = 1440;

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

/// A WGS-84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Coordinate {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lon: f64,
}

impl Coordinate {
    /// Create a coordinate from latitude and longitude in degrees.
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A daily opening window in minutes after midnight.
///
/// `close_minute` may be smaller than `open_minute` for venues that stay
/// open past midnight. Equal values mean open around the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct OpeningHours {
    /// Minute of the day the venue opens.
    pub open_minute: u32,
    /// Minute of the day the venue closes.
    pub close_minute: u32,
}

impl OpeningHours {
    /// Create an opening window from `HH`, `MM` pairs.
    pub const fn from_hm(open: (u32, u32), close: (u32, u32)) -> Self {
        Self {
            open_minute: open.0.saturating_mul(60).saturating_add(open.1),
            close_minute: close.0.saturating_mul(60).saturating_add(close.1),
        }
    }

    /// Whether the venue is open at `minute_of_day`.
    pub const fn is_open_at(&self, minute_of_day: u32) -> bool {
        let m = minute_of_day % MINUTES_PER_DAY;
        if self.open_minute == self.close_minute {
            true
        } else if self.open_minute < self.close_minute {
            m >= self.open_minute && m < self.close_minute
        } else {
            m >= self.open_minute || m < self.close_minute
        }
    }
}

/// Review-derived quality of a location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct QualityRecord {
    /// Mean rating from 0.0 to 5.0.
    pub rating: f64,
    /// How much the rating can be trusted, 0.0 to 1.0. Low when reviews
    /// are few or look inauthentic.
    pub confidence: f64,
    /// Number of reviews the rating is based on.
    pub review_count: u32,
}

impl Default for QualityRecord {
    fn default() -> Self {
        Self {
            rating: 2.5,
            confidence: 0.0,
            review_count: 0,
        }
    }
}

/// A visitable place, owned by the location catalog and never mutated by
/// the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Location {
    /// Unique identifier.
    pub id: LocationId,
    /// Display name.
    pub name: String,
    /// Position.
    pub coordinate: Coordinate,
    /// What kind of place this is.
    pub category: Category,
    /// Whether the visit is sheltered.
    pub setting: Setting,
    /// Street address.
    pub address: String,
    /// Phone number or website, if known.
    pub contact: Option<String>,
    /// Ticket cost for one traveler.
    #[ts(as = "String")]
    pub admission: Decimal,
    /// Typical length of a visit.
    pub visit_minutes: u32,
    /// Review-derived quality.
    pub quality: QualityRecord,
    /// Daily opening window; `None` means always open.
    pub opening_hours: Option<OpeningHours>,
    /// Neighbourhood label, used to notice the traveler doubling back.
    pub region: Option<String>,
}

// ---------------------------------------------------------------------------
// Traveler
// ---------------------------------------------------------------------------

/// What the traveler wants from the trip, produced by the preference
/// interpreter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct UserProfile {
    /// Weight of each travel purpose, 0.0 to 1.0. Missing purposes count
    /// as 0.0.
    pub purposes: BTreeMap<Purpose, f64>,
    /// Preferred pace.
    pub pace: Pace,
    /// Comfortable admission spend.
    pub budget_tier: BudgetTier,
    /// How strongly crowds put the traveler off, 0.0 to 1.0.
    pub avoid_crowds: f64,
}

impl UserProfile {
    /// Weight of a single purpose, clamped to `[0, 1]`.
    pub fn purpose_weight(&self, purpose: Purpose) -> f64 {
        self.purposes
            .get(&purpose)
            .copied()
            .unwrap_or(0.0)
            .clamp(0.0, 1.0)
    }
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            purposes: BTreeMap::from([(Purpose::Leisure, 0.5)]),
            pace: Pace::Medium,
            budget_tier: BudgetTier::Medium,
            avoid_crowds: 0.5,
        }
    }
}

/// The traveler's physical and mental condition, every value in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TravelerCondition {
    /// Stamina for walking and active venues.
    pub physical_energy: f64,
    /// Attention for museums and other static viewing.
    pub mental_energy: f64,
    /// General mood.
    pub mood: f64,
    /// How full the traveler is; low means hungry.
    pub satiety: f64,
    /// Share of the trip's time already used.
    pub time_pressure: f64,
}

impl TravelerCondition {
    /// Condition at the start of a day.
    pub const fn fresh() -> Self {
        Self {
            physical_energy: 1.0,
            mental_energy: 1.0,
            mood: 0.8,
            satiety: 0.7,
            time_pressure: 0.0,
        }
    }

    /// Copy with every value clamped to `[0, 1]`.
    pub const fn clamped(self) -> Self {
        Self {
            physical_energy: self.physical_energy.clamp(0.0, 1.0),
            mental_energy: self.mental_energy.clamp(0.0, 1.0),
            mood: self.mood.clamp(0.0, 1.0),
            satiety: self.satiety.clamp(0.0, 1.0),
            time_pressure: self.time_pressure.clamp(0.0, 1.0),
        }
    }
}

impl Default for TravelerCondition {
    fn default() -> Self {
        Self::fresh()
    }
}

/// The fixed bounds of one trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TripConstraints {
    /// Total time available, in minutes.
    pub total_minutes: u32,
    /// Total admission budget.
    #[ts(as = "String")]
    pub total_budget: Decimal,
    /// Local minute of the day the trip starts at.
    pub start_minute_of_day: u32,
    /// Furthest straight-line hop the traveler will consider, in km.
    pub max_distance_km: f64,
}

/// Where the traveler is and what they have used so far.
///
/// Invariants: `elapsed_minutes <= constraints.total_minutes`,
/// `spent <= constraints.total_budget`, `history` is non-empty and ends
/// with `current_location`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TravelState {
    /// Where the traveler is now.
    pub current_location: LocationId,
    /// Minutes used since the trip started.
    pub elapsed_minutes: u32,
    /// Admission money spent so far.
    #[ts(as = "String")]
    pub spent: Decimal,
    /// Visited locations in order, starting with the origin.
    pub history: Vec<LocationId>,
    /// Current traveler condition.
    pub condition: TravelerCondition,
    /// Bounds the trip was planned with.
    pub constraints: TripConstraints,
}

impl TravelState {
    /// State at the start of a trip from `origin`.
    pub fn start(origin: LocationId, constraints: TripConstraints, condition: TravelerCondition) -> Self {
        Self {
            current_location: origin,
            elapsed_minutes: 0,
            spent: Decimal::ZERO,
            history: vec![origin],
            condition: condition.clamped(),
            constraints,
        }
    }

    /// Minutes still available.
    pub const fn remaining_minutes(&self) -> u32 {
        self.constraints
            .total_minutes
            .saturating_sub(self.elapsed_minutes)
    }

    /// Admission budget still available.
    pub fn remaining_budget(&self) -> Decimal {
        self.constraints
            .total_budget
            .checked_sub(self.spent)
            .map_or(Decimal::ZERO, |left| left.max(Decimal::ZERO))
    }

    /// Whether `location` has already been visited (the origin included).
    pub fn has_visited(&self, location: LocationId) -> bool {
        self.history.contains(&location)
    }
}

// ---------------------------------------------------------------------------
// Transit and context
// ---------------------------------------------------------------------------

/// An estimated hop from the current location to a candidate by one mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TransitEdge {
    /// How the traveler gets there.
    pub mode: TransportMode,
    /// Straight-line distance in km.
    pub direct_km: f64,
    /// Distance actually covered in km.
    pub route_km: f64,
    /// Door-to-door minutes, waiting included.
    pub travel_minutes: u32,
    /// Fare for the hop. Reported only; the trip budget covers admissions.
    #[ts(as = "String")]
    pub fare: Decimal,
    /// Trip minute at which the traveler would arrive.
    pub arrival_minute: u32,
}

/// Live conditions at a location, from the contextual data source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ContextSignals {
    /// Weather at the location.
    pub weather: Weather,
    /// Crowding, 0.0 (empty) to 1.0 (packed).
    pub crowd_level: f64,
    /// Closed regardless of the published opening hours.
    pub closed: bool,
    /// How old the observation is, in minutes.
    pub age_minutes: u32,
}
