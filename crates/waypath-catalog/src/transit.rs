//! Transit edge estimation between two locations.
//!
//! Each [`TransportMode`] has a [`ModeProfile`]: an average speed, a detour
//! factor turning straight-line distance into route distance, a fixed wait,
//! the distance band in which the mode is sensible, and a fare schedule.
//!
//! | Mode   | Speed   | Detour | Wait   | Band      | Fare                      |
//! |--------|---------|--------|--------|-----------|---------------------------|
//! | Walk   | 4 km/h  | 1.0    | 0 min  | 0-2 km    | free                      |
//! | Bus    | 15 km/h | 1.4    | 18 min | 1-20 km   | 2                         |
//! | Subway | 35 km/h | 1.2    | 15 min | 3-30 km   | 2 + 0.1/km, capped at 8   |
//! | Taxi   | 30 km/h | 1.3    | 0 min  | any       | 13 + 2.5/km               |
//!
//! Ride minutes are rounded up to whole minutes.

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use waypath_types::{TransitEdge, TransportMode};

/// Speed, detour, wait, band, and fare for one mode.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ModeProfile {
    /// Whether the mode is offered at all.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Average moving speed in km/h.
    pub speed_kmh: f64,
    /// Route distance divided by straight-line distance.
    pub detour_factor: f64,
    /// Fixed wait before moving, in minutes.
    #[serde(default)]
    pub wait_minutes: u32,
    /// Shortest straight-line hop the mode is used for, in km.
    #[serde(default)]
    pub min_km: f64,
    /// Longest straight-line hop the mode is used for, in km.
    #[serde(default)]
    pub max_km: Option<f64>,
    /// Flat part of the fare.
    #[serde(default)]
    pub base_fare: Decimal,
    /// Fare per route km.
    #[serde(default)]
    pub fare_per_km: Decimal,
    /// Upper bound on the fare.
    #[serde(default)]
    pub fare_cap: Option<Decimal>,
}

impl ModeProfile {
    /// Whether a hop of `direct_km` falls inside this mode's band.
    pub fn covers(&self, direct_km: f64) -> bool {
        self.enabled
            && self.speed_kmh > 0.0
            && direct_km >= self.min_km
            && self.max_km.is_none_or(|max| direct_km <= max)
    }

    /// Fare for `route_km` of travel.
    pub fn fare(&self, route_km: f64) -> Decimal {
        let km = Decimal::from_f64(route_km)
            .unwrap_or(Decimal::ZERO)
            .round_dp(2);
        let metered = self
            .fare_per_km
            .checked_mul(km)
            .and_then(|variable| self.base_fare.checked_add(variable))
            .unwrap_or(self.base_fare);
        let fare = self.fare_cap.map_or(metered, |cap| metered.min(cap));
        fare.round_dp(2)
    }
}

/// Profiles for every transit mode.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TransitConfig {
    /// Walking.
    #[serde(default = "default_walk")]
    pub walk: ModeProfile,
    /// Public bus.
    #[serde(default = "default_bus")]
    pub bus: ModeProfile,
    /// Subway.
    #[serde(default = "default_subway")]
    pub subway: ModeProfile,
    /// Taxi.
    #[serde(default = "default_taxi")]
    pub taxi: ModeProfile,
}

impl TransitConfig {
    /// The profile for `mode`.
    pub const fn profile(&self, mode: TransportMode) -> &ModeProfile {
        match mode {
            TransportMode::Walk => &self.walk,
            TransportMode::Bus => &self.bus,
            TransportMode::Subway => &self.subway,
            TransportMode::Taxi => &self.taxi,
        }
    }
}

impl Default for TransitConfig {
    fn default() -> Self {
        Self {
            walk: default_walk(),
            bus: default_bus(),
            subway: default_subway(),
            taxi: default_taxi(),
        }
    }
}

/// Estimate one hop of `direct_km` by `mode`, departing at trip minute
/// `departure_minute`.
///
/// Returns `None` when the mode is disabled or the hop is outside its band.
pub fn estimate_edge(
    mode: TransportMode,
    direct_km: f64,
    departure_minute: u32,
    config: &TransitConfig,
) -> Option<TransitEdge> {
    let profile = config.profile(mode);
    if !direct_km.is_finite() || !profile.covers(direct_km) {
        return None;
    }

    let route_km = direct_km * profile.detour_factor;
    let ride_minutes = whole_minutes(route_km / profile.speed_kmh * 60.0);
    let travel_minutes = profile.wait_minutes.saturating_add(ride_minutes);

    Some(TransitEdge {
        mode,
        direct_km,
        route_km,
        travel_minutes,
        fare: profile.fare(route_km),
        arrival_minute: departure_minute.saturating_add(travel_minutes),
    })
}

/// Estimate a hop by every mode whose band covers it, in mode order.
pub fn estimate_edges(
    direct_km: f64,
    departure_minute: u32,
    config: &TransitConfig,
) -> Vec<TransitEdge> {
    TransportMode::ALL
        .iter()
        .filter_map(|&mode| estimate_edge(mode, direct_km, departure_minute, config))
        .collect()
}

/// Round a non-negative minute count up to a whole `u32`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_minutes(minutes: f64) -> u32 {
    if minutes.is_nan() || minutes <= 0.0 {
        return 0;
    }
    // Float noise must not push an exact minute count up by one.
    let rounded = (minutes - 1e-6).ceil().max(0.0);
    // Clamped to the u32 range, so the cast is exact.
    rounded.min(f64::from(u32::MAX)) as u32
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

const fn default_enabled() -> bool {
    true
}

fn default_walk() -> ModeProfile {
    ModeProfile {
        enabled: true,
        speed_kmh: 4.0,
        detour_factor: 1.0,
        wait_minutes: 0,
        min_km: 0.0,
        max_km: Some(2.0),
        base_fare: Decimal::ZERO,
        fare_per_km: Decimal::ZERO,
        fare_cap: None,
    }
}

fn default_bus() -> ModeProfile {
    ModeProfile {
        enabled: true,
        speed_kmh: 15.0,
        detour_factor: 1.4,
        wait_minutes: 18,
        min_km: 1.0,
        max_km: Some(20.0),
        base_fare: Decimal::TWO,
        fare_per_km: Decimal::ZERO,
        fare_cap: None,
    }
}

fn default_subway() -> ModeProfile {
    ModeProfile {
        enabled: true,
        speed_kmh: 35.0,
        detour_factor: 1.2,
        wait_minutes: 15,
        min_km: 3.0,
        max_km: Some(30.0),
        base_fare: Decimal::TWO,
        fare_per_km: Decimal::new(1, 1),
        fare_cap: Some(Decimal::new(8, 0)),
    }
}

fn default_taxi() -> ModeProfile {
    ModeProfile {
        enabled: true,
        speed_kmh: 30.0,
        detour_factor: 1.3,
        wait_minutes: 0,
        min_km: 0.0,
        max_km: None,
        base_fare: Decimal::new(13, 0),
        fare_per_km: Decimal::new(25, 1),
        fare_cap: None,
    }
}
