//! Live conditions at a location: weather, crowding, unscheduled closures.
//!
//! The engine asks a [`ContextSource`] for the [`ContextSignals`] at a
//! location for the trip minute the traveler would arrive. A failure is
//! not fatal to ranking; callers fall back to static opening hours and
//! mark the contextual layer degraded.
//!
//! [`ScheduledContext`] is a deterministic in-memory source: a weather
//! timeline keyed by trip minute plus per-location crowd levels and
//! closures. [`UnavailableContext`] always fails.

use std::collections::{BTreeMap, BTreeSet};

use waypath_types::{ContextSignals, Location, LocationId, Weather};

use crate::error::ContextError;

/// Source of live conditions.
pub trait ContextSource: Send + Sync {
    /// Conditions at `location` at trip minute `trip_minute`.
    fn signals(&self, location: &Location, trip_minute: u32)
    -> Result<ContextSignals, ContextError>;
}

/// A scripted context source.
#[derive(Debug, Clone)]
pub struct ScheduledContext {
    /// Weather changes as `(from_trip_minute, weather)`, sorted by minute.
    weather: Vec<(u32, Weather)>,
    /// Crowd level used for locations without their own entry.
    default_crowd: f64,
    /// Crowd level per location.
    crowd: BTreeMap<LocationId, f64>,
    /// Locations closed for the whole trip.
    closed: BTreeSet<LocationId>,
    /// Reported age of every observation.
    age_minutes: u32,
}

impl ScheduledContext {
    /// A source reporting `weather` for the whole trip, light crowds, and
    /// no closures.
    pub fn new(weather: Weather) -> Self {
        Self {
            weather: vec![(0, weather)],
            default_crowd: 0.3,
            crowd: BTreeMap::new(),
            closed: BTreeSet::new(),
            age_minutes: 0,
        }
    }

    /// Switch to `weather` from trip minute `from_minute` onward.
    #[must_use]
    pub fn with_weather_from(mut self, from_minute: u32, weather: Weather) -> Self {
        self.weather.retain(|&(minute, _)| minute != from_minute);
        self.weather.push((from_minute, weather));
        self.weather.sort_by_key(|&(minute, _)| minute);
        self
    }

    /// Crowd level for locations without their own entry.
    #[must_use]
    pub const fn with_default_crowd(mut self, level: f64) -> Self {
        self.default_crowd = level.clamp(0.0, 1.0);
        self
    }

    /// Crowd level for one location.
    #[must_use]
    pub fn with_crowd(mut self, location: LocationId, level: f64) -> Self {
        self.crowd.insert(location, level.clamp(0.0, 1.0));
        self
    }

    /// Close one location for the whole trip.
    #[must_use]
    pub fn with_closure(mut self, location: LocationId) -> Self {
        self.closed.insert(location);
        self
    }

    /// Report every observation as `age_minutes` old.
    #[must_use]
    pub const fn with_age(mut self, age_minutes: u32) -> Self {
        self.age_minutes = age_minutes;
        self
    }

    /// Weather in effect at `trip_minute`.
    pub fn weather_at(&self, trip_minute: u32) -> Weather {
        self.weather
            .iter()
            .rev()
            .find(|&&(from, _)| from <= trip_minute)
            .or_else(|| self.weather.first())
            .map_or(Weather::Clear, |&(_, weather)| weather)
    }
}

impl ContextSource for ScheduledContext {
    fn signals(
        &self,
        location: &Location,
        trip_minute: u32,
    ) -> Result<ContextSignals, ContextError> {
        Ok(ContextSignals {
            weather: self.weather_at(trip_minute),
            crowd_level: self
                .crowd
                .get(&location.id)
                .copied()
                .unwrap_or(self.default_crowd),
            closed: self.closed.contains(&location.id),
            age_minutes: self.age_minutes,
        })
    }
}

/// A context source that is never reachable.
#[derive(Debug, Clone)]
pub struct UnavailableContext {
    /// Reported failure reason.
    reason: String,
}

impl UnavailableContext {
    /// Create a source failing with `reason`.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl ContextSource for UnavailableContext {
    fn signals(
        &self,
        _location: &Location,
        _trip_minute: u32,
    ) -> Result<ContextSignals, ContextError> {
        Err(ContextError::Unavailable {
            reason: self.reason.clone(),
        })
    }
}
