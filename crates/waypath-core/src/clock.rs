//! Trip clock: maps elapsed trip minutes to local time of day.
//!
//! A trip starts at a local minute of the day (09:00 unless the traveler
//! says otherwise). Feasibility checks opening hours against the local
//! clock, and the contextual and coherence layers use the time-of-day
//! band and meal windows.

use waypath_types::{MINUTES_PER_DAY, TimeOfDay};

/// Meal windows as `[start, end)` local minutes of the day.
const MEAL_WINDOWS: [(u32, u32); 3] = [
    (7 * 60, 9 * 60),
    (11 * 60 + 30, 13 * 60 + 30),
    (17 * 60 + 30, 20 * 60),
];

/// Converts trip minutes into local clock readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripClock {
    /// Local minute of the day at trip minute 0.
    start_minute_of_day: u32,
}

impl TripClock {
    /// Create a clock for a trip starting at `start_minute_of_day`.
    pub const fn new(start_minute_of_day: u32) -> Self {
        Self {
            start_minute_of_day: start_minute_of_day % MINUTES_PER_DAY,
        }
    }

    /// Local minute of the day at `trip_minute`.
    pub const fn minute_of_day(self, trip_minute: u32) -> u32 {
        let offset = trip_minute % MINUTES_PER_DAY;
        // Both operands are below MINUTES_PER_DAY, so the sum fits.
        self.start_minute_of_day.saturating_add(offset) % MINUTES_PER_DAY
    }

    /// Time-of-day band at `trip_minute`.
    pub const fn time_of_day(self, trip_minute: u32) -> TimeOfDay {
        let hour = self.minute_of_day(trip_minute) / 60;
        match hour {
            6..=10 => TimeOfDay::Morning,
            11..=13 => TimeOfDay::Midday,
            14..=16 => TimeOfDay::Afternoon,
            17..=20 => TimeOfDay::Evening,
            _ => TimeOfDay::Night,
        }
    }

    /// Whether `trip_minute` falls in a breakfast, lunch, or dinner window.
    pub fn is_meal_time(self, trip_minute: u32) -> bool {
        let m = self.minute_of_day(trip_minute);
        MEAL_WINDOWS
            .iter()
            .any(|&(start, end)| m >= start && m < end)
    }

    /// Render `trip_minute` as local `HH:MM`.
    pub fn format(self, trip_minute: u32) -> String {
        let m = self.minute_of_day(trip_minute);
        format!("{:02}:{:02}", m / 60, m % 60)
    }
}
