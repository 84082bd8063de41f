//! A small sample city for demos and tests.
//!
//! Twelve locations across three regions (Old Town, Riverside, Hilltop)
//! with a mix of categories, settings, prices, and opening hours. The
//! central station is the natural trip origin.

use rust_decimal::Decimal;
use waypath_types::{
    Category, Coordinate, Location, LocationId, OpeningHours, QualityRecord, Setting,
};

use crate::catalog::InMemoryCatalog;
use crate::error::CatalogError;

/// Fields of a sample location that vary.
struct Spec {
    name: &'static str,
    region: &'static str,
    category: Category,
    setting: Setting,
    at: (f64, f64),
    admission: i64,
    visit_minutes: u32,
    hours: Option<OpeningHours>,
    rating: f64,
}

/// Helper to build a [`Location`].
fn loc(id: LocationId, spec: Spec) -> Location {
    Location {
        id,
        name: String::from(spec.name),
        coordinate: Coordinate::new(spec.at.0, spec.at.1),
        category: spec.category,
        setting: spec.setting,
        address: format!("{}, Harbor City", spec.region),
        contact: None,
        admission: Decimal::new(spec.admission, 0),
        visit_minutes: spec.visit_minutes,
        quality: QualityRecord {
            rating: spec.rating,
            confidence: 0.8,
            review_count: 250,
        },
        opening_hours: spec.hours,
        region: Some(String::from(spec.region)),
    }
}

/// Identifiers for all sample locations, returned alongside the catalog so
/// callers can start trips and script context by name.
#[derive(Debug, Clone)]
pub struct SampleLocationIds {
    // --- Old Town ---
    /// Central station, the usual trip origin.
    pub central_station: LocationId,
    /// City museum (indoor, ticketed).
    pub city_museum: LocationId,
    /// Old temple (mixed setting, cheap).
    pub old_temple: LocationId,
    /// Noodle house (dining).
    pub noodle_house: LocationId,

    // --- Riverside ---
    /// River promenade (outdoor, free).
    pub river_promenade: LocationId,
    /// Riverside market (shopping).
    pub riverside_market: LocationId,
    /// Jazz bar (evening entertainment).
    pub jazz_bar: LocationId,
    /// Seafood grill (dining).
    pub seafood_grill: LocationId,

    // --- Hilltop ---
    /// Hill park (outdoor, free).
    pub hill_park: LocationId,
    /// Observation tower (indoor, expensive).
    pub observation_tower: LocationId,
    /// Tea garden (outdoor dining).
    pub tea_garden: LocationId,
    /// Arcade hall (indoor entertainment).
    pub arcade_hall: LocationId,
}

/// Build the sample city.
///
/// # Errors
///
/// Returns [`CatalogError`] if a location record is rejected.
#[allow(clippy::too_many_lines)]
pub fn sample_city() -> Result<(InMemoryCatalog, SampleLocationIds), CatalogError> {
    let ids = SampleLocationIds {
        central_station: LocationId::new(),
        city_museum: LocationId::new(),
        old_temple: LocationId::new(),
        noodle_house: LocationId::new(),
        river_promenade: LocationId::new(),
        riverside_market: LocationId::new(),
        jazz_bar: LocationId::new(),
        seafood_grill: LocationId::new(),
        hill_park: LocationId::new(),
        observation_tower: LocationId::new(),
        tea_garden: LocationId::new(),
        arcade_hall: LocationId::new(),
    };

    let hm = OpeningHours::from_hm;
    let locations = vec![
        loc(ids.central_station, Spec {
            name: "Central Station",
            region: "Old Town",
            category: Category::TransportHub,
            setting: Setting::Indoor,
            at: (31.2300, 121.4700),
            admission: 0,
            visit_minutes: 10,
            hours: None,
            rating: 3.8,
        }),
        loc(ids.city_museum, Spec {
            name: "City Museum",
            region: "Old Town",
            category: Category::Attraction,
            setting: Setting::Indoor,
            at: (31.2335, 121.4745),
            admission: 40,
            visit_minutes: 120,
            hours: Some(hm((9, 0), (17, 0))),
            rating: 4.6,
        }),
        loc(ids.old_temple, Spec {
            name: "Old Temple",
            region: "Old Town",
            category: Category::Attraction,
            setting: Setting::Mixed,
            at: (31.2270, 121.4760),
            admission: 10,
            visit_minutes: 60,
            hours: Some(hm((8, 0), (17, 30))),
            rating: 4.4,
        }),
        loc(ids.noodle_house, Spec {
            name: "Noodle House",
            region: "Old Town",
            category: Category::Dining,
            setting: Setting::Indoor,
            at: (31.2318, 121.4682),
            admission: 0,
            visit_minutes: 50,
            hours: Some(hm((10, 30), (21, 0))),
            rating: 4.3,
        }),
        loc(ids.river_promenade, Spec {
            name: "River Promenade",
            region: "Riverside",
            category: Category::Attraction,
            setting: Setting::Outdoor,
            at: (31.2400, 121.4900),
            admission: 0,
            visit_minutes: 60,
            hours: None,
            rating: 4.5,
        }),
        loc(ids.riverside_market, Spec {
            name: "Riverside Market",
            region: "Riverside",
            category: Category::Shopping,
            setting: Setting::Mixed,
            at: (31.2385, 121.4870),
            admission: 0,
            visit_minutes: 75,
            hours: Some(hm((10, 0), (22, 0))),
            rating: 4.0,
        }),
        loc(ids.jazz_bar, Spec {
            name: "Blue Note Jazz Bar",
            region: "Riverside",
            category: Category::Entertainment,
            setting: Setting::Indoor,
            at: (31.2412, 121.4862),
            admission: 25,
            visit_minutes: 90,
            hours: Some(hm((19, 0), (2, 0))),
            rating: 4.2,
        }),
        loc(ids.seafood_grill, Spec {
            name: "Seafood Grill",
            region: "Riverside",
            category: Category::Dining,
            setting: Setting::Indoor,
            at: (31.2420, 121.4915),
            admission: 0,
            visit_minutes: 70,
            hours: Some(hm((11, 0), (22, 0))),
            rating: 4.5,
        }),
        loc(ids.hill_park, Spec {
            name: "Hill Park",
            region: "Hilltop",
            category: Category::Attraction,
            setting: Setting::Outdoor,
            at: (31.2000, 121.4400),
            admission: 0,
            visit_minutes: 90,
            hours: Some(hm((6, 0), (19, 0))),
            rating: 4.7,
        }),
        loc(ids.observation_tower, Spec {
            name: "Observation Tower",
            region: "Hilltop",
            category: Category::Attraction,
            setting: Setting::Indoor,
            at: (31.2025, 121.4430),
            admission: 80,
            visit_minutes: 60,
            hours: Some(hm((9, 0), (22, 0))),
            rating: 4.1,
        }),
        loc(ids.tea_garden, Spec {
            name: "Tea Garden",
            region: "Hilltop",
            category: Category::Dining,
            setting: Setting::Outdoor,
            at: (31.1985, 121.4420),
            admission: 15,
            visit_minutes: 45,
            hours: Some(hm((9, 0), (18, 0))),
            rating: 4.6,
        }),
        loc(ids.arcade_hall, Spec {
            name: "Arcade Hall",
            region: "Hilltop",
            category: Category::Entertainment,
            setting: Setting::Indoor,
            at: (31.2040, 121.4460),
            admission: 20,
            visit_minutes: 60,
            hours: Some(hm((12, 0), (23, 0))),
            rating: 3.9,
        }),
    ];

    let mut catalog = InMemoryCatalog::new();
    for location in locations {
        catalog.add_location(location)?;
    }

    tracing::debug!(location_count = catalog.len(), "Sample city created");
    Ok((catalog, ids))
}
