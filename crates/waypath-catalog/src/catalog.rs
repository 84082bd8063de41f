//! The location catalog: where candidate locations come from.
//!
//! The engine only ever reads locations through [`LocationCatalog`], so a
//! provider-backed catalog and the [`InMemoryCatalog`] are interchangeable.
//! Results are always returned in ID order so downstream ranking is
//! reproducible.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use waypath_types::{Coordinate, Location, LocationId};

use crate::error::CatalogError;
use crate::geo::haversine_km;

/// Read-only source of [`Location`] records.
pub trait LocationCatalog: Send + Sync {
    /// Every location within `radius_km` of `point`, in ID order.
    fn locations_near(&self, point: Coordinate, radius_km: f64)
    -> Result<Vec<Location>, CatalogError>;

    /// A single location by ID.
    fn location(&self, id: LocationId) -> Result<Location, CatalogError>;
}

/// A catalog held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    /// All locations indexed by their identifier.
    locations: BTreeMap<LocationId, Location>,
}

impl InMemoryCatalog {
    /// Create an empty catalog.
    pub const fn new() -> Self {
        Self {
            locations: BTreeMap::new(),
        }
    }

    /// Add a location.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateLocation`] if the ID is taken, or
    /// [`CatalogError::InvalidLocation`] if the record is malformed.
    pub fn add_location(&mut self, location: Location) -> Result<(), CatalogError> {
        validate(&location)?;
        let id = location.id;
        if self.locations.contains_key(&id) {
            return Err(CatalogError::DuplicateLocation(id));
        }
        self.locations.insert(id, location);
        Ok(())
    }

    /// Return the number of locations in the catalog.
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Find a location by exact display name.
    pub fn find_by_name(&self, name: &str) -> Option<&Location> {
        self.locations.values().find(|l| l.name == name)
    }

    /// Iterate over all locations in ID order.
    pub fn iter(&self) -> impl Iterator<Item = &Location> {
        self.locations.values()
    }
}

impl LocationCatalog for InMemoryCatalog {
    fn locations_near(
        &self,
        point: Coordinate,
        radius_km: f64,
    ) -> Result<Vec<Location>, CatalogError> {
        Ok(self
            .locations
            .values()
            .filter(|l| haversine_km(point, l.coordinate) <= radius_km)
            .cloned()
            .collect())
    }

    fn location(&self, id: LocationId) -> Result<Location, CatalogError> {
        self.locations
            .get(&id)
            .cloned()
            .ok_or(CatalogError::LocationNotFound(id))
    }
}

fn validate(location: &Location) -> Result<(), CatalogError> {
    let invalid = |reason: &str| CatalogError::InvalidLocation {
        id: location.id,
        reason: String::from(reason),
    };
    let c = location.coordinate;
    if !(-90.0..=90.0).contains(&c.lat) || !(-180.0..=180.0).contains(&c.lon) {
        return Err(invalid("coordinate out of range"));
    }
    if location.admission < Decimal::ZERO {
        return Err(invalid("negative admission"));
    }
    let q = location.quality;
    if !(0.0..=5.0).contains(&q.rating) || !(0.0..=1.0).contains(&q.confidence) {
        return Err(invalid("quality out of range"));
    }
    Ok(())
}
