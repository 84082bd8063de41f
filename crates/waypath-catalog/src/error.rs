//! Error types for the `waypath-catalog` crate.
//!
//! Catalog lookups fail with [`CatalogError`]. The contextual data source
//! fails with [`ContextError`], which callers treat as a degradation rather
//! than a hard failure.

use waypath_types::LocationId;

/// Errors that can occur while querying or building a location catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// A location was not found in the catalog.
    #[error("location not found: {0}")]
    LocationNotFound(LocationId),

    /// A location with the same ID already exists.
    #[error("duplicate location: {0}")]
    DuplicateLocation(LocationId),

    /// A location record is malformed.
    #[error("invalid location {id}: {reason}")]
    InvalidLocation {
        /// The offending location.
        id: LocationId,
        /// What is wrong with it.
        reason: String,
    },

    /// The catalog provider could not be reached.
    #[error("catalog provider unavailable: {reason}")]
    Unavailable {
        /// Description of the failure.
        reason: String,
    },
}

/// Errors that can occur while reading live context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// The context provider could not be reached.
    #[error("context source unavailable: {reason}")]
    Unavailable {
        /// Description of the failure.
        reason: String,
    },

    /// The provider has no observation for this location.
    #[error("no context observation for location {0}")]
    NoObservation(LocationId),
}
