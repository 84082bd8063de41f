//! Location catalog, transit estimation, and live context for the Waypath
//! itinerary engine.
//!
//! This crate is the engine's view of the outside world. It answers three
//! questions: which locations exist near a point, how long and how much it
//! takes to get between two of them by each mode, and what conditions look
//! like at a location right now.
//!
//! # Modules
//!
//! - [`catalog`] -- The [`LocationCatalog`] trait and an in-memory catalog
//! - [`context`] -- The [`ContextSource`] trait and scripted sources
//! - [`error`] -- Catalog and context error types
//! - [`geo`] -- Haversine distance
//! - [`sample`] -- A twelve-location sample city
//! - [`transit`] -- Per-mode transit edge estimation

pub mod catalog;
pub mod context;
pub mod error;
pub mod geo;
pub mod sample;
pub mod transit;

pub use catalog::{InMemoryCatalog, LocationCatalog};
pub use context::{ContextSource, ScheduledContext, UnavailableContext};
pub use error::{CatalogError, ContextError};
pub use geo::haversine_km;
pub use sample::{SampleLocationIds, sample_city};
pub use transit::{ModeProfile, TransitConfig, estimate_edge, estimate_edges};
