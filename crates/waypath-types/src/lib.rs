//! Shared type definitions for the Waypath itinerary engine.
//!
//! This crate is the single source of truth for the types that cross
//! crate boundaries. Payload types flow downstream to `TypeScript` via
//! `ts-rs` so a client can render ranked candidates and lattices.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for locations, sessions, snapshots
//! - [`enums`] -- Categories, transit modes, weather, preference vocabulary
//! - [`structs`] -- Locations, traveler profile and condition, travel state
//! - [`planning`] -- Ranked candidates, explanations, lattice, snapshots

pub mod enums;
pub mod ids;
pub mod planning;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    BudgetTier, Category, LayerKind, LayerStatus, NodeStatus, Pace, Purpose, Setting, TimeOfDay,
    TransportMode, Weather,
};
pub use ids::{LocationId, SessionId, SnapshotId};
pub use planning::{
    Adjustment, Candidate, DecisionPoint, Explanation, Lattice, LayerReport, PathChange,
    ScoreBreakdown, Snapshot, TimelineNode,
};
pub use structs::{
    ContextSignals, Coordinate, Location, MINUTES_PER_DAY, OpeningHours, QualityRecord,
    TransitEdge, TravelState, TravelerCondition, TripConstraints, UserProfile,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs writes the files to `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::LocationId::export_all();
        let _ = crate::ids::SessionId::export_all();
        let _ = crate::ids::SnapshotId::export_all();

        // Enums
        let _ = crate::enums::Category::export_all();
        let _ = crate::enums::Setting::export_all();
        let _ = crate::enums::TransportMode::export_all();
        let _ = crate::enums::Weather::export_all();
        let _ = crate::enums::TimeOfDay::export_all();
        let _ = crate::enums::Purpose::export_all();
        let _ = crate::enums::Pace::export_all();
        let _ = crate::enums::BudgetTier::export_all();
        let _ = crate::enums::LayerKind::export_all();
        let _ = crate::enums::LayerStatus::export_all();
        let _ = crate::enums::NodeStatus::export_all();

        // Structs
        let _ = crate::structs::Coordinate::export_all();
        let _ = crate::structs::OpeningHours::export_all();
        let _ = crate::structs::QualityRecord::export_all();
        let _ = crate::structs::Location::export_all();
        let _ = crate::structs::UserProfile::export_all();
        let _ = crate::structs::TravelerCondition::export_all();
        let _ = crate::structs::TripConstraints::export_all();
        let _ = crate::structs::TravelState::export_all();
        let _ = crate::structs::TransitEdge::export_all();
        let _ = crate::structs::ContextSignals::export_all();

        // Planning payloads
        let _ = crate::planning::ScoreBreakdown::export_all();
        let _ = crate::planning::LayerReport::export_all();
        let _ = crate::planning::Explanation::export_all();
        let _ = crate::planning::Candidate::export_all();
        let _ = crate::planning::Adjustment::export_all();
        let _ = crate::planning::DecisionPoint::export_all();
        let _ = crate::planning::TimelineNode::export_all();
        let _ = crate::planning::Lattice::export_all();
        let _ = crate::planning::Snapshot::export_all();
        let _ = crate::planning::PathChange::export_all();
    }
}
