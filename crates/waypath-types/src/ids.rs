//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Locations, planning sessions, and frozen snapshots each carry a
//! strongly-typed ID so identifiers cannot be mixed at compile time. All
//! IDs use UUID v7 (time-ordered), which also gives ranking a stable final
//! tie-break.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a location in the catalog.
    LocationId
}

define_id! {
    /// Unique identifier for a planning session.
    SessionId
}

define_id! {
    /// Unique identifier for a frozen itinerary snapshot.
    SnapshotId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let location = LocationId::new();
        let session = SessionId::new();
        // Different types -- the compiler enforces no mixing.
        assert_ne!(location.into_inner(), Uuid::nil());
        assert_ne!(session.into_inner(), Uuid::nil());
    }

    #[test]
    fn display_matches_inner_uuid() {
        let id = SnapshotId::new();
        assert_eq!(id.to_string(), id.into_inner().to_string());
    }

    #[test]
    fn uuid_conversion_is_lossless() {
        let raw = Uuid::now_v7();
        let id = LocationId::from(raw);
        assert_eq!(Uuid::from(id), raw);
    }
}
