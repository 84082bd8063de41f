//! Error types for the `waypath-core` crate.
//!
//! [`EngineError`] is what the outward operations return. Running out of
//! feasible candidates is not an error; it is reported as
//! [`crate::planner::CycleOutcome::NoFeasibleCandidates`].
//!
//! [`CollaboratorError`] describes a failing external collaborator (the
//! context source or the reasoning collaborator). It never escapes a
//! scoring cycle: the affected layer is degraded or skipped and the
//! failure is written into the candidate's explanation instead.

use std::time::Duration;

use waypath_catalog::{CatalogError, ContextError};
use waypath_types::{LocationId, SessionId, SnapshotId, TransportMode};

/// Errors returned by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The requested move is not in the most recently computed feasible
    /// set. The session state is unchanged.
    #[error("infeasible transition to {location} by {mode:?}: {reason}")]
    InfeasibleTransition {
        /// The requested destination.
        location: LocationId,
        /// The requested mode.
        mode: TransportMode,
        /// Why it was refused.
        reason: String,
    },

    /// Session constraints or weights are malformed.
    #[error("invalid constraint: {message}")]
    InvalidConstraint {
        /// What is wrong.
        message: String,
    },

    /// No live session has this ID.
    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    /// No snapshot with this ID belongs to the session.
    #[error("snapshot not found: {0}")]
    SnapshotNotFound(SnapshotId),

    /// The lattice has no cell at `(y, x)`.
    #[error("no lattice cell at ({y}, {x})")]
    InvalidCell {
        /// Step index.
        y: usize,
        /// Rank within the step.
        x: usize,
    },

    /// A lattice path visits the same location twice. Happens when a row
    /// was switched and the rows after it still follow the old pick.
    #[error("path revisits {location} at step {y}")]
    RepeatedLocation {
        /// The location visited twice.
        location: LocationId,
        /// Step of the second visit.
        y: usize,
    },

    /// The location catalog failed.
    #[error("catalog error: {source}")]
    Catalog {
        /// The underlying catalog error.
        #[from]
        source: CatalogError,
    },

    /// Checked arithmetic on time or money overflowed.
    #[error("arithmetic overflow: {context}")]
    ArithmeticOverflow {
        /// Which computation overflowed.
        context: String,
    },
}

impl EngineError {
    /// Shorthand for [`EngineError::InvalidConstraint`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConstraint {
            message: message.into(),
        }
    }

    /// Shorthand for [`EngineError::ArithmeticOverflow`].
    pub fn overflow(context: &str) -> Self {
        Self::ArithmeticOverflow {
            context: String::from(context),
        }
    }
}

/// A failing external collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollaboratorError {
    /// The context source failed.
    #[error("context source failed: {source}")]
    Context {
        /// The underlying context error.
        #[from]
        source: ContextError,
    },

    /// The context observation is older than the configured tolerance.
    #[error("context observation is {age_minutes} minutes old (limit {limit_minutes})")]
    Stale {
        /// Age of the observation.
        age_minutes: u32,
        /// Configured tolerance.
        limit_minutes: u32,
    },

    /// The reasoning collaborator did not answer in time.
    #[error("reasoning collaborator timed out after {timeout:?}")]
    Timeout {
        /// The timeout that elapsed.
        timeout: Duration,
    },

    /// The reasoning collaborator answered with an error.
    #[error("reasoning collaborator failed: {message}")]
    Reasoning {
        /// Description of the failure.
        message: String,
    },
}
