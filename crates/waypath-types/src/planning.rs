//! Planning payloads handed to clients: ranked candidates with their
//! explanations, the decision lattice, and frozen snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{LayerKind, LayerStatus, NodeStatus, TransportMode};
use crate::ids::{LocationId, SessionId, SnapshotId};
use crate::structs::{Location, TransitEdge};

// ---------------------------------------------------------------------------
// Ranking
// ---------------------------------------------------------------------------

/// Per-layer scores of one candidate and how they fused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ScoreBreakdown {
    /// Preference layer score, if applied.
    pub preference: Option<f64>,
    /// Efficiency layer score, if applied.
    pub efficiency: Option<f64>,
    /// Contextual layer score, if applied.
    pub contextual: Option<f64>,
    /// Semantic flow `S_sem` in `[-1, 1]`, if the coherence layer ran.
    pub semantic: Option<f64>,
    /// Causal strength `C_causal` in `[0, 1]`, if the coherence layer ran.
    pub causal: Option<f64>,
    /// Weighted sum of the base layers.
    pub base: f64,
    /// Coherence correction added on top of `base`.
    pub correction: f64,
    /// `base + correction`, unclamped.
    pub final_score: f64,
}

/// How one layer took part in a candidate's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LayerReport {
    /// Which layer.
    pub layer: LayerKind,
    /// Whether it was applied.
    pub status: LayerStatus,
    /// Effective weight after redistribution. The coherence correction is
    /// added unweighted, so its entry is 1 when applied and 0 otherwise.
    pub weight: f64,
    /// Why the layer was degraded or skipped.
    pub note: Option<String>,
}

/// Why a candidate scored the way it did.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Explanation {
    /// One entry per layer, always all four.
    pub layers: Vec<LayerReport>,
    /// Other remarks (e.g. a feasibility gate that could not be checked).
    pub notes: Vec<String>,
}

/// A feasible next location with its scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Candidate {
    /// The location.
    pub location: Location,
    /// Every mode that passed the feasibility gates.
    pub edges: Vec<TransitEdge>,
    /// The fastest feasible edge, used for scoring.
    pub primary: TransitEdge,
    /// Scores.
    pub scores: ScoreBreakdown,
    /// Explanation of the scores.
    pub explanation: Explanation,
}

// ---------------------------------------------------------------------------
// Lattice
// ---------------------------------------------------------------------------

/// A time shift applied to a lattice cell after it was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Adjustment {
    /// Arrival minute before the shift.
    pub original_minute: u32,
    /// Why it moved.
    pub reason: String,
}

/// One cell of the lattice: the `x`-th ranked option at step `y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DecisionPoint {
    /// Step index.
    pub y: usize,
    /// Rank within the step.
    pub x: usize,
    /// The location this option visits.
    pub location_id: LocationId,
    /// Its display name.
    pub location_name: String,
    /// Mode of the primary edge.
    pub mode: TransportMode,
    /// Trip minute of arrival.
    pub arrival_minute: u32,
    /// Planned visit length.
    pub visit_minutes: u32,
    /// The scores that ranked this option.
    pub scores: ScoreBreakdown,
    /// Cell status.
    pub status: NodeStatus,
    /// Set once the cell has been time-shifted.
    pub adjustment: Option<Adjustment>,
}

/// One row of the lattice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TimelineNode {
    /// Step index.
    pub y: usize,
    /// Trip minute at which the step departs.
    pub start_minute: u32,
    /// Ranked options, best first. Empty when the simulated trip could
    /// not continue.
    pub points: Vec<DecisionPoint>,
    /// Which option the row follows.
    pub selected_x: Option<usize>,
}

impl TimelineNode {
    /// The option the row follows, if any.
    pub fn selected(&self) -> Option<&DecisionPoint> {
        self.selected_x.and_then(|x| self.points.get(x))
    }

    /// Follow option `x` instead. Returns `false` (and changes nothing)
    /// when the row has no such option. Adjusted cells keep their status.
    pub fn switch_to(&mut self, x: usize) -> bool {
        if x >= self.points.len() {
            return false;
        }
        for point in &mut self.points {
            if point.status == NodeStatus::Adjusted {
                continue;
            }
            point.status = if point.x == x {
                NodeStatus::Selected
            } else {
                NodeStatus::Alternative
            };
        }
        self.selected_x = Some(x);
        true
    }
}

/// A `steps x alternatives` grid of hypothetical future choices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Lattice {
    /// Rows in step order.
    pub rows: Vec<TimelineNode>,
}

impl Lattice {
    /// The cell at `(y, x)`.
    pub fn cell(&self, y: usize, x: usize) -> Option<&DecisionPoint> {
        self.rows.get(y).and_then(|row| row.points.get(x))
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// A frozen path through the lattice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Snapshot {
    /// Unique identifier.
    pub id: SnapshotId,
    /// Session the snapshot belongs to.
    pub session_id: SessionId,
    /// When it was taken.
    pub created_at: DateTime<Utc>,
    /// Caller's note.
    pub message: String,
    /// One cell per step, in order.
    pub path: Vec<DecisionPoint>,
    /// Mean final score of the path, clamped to `[0, 1]`.
    pub confidence: f64,
}

/// One difference between a snapshot and the working lattice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum PathChange {
    /// The row now follows a different location.
    OptionChanged {
        /// Step index.
        y: usize,
        /// Location in the snapshot.
        from: LocationId,
        /// Location in the lattice.
        to: LocationId,
    },
    /// Same location, different arrival minute.
    TimeAdjusted {
        /// Step index.
        y: usize,
        /// Arrival in the snapshot.
        from_minute: u32,
        /// Arrival in the lattice.
        to_minute: u32,
    },
    /// The lattice no longer has a selected cell at this step.
    Dropped {
        /// Step index.
        y: usize,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn point(x: usize, status: NodeStatus) -> DecisionPoint {
        DecisionPoint {
            y: 0,
            x,
            location_id: LocationId::new(),
            location_name: format!("option {x}"),
            mode: TransportMode::Walk,
            arrival_minute: 30,
            visit_minutes: 45,
            scores: ScoreBreakdown {
                preference: Some(0.5),
                efficiency: Some(0.5),
                contextual: Some(0.5),
                semantic: None,
                causal: None,
                base: 0.5,
                correction: 0.0,
                final_score: 0.5,
            },
            status,
            adjustment: None,
        }
    }

    fn row() -> TimelineNode {
        TimelineNode {
            y: 0,
            start_minute: 0,
            points: vec![
                point(0, NodeStatus::Selected),
                point(1, NodeStatus::Alternative),
                point(2, NodeStatus::Adjusted),
            ],
            selected_x: Some(0),
        }
    }

    #[test]
    fn switching_moves_the_selection() {
        let mut node = row();
        assert!(node.switch_to(1));
        assert_eq!(node.selected_x, Some(1));
        assert_eq!(node.selected().unwrap().x, 1);
        let statuses: Vec<NodeStatus> = node.points.iter().map(|p| p.status).collect();
        assert_eq!(
            statuses,
            vec![NodeStatus::Alternative, NodeStatus::Selected, NodeStatus::Adjusted]
        );
    }

    #[test]
    fn switching_out_of_range_changes_nothing() {
        let mut node = row();
        let before = node.clone();
        assert!(!node.switch_to(3));
        assert_eq!(node, before);
    }

    #[test]
    fn cell_lookup_is_bounds_checked() {
        let lattice = Lattice { rows: vec![row()] };
        assert_eq!(lattice.cell(0, 2).map(|p| p.x), Some(2));
        assert!(lattice.cell(0, 3).is_none());
        assert!(lattice.cell(1, 0).is_none());
    }
}
