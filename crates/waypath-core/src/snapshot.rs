//! Freezing a lattice path and comparing it with later lattices.

use std::collections::BTreeSet;

use chrono::Utc;
use tracing::info;
use waypath_types::{Lattice, PathChange, SessionId, Snapshot, SnapshotId};

use crate::error::EngineError;

/// Freeze the path that ends at cell `(y, x)`.
///
/// Rows before `y` contribute the cell they currently follow; row `y`
/// contributes `x`. Confidence is the mean final score of the path,
/// clamped to `[0, 1]`.
///
/// Rows after a switched row were scored as if the old pick had been
/// visited, so they may offer the newly followed location again. Such a
/// path is refused rather than frozen.
///
/// # Errors
///
/// Returns [`EngineError::InvalidCell`] if `(y, x)` does not exist or an
/// earlier row has no selected cell, and
/// [`EngineError::RepeatedLocation`] if the path visits a location twice.
pub fn take_snapshot(
    lattice: &Lattice,
    y: usize,
    x: usize,
    session_id: SessionId,
    message: &str,
) -> Result<Snapshot, EngineError> {
    let last = lattice.cell(y, x).ok_or(EngineError::InvalidCell { y, x })?;

    let mut path = Vec::with_capacity(y.saturating_add(1));
    for row in lattice.rows.iter().take(y) {
        let point = row.selected().ok_or(EngineError::InvalidCell {
            y: row.y,
            x: row.selected_x.unwrap_or_default(),
        })?;
        path.push(point.clone());
    }
    path.push(last.clone());

    let mut seen = BTreeSet::new();
    if let Some(repeat) = path.iter().find(|p| !seen.insert(p.location_id)) {
        return Err(EngineError::RepeatedLocation {
            location: repeat.location_id,
            y: repeat.y,
        });
    }

    let total: f64 = path.iter().map(|p| p.scores.final_score).sum();
    let count = f64::from(u32::try_from(path.len()).unwrap_or(u32::MAX));
    let confidence = (total / count).clamp(0.0, 1.0);

    let snapshot = Snapshot {
        id: SnapshotId::new(),
        session_id,
        created_at: Utc::now(),
        message: String::from(message),
        path,
        confidence,
    };
    info!(
        snapshot_id = %snapshot.id,
        session_id = %session_id,
        steps = snapshot.path.len(),
        confidence,
        "Snapshot taken"
    );
    Ok(snapshot)
}

/// Differences between a frozen path and the working lattice, row by row.
pub fn diff_snapshot(snapshot: &Snapshot, lattice: &Lattice) -> Vec<PathChange> {
    snapshot
        .path
        .iter()
        .filter_map(|frozen| {
            let Some(current) = lattice.rows.get(frozen.y).and_then(|row| row.selected()) else {
                return Some(PathChange::Dropped { y: frozen.y });
            };
            if current.location_id != frozen.location_id {
                Some(PathChange::OptionChanged {
                    y: frozen.y,
                    from: frozen.location_id,
                    to: current.location_id,
                })
            } else if current.arrival_minute != frozen.arrival_minute {
                Some(PathChange::TimeAdjusted {
                    y: frozen.y,
                    from_minute: frozen.arrival_minute,
                    to_minute: current.arrival_minute,
                })
            } else {
                None
            }
        })
        .collect()
}
