//! Score fusion and ranking.
//!
//! `base = w_pref * preference + w_eff * efficiency + w_ctx * contextual`
//! and `final = base + coherence correction`, never clamped. When a base
//! layer cannot run for a candidate its weight is redistributed over the
//! layers that did, proportionally, and the explanation says so.
//!
//! Ranking is a total order: final score descending, then preference
//! descending, then travel time ascending, then location ID.

use std::cmp::Ordering;

use tracing::debug;
use waypath_types::{
    Candidate, Explanation, LayerKind, LayerReport, LayerStatus, ScoreBreakdown,
};

use crate::coherence::CoherenceOutcome;
use crate::config::LayerWeights;
use crate::feasibility::FeasibleCandidate;
use crate::scoring::{BaseLayer, LayerError, ScoringLayer};

/// A base layer's result for one candidate.
pub type LayerResult = (BaseLayer, Result<f64, LayerError>);

const fn weight_of(layer: BaseLayer, weights: &LayerWeights) -> f64 {
    match layer {
        BaseLayer::Preference => weights.preference,
        BaseLayer::Efficiency => weights.efficiency,
        BaseLayer::Contextual => weights.contextual,
    }
}

/// Fuse layer results into a scored, explained [`Candidate`].
pub fn fuse(
    feasible: FeasibleCandidate,
    layers: &[LayerResult],
    weights: &LayerWeights,
    coherence: CoherenceOutcome,
) -> Candidate {
    let applied_weight: f64 = layers
        .iter()
        .filter(|(_, r)| r.is_ok())
        .map(|(layer, _)| weight_of(*layer, weights))
        .sum();
    let degraded = layers.iter().any(|(_, r)| r.is_err());

    let mut reports = Vec::with_capacity(4);
    let mut notes = feasible.notes.clone();
    let mut base = 0.0_f64;
    let mut breakdown = ScoreBreakdown {
        preference: None,
        efficiency: None,
        contextual: None,
        semantic: coherence.semantic,
        causal: coherence.causal,
        base: 0.0,
        correction: 0.0,
        final_score: 0.0,
    };

    for (layer, result) in layers {
        let nominal = weight_of(*layer, weights);
        match result {
            Ok(score) => {
                let weight = if degraded && applied_weight > 0.0 {
                    nominal / applied_weight
                } else {
                    nominal
                };
                base = weight.mul_add(*score, base);
                match layer {
                    BaseLayer::Preference => breakdown.preference = Some(*score),
                    BaseLayer::Efficiency => breakdown.efficiency = Some(*score),
                    BaseLayer::Contextual => breakdown.contextual = Some(*score),
                }
                reports.push(LayerReport {
                    layer: layer.kind(),
                    status: LayerStatus::Applied,
                    weight,
                    note: None,
                });
            }
            Err(err) => reports.push(LayerReport {
                layer: layer.kind(),
                status: LayerStatus::Degraded,
                weight: 0.0,
                note: Some(err.to_string()),
            }),
        }
    }

    if degraded {
        if applied_weight > 0.0 {
            notes.push(String::from(
                "weights redistributed over the remaining base layers",
            ));
        } else {
            notes.push(String::from("no base layer could score this candidate"));
        }
    }

    let applied = coherence.status == LayerStatus::Applied;
    reports.push(LayerReport {
        layer: LayerKind::Coherence,
        status: coherence.status,
        // The correction is added as-is rather than blended.
        weight: if applied { 1.0 } else { 0.0 },
        note: coherence.note,
    });

    breakdown.base = base;
    breakdown.correction = coherence.correction;
    breakdown.final_score = if applied {
        base + coherence.correction
    } else {
        base
    };

    Candidate {
        location: feasible.location,
        edges: feasible.edges,
        primary: feasible.primary,
        scores: breakdown,
        explanation: Explanation {
            layers: reports,
            notes,
        },
    }
}

/// Total order used for ranking; `Less` means `a` ranks first.
pub fn compare_candidates(a: &Candidate, b: &Candidate) -> Ordering {
    b.scores
        .final_score
        .total_cmp(&a.scores.final_score)
        .then_with(|| {
            let pa = a.scores.preference.unwrap_or(0.0);
            let pb = b.scores.preference.unwrap_or(0.0);
            pb.total_cmp(&pa)
        })
        .then_with(|| a.primary.travel_minutes.cmp(&b.primary.travel_minutes))
        .then_with(|| a.location.id.cmp(&b.location.id))
}

/// Sort `candidates` and keep the best `top_k`. Never pads.
pub fn rank(mut candidates: Vec<Candidate>, top_k: usize) -> Vec<Candidate> {
    candidates.sort_by(compare_candidates);
    candidates.truncate(top_k);
    debug!(
        returned = candidates.len(),
        best = candidates.first().map(|c| c.location.name.as_str()),
        "Candidates ranked"
    );
    candidates
}
