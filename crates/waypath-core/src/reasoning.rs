//! Optional reasoning collaborator for the coherence layer.
//!
//! A [`ReasoningCollaborator`] (typically backed by a language model)
//! returns its own estimate of semantic flow and causal strength for a
//! candidate. The planner asks for every candidate of a cycle at once,
//! concurrently, before ranking, and each call runs under a deadline. A
//! call that fails or runs out of time, or answers with a value that is
//! not a real number, yields a [`CollaboratorError`] for that candidate
//! only; the coherence layer is then skipped for it and the
//! rest of the ranking is unaffected.

use std::collections::BTreeMap;
use std::time::Duration;

use futures::future::{BoxFuture, join_all};
use serde::{Deserialize, Serialize};
use tracing::warn;
use waypath_types::{Category, LocationId, Setting, TravelerCondition, Weather};

use crate::error::CollaboratorError;

/// What the collaborator is told about one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReasoningRequest {
    /// The candidate.
    pub location_id: LocationId,
    /// Its display name.
    pub location_name: String,
    /// Its category.
    pub category: Category,
    /// Its setting.
    pub setting: Setting,
    /// Names of recent visits, oldest first.
    pub recent_visits: Vec<String>,
    /// Weather at arrival, if known.
    pub weather: Option<Weather>,
    /// Local arrival time as `HH:MM`.
    pub local_time: String,
    /// The traveler's condition.
    pub condition: TravelerCondition,
}

/// The collaborator's answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReasoningEstimate {
    /// Semantic flow in `[-1, 1]`.
    pub semantic: f64,
    /// Causal strength in `[0, 1]`.
    pub causal: f64,
}

impl ReasoningEstimate {
    /// Whether both values are real numbers.
    pub const fn is_finite(&self) -> bool {
        self.semantic.is_finite() && self.causal.is_finite()
    }

    /// Copy with both values clamped to their ranges.
    pub const fn clamped(self) -> Self {
        Self {
            semantic: self.semantic.clamp(-1.0, 1.0),
            causal: self.causal.clamp(0.0, 1.0),
        }
    }
}

/// A source of coherence estimates.
pub trait ReasoningCollaborator: Send + Sync {
    /// Estimate semantic flow and causal strength for one candidate.
    fn estimate(
        &self,
        request: ReasoningRequest,
    ) -> BoxFuture<'_, Result<ReasoningEstimate, CollaboratorError>>;
}

/// Collaborator results for one cycle, by candidate.
pub type EstimateMap = BTreeMap<LocationId, Result<ReasoningEstimate, CollaboratorError>>;

/// Ask the collaborator about every request concurrently, each under
/// `timeout`.
pub async fn prefetch_estimates(
    collaborator: &dyn ReasoningCollaborator,
    requests: Vec<ReasoningRequest>,
    timeout: Duration,
) -> EstimateMap {
    let calls = requests.into_iter().map(|request| {
        let id = request.location_id;
        async move {
            let result = match tokio::time::timeout(timeout, collaborator.estimate(request)).await
            {
                Ok(Ok(estimate)) if estimate.is_finite() => Ok(estimate.clamped()),
                Ok(Ok(estimate)) => Err(CollaboratorError::Reasoning {
                    message: format!(
                        "non-finite estimate (semantic {}, causal {})",
                        estimate.semantic, estimate.causal
                    ),
                }),
                Ok(Err(err)) => Err(err),
                Err(_elapsed) => Err(CollaboratorError::Timeout { timeout }),
            };
            if let Err(err) = &result {
                warn!(location = %id, error = %err, "Reasoning collaborator failed");
            }
            (id, result)
        }
    });
    join_all(calls).await.into_iter().collect()
}

/// A collaborator that always answers with the same estimate.
#[derive(Debug, Clone, Copy)]
pub struct FixedReasoner {
    /// The answer.
    estimate: ReasoningEstimate,
}

impl FixedReasoner {
    /// Create a collaborator answering `(semantic, causal)`.
    pub const fn new(semantic: f64, causal: f64) -> Self {
        Self {
            estimate: ReasoningEstimate { semantic, causal },
        }
    }
}

impl ReasoningCollaborator for FixedReasoner {
    fn estimate(
        &self,
        _request: ReasoningRequest,
    ) -> BoxFuture<'_, Result<ReasoningEstimate, CollaboratorError>> {
        let estimate = self.estimate;
        Box::pin(async move { Ok(estimate) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct SlowReasoner;

    impl ReasoningCollaborator for SlowReasoner {
        fn estimate(
            &self,
            _request: ReasoningRequest,
        ) -> BoxFuture<'_, Result<ReasoningEstimate, CollaboratorError>> {
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(ReasoningEstimate {
                    semantic: 0.0,
                    causal: 0.0,
                })
            })
        }
    }

    fn request() -> ReasoningRequest {
        ReasoningRequest {
            location_id: LocationId::new(),
            location_name: String::from("museum"),
            category: Category::Attraction,
            setting: Setting::Indoor,
            recent_visits: Vec::new(),
            weather: Some(Weather::Rain),
            local_time: String::from("10:00"),
            condition: TravelerCondition::fresh(),
        }
    }

    #[tokio::test]
    async fn answers_are_clamped_and_keyed_by_location() {
        let req = request();
        let id = req.location_id;
        let estimates =
            prefetch_estimates(&FixedReasoner::new(3.0, -1.0), vec![req], Duration::from_secs(1))
                .await;
        let estimate = estimates.get(&id).and_then(|r| r.as_ref().ok()).copied();
        assert_eq!(
            estimate,
            Some(ReasoningEstimate {
                semantic: 1.0,
                causal: 0.0,
            })
        );
    }

    #[tokio::test]
    async fn non_finite_answer_is_an_error() {
        let req = request();
        let id = req.location_id;
        let estimates = prefetch_estimates(
            &FixedReasoner::new(f64::NAN, 0.5),
            vec![req],
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(
            estimates.get(&id),
            Some(Err(CollaboratorError::Reasoning { .. }))
        ));

        let req = request();
        let id = req.location_id;
        let estimates = prefetch_estimates(
            &FixedReasoner::new(0.2, f64::INFINITY),
            vec![req],
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(
            estimates.get(&id),
            Some(Err(CollaboratorError::Reasoning { .. }))
        ));
    }

    #[tokio::test]
    async fn slow_collaborator_times_out() {
        let req = request();
        let id = req.location_id;
        let estimates =
            prefetch_estimates(&SlowReasoner, vec![req], Duration::from_millis(100)).await;
        assert!(matches!(
            estimates.get(&id),
            Some(Err(CollaboratorError::Timeout { .. }))
        ));
    }
}
