//! Batch evaluation with per-item failure isolation.

use std::sync::Arc;

use warden_core::{AuthorizationRequest, BatchOutcome, GatewayError};

use crate::decision::DecisionOrchestrator;

/// Hard cap on items per batch.
pub const MAX_BATCH_ITEMS: usize = 30;

/// Drives the orchestrator over an ordered list of requests.
pub struct BatchEvaluator {
    orchestrator: Arc<DecisionOrchestrator>,
}

impl BatchEvaluator {
    pub fn new(orchestrator: Arc<DecisionOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Evaluate every item, preserving input order positionally.
    ///
    /// An empty batch or one over the cap is rejected wholesale before any
    /// item runs. A single item failing validation becomes an error slot at
    /// its position and never aborts its siblings. Items are evaluated
    /// sequentially so slot `i` always answers item `i`.
    pub async fn evaluate(
        &self,
        items: &[AuthorizationRequest],
    ) -> Result<Vec<BatchOutcome>, GatewayError> {
        if items.is_empty() {
            return Err(GatewayError::validation(
                "batch must contain at least 1 item",
            ));
        }
        if items.len() > MAX_BATCH_ITEMS {
            return Err(GatewayError::validation(format!(
                "batch of {} items exceeds the maximum of {MAX_BATCH_ITEMS}",
                items.len()
            )));
        }

        let mut results = Vec::with_capacity(items.len());
        for item in items {
            match item.validate() {
                Ok(()) => {
                    let decision = self.orchestrator.authorize(item).await;
                    results.push(BatchOutcome::Decision(decision));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "batch item failed validation");
                    results.push(BatchOutcome::failed(e.code(), e.to_string()));
                }
            }
        }

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use warden_core::{Decision, Outcome};

    use super::*;
    use crate::decision::tests::{FakeEngine, request};
    use crate::decision::DEFAULT_DECISION_TTL;
    use crate::store::InMemoryCacheStore;

    fn evaluator(engine: Arc<FakeEngine>) -> BatchEvaluator {
        BatchEvaluator::new(Arc::new(DecisionOrchestrator::new(
            Arc::new(InMemoryCacheStore::new()),
            engine,
            DEFAULT_DECISION_TTL,
            Duration::from_secs(1),
        )))
    }

    #[tokio::test]
    async fn results_match_input_length_and_order() {
        let engine = FakeEngine::new(vec![
            Ok(Decision::allow()),
            Ok(Decision::deny(vec!["Policy: p1".to_string()])),
            Ok(Decision::allow()),
        ]);
        let evaluator = evaluator(engine);

        let items = vec![
            request("u1", "User:read", "a"),
            request("u1", "User:disable", "b"),
            request("u1", "User:list", "self"),
        ];
        let results = evaluator.evaluate(&items).await.unwrap();

        assert_eq!(results.len(), 3);
        assert!(matches!(&results[0], BatchOutcome::Decision(d) if d.outcome == Outcome::Allow));
        assert!(matches!(&results[1], BatchOutcome::Decision(d) if d.outcome == Outcome::Deny));
        assert!(matches!(&results[2], BatchOutcome::Decision(d) if d.outcome == Outcome::Allow));
    }

    #[tokio::test]
    async fn one_bad_item_fails_in_place_without_aborting_siblings() {
        let engine = FakeEngine::always_allow();
        let evaluator = evaluator(engine.clone());

        let items = vec![
            request("u1", "User:read", "a"),
            request("u1", "not-an-action", "b"),
            request("u1", "User:list", "self"),
        ];
        let results = evaluator.evaluate(&items).await.unwrap();

        assert_eq!(results.len(), 3);
        assert!(matches!(&results[0], BatchOutcome::Decision(_)));
        assert!(
            matches!(&results[1], BatchOutcome::Failed { error } if error.code == "VALIDATION_FAILED")
        );
        assert!(matches!(&results[2], BatchOutcome::Decision(_)));
        // The invalid item never reached the engine.
        assert_eq!(engine.calls(), 2);
    }

    #[tokio::test]
    async fn batch_over_the_cap_is_rejected_before_any_evaluation() {
        let engine = FakeEngine::always_allow();
        let evaluator = evaluator(engine.clone());

        let items: Vec<_> = (0..=MAX_BATCH_ITEMS)
            .map(|i| request("u1", "User:read", &format!("r{i}")))
            .collect();
        assert_eq!(items.len(), 31);

        let err = evaluator.evaluate(&items).await.unwrap_err();
        assert_eq!(err.code(), "VALIDATION_FAILED");
        assert_eq!(engine.calls(), 0);
    }

    #[tokio::test]
    async fn batch_at_the_cap_is_accepted() {
        let engine = FakeEngine::always_allow();
        let evaluator = evaluator(engine);

        let items: Vec<_> = (0..MAX_BATCH_ITEMS)
            .map(|i| request("u1", "User:read", &format!("r{i}")))
            .collect();
        let results = evaluator.evaluate(&items).await.unwrap();
        assert_eq!(results.len(), MAX_BATCH_ITEMS);
    }

    #[tokio::test]
    async fn empty_batch_is_rejected() {
        let evaluator = evaluator(FakeEngine::always_allow());
        let err = evaluator.evaluate(&[]).await.unwrap_err();
        assert!(matches!(err, GatewayError::ValidationFailed(_)));
    }

    #[tokio::test]
    async fn repeated_items_share_the_decision_cache() {
        let engine = FakeEngine::always_allow();
        let evaluator = evaluator(engine.clone());

        let items = vec![
            request("u1", "User:read", "a"),
            request("u1", "User:read", "a"),
        ];
        let results = evaluator.evaluate(&items).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(engine.calls(), 1);
    }
}
