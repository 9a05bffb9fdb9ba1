//! Decision orchestration: cache in front of the policy engine, fail-closed.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use warden_core::{AuthorizationRequest, Decision, PrincipalId};

use crate::store::CacheStore;
use crate::{CacheStoreError, PolicyEngineError};

/// Default TTL for cached decisions (ALLOW and DENY alike).
pub const DEFAULT_DECISION_TTL: Duration = Duration::from_secs(60);

/// Prefix shared by every decision-cache key.
pub const DECISION_KEY_PREFIX: &str = "authz:";

/// Policy engine collaborator.
#[async_trait]
pub trait PolicyEngineClient: Send + Sync {
    async fn is_authorized(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<Decision, PolicyEngineError>;
}

/// Combines the decision cache with the policy engine.
///
/// `authorize` is infallible by design: the enforcement point always has a
/// verdict, and every engine/cache failure converges to DENY. Synthetic
/// fail-closed denies are cached for the full TTL like real ones; an engine
/// blip can therefore hold a legitimate principal out for up to one TTL
/// after recovery. That trade favors the enforcement point's availability
/// over access availability and must not be weakened casually.
pub struct DecisionOrchestrator {
    store: Arc<dyn CacheStore>,
    engine: Arc<dyn PolicyEngineClient>,
    ttl: Duration,
    call_timeout: Duration,
}

impl DecisionOrchestrator {
    pub fn new(
        store: Arc<dyn CacheStore>,
        engine: Arc<dyn PolicyEngineClient>,
        ttl: Duration,
        call_timeout: Duration,
    ) -> Self {
        Self {
            store,
            engine,
            ttl,
            call_timeout,
        }
    }

    /// Evaluate one authorization request, consulting the cache first.
    ///
    /// Cached decisions are returned unchanged with no TTL refresh on read.
    /// The decision cache is only written after the engine call resolved, so
    /// a request canceled mid-flight commits nothing.
    pub async fn authorize(&self, request: &AuthorizationRequest) -> Decision {
        let key = request.cache_key();

        match self.store.get(&key).await {
            Ok(Some(raw)) => match serde_json::from_str::<Decision>(&raw) {
                Ok(decision) => {
                    tracing::debug!(key = %key, "decision cache hit");
                    return decision;
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "unreadable cached decision, re-evaluating");
                }
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "decision cache read failed");
            }
        }

        let decision =
            match tokio::time::timeout(self.call_timeout, self.engine.is_authorized(request)).await
            {
                Ok(Ok(decision)) => decision,
                Ok(Err(PolicyEngineError::Unavailable(e))) => {
                    tracing::error!(key = %key, error = %e, "policy engine unavailable, failing closed");
                    Decision::deny(vec!["Service unavailable".to_string()])
                }
                Ok(Err(e)) => {
                    tracing::error!(key = %key, error = %e, "policy engine error, failing closed");
                    Decision::deny(vec!["Authorization error".to_string()])
                }
                Err(_) => {
                    tracing::error!(key = %key, "policy engine call timed out, failing closed");
                    Decision::deny(vec!["Service unavailable".to_string()])
                }
            };

        // Cache whatever resulted, synthetic denies included, so a principal
        // who is never going to be allowed does not hammer the engine.
        match serde_json::to_string(&decision) {
            Ok(raw) => {
                if let Err(e) = self.store.set(&key, &raw, self.ttl).await {
                    tracing::warn!(key = %key, error = %e, "decision cache write failed");
                }
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "decision not serializable for caching");
            }
        }

        decision
    }

    /// Drop every cached decision for one principal (attributes changed).
    pub async fn invalidate_principal(
        &self,
        principal_id: &PrincipalId,
    ) -> Result<u64, CacheStoreError> {
        let prefix = format!("{DECISION_KEY_PREFIX}{principal_id}:");
        let deleted = self.store.delete_prefix(&prefix).await?;
        tracing::info!(principal_id = %principal_id, deleted, "invalidated principal decisions");
        Ok(deleted)
    }

    /// Drop every cached decision (policy rule set republished).
    pub async fn flush_all(&self) -> Result<u64, CacheStoreError> {
        let deleted = self.store.delete_prefix(DECISION_KEY_PREFIX).await?;
        tracing::info!(deleted, "flushed decision cache");
        Ok(deleted)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::Map;

    use warden_core::{Action, Outcome, Principal, PrincipalType, Resource};

    use super::*;
    use crate::store::InMemoryCacheStore;

    pub(crate) fn request(principal_id: &str, action: &str, resource_id: &str) -> AuthorizationRequest {
        AuthorizationRequest {
            principal: Principal::new(
                PrincipalId::new(principal_id),
                PrincipalType::User,
                Map::new(),
                Map::new(),
            ),
            action: Action::new(action),
            resource: Resource::new("User", resource_id),
            context: Map::new(),
        }
    }

    pub(crate) struct FakeEngine {
        responses: Mutex<Vec<Result<Decision, PolicyEngineError>>>,
        calls: AtomicUsize,
    }

    impl FakeEngine {
        pub(crate) fn new(responses: Vec<Result<Decision, PolicyEngineError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn always_allow() -> Arc<Self> {
            Self::new(vec![])
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PolicyEngineClient for FakeEngine {
        async fn is_authorized(
            &self,
            _request: &AuthorizationRequest,
        ) -> Result<Decision, PolicyEngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Ok(Decision::allow())
            } else {
                responses.remove(0)
            }
        }
    }

    fn orchestrator(engine: Arc<FakeEngine>) -> DecisionOrchestrator {
        DecisionOrchestrator::new(
            Arc::new(InMemoryCacheStore::new()),
            engine,
            DEFAULT_DECISION_TTL,
            Duration::from_secs(1),
        )
    }

    #[tokio::test]
    async fn second_call_within_ttl_hits_the_cache() {
        let engine = FakeEngine::always_allow();
        let orch = orchestrator(engine.clone());
        let req = request("u1", "User:read", "u2");

        assert_eq!(orch.authorize(&req).await.outcome, Outcome::Allow);
        assert_eq!(orch.authorize(&req).await.outcome, Outcome::Allow);
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn deny_decisions_are_cached_as_well() {
        let engine = FakeEngine::new(vec![Ok(Decision::deny(vec!["Policy: p1".to_string()]))]);
        let orch = orchestrator(engine.clone());
        let req = request("u1", "User:disable", "u2");

        let first = orch.authorize(&req).await;
        assert_eq!(first.outcome, Outcome::Deny);
        assert_eq!(first.reasons, vec!["Policy: p1"]);

        let second = orch.authorize(&req).await;
        assert_eq!(second, first);
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn engine_outage_fails_closed_and_the_deny_is_cached() {
        let engine = FakeEngine::new(vec![Err(PolicyEngineError::Unavailable(
            "connect refused".into(),
        ))]);
        let orch = orchestrator(engine.clone());
        let req = request("u1", "User:read", "u2");

        let decision = orch.authorize(&req).await;
        assert_eq!(decision.outcome, Outcome::Deny);
        assert_eq!(decision.reasons, vec!["Service unavailable"]);

        // Within the TTL the synthetic deny is served from cache: no second
        // engine call even though the engine would now succeed.
        let again = orch.authorize(&req).await;
        assert_eq!(again.outcome, Outcome::Deny);
        assert_eq!(engine.calls(), 1);
    }

    #[tokio::test]
    async fn validation_and_store_errors_deny_with_authorization_error_reason() {
        let engine = FakeEngine::new(vec![
            Err(PolicyEngineError::InvalidRequest("bad entity".into())),
            Err(PolicyEngineError::StoreNotFound("ps-1".into())),
        ]);
        let orch = orchestrator(engine);

        let decision = orch.authorize(&request("u1", "User:read", "a")).await;
        assert_eq!(decision.reasons, vec!["Authorization error"]);

        let decision = orch.authorize(&request("u1", "User:read", "b")).await;
        assert_eq!(decision.reasons, vec!["Authorization error"]);
    }

    #[tokio::test]
    async fn distinct_requests_get_distinct_cache_entries() {
        let engine = FakeEngine::always_allow();
        let orch = orchestrator(engine.clone());

        orch.authorize(&request("u1", "User:read", "a")).await;
        orch.authorize(&request("u1", "User:read", "b")).await;
        orch.authorize(&request("u2", "User:read", "a")).await;
        assert_eq!(engine.calls(), 3);
    }

    #[tokio::test]
    async fn invalidate_principal_only_touches_that_principal() {
        let engine = FakeEngine::always_allow();
        let orch = orchestrator(engine.clone());

        orch.authorize(&request("u1", "User:read", "a")).await;
        orch.authorize(&request("u1", "User:list", "self")).await;
        orch.authorize(&request("u2", "User:read", "a")).await;

        let deleted = orch.invalidate_principal(&PrincipalId::new("u1")).await.unwrap();
        assert_eq!(deleted, 2);

        // u1 re-evaluates, u2 still cached.
        orch.authorize(&request("u1", "User:read", "a")).await;
        orch.authorize(&request("u2", "User:read", "a")).await;
        assert_eq!(engine.calls(), 4);
    }

    #[tokio::test]
    async fn flush_all_drops_every_decision() {
        let engine = FakeEngine::always_allow();
        let orch = orchestrator(engine.clone());

        orch.authorize(&request("u1", "User:read", "a")).await;
        orch.authorize(&request("u2", "User:read", "a")).await;

        assert_eq!(orch.flush_all().await.unwrap(), 2);

        orch.authorize(&request("u1", "User:read", "a")).await;
        assert_eq!(engine.calls(), 3);
    }

    struct HangingEngine;

    #[async_trait]
    impl PolicyEngineClient for HangingEngine {
        async fn is_authorized(
            &self,
            _request: &AuthorizationRequest,
        ) -> Result<Decision, PolicyEngineError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!()
        }
    }

    #[tokio::test]
    async fn slow_engine_hits_the_timeout_and_fails_closed() {
        let orch = DecisionOrchestrator::new(
            Arc::new(InMemoryCacheStore::new()),
            Arc::new(HangingEngine),
            DEFAULT_DECISION_TTL,
            Duration::from_millis(50),
        );

        let decision = orch.authorize(&request("u1", "User:read", "a")).await;
        assert_eq!(decision.outcome, Outcome::Deny);
        assert_eq!(decision.reasons, vec!["Service unavailable"]);
    }
}
