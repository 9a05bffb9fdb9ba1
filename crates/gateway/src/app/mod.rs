//! HTTP application assembly: state, router, and handlers.

mod dto;
mod errors;
mod routes;

pub use errors::error_response;

use std::sync::Arc;

use axum::routing::{delete, get, post};
use axum::{Router, middleware::from_fn_with_state};

use warden_auth::{KeyEndpoint, KeySetCache, TokenValidator};
use warden_authz::{
    BatchEvaluator, CacheStore, DecisionOrchestrator, IdentityDirectory, PolicyEngineClient,
    StatusCache,
};

use crate::config::GatewayConfig;
use crate::middleware::enforcement_middleware;
use crate::pipeline::{EnforcementPipeline, default_rules};

/// External collaborators, injected so tests can substitute fakes.
pub struct Collaborators {
    pub key_endpoint: Arc<dyn KeyEndpoint>,
    pub directory: Arc<dyn IdentityDirectory>,
    pub policy_engine: Arc<dyn PolicyEngineClient>,
    pub cache: Arc<dyn CacheStore>,
}

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<EnforcementPipeline>,
    pub decisions: Arc<DecisionOrchestrator>,
    pub batch: Arc<BatchEvaluator>,
}

/// Wires the full pipeline and returns the router.
pub fn build_app(config: &GatewayConfig, collaborators: Collaborators) -> Router {
    let keys = Arc::new(KeySetCache::new(
        collaborators.key_endpoint,
        config.call_timeout,
    ));
    let verifier = Arc::new(TokenValidator::new(keys, config.issuer.clone()));

    let status = Arc::new(StatusCache::new(
        collaborators.cache.clone(),
        collaborators.directory,
        config.status_ttl,
        config.call_timeout,
    ));
    let decisions = Arc::new(DecisionOrchestrator::new(
        collaborators.cache,
        collaborators.policy_engine,
        config.decision_ttl,
        config.call_timeout,
    ));
    let batch = Arc::new(BatchEvaluator::new(decisions.clone()));

    let pipeline = Arc::new(EnforcementPipeline::new(
        verifier,
        status,
        decisions.clone(),
        default_rules(),
    ));

    let state = AppState {
        pipeline,
        decisions,
        batch,
    };

    // Everything behind the enforcement layer requires a verified, enabled
    // principal; routes mapped by a rule additionally need a policy decision.
    let protected = Router::new()
        .route("/v1/whoami", get(routes::whoami))
        .route("/v1/authorize", post(routes::authorize))
        .route("/v1/authorize/batch", post(routes::authorize_batch))
        .route(
            "/v1/authz/cache/:principal_id",
            delete(routes::invalidate_principal),
        )
        .route("/v1/authz/cache", delete(routes::flush_cache))
        .layer(from_fn_with_state(state.clone(), enforcement_middleware));

    Router::new()
        .route("/health", get(routes::health))
        .route("/v1/enforce", post(routes::enforce))
        .merge(protected)
        .with_state(state)
}
