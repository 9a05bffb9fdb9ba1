//! Per-request enforcement pipeline.
//!
//! Terminal states are `Allowed` or `Rejected(code)`; a rejection at any
//! step is final and nothing downstream of it executes.

use std::sync::Arc;

use axum::http::Method;
use uuid::Uuid;

use warden_auth::{TokenError, TokenVerifier};
use warden_authz::{DecisionOrchestrator, StatusCache};
use warden_core::{
    Action, AuthorizationRequest, GatewayError, Outcome, Principal, Resource, SELF_RESOURCE_ID,
};

/// The parts of an inbound request the pipeline looks at.
#[derive(Debug)]
pub struct InboundRequest<'a> {
    pub method: Method,
    pub path: &'a str,
    pub bearer: Option<&'a str>,
}

/// Final verdict for one inbound request.
#[derive(Debug)]
pub enum EnforcementVerdict {
    Allowed(Principal),
    Rejected(GatewayError),
}

/// Maps a (method, path) pair to the action a matching request performs.
#[derive(Debug, Clone)]
pub struct RouteRule {
    methods: Vec<Method>,
    segments: Vec<Segment>,
    action: Action,
    resource_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
}

impl RouteRule {
    /// `pattern` uses `{name}` placeholders, e.g. `/v1/users/{id}/disable`.
    pub fn new(methods: &[Method], pattern: &str, action: &str, resource_type: &str) -> Self {
        let segments = pattern
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| {
                if s.starts_with('{') && s.ends_with('}') {
                    Segment::Param
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();

        Self {
            methods: methods.to_vec(),
            segments,
            action: Action::new(action),
            resource_type: resource_type.to_string(),
        }
    }

    fn matches(&self, method: &Method, path: &str) -> bool {
        if !self.methods.contains(method) {
            return false;
        }

        let parts: Vec<&str> = path
            .trim_matches('/')
            .split('/')
            .filter(|s| !s.is_empty())
            .collect();
        if parts.len() != self.segments.len() {
            return false;
        }

        self.segments
            .iter()
            .zip(&parts)
            .all(|(segment, part)| match segment {
                Segment::Literal(lit) => lit == part,
                Segment::Param => true,
            })
    }
}

/// Protected-surface rules: which routes need a policy decision, and which
/// action they map to. Ordered; first match wins.
pub fn default_rules() -> Vec<RouteRule> {
    vec![
        RouteRule::new(&[Method::GET, Method::POST], "/v1/users", "User:list", "User"),
        RouteRule::new(
            &[Method::GET, Method::PUT, Method::DELETE],
            "/v1/users/{id}",
            "User:read",
            "User",
        ),
        RouteRule::new(&[Method::POST], "/v1/users/{id}/disable", "User:disable", "User"),
        RouteRule::new(&[Method::POST], "/v1/users/{id}/enable", "User:enable", "User"),
    ]
}

/// First UUID-shaped path segment, or the `self` sentinel.
fn extract_resource_id(path: &str) -> String {
    path.split('/')
        .find(|s| s.len() == 36 && Uuid::parse_str(s).is_ok())
        .unwrap_or(SELF_RESOURCE_ID)
        .to_string()
}

/// Composes verification, status enforcement, route mapping, and decision
/// orchestration into one verdict per request.
pub struct EnforcementPipeline {
    verifier: Arc<dyn TokenVerifier>,
    status: Arc<StatusCache>,
    decisions: Arc<DecisionOrchestrator>,
    rules: Vec<RouteRule>,
}

impl EnforcementPipeline {
    pub fn new(
        verifier: Arc<dyn TokenVerifier>,
        status: Arc<StatusCache>,
        decisions: Arc<DecisionOrchestrator>,
        rules: Vec<RouteRule>,
    ) -> Self {
        Self {
            verifier,
            status,
            decisions,
            rules,
        }
    }

    /// Run the full state machine for one inbound request.
    pub async fn enforce(&self, request: &InboundRequest<'_>) -> EnforcementVerdict {
        let Some(token) = request.bearer else {
            return EnforcementVerdict::Rejected(GatewayError::AuthenticationRequired);
        };

        let principal = match self.verifier.verify(token).await {
            Ok(principal) => principal,
            Err(TokenError::Expired) => {
                return EnforcementVerdict::Rejected(GatewayError::TokenExpired);
            }
            Err(e) => {
                return EnforcementVerdict::Rejected(GatewayError::TokenInvalid(e.to_string()));
            }
        };

        if !self.status.is_enabled(&principal.id).await {
            tracing::warn!(principal_id = %principal.id, "disabled principal rejected");
            return EnforcementVerdict::Rejected(GatewayError::UserDisabled);
        }

        let Some(rule) = self
            .rules
            .iter()
            .find(|rule| rule.matches(&request.method, request.path))
        else {
            // No rule: the route needs no policy decision beyond
            // authentication and status.
            return EnforcementVerdict::Allowed(principal);
        };

        let authz_request = AuthorizationRequest {
            principal: principal.clone(),
            action: rule.action.clone(),
            resource: Resource::new(rule.resource_type.clone(), extract_resource_id(request.path)),
            context: serde_json::Map::new(),
        };

        let decision = self.decisions.authorize(&authz_request).await;
        match decision.outcome {
            Outcome::Allow => EnforcementVerdict::Allowed(principal),
            Outcome::Deny => {
                tracing::warn!(
                    principal_id = %principal.id,
                    action = %authz_request.action,
                    reasons = ?decision.reasons,
                    "request denied by policy"
                );
                EnforcementVerdict::Rejected(GatewayError::AuthorizationDenied)
            }
        }
    }
}
