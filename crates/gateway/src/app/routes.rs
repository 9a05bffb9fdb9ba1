use axum::Json;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Response};
use serde_json::json;

use warden_core::{GatewayError, Principal, PrincipalId};

use crate::pipeline::{EnforcementVerdict, InboundRequest};

use super::AppState;
use super::dto::{AuthorizeBody, BatchBody, EnforceBody};
use super::errors::error_response;

pub async fn health() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

/// Echoes the verified principal the middleware attached.
pub async fn whoami(axum::Extension(principal): axum::Extension<Principal>) -> Response {
    Json(principal).into_response()
}

/// Single policy decision, cache-first.
pub async fn authorize(State(state): State<AppState>, Json(body): Json<AuthorizeBody>) -> Response {
    let request = match body.into_request() {
        Ok(request) => request,
        Err(e) => return error_response(&e),
    };
    let decision = state.decisions.authorize(&request).await;
    Json(decision).into_response()
}

/// Batch of policy decisions; results are positional.
pub async fn authorize_batch(
    State(state): State<AppState>,
    Json(body): Json<BatchBody>,
) -> Response {
    let mut items = Vec::with_capacity(body.items.len());
    for (index, item) in body.items.into_iter().enumerate() {
        match item.build() {
            Ok(request) => items.push(request),
            Err(e) => {
                return error_response(&GatewayError::validation(format!("item {index}: {e}")));
            }
        }
    }

    match state.batch.evaluate(&items).await {
        Ok(results) => Json(json!({ "results": results })).into_response(),
        Err(e) => error_response(&e),
    }
}

/// Drops every cached decision for one principal.
pub async fn invalidate_principal(
    State(state): State<AppState>,
    Path(principal_id): Path<String>,
) -> Response {
    let principal_id = PrincipalId::new(principal_id);
    match state.decisions.invalidate_principal(&principal_id).await {
        Ok(deleted) => Json(json!({ "deleted": deleted })).into_response(),
        Err(e) => error_response(&GatewayError::DependencyUnavailable(e.to_string())),
    }
}

/// Drops the whole decision cache.
pub async fn flush_cache(State(state): State<AppState>) -> Response {
    match state.decisions.flush_all().await {
        Ok(deleted) => Json(json!({ "deleted": deleted })).into_response(),
        Err(e) => error_response(&GatewayError::DependencyUnavailable(e.to_string())),
    }
}

/// Forward-auth entry point: runs the pipeline for a described request
/// using the caller's own bearer token.
pub async fn enforce(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<EnforceBody>,
) -> Response {
    // Method tokens are case-sensitive and any token parses as an extension
    // method, so a lower-cased "get" from an un-normalizing proxy would slip
    // past the route rules. Canonicalize before matching.
    let Ok(method) = Method::try_from(body.method.to_ascii_uppercase().as_str()) else {
        return error_response(&GatewayError::validation(format!(
            "unknown HTTP method {:?}",
            body.method
        )));
    };

    let bearer = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let inbound = InboundRequest {
        method,
        path: &body.path,
        bearer,
    };

    match state.pipeline.enforce(&inbound).await {
        EnforcementVerdict::Allowed(principal) => Json(json!({
            "verdict": "ALLOWED",
            "principal_id": principal.id,
        }))
        .into_response(),
        EnforcementVerdict::Rejected(error) => error_response(&error),
    }
}
