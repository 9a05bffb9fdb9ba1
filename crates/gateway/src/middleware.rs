//! Request enforcement as an axum middleware layer.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::app::{AppState, error_response};
use crate::pipeline::{EnforcementVerdict, InboundRequest};

/// Pulls the token out of the `Authorization` header, if present and well
/// formed.
pub(crate) fn extract_bearer(request: &Request) -> Option<&str> {
    let header = request.headers().get(axum::http::header::AUTHORIZATION)?;
    let value = header.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() { None } else { Some(token) }
}

/// Runs the enforcement pipeline before every protected handler. On success
/// the verified `Principal` is attached as a request extension.
pub async fn enforcement_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let verdict = {
        let inbound = InboundRequest {
            method: request.method().clone(),
            path: request.uri().path(),
            bearer: extract_bearer(&request),
        };
        state.pipeline.enforce(&inbound).await
    };

    match verdict {
        EnforcementVerdict::Allowed(principal) => {
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        EnforcementVerdict::Rejected(error) => error_response(&error),
    }
}
