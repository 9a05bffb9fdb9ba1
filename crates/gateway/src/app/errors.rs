//! Rejection bodies in the gateway's error envelope shape.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use warden_core::{ErrorEnvelope, GatewayError};

/// Renders any gateway error as its status code plus the standard envelope.
pub fn error_response(error: &GatewayError) -> Response {
    let status = StatusCode::from_u16(error.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorEnvelope::from(error))).into_response()
}
