//! Gateway error model.
//!
//! A single closed enum carries every caller-visible failure, with its wire
//! code, HTTP status, and retry metadata as data rather than scattered
//! constants. The boundary layer matches it exhaustively when building the
//! error envelope.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// Caller-visible gateway failure.
///
/// Only authentication and request-validation failures are distinguishable
/// from a deny: every authorization-path dependency failure converges to
/// `AuthorizationDenied` (or `UserDisabled`) before it reaches this type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// No bearer credentials were presented.
    #[error("authentication required")]
    AuthenticationRequired,

    /// The token was valid once, but its expiry has passed.
    #[error("access token has expired")]
    TokenExpired,

    /// The token is malformed, mis-signed, or missing required claims.
    #[error("invalid token: {0}")]
    TokenInvalid(String),

    /// The authenticated principal's account is disabled.
    #[error("user account is disabled")]
    UserDisabled,

    /// The policy decision for this request was DENY.
    #[error("not authorized to perform this action")]
    AuthorizationDenied,

    /// The request body/shape failed validation.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// A collaborator the caller depends on directly is unreachable.
    #[error("dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// The caller is being throttled.
    #[error("rate limit exceeded")]
    RateLimitExceeded { retry_after_seconds: u64 },
}

impl GatewayError {
    /// Stable wire code for the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "AUTHENTICATION_REQUIRED",
            Self::TokenExpired => "TOKEN_EXPIRED",
            Self::TokenInvalid(_) => "TOKEN_INVALID",
            Self::UserDisabled => "USER_DISABLED",
            Self::AuthorizationDenied => "AUTHORIZATION_DENIED",
            Self::ValidationFailed(_) => "VALIDATION_FAILED",
            Self::DependencyUnavailable(_) => "DEPENDENCY_UNAVAILABLE",
            Self::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
        }
    }

    /// HTTP status the boundary layer should answer with.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::AuthenticationRequired | Self::TokenExpired | Self::TokenInvalid(_) => 401,
            Self::UserDisabled | Self::AuthorizationDenied => 403,
            Self::ValidationFailed(_) => 422,
            Self::DependencyUnavailable(_) => 503,
            Self::RateLimitExceeded { .. } => 429,
        }
    }

    pub fn retryable(&self) -> bool {
        matches!(
            self,
            Self::DependencyUnavailable(_) | Self::RateLimitExceeded { .. }
        )
    }

    pub fn retry_after_seconds(&self) -> Option<u64> {
        match self {
            Self::RateLimitExceeded { retry_after_seconds } => Some(*retry_after_seconds),
            _ => None,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationFailed(msg.into())
    }
}

/// Wire shape surfaced to callers for every rejection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
    pub retry: RetryAdvice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(default)]
    pub details: Map<String, JsonValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryAdvice {
    pub retryable: bool,
    pub retry_after_seconds: Option<u64>,
}

impl From<&GatewayError> for ErrorEnvelope {
    fn from(err: &GatewayError) -> Self {
        Self {
            error: ErrorBody {
                code: err.code().to_string(),
                message: err.to_string(),
                details: Map::new(),
            },
            retry: RetryAdvice {
                retryable: err.retryable(),
                retry_after_seconds: err.retry_after_seconds(),
            },
        }
    }
}
