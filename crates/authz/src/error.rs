use thiserror::Error;

/// Failure talking to the shared cache store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheStoreError {
    #[error("cache store unavailable: {0}")]
    Unavailable(String),

    #[error("cache payload invalid: {0}")]
    InvalidPayload(String),
}

/// Failure from the identity directory collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("principal not found in directory")]
    NotFound,

    #[error("identity directory unavailable: {0}")]
    Unavailable(String),
}

/// Failure from the policy engine collaborator.
///
/// None of these escape the orchestrator: each maps to a fail-closed DENY
/// whose reason text preserves the failure class for observability.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyEngineError {
    #[error("policy engine unavailable: {0}")]
    Unavailable(String),

    #[error("policy engine rejected the request: {0}")]
    InvalidRequest(String),

    #[error("policy store not found: {0}")]
    StoreNotFound(String),
}
