//! `warden-core` — data model and error taxonomy for the enforcement gateway.
//!
//! This crate is intentionally decoupled from HTTP, token parsing, and cache
//! backends: it defines the vocabulary the other crates speak (principals,
//! authorization requests, decisions) and the closed error type the boundary
//! layer maps to wire envelopes.

pub mod decision;
pub mod error;
pub mod principal;
pub mod request;

pub use decision::{BatchItemError, BatchOutcome, Decision, Outcome};
pub use error::{ErrorBody, ErrorEnvelope, GatewayError, RetryAdvice};
pub use principal::{Principal, PrincipalId, PrincipalType};
pub use request::{Action, AuthorizationRequest, Resource, SELF_RESOURCE_ID};
