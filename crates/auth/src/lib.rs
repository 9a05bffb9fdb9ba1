//! `warden-auth` — bearer-token verification against a rotating key set.
//!
//! Verifies signature, expiry, issuer, and required identity claims, and
//! turns a trusted token into a [`warden_core::Principal`]. Key material is
//! fetched lazily from the issuer's published key endpoint and cached by key
//! id; an unknown key id triggers at most one wholesale refresh per process.

pub mod error;
pub mod keys;
pub mod validator;

pub use error::TokenError;
pub use keys::{HttpKeyEndpoint, KeyEndpoint, KeyEndpointError, KeySetCache};
pub use validator::{TokenValidator, TokenVerifier};
