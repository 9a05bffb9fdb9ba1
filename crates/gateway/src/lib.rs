//! `warden-gateway` — the enforcement surface in front of protected APIs.
//!
//! Composes token verification, status enforcement, route-to-action mapping,
//! and decision orchestration into one allow/deny verdict per request, and
//! exposes that pipeline over HTTP (forward-auth endpoint, direct authorize
//! endpoints, cache administration).

pub mod app;
pub mod clients;
pub mod config;
pub mod middleware;
pub mod pipeline;

pub use config::GatewayConfig;
pub use pipeline::{EnforcementPipeline, EnforcementVerdict, InboundRequest, RouteRule};
