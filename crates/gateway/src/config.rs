//! Runtime configuration, read once at startup from `WARDEN_*` variables.

use std::env;
use std::time::Duration;

use warden_authz::{DEFAULT_DECISION_TTL, DEFAULT_STATUS_TTL};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_ISSUER: &str = "http://localhost:9000";
const DEFAULT_DIRECTORY_URL: &str = "http://localhost:9001";
const DEFAULT_POLICY_ENGINE_URL: &str = "http://localhost:9002";
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_addr: String,
    /// Expected `iss` claim; tokens minted by anyone else are rejected.
    pub issuer: String,
    pub jwks_url: String,
    pub directory_url: String,
    pub policy_engine_url: String,
    /// When unset, decisions and statuses live in the in-process store.
    pub redis_url: Option<String>,
    pub status_ttl: Duration,
    pub decision_ttl: Duration,
    /// Upper bound on each outbound directory / policy-engine / JWKS call.
    pub call_timeout: Duration,
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let issuer = env::var("WARDEN_ISSUER").unwrap_or_else(|_| {
            tracing::warn!("WARDEN_ISSUER not set, using local development issuer");
            DEFAULT_ISSUER.to_string()
        });
        let jwks_url = env::var("WARDEN_JWKS_URL")
            .unwrap_or_else(|_| format!("{}/.well-known/jwks.json", issuer.trim_end_matches('/')));

        Self {
            bind_addr: env::var("WARDEN_BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            issuer,
            jwks_url,
            directory_url: env::var("WARDEN_DIRECTORY_URL")
                .unwrap_or_else(|_| DEFAULT_DIRECTORY_URL.to_string()),
            policy_engine_url: env::var("WARDEN_POLICY_ENGINE_URL")
                .unwrap_or_else(|_| DEFAULT_POLICY_ENGINE_URL.to_string()),
            redis_url: env::var("WARDEN_REDIS_URL").ok(),
            status_ttl: env_secs("WARDEN_STATUS_TTL_SECONDS").unwrap_or(DEFAULT_STATUS_TTL),
            decision_ttl: env_secs("WARDEN_DECISION_TTL_SECONDS").unwrap_or(DEFAULT_DECISION_TTL),
            call_timeout: env_secs("WARDEN_CALL_TIMEOUT_SECONDS").unwrap_or(DEFAULT_CALL_TIMEOUT),
        }
    }
}

fn env_secs(name: &str) -> Option<Duration> {
    let raw = env::var(name).ok()?;
    match raw.parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(_) => {
            tracing::warn!(%name, %raw, "ignoring non-numeric duration override");
            None
        }
    }
}
