//! HTTP clients for the identity directory and the policy engine.
//!
//! Both translate transport and server failures into the coarse error
//! variants the caches key their fail-closed behavior on.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use warden_authz::{
    DirectoryError, IdentityDirectory, PolicyEngineClient, PolicyEngineError, PrincipalStatus,
};
use warden_core::{AuthorizationRequest, Decision, PrincipalId};

/// Looks up account status at `GET {base}/v1/principals/{id}/status`.
pub struct HttpIdentityDirectory {
    http: reqwest::Client,
    base_url: String,
}

impl HttpIdentityDirectory {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[derive(Deserialize)]
struct StatusPayload {
    enabled: bool,
}

#[async_trait]
impl IdentityDirectory for HttpIdentityDirectory {
    async fn get_status(&self, principal_id: &PrincipalId) -> Result<PrincipalStatus, DirectoryError> {
        let url = format!(
            "{}/v1/principals/{}/status",
            self.base_url.trim_end_matches('/'),
            principal_id
        );
        let response = self.http.get(&url).send().await.map_err(|e| {
            tracing::warn!(error = %e, "identity directory unreachable");
            DirectoryError::Unavailable(e.to_string())
        })?;

        match response.status() {
            StatusCode::NOT_FOUND => Err(DirectoryError::NotFound),
            status if status.is_success() => {
                let payload: StatusPayload = response
                    .json()
                    .await
                    .map_err(|e| DirectoryError::Unavailable(e.to_string()))?;
                Ok(PrincipalStatus {
                    enabled: payload.enabled,
                })
            }
            status => {
                tracing::warn!(%status, "identity directory returned an error status");
                Err(DirectoryError::Unavailable(format!("status {status}")))
            }
        }
    }
}

/// Evaluates policy at `POST {base}/v1/authorize`.
pub struct HttpPolicyEngine {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPolicyEngine {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl PolicyEngineClient for HttpPolicyEngine {
    async fn is_authorized(
        &self,
        request: &AuthorizationRequest,
    ) -> Result<Decision, PolicyEngineError> {
        let url = format!("{}/v1/authorize", self.base_url.trim_end_matches('/'));
        let response = self.http.post(&url).json(request).send().await.map_err(|e| {
            tracing::warn!(error = %e, "policy engine unreachable");
            PolicyEngineError::Unavailable(e.to_string())
        })?;

        match response.status() {
            StatusCode::UNPROCESSABLE_ENTITY => Err(PolicyEngineError::InvalidRequest(
                "request rejected by the engine".to_string(),
            )),
            StatusCode::NOT_FOUND => Err(PolicyEngineError::StoreNotFound(
                "policy store missing".to_string(),
            )),
            status if status.is_success() => response
                .json::<Decision>()
                .await
                .map_err(|e| PolicyEngineError::Unavailable(e.to_string())),
            status => {
                tracing::warn!(%status, "policy engine returned an error status");
                Err(PolicyEngineError::Unavailable(format!("status {status}")))
            }
        }
    }
}
