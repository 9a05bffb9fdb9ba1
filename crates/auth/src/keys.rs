//! Signing-key resolution with on-miss refresh.
//!
//! Keys are fetched from the issuer's published key endpoint and cached by
//! key id. A cache miss replaces the whole set (rotation is assumed additive
//! within the overlap window, so a merge is never needed); a key id still
//! absent after a refresh is remembered so one unknown kid costs one fetch
//! per process, not one per request.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::JwkSet;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::TokenError;

/// Public key material published by the issuer, indexed by key id.
pub type KeySet = HashMap<String, DecodingKey>;

#[derive(Debug, Error)]
pub enum KeyEndpointError {
    #[error("key endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("key set payload invalid: {0}")]
    InvalidPayload(String),
}

/// Issuer-published key endpoint.
#[async_trait]
pub trait KeyEndpoint: Send + Sync {
    /// Fetch the full current key set.
    async fn fetch_key_set(&self) -> Result<KeySet, KeyEndpointError>;
}

/// JWKS-over-HTTP key endpoint (`/.well-known/jwks.json` style).
pub struct HttpKeyEndpoint {
    client: reqwest::Client,
    url: String,
}

impl HttpKeyEndpoint {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl KeyEndpoint for HttpKeyEndpoint {
    async fn fetch_key_set(&self) -> Result<KeySet, KeyEndpointError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| KeyEndpointError::Unreachable(e.to_string()))?;

        let jwks: JwkSet = response
            .json()
            .await
            .map_err(|e| KeyEndpointError::InvalidPayload(e.to_string()))?;

        let mut keys = KeySet::new();
        for jwk in &jwks.keys {
            let Some(kid) = jwk.common.key_id.clone() else {
                tracing::warn!(url = %self.url, "skipping published key without a kid");
                continue;
            };

            match DecodingKey::from_jwk(jwk) {
                Ok(key) => {
                    keys.insert(kid, key);
                }
                Err(e) => {
                    tracing::warn!(kid = %kid, error = %e, "skipping unusable published key");
                }
            }
        }

        Ok(keys)
    }
}

/// Cache of the issuer's signing keys, keyed by key id.
pub struct KeySetCache {
    endpoint: Arc<dyn KeyEndpoint>,
    fetch_timeout: Duration,
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    keys: KeySet,
    /// Kids that stayed absent after a successful refresh. A kid in here
    /// fails fast instead of re-fetching on every request carrying it.
    unresolved: HashSet<String>,
}

impl KeySetCache {
    pub fn new(endpoint: Arc<dyn KeyEndpoint>, fetch_timeout: Duration) -> Self {
        Self {
            endpoint,
            fetch_timeout,
            inner: RwLock::new(Inner::default()),
        }
    }

    /// Resolve the signing key for `kid`, refreshing the set on miss.
    pub async fn resolve(&self, kid: &str) -> Result<DecodingKey, TokenError> {
        {
            let inner = self.inner.read().await;
            if let Some(key) = inner.keys.get(kid) {
                return Ok(key.clone());
            }
            if inner.unresolved.contains(kid) {
                return Err(TokenError::KeyResolution(kid.to_string()));
            }
        }

        // Holding the write lock across the fetch serializes concurrent
        // refreshes; waiters re-check the refreshed set below.
        let mut inner = self.inner.write().await;
        if let Some(key) = inner.keys.get(kid) {
            return Ok(key.clone());
        }
        if inner.unresolved.contains(kid) {
            return Err(TokenError::KeyResolution(kid.to_string()));
        }

        let fetched = tokio::time::timeout(self.fetch_timeout, self.endpoint.fetch_key_set()).await;
        let keys = match fetched {
            Ok(Ok(keys)) => keys,
            Ok(Err(e)) => {
                // Transient endpoint failure: not recorded as unresolved, so
                // the next request carrying this kid retries the fetch.
                tracing::error!(kid = %kid, error = %e, "key set fetch failed");
                return Err(TokenError::KeyResolution(kid.to_string()));
            }
            Err(_) => {
                tracing::error!(kid = %kid, "key set fetch timed out");
                return Err(TokenError::KeyResolution(kid.to_string()));
            }
        };

        // Wholesale replace, never merge.
        inner.unresolved.retain(|k| !keys.contains_key(k));
        inner.keys = keys;

        match inner.keys.get(kid) {
            Some(key) => Ok(key.clone()),
            None => {
                inner.unresolved.insert(kid.to_string());
                Err(TokenError::KeyResolution(kid.to_string()))
            }
        }
    }
}
