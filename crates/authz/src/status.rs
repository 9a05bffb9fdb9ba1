//! Account-status enforcement with a short-TTL cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use warden_core::PrincipalId;

use crate::store::CacheStore;
use crate::DirectoryError;

/// Default TTL for cached status lookups.
pub const DEFAULT_STATUS_TTL: Duration = Duration::from_secs(30);

const ENABLED: &str = "enabled";
const DISABLED: &str = "disabled";

/// Current account state as reported by the identity directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrincipalStatus {
    pub enabled: bool,
}

/// Identity directory collaborator (the credential system of record).
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn get_status(&self, principal_id: &PrincipalId)
        -> Result<PrincipalStatus, DirectoryError>;
}

/// Short-TTL cache of principal enabled/disabled state.
///
/// A valid token is not enough: a principal disabled after token issuance
/// must be locked out within one TTL window. Directory trouble fails closed
/// to "disabled" and is deliberately NOT cached, so the next request retries
/// the directory instead of pinning a false negative for the whole window.
pub struct StatusCache {
    store: Arc<dyn CacheStore>,
    directory: Arc<dyn IdentityDirectory>,
    ttl: Duration,
    call_timeout: Duration,
}

impl StatusCache {
    pub fn new(
        store: Arc<dyn CacheStore>,
        directory: Arc<dyn IdentityDirectory>,
        ttl: Duration,
        call_timeout: Duration,
    ) -> Self {
        Self {
            store,
            directory,
            ttl,
            call_timeout,
        }
    }

    fn cache_key(principal_id: &PrincipalId) -> String {
        format!("user_status:{principal_id}")
    }

    /// Whether the principal's account is currently enabled.
    pub async fn is_enabled(&self, principal_id: &PrincipalId) -> bool {
        let key = Self::cache_key(principal_id);

        match self.store.get(&key).await {
            Ok(Some(cached)) => return cached == ENABLED,
            Ok(None) => {}
            Err(e) => {
                // Store trouble degrades to a miss; the directory still decides.
                tracing::warn!(principal_id = %principal_id, error = %e, "status cache read failed");
            }
        }

        let status =
            match tokio::time::timeout(self.call_timeout, self.directory.get_status(principal_id))
                .await
            {
                Ok(Ok(status)) => status,
                Ok(Err(e)) => {
                    tracing::error!(principal_id = %principal_id, error = %e, "status lookup failed, failing closed");
                    return false;
                }
                Err(_) => {
                    tracing::error!(principal_id = %principal_id, "status lookup timed out, failing closed");
                    return false;
                }
            };

        let value = if status.enabled { ENABLED } else { DISABLED };
        if let Err(e) = self.store.set(&key, value, self.ttl).await {
            tracing::warn!(principal_id = %principal_id, error = %e, "status cache write failed");
        }

        status.enabled
    }
}
