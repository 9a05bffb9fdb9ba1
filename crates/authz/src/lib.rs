//! `warden-authz` — account-status and policy-decision enforcement.
//!
//! Everything here is fail-closed: a directory error reads as "disabled", a
//! policy-engine error reads as DENY, and a cache error degrades to a miss.
//! Cross-request state lives only in the injected [`CacheStore`]; the
//! collaborator traits ([`IdentityDirectory`], [`PolicyEngineClient`]) are
//! the substitution seams for tests and deployment wiring.

pub mod batch;
pub mod decision;
pub mod error;
#[cfg(feature = "redis")]
pub mod redis_store;
pub mod status;
pub mod store;

pub use batch::{BatchEvaluator, MAX_BATCH_ITEMS};
pub use decision::{DEFAULT_DECISION_TTL, DecisionOrchestrator, PolicyEngineClient};
pub use error::{CacheStoreError, DirectoryError, PolicyEngineError};
#[cfg(feature = "redis")]
pub use redis_store::RedisCacheStore;
pub use status::{DEFAULT_STATUS_TTL, IdentityDirectory, PrincipalStatus, StatusCache};
pub use store::{CacheStore, InMemoryCacheStore};
