use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::{GatewayError, Principal};

/// Sentinel resource id meaning "the caller's own record".
pub const SELF_RESOURCE_ID: &str = "self";

/// Action identifier in `ResourceType:verb` form (e.g. `User:read`).
///
/// Kept as an opaque validated string rather than an enum so the policy
/// engine, not the gateway, owns the action vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Action(String);

impl Action {
    pub fn new(action: impl Into<String>) -> Self {
        Self(action.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check the `ResourceType:verb` shape (both halves non-empty).
    pub fn validate(&self) -> Result<(), GatewayError> {
        match self.0.split_once(':') {
            Some((resource_type, verb)) if !resource_type.is_empty() && !verb.is_empty() => Ok(()),
            _ => Err(GatewayError::validation(format!(
                "action '{}' must have the form ResourceType:verb",
                self.0
            ))),
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The entity an action targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Resource of the given type addressing the caller's own record.
    pub fn self_of(resource_type: impl Into<String>) -> Self {
        Self::new(resource_type, SELF_RESOURCE_ID)
    }
}

/// One authorization question: may `principal` perform `action` on `resource`?
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub principal: Principal,
    pub action: Action,
    pub resource: Resource,
    #[serde(default)]
    pub context: Map<String, JsonValue>,
}

impl AuthorizationRequest {
    /// Deterministic decision-cache key.
    ///
    /// Field order is fixed; the same logical request always maps to the
    /// same key, and all keys for one principal share the
    /// `authz:{principal_id}:` prefix used for targeted invalidation.
    pub fn cache_key(&self) -> String {
        format!(
            "authz:{}:{}:{}:{}",
            self.principal.id, self.action, self.resource.resource_type, self.resource.id
        )
    }

    /// Shape validation for externally supplied requests.
    pub fn validate(&self) -> Result<(), GatewayError> {
        self.action.validate()?;
        if self.principal.id.as_str().is_empty() {
            return Err(GatewayError::validation("principal id must not be empty"));
        }
        if self.resource.resource_type.is_empty() {
            return Err(GatewayError::validation("resource type must not be empty"));
        }
        if self.resource.id.is_empty() {
            return Err(GatewayError::validation("resource id must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::{PrincipalId, PrincipalType};

    fn request(principal_id: &str, action: &str, rtype: &str, rid: &str) -> AuthorizationRequest {
        AuthorizationRequest {
            principal: Principal::new(
                PrincipalId::new(principal_id),
                PrincipalType::User,
                Map::new(),
                Map::new(),
            ),
            action: Action::new(action),
            resource: Resource::new(rtype, rid),
            context: Map::new(),
        }
    }

    #[test]
    fn cache_key_has_fixed_field_order() {
        let req = request("u1", "User:read", "User", "u2");
        assert_eq!(req.cache_key(), "authz:u1:User:read:User:u2");
    }

    #[test]
    fn self_sentinel_flows_into_the_key() {
        let req = request("u1", "User:read", "User", SELF_RESOURCE_ID);
        assert_eq!(req.cache_key(), "authz:u1:User:read:User:self");
    }

    #[test]
    fn action_shape_is_validated() {
        assert!(Action::new("User:read").validate().is_ok());
        assert!(Action::new("User:").validate().is_err());
        assert!(Action::new(":read").validate().is_err());
        assert!(Action::new("read").validate().is_err());
        assert!(Action::new("").validate().is_err());
    }

    #[test]
    fn request_validation_rejects_empty_fields() {
        assert!(request("u1", "User:read", "User", "u2").validate().is_ok());
        assert!(request("", "User:read", "User", "u2").validate().is_err());
        assert!(request("u1", "User:read", "", "u2").validate().is_err());
        assert!(request("u1", "User:read", "User", "").validate().is_err());
    }

    proptest! {
        #[test]
        fn cache_key_is_deterministic(
            pid in "[a-z0-9-]{1,32}",
            rtype in "[A-Za-z]{1,16}",
            verb in "[a-z]{1,16}",
            rid in "[a-z0-9-]{1,32}",
        ) {
            let action = format!("{rtype}:{verb}");
            let a = request(&pid, &action, &rtype, &rid);
            let b = request(&pid, &action, &rtype, &rid);
            prop_assert_eq!(a.cache_key(), b.cache_key());
        }

        #[test]
        fn cache_key_starts_with_principal_prefix(
            pid in "[a-z0-9-]{1,32}",
            rtype in "[A-Za-z]{1,16}",
            verb in "[a-z]{1,16}",
            rid in "[a-z0-9-]{1,32}",
        ) {
            let action = format!("{rtype}:{verb}");
            let req = request(&pid, &action, &rtype, &rid);
            let prefix = format!("authz:{pid}:");
            prop_assert!(req.cache_key().starts_with(&prefix));
        }
    }
}
