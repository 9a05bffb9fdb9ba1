use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Stable subject identifier of an authenticated principal.
///
/// Opaque at this layer: the token issuer decides its shape (typically a
/// UUID), the gateway only ever compares and embeds it in cache keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// What kind of actor the token represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PrincipalType {
    /// A human end user.
    #[default]
    User,
    /// A machine caller acting under a service role.
    ServiceRole,
}

impl PrincipalType {
    /// Parse the type claim carried in tokens ("user" / "service_role").
    pub fn from_claim(value: &str) -> Self {
        match value {
            "service_role" | "service" => Self::ServiceRole,
            _ => Self::User,
        }
    }
}

/// The authenticated actor behind a request.
///
/// Constructed once from a verified token and never mutated afterwards:
/// `attributes` feed ABAC context to the policy engine, `claims` keep the
/// raw verified claim set for observability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    #[serde(rename = "type")]
    pub principal_type: PrincipalType,
    #[serde(default)]
    pub attributes: Map<String, JsonValue>,
    #[serde(default)]
    pub claims: Map<String, JsonValue>,
}

impl Principal {
    pub fn new(
        id: PrincipalId,
        principal_type: PrincipalType,
        attributes: Map<String, JsonValue>,
        claims: Map<String, JsonValue>,
    ) -> Self {
        Self {
            id,
            principal_type,
            attributes,
            claims,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_type_from_claim() {
        assert_eq!(PrincipalType::from_claim("end_user"), PrincipalType::User);
        assert_eq!(
            PrincipalType::from_claim("service_role"),
            PrincipalType::ServiceRole
        );
        assert_eq!(PrincipalType::from_claim("admin"), PrincipalType::User);
    }

    #[test]
    fn principal_id_is_transparent_in_json() {
        let id = PrincipalId::new("u-123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"u-123\"");
    }
}
