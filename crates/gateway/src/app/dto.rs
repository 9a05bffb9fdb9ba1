//! Request bodies for the authorization endpoints.
//!
//! These are deliberately looser than the core types: principal type and
//! context are optional on the wire, and action-shape validation is left to
//! the evaluator so batch items can fail individually.

use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use warden_core::{
    Action, AuthorizationRequest, GatewayError, Principal, PrincipalId, PrincipalType, Resource,
};

#[derive(Debug, Deserialize)]
pub struct PrincipalBody {
    pub id: String,
    #[serde(rename = "type")]
    pub principal_type: Option<String>,
    #[serde(default)]
    pub attributes: Map<String, JsonValue>,
}

#[derive(Debug, Deserialize)]
pub struct ResourceBody {
    #[serde(rename = "type")]
    pub resource_type: String,
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeBody {
    pub principal: PrincipalBody,
    pub action: String,
    pub resource: ResourceBody,
    #[serde(default)]
    pub context: Map<String, JsonValue>,
}

#[derive(Debug, Deserialize)]
pub struct BatchBody {
    pub items: Vec<AuthorizeBody>,
}

#[derive(Debug, Deserialize)]
pub struct EnforceBody {
    pub method: String,
    pub path: String,
}

fn parse_principal_type(raw: Option<&str>) -> Result<PrincipalType, GatewayError> {
    match raw {
        None | Some("User") => Ok(PrincipalType::User),
        Some("ServiceRole") => Ok(PrincipalType::ServiceRole),
        Some(other) => Err(GatewayError::validation(format!(
            "unknown principal type {other:?}"
        ))),
    }
}

impl AuthorizeBody {
    /// Converts to the internal request without validating action shape.
    /// Unknown principal types are rejected here, for batch and single alike.
    pub fn build(self) -> Result<AuthorizationRequest, GatewayError> {
        let principal_type = parse_principal_type(self.principal.principal_type.as_deref())?;
        Ok(AuthorizationRequest {
            principal: Principal::new(
                PrincipalId::new(self.principal.id),
                principal_type,
                self.principal.attributes,
                Map::new(),
            ),
            action: Action::new(self.action),
            resource: Resource::new(self.resource.resource_type, self.resource.id),
            context: self.context,
        })
    }

    /// Full conversion for the single-decision endpoint: shape errors are
    /// a wholesale rejection there.
    pub fn into_request(self) -> Result<AuthorizationRequest, GatewayError> {
        let request = self.build()?;
        request.validate()?;
        Ok(request)
    }
}
