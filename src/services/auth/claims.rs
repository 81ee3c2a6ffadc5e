use serde::{Deserialize, Serialize};

/// Bearer token claims.
///
/// Only `sub`, `iss` and `exp` are required on the wire. `roles` defaults to
/// an empty list so tokens issued without roles still decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iss: String,

    #[serde(default)]
    pub roles: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    pub exp: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    pub fn subject(&self) -> &str {
        &self.sub
    }

    pub fn issuer(&self) -> &str {
        &self.iss
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// True when at least one of `roles` is held. An empty slice never matches.
    pub fn has_any_role<R: AsRef<str>>(&self, roles: &[R]) -> bool {
        roles.iter().any(|role| self.has_role(role.as_ref()))
    }
}
