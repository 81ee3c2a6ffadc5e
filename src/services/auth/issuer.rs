use jsonwebtoken::{Algorithm, EncodingKey, Header};
use tracing::error;
use uuid::Uuid;

use super::claims::Claims;
use super::verifier::VerifyError;

/// HS256 token issuer sharing the verifier's secret.
#[derive(Clone)]
pub struct TokenIssuer {
    issuer: String,
    ttl_seconds: u64,
    encoding_key: Option<EncodingKey>,
}

impl TokenIssuer {
    pub fn new(secret_key: &str, issuer: impl Into<String>, ttl_seconds: u64) -> Self {
        let encoding_key =
            (!secret_key.is_empty()).then(|| EncodingKey::from_secret(secret_key.as_bytes()));

        Self {
            issuer: issuer.into(),
            ttl_seconds,
            encoding_key,
        }
    }

    /// Issue a token for `subject` carrying `roles`.
    pub fn issue<R: AsRef<str>>(&self, subject: &str, roles: &[R]) -> Result<String, VerifyError> {
        let now = chrono::Utc::now().timestamp();
        let exp = now.saturating_add(i64::try_from(self.ttl_seconds).unwrap_or(i64::MAX));

        let claims = Claims {
            sub: subject.to_string(),
            iss: self.issuer.clone(),
            roles: roles.iter().map(|r| r.as_ref().to_string()).collect(),
            iat: Some(now),
            exp,
            jti: Some(Uuid::new_v4().to_string()),
        };

        self.sign(&claims)
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, VerifyError> {
        let key = self
            .encoding_key
            .as_ref()
            .ok_or(VerifyError::InvalidSecretKey)?;

        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());

        jsonwebtoken::encode(&header, claims, key).map_err(|e| {
            error!(error = %e, "failed to sign JWT");
            VerifyError::Jwt(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_secret_cannot_issue() {
        let err = TokenIssuer::new("", "example.com", 60)
            .issue("user", &["admin"])
            .unwrap_err();
        assert!(err.is_config_fault());
    }

    #[test]
    fn issued_token_has_three_segments() {
        let token = TokenIssuer::new("secret", "example.com", 60)
            .issue("user", &["admin"])
            .unwrap();
        assert_eq!(token.split('.').count(), 3);
    }
}
