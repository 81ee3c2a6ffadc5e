use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use thiserror::Error;

use super::claims::Claims;

/// Errors returned by token verification and issuance.
///
/// `InvalidSecretKey` is a server configuration fault. Everything else means
/// the presented token is unusable.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("invalid secret key")]
    InvalidSecretKey,

    #[error("jwt verification failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl VerifyError {
    pub fn is_config_fault(&self) -> bool {
        matches!(self, Self::InvalidSecretKey)
    }
}

/// HS256 bearer-token verifier keyed by a shared secret.
///
/// - Key material is intentionally not printable via Debug.
/// - An empty secret is accepted at construction and reported on every
///   `verify` call, so a misconfigured server answers 500 instead of silently
///   treating everyone as anonymous.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: Option<DecodingKey>,
    validation: Validation,
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("has_key", &self.decoding_key.is_some())
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(secret_key: &str) -> Self {
        let decoding_key =
            (!secret_key.is_empty()).then(|| DecodingKey::from_secret(secret_key.as_bytes()));

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub", "iss"]);
        validation.leeway = 0;

        Self {
            decoding_key,
            validation,
        }
    }

    /// Only accept tokens whose `iss` is one of `issuers`.
    pub fn with_issuers(mut self, issuers: &[&str]) -> Self {
        self.validation.set_issuer(issuers);
        self
    }

    /// Allowed clock skew for `exp`, seconds.
    pub fn with_leeway(mut self, seconds: u64) -> Self {
        self.validation.leeway = seconds;
        self
    }

    pub fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        let key = self
            .decoding_key
            .as_ref()
            .ok_or(VerifyError::InvalidSecretKey)?;

        let data = jsonwebtoken::decode::<Claims>(token, key, &self.validation)?;
        Ok(data.claims)
    }
}
