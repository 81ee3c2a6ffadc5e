pub mod claims;
pub mod issuer;
pub mod verifier;

pub use claims::Claims;
pub use issuer::TokenIssuer;
pub use verifier::{TokenVerifier, VerifyError};
