//! Request-filtering middleware for axum: bearer authentication, CORS,
//! language negotiation, maintenance gating and role-based access control.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod services;
pub mod state;

pub use error::AppError;
pub use extractors::{Authenticated, RequestClaims, RequestLang};
pub use middleware::cors::CorsOptions;
pub use services::auth::{Claims, TokenIssuer, TokenVerifier, VerifyError};
pub use services::lang::{LanguageMatcher, LanguageTag};
pub use services::maintenance::MaintenanceProbe;
