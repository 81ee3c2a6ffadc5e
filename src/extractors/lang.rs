use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::services::lang::LanguageTag;

/// Negotiated response language. Falls back to English when
/// `middleware::lang` was not applied to the route.
#[derive(Debug, Clone)]
pub struct RequestLang(pub LanguageTag);

impl<S> FromRequestParts<S> for RequestLang
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let tag = parts
            .extensions
            .get::<LanguageTag>()
            .cloned()
            .unwrap_or_else(LanguageTag::english);
        Ok(Self(tag))
    }
}
