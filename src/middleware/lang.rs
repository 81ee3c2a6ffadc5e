//! `Accept-Language` negotiation -> `LanguageTag` in request extensions.
//!
//! Never rejects. Handlers read the tag through `extractors::RequestLang`.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::{self, Next},
    response::Response,
};
use tracing::trace;

use crate::services::lang::LanguageMatcher;

pub fn apply<S>(router: Router<S>, matcher: LanguageMatcher) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(
        Arc::new(matcher),
        negotiate_language,
    ))
}

async fn negotiate_language(
    State(matcher): State<Arc<LanguageMatcher>>,
    mut req: Request,
    next: Next,
) -> Response {
    let accept = req
        .headers()
        .get(header::ACCEPT_LANGUAGE)
        .and_then(|v| v.to_str().ok());
    let tag = matcher.negotiate(accept);
    trace!(lang = %tag, "negotiated language");

    req.extensions_mut().insert(tag.clone());
    let mut res = next.run(req).await;

    if !res.headers().contains_key(header::CONTENT_LANGUAGE) {
        if let Ok(value) = HeaderValue::from_str(tag.as_str()) {
            res.headers_mut().insert(header::CONTENT_LANGUAGE, value);
        }
    }

    res
}
