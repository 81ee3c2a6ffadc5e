//! Bearer token authentication -> `Claims` in request extensions.
//!
//! This middleware never rejects a client. A missing, malformed, expired or
//! badly signed token just leaves the request anonymous; whether that is
//! acceptable is decided downstream (`middleware::role`, `Authenticated`).
//! The only failure is a server-side one: a verifier without a usable secret
//! answers 500.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::{self, Next},
    response::Response,
};
use tracing::{debug, error};

use crate::error::AppError;
use crate::services::auth::{Claims, TokenVerifier};

/// Authenticate every request routed through `router`.
///
/// ```ignore
/// let api = middleware::auth::apply(api::v1::routes(), verifier.clone());
/// ```
pub fn apply<S>(router: Router<S>, verifier: Arc<TokenVerifier>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(verifier, authenticate))
}

pub(crate) async fn authenticate(
    State(verifier): State<Arc<TokenVerifier>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Already authenticated further out in the stack.
    if req.extensions().get::<Claims>().is_some() {
        return Ok(next.run(req).await);
    }

    let Some(verified) = bearer_token(req.headers()).map(|token| verifier.verify(token)) else {
        return Ok(next.run(req).await);
    };

    match verified {
        Ok(claims) => {
            debug!(sub = %claims.sub, iss = %claims.iss, "bearer token accepted");
            req.extensions_mut().insert(claims);
        }
        Err(err) if err.is_config_fault() => {
            error!(error = %err, "token verifier is misconfigured");
            return Err(AppError::Internal);
        }
        Err(err) => {
            debug!(error = %err, "bearer token rejected, continuing unauthenticated");
        }
    }

    Ok(next.run(req).await)
}

/// `Authorization: <scheme> <token>` with a case-insensitive `bearer` scheme.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;

    let mut parts = value.split(' ');
    let scheme = parts.next()?;
    let token = parts.next()?;

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{Body, to_bytes},
        http::{HeaderValue, StatusCode},
        routing::get,
    };
    use tower::ServiceExt;

    use crate::extractors::RequestClaims;
    use crate::services::auth::TokenIssuer;

    const SECRET: &str = "somerandomstring";

    async fn whoami(RequestClaims(claims): RequestClaims) -> String {
        match claims {
            Some(c) => format!("authenticated:{}:{}", c.sub, c.iss),
            None => "unauthenticated".to_string(),
        }
    }

    fn app(secret: &str) -> Router {
        apply(
            Router::new().route("/", get(whoami)),
            Arc::new(TokenVerifier::new(secret)),
        )
    }

    async fn call(app: Router, authorization: Option<&str>) -> (StatusCode, String) {
        let mut req = axum::http::Request::builder().uri("/");
        if let Some(value) = authorization {
            req = req.header(header::AUTHORIZATION, value);
        }

        let res = app.oneshot(req.body(Body::empty()).unwrap()).await.unwrap();
        let status = res.status();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn token() -> String {
        TokenIssuer::new(SECRET, "example.com", 600)
            .issue("user", &[] as &[&str])
            .unwrap()
    }

    #[tokio::test]
    async fn no_header_is_unauthenticated() {
        let (status, body) = call(app(SECRET), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "unauthenticated");
    }

    #[tokio::test]
    async fn bad_token_is_unauthenticated() {
        let (status, body) = call(app(SECRET), Some("Bearer unimportant")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "unauthenticated");
    }

    #[tokio::test]
    async fn other_schemes_are_ignored() {
        let basic = format!("Basic {}", token());
        let (status, body) = call(app(SECRET), Some(&basic)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "unauthenticated");

        let (_, body) = call(app(SECRET), Some("Bearer")).await;
        assert_eq!(body, "unauthenticated");
    }

    #[tokio::test]
    async fn valid_token_is_authenticated() {
        let header = format!("Bearer {}", token());
        let (status, body) = call(app(SECRET), Some(&header)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "authenticated:user:example.com");
    }

    #[tokio::test]
    async fn scheme_is_case_insensitive() {
        let header = format!("bEaReR {}", token());
        let (_, body) = call(app(SECRET), Some(&header)).await;
        assert_eq!(body, "authenticated:user:example.com");
    }

    #[tokio::test]
    async fn empty_secret_is_a_server_error() {
        let header = format!("Bearer {}", token());
        let (status, _) = call(app(""), Some(&header)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        // No token, nothing to verify.
        let (status, _) = call(app(""), None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn outer_authentication_is_reused() {
        // The inner verifier has no key: verifying again would answer 500.
        let guarded = crate::middleware::role::apply(
            Router::new().route("/", get(whoami)),
            Arc::new(TokenVerifier::new("")),
            ["admin"],
        );
        let app = apply(guarded, Arc::new(TokenVerifier::new(SECRET)));

        let admin = TokenIssuer::new(SECRET, "example.com", 600)
            .issue("user", &["admin"])
            .unwrap();
        let (status, body) = call(app.clone(), Some(&format!("Bearer {admin}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "authenticated:user:example.com");

        let (status, _) = call(app, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers), Some("abc.def"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer  abc"));
        assert_eq!(bearer_token(&headers), None);

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Token abc"));
        assert_eq!(bearer_token(&headers), None);
    }
}
