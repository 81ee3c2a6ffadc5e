//! Role-based access control on top of bearer authentication.
//!
//! `apply` takes the `TokenVerifier` and installs the authenticator outside the
//! role check itself, so a protected route can never be mounted without claims
//! being resolved first. Any one of the listed roles is enough.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
};
use tracing::debug;

use crate::error::AppError;
use crate::middleware::auth::authenticate;
use crate::services::auth::{Claims, TokenVerifier};

/// Restrict the routes of `router` to callers holding at least one of `roles`.
///
/// - no roles: no restriction (claims are still resolved when a token is sent)
/// - no valid token: 401
/// - token without a matching role: 403
pub fn apply<S, I, R>(router: Router<S>, verifier: Arc<TokenVerifier>, roles: I) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
    I: IntoIterator<Item = R>,
    R: Into<String>,
{
    let roles: Arc<[String]> = roles.into_iter().map(Into::into).collect();

    router
        .route_layer(middleware::from_fn_with_state(roles, require_roles))
        .route_layer(middleware::from_fn_with_state(verifier, authenticate))
}

async fn require_roles(
    State(roles): State<Arc<[String]>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if roles.is_empty() {
        return Ok(next.run(req).await);
    }

    let Some(claims) = req.extensions().get::<Claims>() else {
        return Err(AppError::Unauthorized);
    };

    if !claims.has_any_role(&roles[..]) {
        debug!(sub = %claims.sub, required = ?roles, "no matching role");
        return Err(AppError::Forbidden);
    }

    Ok(next.run(req).await)
}
