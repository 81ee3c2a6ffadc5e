/*
 * Responsibility
 * - v1 URL structure
 * - /health and /me are open; /admin is restricted to the configured admin roles
 */
use axum::{Router, routing::get};

use crate::middleware;
use crate::state::AppState;

use crate::api::v1::handlers::{admin::admin, health::health, me::me};

pub fn routes(state: &AppState) -> Router<AppState> {
    let admin_routes = middleware::role::apply(
        Router::new().route("/admin", get(admin)),
        state.verifier.clone(),
        state.admin_roles.iter().cloned(),
    );

    Router::new()
        .route("/health", get(health))
        .route("/me", get(me))
        .merge(admin_routes)
}
