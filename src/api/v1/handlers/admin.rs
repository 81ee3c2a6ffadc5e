/*
 * Responsibility
 * - GET /api/v1/admin (role-protected in routes.rs)
 */
use axum::Json;
use serde_json::{Value, json};

use crate::extractors::Authenticated;

pub async fn admin(Authenticated(claims): Authenticated) -> Json<Value> {
    Json(json!({
        "subject": claims.sub,
        "roles": claims.roles,
    }))
}
