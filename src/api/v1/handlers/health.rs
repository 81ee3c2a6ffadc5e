/*
 * Responsibility
 * - GET /api/v1/health (goes through every v1 filter, unlike the root /health)
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::extractors::RequestLang;

pub async fn health(RequestLang(lang): RequestLang) -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok", "lang": lang.as_str() })))
}
