/*
 * Responsibility
 * - GET /api/v1/me
 * - Report what the filters resolved for this request: claims (if any) and language
 */
use axum::Json;
use serde::Serialize;

use crate::extractors::{RequestClaims, RequestLang};

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    pub roles: Vec<String>,
    pub lang: String,
}

pub async fn me(
    RequestClaims(claims): RequestClaims,
    RequestLang(lang): RequestLang,
) -> Json<MeResponse> {
    let lang = lang.to_string();

    let res = match claims {
        Some(claims) => MeResponse {
            authenticated: true,
            subject: Some(claims.sub),
            issuer: Some(claims.iss),
            roles: claims.roles,
            lang,
        },
        None => MeResponse {
            authenticated: false,
            subject: None,
            issuer: None,
            roles: Vec::new(),
            lang,
        },
    };

    Json(res)
}
