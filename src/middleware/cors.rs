//! CORS policy enforcement for browser clients.
//!
//! Note:
//! - CORS is enforced by browsers. Native mobile apps and server-to-server calls are not
//!   restricted by CORS, so requests without `Origin` are let through when the policy is
//!   permissive.
//! - Origins are matched exactly. Methods and headers are matched case-insensitively.
//! - Preflight (`OPTIONS`) is answered here with 204 and never reaches a handler.
//! - Request headers are only checked on preflight, and only with `strict_headers`.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::AppError;

/// CORS policy. Immutable once applied.
#[derive(Debug, Clone, Default)]
pub struct CorsOptions {
    /// Origins allowed to access resources on this server. Empty accepts any origin.
    pub origins: Vec<String>,
    pub methods: Vec<String>,
    pub headers: Vec<String>,
    /// Whether clients may send cookies or HTTP authentication.
    pub allow_credentials: bool,
    /// How long (seconds) a preflight result may be cached.
    pub max_age: u64,
    /// Accept requests without `Origin`. They get no CORS headers.
    pub permissive: bool,
    /// Reject preflights asking for headers outside `headers`.
    pub strict_headers: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CorsConfigError {
    #[error("invalid origin {origin:?}: expected scheme://host[:port]")]
    InvalidOrigin { origin: String },
    #[error("invalid HTTP method {method:?}")]
    InvalidMethod { method: String },
    #[error("invalid header name {header:?}")]
    InvalidHeader { header: String },
    #[error("credentials require an explicit origin allowlist")]
    CredentialsWithAnyOrigin,
}

impl CorsOptions {
    pub fn allows_origin(&self, origin: &str) -> bool {
        if origin.is_empty() {
            return false;
        }

        self.origins.is_empty() || self.origins.iter().any(|o| o == origin)
    }

    pub fn allows_method(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m.eq_ignore_ascii_case(method))
    }

    pub fn allows_header(&self, header: &str) -> bool {
        self.headers.iter().any(|h| h.eq_ignore_ascii_case(header))
    }

    /// Reject policies that cannot be expressed as valid CORS headers.
    pub fn validate(&self) -> Result<(), CorsConfigError> {
        for origin in &self.origins {
            let canonical = url::Url::parse(origin)
                .ok()
                .filter(|u| matches!(u.scheme(), "http" | "https"))
                .map(|u| u.origin().ascii_serialization());

            if canonical.as_deref() != Some(origin.as_str()) {
                return Err(CorsConfigError::InvalidOrigin {
                    origin: origin.clone(),
                });
            }
        }

        for method in &self.methods {
            if Method::from_bytes(method.as_bytes()).is_err() {
                return Err(CorsConfigError::InvalidMethod {
                    method: method.clone(),
                });
            }
        }

        for name in &self.headers {
            if HeaderName::from_bytes(name.as_bytes()).is_err() {
                return Err(CorsConfigError::InvalidHeader {
                    header: name.clone(),
                });
            }
        }

        if self.allow_credentials && self.origins.is_empty() {
            return Err(CorsConfigError::CredentialsWithAnyOrigin);
        }

        Ok(())
    }
}

/// Apply the CORS policy to the given Router.
pub fn apply<S>(router: Router<S>, options: CorsOptions) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(Arc::new(options), enforce_cors))
}

async fn enforce_cors(
    State(opt): State<Arc<CorsOptions>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let origin = match req.headers().get(header::ORIGIN).map(HeaderValue::to_str) {
        None => String::new(),
        Some(Ok(origin)) => origin.to_owned(),
        Some(Err(_)) => {
            warn!("non-ascii Origin header");
            return Err(AppError::InvalidOrigin);
        }
    };

    if origin.is_empty() && opt.permissive {
        return Ok(next.run(req).await);
    }

    if !opt.allows_origin(&origin) {
        warn!(origin = %origin, "origin not allowed");
        return Err(AppError::InvalidOrigin);
    }

    if req.method() == Method::OPTIONS {
        if opt.strict_headers
            && let Some(name) = first_disallowed_header(&opt, req.headers())
        {
            warn!(origin = %origin, header = %name, "preflight header not allowed");
            return Err(AppError::InvalidHeader);
        }

        debug!(origin = %origin, "answering preflight");
        return Ok(preflight_response(&origin, &opt));
    }

    if !opt.allows_method(req.method().as_str()) {
        warn!(origin = %origin, method = %req.method(), "method not allowed");
        return Err(AppError::InvalidMethod);
    }

    let mut res = next.run(req).await;
    if let Ok(value) = HeaderValue::from_str(&origin) {
        res.headers_mut()
            .insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, value);
    }
    Ok(res)
}

fn first_disallowed_header(opt: &CorsOptions, headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::ACCESS_CONTROL_REQUEST_HEADERS)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .find(|name| !opt.allows_header(name))
        .map(str::to_owned)
}

fn preflight_response(origin: &str, opt: &CorsOptions) -> Response {
    let credentials = if opt.allow_credentials { "true" } else { "false" };

    let pairs = [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.to_owned()),
        (header::ACCESS_CONTROL_ALLOW_METHODS, opt.methods.join(", ")),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, opt.headers.join(", ")),
        (header::ACCESS_CONTROL_ALLOW_CREDENTIALS, credentials.to_owned()),
        (header::ACCESS_CONTROL_MAX_AGE, opt.max_age.to_string()),
    ];

    let mut headers = HeaderMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        match HeaderValue::from_str(&value) {
            Ok(value) => {
                headers.insert(name, value);
            }
            Err(_) => warn!(header = %name, "skipping unrepresentable CORS header value"),
        }
    }

    (StatusCode::NO_CONTENT, headers).into_response()
}
