/*
 * Responsibility
 * - Load config -> build state -> assemble the Router
 * - Apply the request filters in order (CORS -> maintenance -> language -> auth)
 * - Transport concerns (request id, access log, timeout)
 * - Start with axum::serve()
 */
use std::{panic, process, time::Duration};

use anyhow::Result;
use axum::{
    Router,
    error_handling::HandleErrorLayer,
    extract::Request,
    http::{StatusCode, header::HeaderName},
    routing::get,
};
use tower::{BoxError, ServiceBuilder, timeout::TimeoutLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::Span;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{api, config::Config, middleware, state::AppState};

const REQUEST_ID: &str = "x-request-id";

// Used when RUST_LOG is unset. The filters log rejections at warn/debug.
const DEFAULT_LOG_FILTER: &str = "info,gatehouse=info,tower_http=info";

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Route panics through tracing. Outside production the process aborts.
fn init_panic_hook(abort_on_panic: bool) {
    let previous = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|l| format!("{}:{}", l.file(), l.line()))
            .unwrap_or_default();
        let message = info
            .payload()
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_default();

        tracing::error!(%location, %message, "handler panicked");

        if abort_on_panic {
            process::abort();
        }
        previous(info);
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting gatehouse in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = AppState::from_config(&config)?;
    let app = build_router(state, config.request_timeout);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    async fn health() -> &'static str {
        "ok"
    }

    // Innermost first: auth sees the request last, CORS first.
    let v1 = api::v1::routes(&state);
    let v1 = middleware::auth::apply(v1, state.verifier.clone());
    let v1 = middleware::lang::apply(v1, state.languages.clone());
    let v1 = middleware::maintenance::apply(v1, state.maintenance.clone());
    let v1 = middleware::cors::apply(v1, state.cors.clone());

    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", v1)
        .with_state(state);

    with_http_layers(router, request_timeout)
}

/// Transport layers around the whole app: request id, access log, timeout.
///
/// The request id is assigned before the trace span opens, so every log line a
/// filter emits carries it.
fn with_http_layers(router: Router, request_timeout: Duration) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID);

    let layers = ServiceBuilder::new()
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                tracing::warn!("request timed out");
                StatusCode::REQUEST_TIMEOUT
            } else {
                tracing::error!(error = %err, "unhandled transport error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }))
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(request_id))
        .layer(TraceLayer::new_for_http().make_span_with(request_span))
        .layer(TimeoutLayer::new(request_timeout));

    router.layer(layers)
}

fn request_span(req: &Request) -> Span {
    let id = req
        .headers()
        .get(REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");

    tracing::info_span!("request", method = %req.method(), uri = %req.uri(), request_id = %id)
}
