//! Maintenance gate: 503 while the probe says the server is in maintenance.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
};
use tracing::{debug, error};

use crate::error::AppError;
use crate::services::maintenance::MaintenanceProbe;

pub fn apply<S>(router: Router<S>, probe: Arc<dyn MaintenanceProbe>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(middleware::from_fn_with_state(probe, maintenance_gate))
}

async fn maintenance_gate(
    State(probe): State<Arc<dyn MaintenanceProbe>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let in_maintenance = probe.in_maintenance().map_err(|err| {
        error!(error = ?err, "maintenance probe failed");
        AppError::Internal
    })?;

    if in_maintenance {
        debug!(path = %req.uri().path(), "rejecting request during maintenance");
        return Err(AppError::ServiceUnavailable);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::StatusCode,
        routing::get,
    };
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn app(probe: Arc<dyn MaintenanceProbe>) -> Router {
        apply(Router::new().route("/", get(|| async { StatusCode::OK })), probe)
    }

    async fn status(app: Router) -> StatusCode {
        let req = axum::http::Request::builder()
            .uri("/")
            .body(Body::empty())
            .unwrap();
        app.oneshot(req).await.unwrap().status()
    }

    #[tokio::test]
    async fn available_passes_through() {
        let probe: Arc<dyn MaintenanceProbe> = Arc::new(|| -> anyhow::Result<bool> { Ok(false) });
        assert_eq!(status(app(probe)).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn maintenance_is_503() {
        let probe: Arc<dyn MaintenanceProbe> = Arc::new(|| -> anyhow::Result<bool> { Ok(true) });
        assert_eq!(status(app(probe)).await, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn probe_error_is_500() {
        let probe: Arc<dyn MaintenanceProbe> =
            Arc::new(|| -> anyhow::Result<bool> { Err(anyhow::anyhow!("flag store down")) });
        assert_eq!(status(app(probe)).await, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn probe_is_consulted_per_request() {
        let maintenance = Arc::new(AtomicBool::new(false));
        let calls = Arc::new(AtomicUsize::new(0));

        let (flag, counter) = (maintenance.clone(), calls.clone());
        let probe: Arc<dyn MaintenanceProbe> = Arc::new(move || -> anyhow::Result<bool> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(flag.load(Ordering::SeqCst))
        });
        let app = app(probe);

        assert_eq!(status(app.clone()).await, StatusCode::OK);
        maintenance.store(true, Ordering::SeqCst);
        assert_eq!(status(app).await, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
