use crate::infra::AppState;
use axis_intake::workflows::intake::{
    admin_router, intake_router, IntakeService, LeadAdminService, LeadRepository, SettingsStore,
    SignalSink,
};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_intake_routes<R, S, G>(
    intake: Arc<IntakeService<R, S, G>>,
    admin: Arc<LeadAdminService<R>>,
    admin_token: Option<String>,
) -> axum::Router
where
    R: LeadRepository + 'static,
    S: SignalSink + 'static,
    G: SettingsStore + 'static,
{
    intake_router(intake)
        .merge(admin_router(admin, admin_token))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
