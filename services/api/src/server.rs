use crate::cli::ServeArgs;
use crate::infra::{AppState, LeadBackend};
use crate::routes::with_intake_routes;
use axis_intake::config::AppConfig;
use axis_intake::error::AppError;
use axis_intake::telemetry;
use axis_intake::workflows::intake::{build_intake_service, LeadAdminService};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let backend = Arc::new(LeadBackend::from_settings(&config.store)?);
    if let Some(issue) = config.store.configuration_issue() {
        warn!(%issue, "lead submissions disabled");
    }
    if config.admin.api_token.is_none() {
        warn!("ADMIN_API_TOKEN not set; admin routes will refuse every request");
    }

    let intake_service = Arc::new(build_intake_service(
        Arc::clone(&backend),
        Arc::clone(&backend),
        Arc::clone(&backend),
        &config.store,
        &config.intake,
    ));
    let admin_service = Arc::new(LeadAdminService::new(Arc::clone(&backend)));

    let app = with_intake_routes(intake_service, admin_service, config.admin.api_token.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| AppError::Bind { addr, source })?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        store = backend.label(),
        access_codes = config.intake.access_codes.len(),
        "membership intake service ready"
    );

    axum::serve(listener, app).await.map_err(AppError::Serve)?;
    Ok(())
}
