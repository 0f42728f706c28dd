use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::json;
use sha2::Sha256;

use super::admin::{AdminError, LeadAdminService};
use super::domain::{ContactDetails, LeadId, LeadStatus, RawLeadFields};
use super::gateway::SubmissionError;
use super::repository::{LeadQuery, LeadRepository, RepositoryError, SettingsStore, SignalSink};
use super::service::{submission_response, IntakeService};
use super::session::{IntakeAction, SessionError, SessionId};

#[derive(Debug, Deserialize)]
pub(crate) struct AccessCodeRequest {
    #[serde(default)]
    code: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusUpdateRequest {
    status: LeadStatus,
}

/// Public intake endpoints: availability, access codes, wizard sessions, raw submissions.
pub fn intake_router<R, S, G>(service: Arc<IntakeService<R, S, G>>) -> Router
where
    R: LeadRepository + 'static,
    S: SignalSink + 'static,
    G: SettingsStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/intake/availability",
            get(availability_handler::<R, S, G>),
        )
        .route(
            "/api/v1/intake/access-codes/verify",
            post(verify_code_handler::<R, S, G>),
        )
        .route(
            "/api/v1/intake/sessions",
            post(start_session_handler::<R, S, G>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id",
            get(session_handler::<R, S, G>).delete(abandon_handler::<R, S, G>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/actions",
            post(action_handler::<R, S, G>),
        )
        .route(
            "/api/v1/intake/sessions/:session_id/submit",
            post(session_submit_handler::<R, S, G>),
        )
        .route("/api/v1/leads", post(lead_submit_handler::<R, S, G>))
        .with_state(service)
}

pub(crate) async fn availability_handler<R, S, G>(
    State(service): State<Arc<IntakeService<R, S, G>>>,
) -> Response
where
    R: LeadRepository + 'static,
    S: SignalSink + 'static,
    G: SettingsStore + 'static,
{
    let snapshot = service.availability().await;
    let payload = json!({
        "private": {
            "available": snapshot.private.available,
            "active_count": snapshot.private.active_count,
            "capacity_limit": snapshot.private.capacity_limit,
            "status": snapshot.private.capacity_status().label(),
            "zone": snapshot.private.zone,
        },
        "corporate": {
            "available": snapshot.corporate.available,
            "active_count": snapshot.corporate.active_count,
            "capacity_limit": snapshot.corporate.capacity_limit,
            "status": snapshot.corporate.capacity_status().label(),
            "zone": snapshot.corporate.zone,
        },
        "source": snapshot.source,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn verify_code_handler<R, S, G>(
    State(service): State<Arc<IntakeService<R, S, G>>>,
    axum::Json(request): axum::Json<AccessCodeRequest>,
) -> Response
where
    R: LeadRepository + 'static,
    S: SignalSink + 'static,
    G: SettingsStore + 'static,
{
    let verification = service.verify_access_code(&request.code);
    (StatusCode::OK, axum::Json(verification)).into_response()
}

pub(crate) async fn start_session_handler<R, S, G>(
    State(service): State<Arc<IntakeService<R, S, G>>>,
) -> Response
where
    R: LeadRepository + 'static,
    S: SignalSink + 'static,
    G: SettingsStore + 'static,
{
    let view = service.start_session().await;
    (StatusCode::CREATED, axum::Json(view)).into_response()
}

pub(crate) async fn session_handler<R, S, G>(
    State(service): State<Arc<IntakeService<R, S, G>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: LeadRepository + 'static,
    S: SignalSink + 'static,
    G: SettingsStore + 'static,
{
    match service.session(&SessionId(session_id)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => session_error_response(err),
    }
}

pub(crate) async fn abandon_handler<R, S, G>(
    State(service): State<Arc<IntakeService<R, S, G>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: LeadRepository + 'static,
    S: SignalSink + 'static,
    G: SettingsStore + 'static,
{
    match service.abandon(&SessionId(session_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => session_error_response(err),
    }
}

pub(crate) async fn action_handler<R, S, G>(
    State(service): State<Arc<IntakeService<R, S, G>>>,
    Path(session_id): Path<String>,
    axum::Json(action): axum::Json<IntakeAction>,
) -> Response
where
    R: LeadRepository + 'static,
    S: SignalSink + 'static,
    G: SettingsStore + 'static,
{
    match service.apply(&SessionId(session_id), action) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => session_error_response(err),
    }
}

pub(crate) async fn session_submit_handler<R, S, G>(
    State(service): State<Arc<IntakeService<R, S, G>>>,
    Path(session_id): Path<String>,
    axum::Json(contact): axum::Json<ContactDetails>,
) -> Response
where
    R: LeadRepository + 'static,
    S: SignalSink + 'static,
    G: SettingsStore + 'static,
{
    match service.submit(&SessionId(session_id), contact).await {
        Ok(submission) => {
            let status = match &submission.failure {
                None => StatusCode::CREATED,
                Some(err) => submission_error_status(err),
            };
            (status, axum::Json(submission)).into_response()
        }
        Err(err) => session_error_response(err),
    }
}

pub(crate) async fn lead_submit_handler<R, S, G>(
    State(service): State<Arc<IntakeService<R, S, G>>>,
    axum::Json(raw): axum::Json<RawLeadFields>,
) -> Response
where
    R: LeadRepository + 'static,
    S: SignalSink + 'static,
    G: SettingsStore + 'static,
{
    let outcome = service.submit_raw(raw).await;
    let status = match &outcome {
        Ok(_) => StatusCode::CREATED,
        Err(err) => submission_error_status(err),
    };
    (status, axum::Json(submission_response(&outcome))).into_response()
}

fn submission_error_status(err: &SubmissionError) -> StatusCode {
    match err {
        SubmissionError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        SubmissionError::Storage(_) => StatusCode::BAD_GATEWAY,
        SubmissionError::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn session_error_response(err: SessionError) -> Response {
    let status = match &err {
        SessionError::NotFound => StatusCode::NOT_FOUND,
        SessionError::UnexpectedAction { .. }
        | SessionError::AtInitialStep
        | SessionError::Terminal
        | SessionError::SubmissionInFlight => StatusCode::CONFLICT,
        SessionError::UnknownOption { .. }
        | SessionError::MissingAnswer(_)
        | SessionError::Incomplete(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    let payload = match &err {
        SessionError::Incomplete(errors) => json!({
            "error": err.to_string(),
            "field_errors": errors,
        }),
        _ => json!({
            "error": err.to_string(),
        }),
    };
    (status, axum::Json(payload)).into_response()
}

/// Internal dashboard endpoints, guarded by a bearer token. Without a token every
/// request is refused.
pub fn admin_router<R>(service: Arc<LeadAdminService<R>>, api_token: Option<String>) -> Router
where
    R: LeadRepository + 'static,
{
    let state = AdminState {
        service,
        api_token: api_token.as_deref().and_then(AdminToken::new),
    };
    Router::new()
        .route("/api/v1/admin/leads", get(list_leads_handler::<R>))
        .route("/api/v1/admin/leads/summary", get(summary_handler::<R>))
        .route(
            "/api/v1/admin/leads/:lead_id/status",
            patch(update_status_handler::<R>),
        )
        .with_state(state)
}

pub(crate) struct AdminState<R> {
    service: Arc<LeadAdminService<R>>,
    api_token: Option<AdminToken>,
}

type HmacSha256 = Hmac<Sha256>;

const ADMIN_TOKEN_CONTEXT: &[u8] = b"axis-intake admin bearer";

/// Admin secret kept only as an HMAC tag; presented tokens are checked with a
/// constant-time tag comparison.
#[derive(Clone)]
pub(crate) struct AdminToken {
    tag: Arc<[u8]>,
}

impl AdminToken {
    pub(crate) fn new(secret: &str) -> Option<Self> {
        let tag = admin_token_mac(secret)?.finalize().into_bytes();
        Some(Self {
            tag: Arc::from(tag.as_slice()),
        })
    }

    pub(crate) fn matches(&self, presented: &str) -> bool {
        admin_token_mac(presented).is_some_and(|mac| mac.verify_slice(&self.tag).is_ok())
    }
}

fn admin_token_mac(secret: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(ADMIN_TOKEN_CONTEXT);
    Some(mac)
}

impl<R> Clone for AdminState<R> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            api_token: self.api_token.clone(),
        }
    }
}

impl<R> AdminState<R> {
    fn authorize(&self, headers: &HeaderMap) -> Result<(), Response> {
        let Some(expected) = self.api_token.as_ref() else {
            let payload = json!({ "error": "admin access is not configured" });
            return Err((StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response());
        };
        let presented = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim);
        if presented.is_some_and(|token| expected.matches(token)) {
            Ok(())
        } else {
            let payload = json!({ "error": "invalid admin token" });
            Err((StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response())
        }
    }
}

pub(crate) async fn list_leads_handler<R>(
    State(state): State<AdminState<R>>,
    headers: HeaderMap,
    Query(query): Query<LeadQuery>,
) -> Response
where
    R: LeadRepository + 'static,
{
    if let Err(denied) = state.authorize(&headers) {
        return denied;
    }
    match state.service.list(&query).await {
        Ok(leads) => (StatusCode::OK, axum::Json(leads)).into_response(),
        Err(err) => admin_error_response(err),
    }
}

pub(crate) async fn summary_handler<R>(
    State(state): State<AdminState<R>>,
    headers: HeaderMap,
    Query(query): Query<LeadQuery>,
) -> Response
where
    R: LeadRepository + 'static,
{
    if let Err(denied) = state.authorize(&headers) {
        return denied;
    }
    match state.service.summary(&query).await {
        Ok(summary) => (StatusCode::OK, axum::Json(summary)).into_response(),
        Err(err) => admin_error_response(err),
    }
}

pub(crate) async fn update_status_handler<R>(
    State(state): State<AdminState<R>>,
    headers: HeaderMap,
    Path(lead_id): Path<String>,
    axum::Json(request): axum::Json<StatusUpdateRequest>,
) -> Response
where
    R: LeadRepository + 'static,
{
    if let Err(denied) = state.authorize(&headers) {
        return denied;
    }
    match state
        .service
        .update_status(&LeadId(lead_id), request.status)
        .await
    {
        Ok(lead) => (StatusCode::OK, axum::Json(lead)).into_response(),
        Err(err) => admin_error_response(err),
    }
}

fn admin_error_response(err: AdminError) -> Response {
    let status = match &err {
        AdminError::InvalidTransition { .. } => StatusCode::CONFLICT,
        AdminError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AdminError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        AdminError::Repository(_) => StatusCode::BAD_GATEWAY,
    };
    let payload = json!({
        "error": err.to_string(),
    });
    (status, axum::Json(payload)).into_response()
}
