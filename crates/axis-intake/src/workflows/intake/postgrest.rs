//! Lead store backed by a PostgREST (Supabase-style) REST API.
//!
//! Tables: `leads`, `signals`, and a single-row `settings` table whose `private` and
//! `corporate` columns hold the per-membership settings objects.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use tracing::debug;

use crate::config::StoreConfig;

use super::availability::IntakeSettings;
use super::domain::{Labelled, Lead, LeadDraft, LeadId, LeadStatus, MembershipType, SignalEvent};
use super::repository::{
    LeadQuery, LeadRepository, RepositoryError, SettingsStore, SignalError, SignalSink,
};

const LEADS: &str = "leads";
const SIGNALS: &str = "signals";
const SETTINGS: &str = "settings";

pub struct PostgrestStore {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestStore {
    pub fn new(config: &StoreConfig) -> Result<Self, RepositoryError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| RepositoryError::Unavailable(err.without_url().to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn request(&self, method: Method, table: &str) -> RequestBuilder {
        self.client
            .request(method, self.table_url(table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, RepositoryError> {
        let response = request.send().await.map_err(|err| self.transport_error(err))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == StatusCode::CONFLICT {
            debug!(body = %redact(&body, &self.api_key), "store reported conflict");
            return Err(RepositoryError::Conflict);
        }
        let message = error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
        Err(RepositoryError::Rejected {
            status: status.as_u16(),
            message: redact(&message, &self.api_key),
        })
    }

    async fn rows<T>(&self, request: RequestBuilder) -> Result<Vec<T>, RepositoryError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let response = self.send(request).await?;
        response
            .json::<Vec<T>>()
            .await
            .map_err(|err| self.transport_error(err))
    }

    fn transport_error(&self, err: reqwest::Error) -> RepositoryError {
        RepositoryError::Unavailable(redact(&err.without_url().to_string(), &self.api_key))
    }
}

#[async_trait]
impl LeadRepository for PostgrestStore {
    async fn insert(&self, draft: LeadDraft) -> Result<Lead, RepositoryError> {
        let request = self
            .request(Method::POST, LEADS)
            .header("Prefer", "return=representation")
            .json(&draft);
        self.rows::<Lead>(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::Rejected {
                status: StatusCode::CREATED.as_u16(),
                message: "insert returned no row".to_string(),
            })
    }

    async fn fetch(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        let request = self
            .request(Method::GET, LEADS)
            .query(&[("id", eq(&id.0)), ("limit", "1".to_string())]);
        Ok(self.rows::<Lead>(request).await?.into_iter().next())
    }

    async fn list(&self, query: &LeadQuery) -> Result<Vec<Lead>, RepositoryError> {
        let request = self
            .request(Method::GET, LEADS)
            .query(&list_params(query));
        self.rows(request).await
    }

    async fn update_status(&self, id: &LeadId, status: LeadStatus) -> Result<Lead, RepositoryError> {
        let request = self
            .request(Method::PATCH, LEADS)
            .query(&[("id", eq(&id.0))])
            .header("Prefer", "return=representation")
            .json(&serde_json::json!({ "status": status.label() }));
        self.rows::<Lead>(request)
            .await?
            .into_iter()
            .next()
            .ok_or(RepositoryError::NotFound)
    }

    async fn count_active(
        &self,
        venture_id: Option<&str>,
        membership: MembershipType,
    ) -> Result<u32, RepositoryError> {
        let request = self
            .request(Method::GET, LEADS)
            .query(&count_params(venture_id, membership))
            .header("Prefer", "count=exact")
            .header("Range-Unit", "items")
            .header("Range", "0-0");
        let response = self.send(request).await?;
        response
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range_total)
            .ok_or_else(|| RepositoryError::Rejected {
                status: response.status().as_u16(),
                message: "missing Content-Range count".to_string(),
            })
    }
}

#[async_trait]
impl SignalSink for PostgrestStore {
    async fn record(&self, event: SignalEvent) -> Result<(), SignalError> {
        let request = self
            .request(Method::POST, SIGNALS)
            .header("Prefer", "return=minimal")
            .json(&event);
        self.send(request)
            .await
            .map(|_| ())
            .map_err(|err| SignalError::Transport(err.to_string()))
    }
}

#[async_trait]
impl SettingsStore for PostgrestStore {
    async fn load_settings(&self) -> Result<Option<IntakeSettings>, RepositoryError> {
        let request = self
            .request(Method::GET, SETTINGS)
            .query(&[("select", "private,corporate"), ("limit", "1")]);
        Ok(self.rows::<IntakeSettings>(request).await?.into_iter().next())
    }
}

fn eq(value: &str) -> String {
    format!("eq.{value}")
}

fn list_params(query: &LeadQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("select", "*".to_string()),
        ("order", "created_at.desc,id.desc".to_string()),
        ("limit", query.effective_limit().to_string()),
    ];
    if query.effective_offset() > 0 {
        params.push(("offset", query.effective_offset().to_string()));
    }
    if let Some(venture_id) = &query.venture_id {
        params.push(("venture_id", eq(venture_id)));
    }
    if let Some(status) = query.status {
        params.push(("status", eq(status.label())));
    }
    params
}

fn count_params(venture_id: Option<&str>, membership: MembershipType) -> Vec<(&'static str, String)> {
    let lead_types = membership
        .lead_types()
        .iter()
        .map(|lead_type| lead_type.label())
        .collect::<Vec<_>>()
        .join(",");
    let mut params = vec![
        ("select", "id".to_string()),
        ("lead_type", format!("in.({lead_types})")),
        ("status", format!("neq.{}", LeadStatus::Archived.label())),
    ];
    if let Some(venture_id) = venture_id {
        params.push(("venture_id", eq(venture_id)));
    }
    params
}

/// `0-0/42` or `*/0` → total.
fn parse_content_range_total(header: &str) -> Option<u32> {
    header.rsplit_once('/')?.1.trim().parse().ok()
}

/// PostgREST error bodies look like `{"code": "...", "message": "...", "details": ...}`.
fn error_message(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: Option<String>,
        details: Option<String>,
    }

    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match (parsed.message, parsed.details) {
        (Some(message), Some(details)) if !details.is_empty() => Some(format!("{message} ({details})")),
        (Some(message), _) => Some(message),
        (None, details) => details,
    }
}

fn redact(text: &str, secret: &str) -> String {
    if secret.is_empty() {
        return text.to_string();
    }
    text.replace(secret, "[redacted]")
}
