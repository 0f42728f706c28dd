use async_trait::async_trait;
use serde::Deserialize;

use super::availability::IntakeSettings;
use super::domain::{Lead, LeadDraft, LeadId, LeadStatus, MembershipType, SignalEvent};

/// Filter for reading leads back for the admin view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LeadQuery {
    #[serde(default, alias = "venture")]
    pub venture_id: Option<String>,
    #[serde(default)]
    pub status: Option<LeadStatus>,
    #[serde(default)]
    pub limit: Option<usize>,
    /// Rows to skip before the first returned lead.
    #[serde(default)]
    pub offset: Option<usize>,
}

impl LeadQuery {
    pub const DEFAULT_LIMIT: usize = 50;
    pub const MAX_LIMIT: usize = 500;

    pub fn effective_limit(&self) -> usize {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn effective_offset(&self) -> usize {
        self.offset.unwrap_or_default()
    }

    pub fn matches(&self, lead: &Lead) -> bool {
        let venture_matches = match self.venture_id.as_deref() {
            Some(venture) => lead.fields.venture_id.as_deref() == Some(venture),
            None => true,
        };
        let status_matches = self
            .status
            .map_or(true, |status| lead.fields.status == status);
        venture_matches && status_matches
    }
}

/// Durable home of lead rows.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    /// Single-row insert; the store assigns id and timestamp.
    async fn insert(&self, draft: LeadDraft) -> Result<Lead, RepositoryError>;
    async fn fetch(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError>;
    /// Newest first.
    async fn list(&self, query: &LeadQuery) -> Result<Vec<Lead>, RepositoryError>;
    async fn update_status(&self, id: &LeadId, status: LeadStatus) -> Result<Lead, RepositoryError>;
    /// Leads of this membership type that are not archived.
    async fn count_active(
        &self,
        venture_id: Option<&str>,
        membership: MembershipType,
    ) -> Result<u32, RepositoryError>;
}

/// Error enumeration for store failures. Messages never carry credentials.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// Secondary, best-effort analytics/CRM event sink.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn record(&self, event: SignalEvent) -> Result<(), SignalError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("signal transport unavailable: {0}")]
    Transport(String),
}

/// Single-row settings collaborator.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn load_settings(&self) -> Result<Option<IntakeSettings>, RepositoryError>;
}
