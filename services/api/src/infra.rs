use async_trait::async_trait;
use axis_intake::config::StoreSettings;
use axis_intake::workflows::intake::{
    IntakeSettings, InMemoryLeadStore, Lead, LeadDraft, LeadId, LeadQuery, LeadRepository,
    LeadStatus, MembershipType, PostgrestStore, RepositoryError, SettingsStore, SignalError,
    SignalEvent, SignalSink,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Lead store chosen at startup. `Unconfigured` keeps browsing alive while the gateway
/// refuses submissions.
#[derive(Clone)]
pub(crate) enum LeadBackend {
    Memory(InMemoryLeadStore),
    Postgrest(Arc<PostgrestStore>),
    Unconfigured,
}

impl LeadBackend {
    pub(crate) fn from_settings(settings: &StoreSettings) -> Result<Self, RepositoryError> {
        Ok(match settings {
            StoreSettings::Memory { .. } => {
                Self::Memory(InMemoryLeadStore::with_settings(IntakeSettings::default()))
            }
            StoreSettings::Configured(config) => Self::Postgrest(Arc::new(PostgrestStore::new(config)?)),
            StoreSettings::Missing { .. } => Self::Unconfigured,
        })
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Postgrest(_) => "postgrest",
            Self::Unconfigured => "unconfigured",
        }
    }
}

fn unconfigured() -> RepositoryError {
    RepositoryError::Unavailable("lead store is not configured".to_string())
}

#[async_trait]
impl LeadRepository for LeadBackend {
    async fn insert(&self, draft: LeadDraft) -> Result<Lead, RepositoryError> {
        match self {
            Self::Memory(store) => store.insert(draft).await,
            Self::Postgrest(store) => store.insert(draft).await,
            Self::Unconfigured => Err(unconfigured()),
        }
    }

    async fn fetch(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        match self {
            Self::Memory(store) => store.fetch(id).await,
            Self::Postgrest(store) => store.fetch(id).await,
            Self::Unconfigured => Err(unconfigured()),
        }
    }

    async fn list(&self, query: &LeadQuery) -> Result<Vec<Lead>, RepositoryError> {
        match self {
            Self::Memory(store) => store.list(query).await,
            Self::Postgrest(store) => store.list(query).await,
            Self::Unconfigured => Err(unconfigured()),
        }
    }

    async fn update_status(&self, id: &LeadId, status: LeadStatus) -> Result<Lead, RepositoryError> {
        match self {
            Self::Memory(store) => store.update_status(id, status).await,
            Self::Postgrest(store) => store.update_status(id, status).await,
            Self::Unconfigured => Err(unconfigured()),
        }
    }

    async fn count_active(
        &self,
        venture_id: Option<&str>,
        membership: MembershipType,
    ) -> Result<u32, RepositoryError> {
        match self {
            Self::Memory(store) => store.count_active(venture_id, membership).await,
            Self::Postgrest(store) => store.count_active(venture_id, membership).await,
            Self::Unconfigured => Err(unconfigured()),
        }
    }
}

#[async_trait]
impl SignalSink for LeadBackend {
    async fn record(&self, event: SignalEvent) -> Result<(), SignalError> {
        match self {
            Self::Memory(store) => store.record(event).await,
            Self::Postgrest(store) => store.record(event).await,
            Self::Unconfigured => Err(SignalError::Transport(
                "lead store is not configured".to_string(),
            )),
        }
    }
}

#[async_trait]
impl SettingsStore for LeadBackend {
    async fn load_settings(&self) -> Result<Option<IntakeSettings>, RepositoryError> {
        match self {
            Self::Memory(store) => store.load_settings().await,
            Self::Postgrest(store) => store.load_settings().await,
            Self::Unconfigured => Ok(None),
        }
    }
}
