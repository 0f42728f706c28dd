use std::sync::Arc;

use async_trait::async_trait;
use axum::response::Response;
use serde_json::Value;
use tokio::sync::Notify;

use crate::config::{IntakeConfig, StoreSettings};
use crate::workflows::intake::access::AccessVerification;
use crate::workflows::intake::availability::IntakeSettings;
use crate::workflows::intake::domain::{
    ContactDetails, Lead, LeadDraft, LeadId, LeadStatus, MembershipType, RawLeadFields,
    SignalEvent,
};
use crate::workflows::intake::memory::InMemoryLeadStore;
use crate::workflows::intake::repository::{
    LeadQuery, LeadRepository, RepositoryError, SignalError, SignalSink,
};
use crate::workflows::intake::session::{
    CorporateTrack, IdentityChoice, IntakeAction, IntakeStep, SessionId,
};
use crate::workflows::intake::{build_intake_service, IntakeService};

pub(super) const VENTURE: &str = "axis-test";

pub(super) type MemoryService = IntakeService<InMemoryLeadStore, InMemoryLeadStore, InMemoryLeadStore>;

pub(super) fn memory_settings() -> StoreSettings {
    StoreSettings::Memory {
        venture_id: Some(VENTURE.to_string()),
    }
}

pub(super) fn build_service() -> (MemoryService, InMemoryLeadStore) {
    build_service_with(InMemoryLeadStore::new(), memory_settings())
}

pub(super) fn build_service_with(
    store: InMemoryLeadStore,
    settings: StoreSettings,
) -> (MemoryService, InMemoryLeadStore) {
    let service = build_intake_service(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        &settings,
        &IntakeConfig::default(),
    );
    (service, store)
}

pub(super) fn settings_store() -> InMemoryLeadStore {
    InMemoryLeadStore::with_settings(IntakeSettings::default())
}

pub(super) fn raw_lead(full_name: &str, phone: &str) -> RawLeadFields {
    RawLeadFields {
        full_name: Some(full_name.to_string()),
        phone: Some(phone.to_string()),
        ..RawLeadFields::default()
    }
}

pub(super) fn contact() -> ContactDetails {
    ContactDetails {
        full_name: "J. Doe".to_string(),
        phone: "8015551234".to_string(),
        email: None,
    }
}

pub(super) fn apply_all<R, S, G>(
    service: &IntakeService<R, S, G>,
    id: &SessionId,
    actions: Vec<IntakeAction>,
) -> IntakeStep
where
    R: LeadRepository + 'static,
    S: SignalSink + 'static,
    G: crate::workflows::intake::repository::SettingsStore + 'static,
{
    let mut step = IntakeStep::Identity;
    for action in actions {
        let name = action.name();
        step = service
            .apply(id, action)
            .unwrap_or_else(|err| panic!("{name} failed: {err}"))
            .step;
    }
    step
}

pub(super) fn private_path_to_contact(zip: &str) -> Vec<IntakeAction> {
    vec![
        IntakeAction::SelectIdentity {
            choice: IdentityChoice::Private,
        },
        IntakeAction::SelectObjective {
            objective: "Acute Recovery".to_string(),
        },
        IntakeAction::SelectOutcome {
            outcome: "Treatment Session".to_string(),
        },
        IntakeAction::SubmitLocation {
            zip_code: zip.to_string(),
        },
    ]
}

pub(super) fn employee_path_to_verify() -> Vec<IntakeAction> {
    vec![
        IntakeAction::SelectIdentity {
            choice: IdentityChoice::Corporate,
        },
        IntakeAction::SelectCorporateTrack {
            track: CorporateTrack::Employee,
        },
    ]
}

pub(super) fn valid_code(verification: &AccessVerification) -> bool {
    verification.valid && verification.entity_name.is_some()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

/// Holds every insert until the gate is opened.
#[derive(Clone)]
pub(super) struct GatedRepository {
    pub(super) inner: InMemoryLeadStore,
    pub(super) gate: Arc<Notify>,
}

impl GatedRepository {
    pub(super) fn new(inner: InMemoryLeadStore) -> Self {
        Self {
            inner,
            gate: Arc::new(Notify::new()),
        }
    }
}

#[async_trait]
impl LeadRepository for GatedRepository {
    async fn insert(&self, draft: LeadDraft) -> Result<Lead, RepositoryError> {
        self.gate.notified().await;
        self.inner.insert(draft).await
    }

    async fn fetch(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        self.inner.fetch(id).await
    }

    async fn list(&self, query: &LeadQuery) -> Result<Vec<Lead>, RepositoryError> {
        self.inner.list(query).await
    }

    async fn update_status(&self, id: &LeadId, status: LeadStatus) -> Result<Lead, RepositoryError> {
        self.inner.update_status(id, status).await
    }

    async fn count_active(
        &self,
        venture_id: Option<&str>,
        membership: MembershipType,
    ) -> Result<u32, RepositoryError> {
        self.inner.count_active(venture_id, membership).await
    }
}

/// Store that refuses every call.
pub(super) struct RejectingRepository;

#[async_trait]
impl LeadRepository for RejectingRepository {
    async fn insert(&self, _draft: LeadDraft) -> Result<Lead, RepositoryError> {
        Err(RepositoryError::Rejected {
            status: 401,
            message: "Invalid API key".to_string(),
        })
    }

    async fn fetch(&self, _id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    async fn list(&self, _query: &LeadQuery) -> Result<Vec<Lead>, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    async fn update_status(&self, _id: &LeadId, _status: LeadStatus) -> Result<Lead, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }

    async fn count_active(
        &self,
        _venture_id: Option<&str>,
        _membership: MembershipType,
    ) -> Result<u32, RepositoryError> {
        Err(RepositoryError::Unavailable("connection refused".to_string()))
    }
}

/// Signal sink that always fails.
pub(super) struct BrokenSignals;

#[async_trait]
impl SignalSink for BrokenSignals {
    async fn record(&self, _event: SignalEvent) -> Result<(), SignalError> {
        Err(SignalError::Transport("signals table missing".to_string()))
    }
}
