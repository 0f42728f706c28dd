use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;

use super::availability::IntakeSettings;
use super::domain::{Lead, LeadDraft, LeadId, LeadStatus, MembershipType, SignalEvent};
use super::repository::{
    LeadQuery, LeadRepository, RepositoryError, SettingsStore, SignalError, SignalSink,
};

/// Process-local store backing every collaborator trait. Used for local runs, the demo,
/// and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLeadStore {
    leads: Arc<Mutex<Vec<Lead>>>,
    signals: Arc<Mutex<Vec<SignalEvent>>>,
    settings: Arc<Mutex<Option<IntakeSettings>>>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: IntakeSettings) -> Self {
        let store = Self::default();
        *lock(&store.settings) = Some(settings);
        store
    }

    pub fn set_settings(&self, settings: Option<IntakeSettings>) {
        *lock(&self.settings) = settings;
    }

    /// Insertion order.
    pub fn leads(&self) -> Vec<Lead> {
        lock(&self.leads).clone()
    }

    pub fn signals(&self) -> Vec<SignalEvent> {
        lock(&self.signals).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl LeadRepository for InMemoryLeadStore {
    async fn insert(&self, draft: LeadDraft) -> Result<Lead, RepositoryError> {
        let lead = Lead {
            id: LeadId::generate(),
            created_at: Utc::now(),
            fields: draft,
        };
        let mut leads = lock(&self.leads);
        if leads.iter().any(|existing| existing.id == lead.id) {
            return Err(RepositoryError::Conflict);
        }
        leads.push(lead.clone());
        Ok(lead)
    }

    async fn fetch(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        Ok(lock(&self.leads).iter().find(|lead| &lead.id == id).cloned())
    }

    async fn list(&self, query: &LeadQuery) -> Result<Vec<Lead>, RepositoryError> {
        let leads = lock(&self.leads);
        Ok(leads
            .iter()
            .rev()
            .filter(|lead| query.matches(lead))
            .skip(query.effective_offset())
            .take(query.effective_limit())
            .cloned()
            .collect())
    }

    async fn update_status(&self, id: &LeadId, status: LeadStatus) -> Result<Lead, RepositoryError> {
        let mut leads = lock(&self.leads);
        let lead = leads
            .iter_mut()
            .find(|lead| &lead.id == id)
            .ok_or(RepositoryError::NotFound)?;
        lead.fields.status = status;
        Ok(lead.clone())
    }

    async fn count_active(
        &self,
        venture_id: Option<&str>,
        membership: MembershipType,
    ) -> Result<u32, RepositoryError> {
        let leads = lock(&self.leads);
        let count = leads
            .iter()
            .filter(|lead| lead.membership_type() == membership)
            .filter(|lead| lead.fields.status.is_active())
            .filter(|lead| venture_id.map_or(true, |venture| lead.fields.venture_id.as_deref() == Some(venture)))
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }
}

#[async_trait]
impl SignalSink for InMemoryLeadStore {
    async fn record(&self, event: SignalEvent) -> Result<(), SignalError> {
        lock(&self.signals).push(event);
        Ok(())
    }
}

#[async_trait]
impl SettingsStore for InMemoryLeadStore {
    async fn load_settings(&self) -> Result<Option<IntakeSettings>, RepositoryError> {
        Ok(lock(&self.settings).clone())
    }
}
