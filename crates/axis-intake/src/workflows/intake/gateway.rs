use std::sync::Arc;

use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::StoreSettings;

use super::availability::AvailabilityService;
use super::domain::{Labelled, Lead, LeadId, RawLeadFields, SignalEvent};
use super::repository::{LeadRepository, SettingsStore, SignalSink};
use super::validation::{validate_lead, FieldErrors};

/// Store-derived knobs the gateway needs at submission time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GatewaySettings {
    pub venture_id: Option<String>,
    pub project_ref: String,
    pub configuration_issue: Option<String>,
}

impl GatewaySettings {
    pub fn from_store(store: &StoreSettings) -> Self {
        Self {
            venture_id: store.venture_id().map(str::to_string),
            project_ref: store.project_ref(),
            configuration_issue: store.configuration_issue(),
        }
    }
}

/// A persisted lead plus the handle of the best-effort signal write, if one started.
#[derive(Debug)]
pub struct SubmissionReceipt {
    pub lead: Lead,
    pub message: String,
    pub signal: Option<JoinHandle<()>>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum SubmissionError {
    #[error("{0}")]
    Configuration(String),
    #[error("Validation Error: {0}")]
    Validation(FieldErrors),
    #[error("Submission Error: {0}")]
    Storage(String),
}

impl SubmissionError {
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            SubmissionError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Caller-visible outcome of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<LeadId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_out_of_area: Option<bool>,
}

impl From<&SubmissionReceipt> for SubmissionResponse {
    fn from(receipt: &SubmissionReceipt) -> Self {
        Self {
            success: true,
            message: receipt.message.clone(),
            field_errors: None,
            lead_id: Some(receipt.lead.id.clone()),
            is_out_of_area: Some(receipt.lead.fields.is_out_of_area),
        }
    }
}

impl From<&SubmissionError> for SubmissionResponse {
    fn from(error: &SubmissionError) -> Self {
        Self {
            success: false,
            message: error.to_string(),
            field_errors: error.field_errors().cloned(),
            lead_id: None,
            is_out_of_area: None,
        }
    }
}

/// Validates, annotates and persists leads, then mirrors them to the signal sink.
pub struct LeadSubmissionGateway<R, S, G> {
    repository: Arc<R>,
    signals: Arc<S>,
    availability: Arc<AvailabilityService<G, R>>,
    settings: GatewaySettings,
}

impl<R, S, G> LeadSubmissionGateway<R, S, G>
where
    R: LeadRepository + 'static,
    S: SignalSink + 'static,
    G: SettingsStore + 'static,
{
    pub fn new(
        repository: Arc<R>,
        signals: Arc<S>,
        availability: Arc<AvailabilityService<G, R>>,
        settings: GatewaySettings,
    ) -> Self {
        Self {
            repository,
            signals,
            availability,
            settings,
        }
    }

    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    pub async fn submit(&self, raw: RawLeadFields) -> Result<SubmissionReceipt, SubmissionError> {
        if let Some(issue) = &self.settings.configuration_issue {
            return Err(SubmissionError::Configuration(issue.clone()));
        }

        let validated = match validate_lead(&raw) {
            Ok(validated) => validated,
            Err(errors) => {
                debug!(fields = %errors, "lead submission rejected by validation");
                return Err(SubmissionError::Validation(errors));
            }
        };

        let membership = validated.lead_type.membership_type();
        let snapshot = self.availability.check_availability().await;
        let is_out_of_area = snapshot.is_out_of_area(
            membership,
            validated.zip_code.as_deref().unwrap_or_default(),
            validated.corporate_code.is_some(),
        );

        let draft = validated.into_draft(is_out_of_area, self.settings.venture_id.clone());
        let lead = match self.repository.insert(draft).await {
            Ok(lead) => lead,
            Err(err) => {
                warn!(error = %err, "lead insert failed");
                return Err(SubmissionError::Storage(err.to_string()));
            }
        };

        info!(
            lead_id = %lead.id.0,
            lead_type = lead.fields.lead_type.label(),
            is_out_of_area = lead.fields.is_out_of_area,
            "lead persisted"
        );

        let signal = self.settings.venture_id.as_deref().map(|venture_id| {
            let event = SignalEvent::lead_captured(venture_id, &lead);
            let signals = Arc::clone(&self.signals);
            tokio::spawn(async move {
                let lead_id = event.lead_id.0.clone();
                if let Err(err) = signals.record(event).await {
                    warn!(error = %err, lead_id = %lead_id, "signal write failed; lead kept");
                }
            })
        });

        Ok(SubmissionReceipt {
            message: format!(
                "Submission confirmed to project [{}...].",
                self.settings.project_ref
            ),
            lead,
            signal,
        })
    }
}
