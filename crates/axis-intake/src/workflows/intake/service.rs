use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use super::access::{AccessCodeVerifier, AccessVerification};
use super::availability::{AvailabilityService, AvailabilitySnapshot};
use super::booking::BookingCatalog;
use super::domain::{ContactDetails, RawLeadFields};
use super::gateway::{LeadSubmissionGateway, SubmissionError, SubmissionReceipt, SubmissionResponse};
use super::repository::{LeadRepository, SettingsStore, SignalSink};
use super::session::{IntakeAction, IntakeSession, SessionError, SessionId, SessionView};

/// Result of a wizard submission: the gateway response plus the updated session.
#[derive(Debug, serde::Serialize)]
pub struct SessionSubmission {
    #[serde(flatten)]
    pub response: SubmissionResponse,
    pub session: SessionView,
    #[serde(skip)]
    pub failure: Option<SubmissionError>,
}

/// Owns the session registry and composes availability, access codes, booking and the
/// submission gateway.
pub struct IntakeService<R, S, G> {
    sessions: Mutex<HashMap<SessionId, IntakeSession>>,
    gateway: Arc<LeadSubmissionGateway<R, S, G>>,
    availability: Arc<AvailabilityService<G, R>>,
    verifier: AccessCodeVerifier,
    booking: BookingCatalog,
}

impl<R, S, G> IntakeService<R, S, G>
where
    R: LeadRepository + 'static,
    S: SignalSink + 'static,
    G: SettingsStore + 'static,
{
    pub fn new(
        gateway: Arc<LeadSubmissionGateway<R, S, G>>,
        availability: Arc<AvailabilityService<G, R>>,
        verifier: AccessCodeVerifier,
        booking: BookingCatalog,
    ) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            gateway,
            availability,
            verifier,
            booking,
        }
    }

    pub async fn availability(&self) -> AvailabilitySnapshot {
        self.availability.check_availability().await
    }

    pub fn verify_access_code(&self, code: &str) -> AccessVerification {
        self.verifier.verify(code)
    }

    /// Opens a session with a fresh availability snapshot.
    pub async fn start_session(&self) -> SessionView {
        let snapshot = self.availability.check_availability().await;
        let session = IntakeSession::new(SessionId::generate(), snapshot);
        let view = session.view(&self.booking);
        debug!(session_id = %session.id().0, "intake session started");
        self.sessions().insert(session.id().clone(), session);
        view
    }

    pub fn session(&self, id: &SessionId) -> Result<SessionView, SessionError> {
        let sessions = self.sessions();
        let session = sessions.get(id).ok_or(SessionError::NotFound)?;
        Ok(session.view(&self.booking))
    }

    pub fn apply(&self, id: &SessionId, action: IntakeAction) -> Result<SessionView, SessionError> {
        let mut sessions = self.sessions();
        let session = sessions.get_mut(id).ok_or(SessionError::NotFound)?;
        session.apply(action, &self.verifier)?;
        Ok(session.view(&self.booking))
    }

    /// Submits the contact step. The registry lock is released while the gateway runs, so
    /// a second submit for the same session sees the pending flag and is refused.
    pub async fn submit(
        &self,
        id: &SessionId,
        contact: ContactDetails,
    ) -> Result<SessionSubmission, SessionError> {
        let ticket = {
            let mut sessions = self.sessions();
            let session = sessions.get_mut(id).ok_or(SessionError::NotFound)?;
            session.begin_submission(contact)?
        };

        let outcome = self.gateway.submit(ticket.fields).await;
        let response = submission_response(&outcome);

        let mut sessions = self.sessions();
        let session = sessions.get_mut(id).ok_or(SessionError::NotFound)?;
        if !session.finish_submission(ticket.generation, &outcome) {
            debug!(session_id = %id.0, "submission finished after session reset; outcome dropped");
        }
        Ok(SessionSubmission {
            response,
            session: session.view(&self.booking),
            failure: outcome.err(),
        })
    }

    /// Drops a session. Refused while a submission is in flight so the caller that
    /// started it still receives the stored lead.
    pub fn abandon(&self, id: &SessionId) -> Result<(), SessionError> {
        let mut sessions = self.sessions();
        let session = sessions.get(id).ok_or(SessionError::NotFound)?;
        if session.is_pending() {
            return Err(SessionError::SubmissionInFlight);
        }
        sessions.remove(id);
        debug!(session_id = %id.0, "intake session abandoned");
        Ok(())
    }

    /// Direct submission path that bypasses the wizard.
    pub async fn submit_raw(
        &self,
        raw: RawLeadFields,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        self.gateway.submit(raw).await
    }

    pub fn session_count(&self) -> usize {
        self.sessions().len()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, IntakeSession>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn submission_response(
    outcome: &Result<SubmissionReceipt, SubmissionError>,
) -> SubmissionResponse {
    match outcome {
        Ok(receipt) => SubmissionResponse::from(receipt),
        Err(err) => SubmissionResponse::from(err),
    }
}
