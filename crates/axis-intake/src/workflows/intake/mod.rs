//! Membership intake: the branching wizard, eligibility and capacity checks, corporate
//! access codes, and lead persistence.
//!
//! Sessions are held in memory by [`IntakeService`]; leads, signals, and settings live
//! behind the [`LeadRepository`], [`SignalSink`], and [`SettingsStore`] traits so the
//! PostgREST store and the in-memory store are interchangeable.

pub mod access;
pub mod admin;
pub mod availability;
pub mod booking;
pub mod domain;
pub mod gateway;
pub mod memory;
pub mod postgrest;
pub mod repository;
pub mod router;
pub mod service;
pub mod session;
pub mod validation;

#[cfg(test)]
mod tests;

pub use access::{AccessCodeDirectory, AccessCodeVerifier, AccessGrant, AccessVerification};
pub use admin::{AdminError, LeadAdminService, PipelineSummary};
pub use availability::{
    AvailabilityService, AvailabilitySnapshot, CapacityStatus, IntakeSettings, MembershipSettings,
    ServiceZone,
};
pub use booking::{BookingCatalog, BookingCategory, BookingDestination};
pub use domain::{
    ContactDetails, DeploymentPriority, InterestLevel, Lead, LeadDraft, LeadId, LeadStatus,
    LeadType, MembershipType, RawLeadFields, SignalEvent,
};
pub use gateway::{
    GatewaySettings, LeadSubmissionGateway, SubmissionError, SubmissionReceipt,
    SubmissionResponse,
};
pub use memory::InMemoryLeadStore;
pub use postgrest::PostgrestStore;
pub use repository::{
    LeadQuery, LeadRepository, RepositoryError, SettingsStore, SignalError, SignalSink,
};
pub use router::{admin_router, intake_router};
pub use service::{IntakeService, SessionSubmission};
pub use session::{
    IntakeAction, IntakeSession, IntakeStep, MembershipMode, SessionError, SessionId, SessionView,
};
pub use validation::{validate_lead, FieldErrors};

use std::sync::Arc;

use crate::config::{IntakeConfig, StoreSettings};

/// Wires the intake service over one set of collaborators.
pub fn build_intake_service<R, S, G>(
    repository: Arc<R>,
    signals: Arc<S>,
    settings: Arc<G>,
    store: &StoreSettings,
    intake: &IntakeConfig,
) -> IntakeService<R, S, G>
where
    R: LeadRepository + 'static,
    S: SignalSink + 'static,
    G: SettingsStore + 'static,
{
    let gateway_settings = GatewaySettings::from_store(store);
    let availability = Arc::new(AvailabilityService::new(
        settings,
        Arc::clone(&repository),
        gateway_settings.venture_id.clone(),
    ));
    let gateway = Arc::new(LeadSubmissionGateway::new(
        repository,
        signals,
        Arc::clone(&availability),
        gateway_settings,
    ));
    IntakeService::new(
        gateway,
        availability,
        AccessCodeVerifier::new(intake.access_codes.clone()),
        BookingCatalog::from_base_url(&intake.booking_base_url),
    )
}
