//! Per-visitor intake wizard state.
//!
//! An [`IntakeSession`] is owned by exactly one visitor. Steps advance only through
//! [`IntakeAction`]s that carry the answer for the current step; `Back` walks the
//! history stack without discarding answers. Submission is split in two halves so the
//! owner can release its lock while the gateway call is in flight.

pub mod options;
pub mod steps;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::access::{AccessCodeVerifier, AccessGrant};
use super::availability::{is_well_formed_zip, AvailabilitySnapshot, CapacityStatus};
use super::booking::{BookingCatalog, BookingDestination};
use super::domain::{ContactDetails, LeadId, Labelled, MembershipType, RawLeadFields};
use super::gateway::{SubmissionError, SubmissionReceipt};
use super::validation::FieldErrors;

pub use options::HeadcountBracket;
pub use steps::{next_step, CorporateTrack, IdentityChoice, IntakeStep, MembershipMode};

pub const OUT_OF_AREA_NOTICE: &str = "You are just outside our primary service area, but we would love to review your application for a bespoke arrangement.";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Answers collected so far. Kept across back/forward navigation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntakeAnswers {
    pub identity: Option<IdentityChoice>,
    pub corporate_track: Option<CorporateTrack>,
    pub headcount: Option<HeadcountBracket>,
    pub objective: Option<String>,
    pub outcome: Option<String>,
    pub zip_code: Option<String>,
    /// Normalized code; only set once verified.
    pub access_code: Option<String>,
    pub contact: Option<ContactDetails>,
}

/// A wizard input. Each variant is accepted only on its own step, except `Back`
/// and `Reset`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum IntakeAction {
    SelectIdentity { choice: IdentityChoice },
    SelectCorporateTrack { track: CorporateTrack },
    VerifyAccessCode { code: String },
    SelectHeadcount { headcount: HeadcountBracket },
    SelectObjective { objective: String },
    SelectOutcome { outcome: String },
    SubmitLocation { zip_code: String },
    Back,
    Reset,
}

impl IntakeAction {
    pub const fn name(&self) -> &'static str {
        match self {
            IntakeAction::SelectIdentity { .. } => "select_identity",
            IntakeAction::SelectCorporateTrack { .. } => "select_corporate_track",
            IntakeAction::VerifyAccessCode { .. } => "verify_access_code",
            IntakeAction::SelectHeadcount { .. } => "select_headcount",
            IntakeAction::SelectObjective { .. } => "select_objective",
            IntakeAction::SelectOutcome { .. } => "select_outcome",
            IntakeAction::SubmitLocation { .. } => "submit_location",
            IntakeAction::Back => "back",
            IntakeAction::Reset => "reset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("intake session not found")]
    NotFound,
    #[error("action '{action}' is not available on step '{step}'")]
    UnexpectedAction {
        step: IntakeStep,
        action: &'static str,
    },
    #[error("already at the first step")]
    AtInitialStep,
    #[error("intake is complete; reset to start again")]
    Terminal,
    #[error("'{value}' is not a valid {field}")]
    UnknownOption { field: &'static str, value: String },
    #[error("{0} is required")]
    MissingAnswer(&'static str),
    #[error("required details incomplete: {0}")]
    Incomplete(FieldErrors),
    #[error("a submission is already in progress")]
    SubmissionInFlight,
}

/// Raw fields handed to the gateway, tagged with the session generation that built them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionTicket {
    pub generation: u64,
    pub fields: RawLeadFields,
}

#[derive(Debug, Clone)]
pub struct IntakeSession {
    id: SessionId,
    step: IntakeStep,
    history: Vec<IntakeStep>,
    answers: IntakeAnswers,
    grant: Option<AccessGrant>,
    availability: AvailabilitySnapshot,
    is_out_of_range: bool,
    pending: bool,
    generation: u64,
    message: Option<String>,
    field_errors: Option<FieldErrors>,
    lead_id: Option<LeadId>,
}

impl IntakeSession {
    pub fn new(id: SessionId, availability: AvailabilitySnapshot) -> Self {
        Self {
            id,
            step: IntakeStep::Identity,
            history: Vec::new(),
            answers: IntakeAnswers::default(),
            grant: None,
            availability,
            is_out_of_range: false,
            pending: false,
            generation: 0,
            message: None,
            field_errors: None,
            lead_id: None,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn step(&self) -> IntakeStep {
        self.step
    }

    pub fn answers(&self) -> &IntakeAnswers {
        &self.answers
    }

    pub fn availability(&self) -> &AvailabilitySnapshot {
        &self.availability
    }

    pub fn is_out_of_range(&self) -> bool {
        self.is_out_of_range
    }

    pub fn is_corporate_verified(&self) -> bool {
        self.grant.is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn lead_id(&self) -> Option<&LeadId> {
        self.lead_id.as_ref()
    }

    /// Resolved path, once the identity (and for corporate, the track) is known.
    pub fn mode(&self) -> Option<MembershipMode> {
        match (self.answers.identity?, self.answers.corporate_track) {
            (IdentityChoice::Private, _) => Some(MembershipMode::Private),
            (IdentityChoice::Corporate, Some(CorporateTrack::NewPartnership)) => {
                Some(MembershipMode::CorporateNew)
            }
            (IdentityChoice::Corporate, Some(CorporateTrack::Employee)) => {
                Some(MembershipMode::CorporateEmployee)
            }
            (IdentityChoice::Corporate, None) => None,
        }
    }

    pub fn apply(
        &mut self,
        action: IntakeAction,
        verifier: &AccessCodeVerifier,
    ) -> Result<(), SessionError> {
        if let IntakeAction::Reset = action {
            self.reset();
            return Ok(());
        }
        if self.step.is_terminal() {
            return Err(SessionError::Terminal);
        }

        let name = action.name();
        match (self.step, action) {
            (_, IntakeAction::Back) => self.back(),
            (IntakeStep::Identity, IntakeAction::SelectIdentity { choice }) => {
                self.answers.identity = Some(choice);
                self.retain_valid_answers();
                let target = match choice {
                    IdentityChoice::Private => IntakeStep::Objective,
                    IdentityChoice::Corporate => IntakeStep::CorpTriage,
                };
                self.advance_to(target);
                Ok(())
            }
            (IntakeStep::CorpTriage, IntakeAction::SelectCorporateTrack { track }) => {
                self.answers.corporate_track = Some(track);
                self.retain_valid_answers();
                let target = match track {
                    CorporateTrack::NewPartnership => IntakeStep::CorpQualify,
                    CorporateTrack::Employee => IntakeStep::CorpVerify,
                };
                self.advance_to(target);
                Ok(())
            }
            (IntakeStep::CorpVerify, IntakeAction::VerifyAccessCode { code }) => {
                let verification = verifier.verify(&code);
                if verification.valid {
                    self.answers.access_code = verification.normalized_code;
                    self.grant = verification.entity_name.map(|entity_name| AccessGrant {
                        entity_name,
                        booking_url: verification.booking_url,
                    });
                    self.advance();
                } else {
                    self.answers.access_code = None;
                    self.grant = None;
                    self.message = verification.message;
                }
                Ok(())
            }
            (IntakeStep::CorpQualify, IntakeAction::SelectHeadcount { headcount }) => {
                self.answers.headcount = Some(headcount);
                self.advance();
                Ok(())
            }
            (IntakeStep::Objective, IntakeAction::SelectObjective { objective }) => {
                let mode = self.require_mode()?;
                let canonical = options::match_option(options::objectives_for(mode), &objective)
                    .ok_or(SessionError::UnknownOption {
                        field: "objective",
                        value: objective,
                    })?;
                self.answers.objective = Some(canonical.to_string());
                self.advance();
                Ok(())
            }
            (IntakeStep::Outcome, IntakeAction::SelectOutcome { outcome }) => {
                let mode = self.require_mode()?;
                let canonical = options::match_option(options::outcomes_for(mode), &outcome)
                    .ok_or(SessionError::UnknownOption {
                        field: "outcome",
                        value: outcome,
                    })?;
                self.answers.outcome = Some(canonical.to_string());
                self.advance();
                Ok(())
            }
            (IntakeStep::Location, IntakeAction::SubmitLocation { zip_code }) => {
                let mode = self.require_mode()?;
                let zip = sanitize_zip(&zip_code);
                if zip.is_empty() {
                    return Err(SessionError::MissingAnswer("zip_code"));
                }
                if !is_well_formed_zip(&zip) {
                    let mut errors = FieldErrors::new();
                    errors.add("zip_code", "Enter a 5-digit zip code");
                    self.field_errors = Some(errors.clone());
                    return Err(SessionError::Incomplete(errors));
                }
                self.field_errors = None;
                self.is_out_of_range = self.availability.is_out_of_area(
                    mode.membership_type(),
                    &zip,
                    self.answers.access_code.is_some(),
                );
                self.answers.zip_code = Some(zip);
                self.advance();
                if self.is_out_of_range {
                    self.message = Some(OUT_OF_AREA_NOTICE.to_string());
                }
                Ok(())
            }
            (step, _) => Err(SessionError::UnexpectedAction { step, action: name }),
        }
    }

    /// First half of a submission: checks the contact step and marks the session pending.
    pub fn begin_submission(
        &mut self,
        contact: ContactDetails,
    ) -> Result<SubmissionTicket, SessionError> {
        if self.pending {
            return Err(SessionError::SubmissionInFlight);
        }
        if self.step != IntakeStep::Contact {
            return Err(if self.step.is_terminal() {
                SessionError::Terminal
            } else {
                SessionError::UnexpectedAction {
                    step: self.step,
                    action: "submit",
                }
            });
        }
        let mode = self.require_mode()?;

        let contact = ContactDetails {
            full_name: contact.full_name.trim().to_string(),
            phone: contact.phone.trim().to_string(),
            email: contact.email,
        };
        let mut missing = FieldErrors::new();
        if contact.full_name.is_empty() {
            missing.add("full_name", "Name is required");
        }
        if contact.phone.is_empty() {
            missing.add("phone", "Phone is required");
        }
        self.answers.contact = Some(contact.clone());
        if !missing.is_empty() {
            self.field_errors = Some(missing.clone());
            return Err(SessionError::Incomplete(missing));
        }

        self.pending = true;
        self.message = None;
        self.field_errors = None;
        Ok(SubmissionTicket {
            generation: self.generation,
            fields: self.lead_fields(mode, contact),
        })
    }

    /// Second half of a submission. Outcomes from before a reset are dropped; returns
    /// whether the outcome was applied.
    pub fn finish_submission(
        &mut self,
        generation: u64,
        outcome: &Result<SubmissionReceipt, SubmissionError>,
    ) -> bool {
        if generation != self.generation {
            return false;
        }
        self.pending = false;
        match outcome {
            Ok(receipt) => {
                self.lead_id = Some(receipt.lead.id.clone());
                self.message = Some(receipt.message.clone());
                self.field_errors = None;
                self.history.clear();
                self.step = IntakeStep::Success;
            }
            Err(err) => {
                self.message = Some(err.to_string());
                self.field_errors = err.field_errors().cloned();
            }
        }
        true
    }

    pub fn booking_destination(&self, catalog: &BookingCatalog) -> Option<BookingDestination> {
        let mode = self.mode()?;
        catalog.destination_for(
            mode.lead_type(),
            self.answers.objective.as_deref(),
            self.grant.as_ref(),
        )
    }

    pub fn view(&self, catalog: &BookingCatalog) -> SessionView {
        SessionView {
            session_id: self.id.clone(),
            step: self.step,
            progress: self.step.progress(),
            mode: self.mode(),
            options: self.current_options(),
            can_go_back: !self.history.is_empty() && !self.step.is_terminal(),
            answers: self.answers.clone(),
            is_out_of_range: self.is_out_of_range,
            is_corporate_verified: self.is_corporate_verified(),
            entity_name: self.grant.as_ref().map(|grant| grant.entity_name.clone()),
            pending: self.pending,
            message: self.message.clone(),
            field_errors: self.field_errors.clone(),
            capacity: CapacityView {
                private: self.availability.capacity_status(MembershipType::Private),
                corporate: self.availability.capacity_status(MembershipType::Corporate),
            },
            lead_id: self.lead_id.clone(),
            booking: if self.step.is_terminal() {
                self.booking_destination(catalog)
            } else {
                None
            },
        }
    }

    fn current_options(&self) -> Vec<String> {
        let labels: Vec<&str> = match (self.step, self.mode()) {
            (IntakeStep::Identity, _) => vec!["private", "corporate"],
            (IntakeStep::CorpTriage, _) => vec!["new_partnership", "employee"],
            (IntakeStep::CorpQualify, _) => HeadcountBracket::ALL
                .iter()
                .map(|bracket| bracket.label())
                .collect(),
            (IntakeStep::Objective, Some(mode)) => options::objectives_for(mode).to_vec(),
            (IntakeStep::Outcome, Some(mode)) => options::outcomes_for(mode).to_vec(),
            _ => Vec::new(),
        };
        labels.into_iter().map(str::to_string).collect()
    }

    fn require_mode(&self) -> Result<MembershipMode, SessionError> {
        self.mode().ok_or(SessionError::MissingAnswer("membership"))
    }

    fn advance(&mut self) {
        if let Some(target) = self.mode().and_then(|mode| next_step(mode, self.step)) {
            self.advance_to(target);
        }
    }

    fn advance_to(&mut self, target: IntakeStep) {
        self.history.push(self.step);
        self.step = target;
        self.message = None;
        self.field_errors = None;
    }

    fn back(&mut self) -> Result<(), SessionError> {
        let previous = self.history.pop().ok_or(SessionError::AtInitialStep)?;
        self.step = previous;
        self.message = None;
        self.field_errors = None;
        Ok(())
    }

    fn reset(&mut self) {
        let generation = self.generation + 1;
        *self = Self::new(self.id.clone(), self.availability.clone());
        self.generation = generation;
    }

    /// Drops objective/outcome answers that are not offered on the current path.
    fn retain_valid_answers(&mut self) {
        let Some(mode) = self.mode() else {
            return;
        };
        if let Some(objective) = &self.answers.objective {
            if options::match_option(options::objectives_for(mode), objective).is_none() {
                self.answers.objective = None;
            }
        }
        if let Some(outcome) = &self.answers.outcome {
            if options::match_option(options::outcomes_for(mode), outcome).is_none() {
                self.answers.outcome = None;
            }
        }
        if mode != MembershipMode::CorporateEmployee {
            self.answers.access_code = None;
            self.grant = None;
        }
    }

    fn lead_fields(&self, mode: MembershipMode, contact: ContactDetails) -> RawLeadFields {
        let mut notes = format!(
            "Outcome: {} | Out of Range: {}",
            self.answers.outcome.as_deref().unwrap_or_default(),
            self.is_out_of_range
        );
        match mode {
            MembershipMode::CorporateNew => {
                let headcount = self.answers.headcount.map(HeadcountBracket::label);
                notes.push_str(&format!(" | Headcount: {}", headcount.unwrap_or_default()));
            }
            MembershipMode::CorporateEmployee => {
                let entity = self.grant.as_ref().map(|grant| grant.entity_name.as_str());
                notes.push_str(&format!(" | Entity: {}", entity.unwrap_or_default()));
            }
            MembershipMode::Private => {}
        }

        RawLeadFields {
            full_name: Some(contact.full_name),
            phone: Some(contact.phone),
            email: contact.email,
            lead_type: Some(mode.lead_type().label().to_string()),
            notes: Some(notes),
            activity_impacted: self.answers.objective.clone(),
            corporate_objective: match mode {
                MembershipMode::CorporateNew => self.answers.objective.clone(),
                _ => None,
            },
            zip_code: self.answers.zip_code.clone(),
            corporate_code: self.answers.access_code.clone(),
            ..RawLeadFields::default()
        }
    }
}

/// Digits only, first five kept.
pub fn sanitize_zip(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).take(5).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CapacityView {
    pub private: CapacityStatus,
    pub corporate: CapacityStatus,
}

/// Client-facing rendering of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub session_id: SessionId,
    pub step: IntakeStep,
    pub progress: u8,
    pub mode: Option<MembershipMode>,
    pub options: Vec<String>,
    pub can_go_back: bool,
    pub answers: IntakeAnswers,
    pub is_out_of_range: bool,
    pub is_corporate_verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
    pub pending: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<FieldErrors>,
    pub capacity: CapacityView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<LeadId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<BookingDestination>,
}
