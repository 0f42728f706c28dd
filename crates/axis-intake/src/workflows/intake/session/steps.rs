use std::fmt;

use serde::{Deserialize, Serialize};

use crate::workflows::intake::domain::{LeadType, MembershipType};

/// One screen of the intake wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntakeStep {
    Identity,
    CorpTriage,
    CorpVerify,
    CorpQualify,
    Objective,
    Outcome,
    Location,
    Contact,
    Success,
}

impl IntakeStep {
    pub const fn as_str(self) -> &'static str {
        match self {
            IntakeStep::Identity => "identity",
            IntakeStep::CorpTriage => "corp_triage",
            IntakeStep::CorpVerify => "corp_verify",
            IntakeStep::CorpQualify => "corp_qualify",
            IntakeStep::Objective => "objective",
            IntakeStep::Outcome => "outcome",
            IntakeStep::Location => "location",
            IntakeStep::Contact => "contact",
            IntakeStep::Success => "success",
        }
    }

    /// Progress bar percentage shown with the step.
    pub const fn progress(self) -> u8 {
        match self {
            IntakeStep::Identity => 10,
            IntakeStep::CorpTriage => 25,
            IntakeStep::CorpVerify | IntakeStep::CorpQualify => 30,
            IntakeStep::Objective => 50,
            IntakeStep::Outcome => 70,
            IntakeStep::Location => 85,
            IntakeStep::Contact => 95,
            IntakeStep::Success => 100,
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, IntakeStep::Success)
    }
}

impl fmt::Display for IntakeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First-screen choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityChoice {
    Private,
    Corporate,
}

/// Corporate triage choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorporateTrack {
    NewPartnership,
    Employee,
}

/// Resolved path through the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipMode {
    Private,
    CorporateNew,
    CorporateEmployee,
}

const PRIVATE_PATH: &[IntakeStep] = &[
    IntakeStep::Identity,
    IntakeStep::Objective,
    IntakeStep::Outcome,
    IntakeStep::Location,
    IntakeStep::Contact,
    IntakeStep::Success,
];

const CORPORATE_NEW_PATH: &[IntakeStep] = &[
    IntakeStep::Identity,
    IntakeStep::CorpTriage,
    IntakeStep::CorpQualify,
    IntakeStep::Objective,
    IntakeStep::Outcome,
    IntakeStep::Location,
    IntakeStep::Contact,
    IntakeStep::Success,
];

const CORPORATE_EMPLOYEE_PATH: &[IntakeStep] = &[
    IntakeStep::Identity,
    IntakeStep::CorpTriage,
    IntakeStep::CorpVerify,
    IntakeStep::Objective,
    IntakeStep::Outcome,
    IntakeStep::Location,
    IntakeStep::Contact,
    IntakeStep::Success,
];

impl MembershipMode {
    /// Ordered steps for this path.
    pub const fn path(self) -> &'static [IntakeStep] {
        match self {
            MembershipMode::Private => PRIVATE_PATH,
            MembershipMode::CorporateNew => CORPORATE_NEW_PATH,
            MembershipMode::CorporateEmployee => CORPORATE_EMPLOYEE_PATH,
        }
    }

    pub const fn lead_type(self) -> LeadType {
        match self {
            MembershipMode::Private => LeadType::Private,
            MembershipMode::CorporateNew => LeadType::CorporateNew,
            MembershipMode::CorporateEmployee => LeadType::CorporateEmployee,
        }
    }

    pub const fn membership_type(self) -> MembershipType {
        self.lead_type().membership_type()
    }
}

/// Step following `current` on this path, if any.
pub fn next_step(mode: MembershipMode, current: IntakeStep) -> Option<IntakeStep> {
    let path = mode.path();
    path.iter()
        .position(|step| *step == current)
        .and_then(|index| path.get(index + 1))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_path_starts_at_identity_and_ends_in_success() {
        for mode in [
            MembershipMode::Private,
            MembershipMode::CorporateNew,
            MembershipMode::CorporateEmployee,
        ] {
            let path = mode.path();
            assert_eq!(path.first(), Some(&IntakeStep::Identity));
            assert_eq!(path.last(), Some(&IntakeStep::Success));
            assert_eq!(next_step(mode, IntakeStep::Success), None);
        }
    }

    #[test]
    fn corporate_paths_diverge_after_triage() {
        assert_eq!(
            next_step(MembershipMode::CorporateNew, IntakeStep::CorpTriage),
            Some(IntakeStep::CorpQualify)
        );
        assert_eq!(
            next_step(MembershipMode::CorporateEmployee, IntakeStep::CorpTriage),
            Some(IntakeStep::CorpVerify)
        );
        assert_eq!(
            next_step(MembershipMode::Private, IntakeStep::Identity),
            Some(IntakeStep::Objective)
        );
        assert_eq!(next_step(MembershipMode::Private, IntakeStep::CorpVerify), None);
    }

    #[test]
    fn progress_increases_along_each_path() {
        for mode in [
            MembershipMode::Private,
            MembershipMode::CorporateNew,
            MembershipMode::CorporateEmployee,
        ] {
            let progress: Vec<u8> = mode.path().iter().map(|step| step.progress()).collect();
            assert!(progress.windows(2).all(|pair| pair[0] < pair[1]));
        }
        assert_eq!(IntakeStep::CorpVerify.to_string(), "corp_verify");
    }
}
