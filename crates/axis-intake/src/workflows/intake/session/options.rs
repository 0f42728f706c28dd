use serde::{Deserialize, Serialize};

use super::steps::MembershipMode;

pub const ACUTE_RECOVERY: &str = "Acute Recovery";

pub const PRIVATE_OBJECTIVES: &[&str] = &[
    "Performance Optimization",
    ACUTE_RECOVERY,
    "Chronic Maintenance",
    "Executive Strategy",
];

pub const CORPORATE_OBJECTIVES: &[&str] = &[
    "Employee Wellness Program",
    "Executive Health Suite",
    "On-Site Recovery Lab",
    "Performance Workshop",
];

pub const PRIVATE_OUTCOMES: &[&str] = &[
    "Treatment Session",
    "Specialized Consult",
    "Bespoke Roadmap",
    "Readiness Scan",
];

pub const CORPORATE_OUTCOMES: &[&str] = &[
    "Implementation Proposal",
    "On-Site Tour",
    "Discovery Workshop",
    "Scalability Review",
];

/// Verified employees book individual care, so they share the private lists.
pub fn objectives_for(mode: MembershipMode) -> &'static [&'static str] {
    match mode {
        MembershipMode::CorporateNew => CORPORATE_OBJECTIVES,
        MembershipMode::Private | MembershipMode::CorporateEmployee => PRIVATE_OBJECTIVES,
    }
}

pub fn outcomes_for(mode: MembershipMode) -> &'static [&'static str] {
    match mode {
        MembershipMode::CorporateNew => CORPORATE_OUTCOMES,
        MembershipMode::Private | MembershipMode::CorporateEmployee => PRIVATE_OUTCOMES,
    }
}

/// Returns the canonical label for a trimmed, case-insensitive match.
pub fn match_option(options: &[&'static str], raw: &str) -> Option<&'static str> {
    let raw = raw.trim();
    options
        .iter()
        .copied()
        .find(|option| option.eq_ignore_ascii_case(raw))
}

/// Organization size asked of new corporate partners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeadcountBracket {
    #[serde(rename = "< 10")]
    UnderTen,
    #[serde(rename = "10-50")]
    TenToFifty,
    #[serde(rename = "50+")]
    FiftyPlus,
}

impl HeadcountBracket {
    pub const ALL: [HeadcountBracket; 3] = [Self::UnderTen, Self::TenToFifty, Self::FiftyPlus];

    pub const fn label(self) -> &'static str {
        match self {
            HeadcountBracket::UnderTen => "< 10",
            HeadcountBracket::TenToFifty => "10-50",
            HeadcountBracket::FiftyPlus => "50+",
        }
    }
}
