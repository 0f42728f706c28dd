use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier wrapper for stored leads. The store assigns it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(pub String);

impl LeadId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Closed vocabulary fields stored as their display label.
pub trait Labelled: Sized + Copy + 'static {
    const FIELD: &'static str;
    const VARIANTS: &'static [Self];

    fn label(self) -> &'static str;

    fn from_label(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::VARIANTS
            .iter()
            .copied()
            .find(|variant| variant.label() == raw)
    }

    fn expected() -> String {
        Self::VARIANTS
            .iter()
            .map(|variant| format!("'{}'", variant.label()))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterestLevel {
    High,
    #[default]
    Medium,
    Low,
}

impl Labelled for InterestLevel {
    const FIELD: &'static str = "interest_level";
    const VARIANTS: &'static [Self] = &[Self::High, Self::Medium, Self::Low];

    fn label(self) -> &'static str {
        match self {
            InterestLevel::High => "High",
            InterestLevel::Medium => "Medium",
            InterestLevel::Low => "Low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LeadType {
    #[default]
    Private,
    #[serde(rename = "Corporate_New")]
    CorporateNew,
    #[serde(rename = "Corporate_Employee")]
    CorporateEmployee,
}

impl LeadType {
    pub const fn membership_type(self) -> MembershipType {
        match self {
            LeadType::Private => MembershipType::Private,
            LeadType::CorporateNew | LeadType::CorporateEmployee => MembershipType::Corporate,
        }
    }
}

impl Labelled for LeadType {
    const FIELD: &'static str = "lead_type";
    const VARIANTS: &'static [Self] = &[Self::Private, Self::CorporateNew, Self::CorporateEmployee];

    fn label(self) -> &'static str {
        match self {
            LeadType::Private => "Private",
            LeadType::CorporateNew => "Corporate_New",
            LeadType::CorporateEmployee => "Corporate_Employee",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeploymentPriority {
    #[serde(rename = "ASAP")]
    Asap,
    #[serde(rename = "This Week")]
    ThisWeek,
    #[default]
    #[serde(rename = "General Inquiry")]
    GeneralInquiry,
}

impl Labelled for DeploymentPriority {
    const FIELD: &'static str = "deployment_priority";
    const VARIANTS: &'static [Self] = &[Self::Asap, Self::ThisWeek, Self::GeneralInquiry];

    fn label(self) -> &'static str {
        match self {
            DeploymentPriority::Asap => "ASAP",
            DeploymentPriority::ThisWeek => "This Week",
            DeploymentPriority::GeneralInquiry => "General Inquiry",
        }
    }
}

/// Pipeline status. Intake only ever writes `New`; the admin surface moves it on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Converted,
    Archived,
}

impl LeadStatus {
    /// Archived leads no longer count against capacity.
    pub const fn is_active(self) -> bool {
        !matches!(self, LeadStatus::Archived)
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl Labelled for LeadStatus {
    const FIELD: &'static str = "status";
    const VARIANTS: &'static [Self] = &[
        Self::New,
        Self::Contacted,
        Self::Converted,
        Self::Archived,
    ];

    fn label(self) -> &'static str {
        match self {
            LeadStatus::New => "New",
            LeadStatus::Contacted => "Contacted",
            LeadStatus::Converted => "Converted",
            LeadStatus::Archived => "Archived",
        }
    }
}

/// Which eligibility rules apply to a prospect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipType {
    Private,
    Corporate,
}

impl MembershipType {
    pub const fn label(self) -> &'static str {
        match self {
            MembershipType::Private => "private",
            MembershipType::Corporate => "corporate",
        }
    }

    pub const fn lead_types(self) -> &'static [LeadType] {
        match self {
            MembershipType::Private => &[LeadType::Private],
            MembershipType::Corporate => &[LeadType::CorporateNew, LeadType::CorporateEmployee],
        }
    }
}

/// Untrusted submission exactly as it arrives from a form or API caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawLeadFields {
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub interest_level: Option<String>,
    pub lead_type: Option<String>,
    pub deployment_priority: Option<String>,
    pub notes: Option<String>,
    pub activity_impacted: Option<String>,
    pub corporate_objective: Option<String>,
    pub zip_code: Option<String>,
    pub corporate_code: Option<String>,
}

/// Normalized insert payload for the `leads` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadDraft {
    pub full_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub interest_level: InterestLevel,
    pub lead_type: LeadType,
    pub deployment_priority: DeploymentPriority,
    pub notes: Option<String>,
    pub activity_impacted: Option<String>,
    pub corporate_objective: Option<String>,
    pub zip_code: Option<String>,
    pub corporate_code: Option<String>,
    pub is_out_of_area: bool,
    pub status: LeadStatus,
    pub venture_id: Option<String>,
}

/// Stored lead row with the server-assigned identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: LeadDraft,
}

impl Lead {
    pub fn membership_type(&self) -> MembershipType {
        self.fields.lead_type.membership_type()
    }
}

/// Secondary analytics/CRM event mirroring a captured lead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub venture_id: String,
    pub source: String,
    pub kind: String,
    pub lead_id: LeadId,
    pub occurred_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl SignalEvent {
    pub const SOURCE: &'static str = "axis-intake";
    pub const LEAD_CAPTURED: &'static str = "lead_captured";

    pub fn lead_captured(venture_id: &str, lead: &Lead) -> Self {
        Self {
            venture_id: venture_id.to_string(),
            source: Self::SOURCE.to_string(),
            kind: Self::LEAD_CAPTURED.to_string(),
            lead_id: lead.id.clone(),
            occurred_at: lead.created_at,
            payload: serde_json::json!({
                "lead_type": lead.fields.lead_type.label(),
                "interest_level": lead.fields.interest_level.label(),
                "deployment_priority": lead.fields.deployment_priority.label(),
                "is_out_of_area": lead.fields.is_out_of_area,
                "zip_code": lead.fields.zip_code,
            }),
        }
    }
}

/// Contact fields collected on the final wizard step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
}
