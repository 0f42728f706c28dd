use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use super::access::normalize_code;
use super::domain::{
    DeploymentPriority, InterestLevel, LeadDraft, LeadStatus, LeadType, Labelled, RawLeadFields,
};

/// Field name to human-readable messages, in field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
            .collect::<Vec<_>>()
            .join(" | ");
        f.write_str(&rendered)
    }
}

/// A submission that passed schema checks, with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLead {
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
}

impl ValidatedLead {
    pub fn into_draft(self, is_out_of_area: bool, venture_id: Option<String>) -> LeadDraft {
        LeadDraft {
            full_name: self.full_name,
            phone: self.phone,
            email: self.email,
            interest_level: self.interest_level,
            lead_type: self.lead_type,
            deployment_priority: self.deployment_priority,
            notes: self.notes,
            activity_impacted: self.activity_impacted,
            corporate_objective: self.corporate_objective,
            zip_code: self.zip_code,
            corporate_code: self.corporate_code,
            is_out_of_area,
            status: LeadStatus::New,
            venture_id,
        }
    }
}

/// Schema check over raw fields. Fails closed: any error rejects the whole lead.
pub fn validate_lead(raw: &RawLeadFields) -> Result<ValidatedLead, FieldErrors> {
    let mut errors = FieldErrors::new();

    let full_name = present(&raw.full_name);
    if full_name.is_none() {
        errors.add("full_name", "Name is required");
    }

    let phone = present(&raw.phone);
    if phone.is_none() {
        errors.add("phone", "Phone is required");
    }

    let email = present(&raw.email);
    if let Some(candidate) = &email {
        if !candidate.validate_email() {
            errors.add("email", "Invalid email");
        }
    }

    let interest_level = parse_label::<InterestLevel>(&raw.interest_level, &mut errors);
    let lead_type = parse_label::<LeadType>(&raw.lead_type, &mut errors);
    let deployment_priority = parse_label::<DeploymentPriority>(&raw.deployment_priority, &mut errors);

    match (full_name, phone) {
        (Some(full_name), Some(phone)) if errors.is_empty() => Ok(ValidatedLead {
            full_name,
            phone,
            email,
            interest_level,
            lead_type,
            deployment_priority,
            notes: present(&raw.notes),
            activity_impacted: present(&raw.activity_impacted),
            corporate_objective: present(&raw.corporate_objective),
            zip_code: present(&raw.zip_code),
            corporate_code: present(&raw.corporate_code).map(|code| normalize_code(&code)),
        }),
        _ => Err(errors),
    }
}

/// Trimmed value; blank counts as absent.
fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn parse_label<T>(value: &Option<String>, errors: &mut FieldErrors) -> T
where
    T: Labelled + Default,
{
    match present(value) {
        None => T::default(),
        Some(raw) => T::from_label(&raw).unwrap_or_else(|| {
            errors.add(
                T::FIELD,
                format!("Invalid value '{raw}'. Expected {}", T::expected()),
            );
            T::default()
        }),
    }
}
