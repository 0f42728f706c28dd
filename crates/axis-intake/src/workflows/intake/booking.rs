use serde::{Deserialize, Serialize};

use super::access::AccessGrant;
use super::domain::LeadType;
use super::session::options::ACUTE_RECOVERY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingCategory {
    AcuteCare,
    Maintenance,
    CorporatePartner,
}

/// Deep link handed to the external booking system after qualification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingDestination {
    pub category: BookingCategory,
    pub url: String,
}

/// Booking links per care category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingCatalog {
    acute_care: String,
    maintenance: String,
}

impl BookingCatalog {
    pub fn from_base_url(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/');
        Self {
            acute_care: format!("{base_url}/#/staff_member/1/treatment/1"),
            maintenance: format!("{base_url}/#/staff_member/1/treatment/2"),
        }
    }

    /// New corporate partners get a proposal from the concierge, not a booking link.
    pub fn destination_for(
        &self,
        lead_type: LeadType,
        objective: Option<&str>,
        grant: Option<&AccessGrant>,
    ) -> Option<BookingDestination> {
        if lead_type == LeadType::CorporateNew {
            return None;
        }

        if let Some(url) = grant.and_then(|grant| grant.booking_url.as_ref()) {
            return Some(BookingDestination {
                category: BookingCategory::CorporatePartner,
                url: url.clone(),
            });
        }

        let acute = objective.is_some_and(|objective| objective.eq_ignore_ascii_case(ACUTE_RECOVERY));
        Some(if acute {
            BookingDestination {
                category: BookingCategory::AcuteCare,
                url: self.acute_care.clone(),
            }
        } else {
            BookingDestination {
                category: BookingCategory::Maintenance,
                url: self.maintenance.clone(),
            }
        })
    }
}
