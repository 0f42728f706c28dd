use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::MembershipType;
use super::repository::{LeadRepository, SettingsStore};

/// Whitelisted private-membership zip codes used when settings are unavailable.
pub const DEFAULT_PRIVATE_WHITELIST: &[&str] = &["84010"];
/// Metro-area zip prefixes accepted for corporate partners.
pub const DEFAULT_CORPORATE_PREFIXES: &[&str] = &["840", "841", "843", "844"];
pub const DEFAULT_PRIVATE_CAPACITY: u32 = 50;
pub const DEFAULT_CORPORATE_CAPACITY: u32 = 10;

/// Rule deciding whether a zip code is inside the primary service zone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum ServiceZone {
    ZipWhitelist {
        zips: Vec<String>,
    },
    RegionalPrefixes {
        prefixes: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        radius_miles: Option<u32>,
    },
}

impl ServiceZone {
    pub fn default_for(membership: MembershipType) -> Self {
        match membership {
            MembershipType::Private => Self::ZipWhitelist {
                zips: to_owned(DEFAULT_PRIVATE_WHITELIST),
            },
            MembershipType::Corporate => Self::RegionalPrefixes {
                prefixes: to_owned(DEFAULT_CORPORATE_PREFIXES),
                radius_miles: None,
            },
        }
    }

    pub fn covers(&self, zip: &str) -> bool {
        match self {
            ServiceZone::ZipWhitelist { zips } => zips.iter().any(|allowed| allowed == zip),
            ServiceZone::RegionalPrefixes { prefixes, .. } => prefixes
                .iter()
                .any(|prefix| !prefix.is_empty() && zip.starts_with(prefix.as_str())),
        }
    }
}

/// A zip is exactly five ASCII digits.
pub fn is_well_formed_zip(zip: &str) -> bool {
    zip.len() == 5 && zip.bytes().all(|byte| byte.is_ascii_digit())
}

/// Service-area check. An access code waives the private whitelist; an empty or
/// malformed zip is always out of area. The result annotates a lead and never blocks it.
pub fn is_out_of_area(
    zone: &ServiceZone,
    membership: MembershipType,
    zip: &str,
    access_code_provided: bool,
) -> bool {
    let zip = zip.trim();
    if !is_well_formed_zip(zip) {
        return true;
    }

    match membership {
        MembershipType::Private => !zone.covers(zip) && !access_code_provided,
        MembershipType::Corporate => !zone.covers(zip),
    }
}

/// Informational capacity label shown next to a membership type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapacityStatus {
    Open,
    #[serde(rename = "Limited Capacity")]
    LimitedCapacity,
}

impl CapacityStatus {
    pub const fn label(self) -> &'static str {
        match self {
            CapacityStatus::Open => "Open",
            CapacityStatus::LimitedCapacity => "Limited Capacity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipAvailability {
    pub membership: MembershipType,
    pub active_count: u32,
    pub capacity_limit: u32,
    pub available: bool,
    pub zone: ServiceZone,
}

impl MembershipAvailability {
    pub fn new(
        membership: MembershipType,
        active_count: u32,
        capacity_limit: u32,
        zone: ServiceZone,
    ) -> Self {
        Self {
            membership,
            active_count,
            capacity_limit,
            available: active_count < capacity_limit,
            zone,
        }
    }

    pub fn with_active_count(self, active_count: u32) -> Self {
        Self::new(self.membership, active_count, self.capacity_limit, self.zone)
    }

    pub fn capacity_status(&self) -> CapacityStatus {
        if self.available {
            CapacityStatus::Open
        } else {
            CapacityStatus::LimitedCapacity
        }
    }
}

/// Where a snapshot's numbers came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    Settings,
    Fallback,
}

/// Read-only capacity and service-zone view fetched when a session starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySnapshot {
    pub private: MembershipAvailability,
    pub corporate: MembershipAvailability,
    pub source: SnapshotSource,
}

impl AvailabilitySnapshot {
    /// Everything open, default zones.
    pub fn permissive_fallback() -> Self {
        Self {
            private: MembershipAvailability::new(
                MembershipType::Private,
                0,
                DEFAULT_PRIVATE_CAPACITY,
                ServiceZone::default_for(MembershipType::Private),
            ),
            corporate: MembershipAvailability::new(
                MembershipType::Corporate,
                0,
                DEFAULT_CORPORATE_CAPACITY,
                ServiceZone::default_for(MembershipType::Corporate),
            ),
            source: SnapshotSource::Fallback,
        }
    }

    pub fn for_membership(&self, membership: MembershipType) -> &MembershipAvailability {
        match membership {
            MembershipType::Private => &self.private,
            MembershipType::Corporate => &self.corporate,
        }
    }

    pub fn capacity_status(&self, membership: MembershipType) -> CapacityStatus {
        self.for_membership(membership).capacity_status()
    }

    pub fn is_out_of_area(
        &self,
        membership: MembershipType,
        zip: &str,
        access_code_provided: bool,
    ) -> bool {
        is_out_of_area(
            &self.for_membership(membership).zone,
            membership,
            zip,
            access_code_provided,
        )
    }

    fn record_active_count(&mut self, membership: MembershipType, active_count: u32) {
        match membership {
            MembershipType::Private => {
                self.private = self.private.clone().with_active_count(active_count);
            }
            MembershipType::Corporate => {
                self.corporate = self.corporate.clone().with_active_count(active_count);
            }
        }
    }
}

/// Per-type row of the single-row settings object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipSettings {
    pub capacity_limit: u32,
    #[serde(default)]
    pub active_count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub whitelist: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prefixes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius_miles: Option<u32>,
}

/// Capacity limits and zone rules as stored by the settings collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeSettings {
    pub private: MembershipSettings,
    pub corporate: MembershipSettings,
}

impl Default for IntakeSettings {
    fn default() -> Self {
        Self {
            private: MembershipSettings {
                capacity_limit: DEFAULT_PRIVATE_CAPACITY,
                active_count: 0,
                whitelist: to_owned(DEFAULT_PRIVATE_WHITELIST),
                prefixes: Vec::new(),
                radius_miles: None,
            },
            corporate: MembershipSettings {
                capacity_limit: DEFAULT_CORPORATE_CAPACITY,
                active_count: 0,
                whitelist: Vec::new(),
                prefixes: to_owned(DEFAULT_CORPORATE_PREFIXES),
                radius_miles: None,
            },
        }
    }
}

impl IntakeSettings {
    /// Empty whitelists or prefix lists fall back to the defaults.
    pub fn snapshot(&self) -> AvailabilitySnapshot {
        let private_zone = if self.private.whitelist.is_empty() {
            ServiceZone::default_for(MembershipType::Private)
        } else {
            ServiceZone::ZipWhitelist {
                zips: self.private.whitelist.clone(),
            }
        };
        let corporate_zone = if self.corporate.prefixes.is_empty() {
            ServiceZone::default_for(MembershipType::Corporate)
        } else {
            ServiceZone::RegionalPrefixes {
                prefixes: self.corporate.prefixes.clone(),
                radius_miles: self.corporate.radius_miles,
            }
        };

        AvailabilitySnapshot {
            private: MembershipAvailability::new(
                MembershipType::Private,
                self.private.active_count,
                self.private.capacity_limit,
                private_zone,
            ),
            corporate: MembershipAvailability::new(
                MembershipType::Corporate,
                self.corporate.active_count,
                self.corporate.capacity_limit,
                corporate_zone,
            ),
            source: SnapshotSource::Settings,
        }
    }
}

/// Reads settings and recomputes active counts from stored leads. Never fails.
pub struct AvailabilityService<G, R> {
    settings: Arc<G>,
    leads: Arc<R>,
    venture_id: Option<String>,
}

impl<G, R> AvailabilityService<G, R>
where
    G: SettingsStore + 'static,
    R: LeadRepository + 'static,
{
    pub fn new(settings: Arc<G>, leads: Arc<R>, venture_id: Option<String>) -> Self {
        Self {
            settings,
            leads,
            venture_id,
        }
    }

    pub async fn check_availability(&self) -> AvailabilitySnapshot {
        let settings = match self.settings.load_settings().await {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                debug!("no intake settings row found; using permissive availability");
                return AvailabilitySnapshot::permissive_fallback();
            }
            Err(err) => {
                debug!(error = %err, "intake settings unavailable; using permissive availability");
                return AvailabilitySnapshot::permissive_fallback();
            }
        };

        let mut snapshot = settings.snapshot();
        for membership in [MembershipType::Private, MembershipType::Corporate] {
            match self
                .leads
                .count_active(self.venture_id.as_deref(), membership)
                .await
            {
                Ok(count) => snapshot.record_active_count(membership, count),
                Err(err) => debug!(
                    error = %err,
                    membership = membership.label(),
                    "active lead count unavailable; keeping stored count"
                ),
            }
        }
        snapshot
    }
}

fn to_owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}
