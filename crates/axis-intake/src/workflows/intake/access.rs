use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PARTNER_CODE: &str = "AXIS2026";
pub const DEFAULT_PARTNER_ENTITY: &str = "Axis Premier Partner";

/// Shown for any rejected code. It must never hint at valid codes.
pub const INVALID_ACCESS_CODE_MESSAGE: &str = "We couldn't confirm that code. Please try again or contact Axis Concierge directly for priority assistance.";

/// What a valid corporate code unlocks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub entity_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_url: Option<String>,
}

/// Codes are compared trimmed and upper-cased.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[derive(Clone, PartialEq, Eq)]
pub struct AccessCodeDirectory {
    codes: HashMap<String, AccessGrant>,
}

impl AccessCodeDirectory {
    pub fn empty() -> Self {
        Self {
            codes: HashMap::new(),
        }
    }

    pub fn insert(&mut self, code: &str, grant: AccessGrant) {
        self.codes.insert(normalize_code(code), grant);
    }

    pub fn lookup(&self, code: &str) -> Option<&AccessGrant> {
        let normalized = normalize_code(code);
        if normalized.is_empty() {
            return None;
        }
        self.codes.get(&normalized)
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

impl Default for AccessCodeDirectory {
    fn default() -> Self {
        let mut directory = Self::empty();
        directory.insert(
            DEFAULT_PARTNER_CODE,
            AccessGrant {
                entity_name: DEFAULT_PARTNER_ENTITY.to_string(),
                booking_url: None,
            },
        );
        directory
    }
}

// Codes are shared secrets; keep them out of logs.
impl fmt::Debug for AccessCodeDirectory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessCodeDirectory")
            .field("codes", &self.codes.len())
            .finish()
    }
}

/// Result of checking a code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessVerification {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip)]
    pub normalized_code: Option<String>,
    #[serde(skip)]
    pub booking_url: Option<String>,
}

impl AccessVerification {
    fn rejected() -> Self {
        Self {
            valid: false,
            entity_name: None,
            message: Some(INVALID_ACCESS_CODE_MESSAGE.to_string()),
            normalized_code: None,
            booking_url: None,
        }
    }
}

/// Per-session handle for checking corporate access codes.
#[derive(Debug, Clone)]
pub struct AccessCodeVerifier {
    directory: Arc<AccessCodeDirectory>,
}

impl AccessCodeVerifier {
    pub fn new(directory: AccessCodeDirectory) -> Self {
        Self {
            directory: Arc::new(directory),
        }
    }

    pub fn verify(&self, code: &str) -> AccessVerification {
        match self.directory.lookup(code) {
            Some(grant) => AccessVerification {
                valid: true,
                entity_name: Some(grant.entity_name.clone()),
                message: None,
                normalized_code: Some(normalize_code(code)),
                booking_url: grant.booking_url.clone(),
            },
            None => AccessVerification::rejected(),
        }
    }

    pub fn grant(&self, code: &str) -> Option<&AccessGrant> {
        self.directory.lookup(code)
    }
}

impl Default for AccessCodeVerifier {
    fn default() -> Self {
        Self::new(AccessCodeDirectory::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verification_ignores_case_and_whitespace() {
        let verifier = AccessCodeVerifier::default();
        let results: Vec<_> = [" axis2026 ", "AXIS2026", "Axis2026"]
            .iter()
            .map(|code| verifier.verify(code))
            .collect();

        for result in &results {
            assert!(result.valid);
            assert_eq!(result.entity_name.as_deref(), Some(DEFAULT_PARTNER_ENTITY));
            assert_eq!(result.normalized_code.as_deref(), Some("AXIS2026"));
        }
        assert_eq!(results[0], results[1]);
        assert_eq!(results[1], results[2]);
    }

    #[test]
    fn rejects_partial_and_empty_codes_without_listing_valid_ones() {
        let verifier = AccessCodeVerifier::default();
        for attempt in ["AXIS", "AXIS20266", "", "   "] {
            let result = verifier.verify(attempt);
            assert!(!result.valid, "{attempt:?} should be rejected");
            let message = result.message.expect("failure message");
            assert!(!message.contains(DEFAULT_PARTNER_CODE));
        }
    }

    #[test]
    fn serialized_verification_hides_internal_fields() {
        let mut directory = AccessCodeDirectory::empty();
        directory.insert(
            "delta",
            AccessGrant {
                entity_name: "Delta Air Group".to_string(),
                booking_url: Some("https://book.example/corp/100".to_string()),
            },
        );
        let verifier = AccessCodeVerifier::new(directory);
        let result = verifier.verify("Delta");
        assert_eq!(result.booking_url.as_deref(), Some("https://book.example/corp/100"));

        let payload = serde_json::to_value(&result).expect("serializes");
        assert_eq!(payload["valid"], true);
        assert!(payload.get("normalized_code").is_none());
        assert!(payload.get("booking_url").is_none());
        assert!(!format!("{:?}", AccessCodeDirectory::default()).contains("AXIS2026"));
    }
}
