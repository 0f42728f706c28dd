//! Membership intake funnel for a concierge chiropractic practice: a branching
//! questionnaire, service-area and capacity checks, corporate access codes, and lead
//! capture into a PostgREST-style store.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
