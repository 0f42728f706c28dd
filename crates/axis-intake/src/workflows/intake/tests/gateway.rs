use super::common::*;
use crate::config::{IntakeConfig, StoreSettings};
use crate::workflows::intake::availability::{
    AvailabilityService, AvailabilitySnapshot, IntakeSettings,
};
use crate::workflows::intake::domain::{LeadStatus, LeadType, MembershipType, SignalEvent};
use crate::workflows::intake::gateway::{
    GatewaySettings, LeadSubmissionGateway, SubmissionError, SubmissionResponse,
};
use crate::workflows::intake::memory::InMemoryLeadStore;
use crate::workflows::intake::{build_intake_service, repository::LeadRepository};
use std::sync::Arc;

#[tokio::test]
async fn scenario_private_lead_in_whitelist_is_stored_as_new() {
    let (service, store) = build_service();
    let mut raw = raw_lead("J. Doe", "8015551234");
    raw.zip_code = Some("84010".to_string());
    raw.lead_type = Some("Private".to_string());

    let receipt = service.submit_raw(raw).await.expect("submission succeeds");
    let response = SubmissionResponse::from(&receipt);
    assert!(response.success);
    assert_eq!(response.is_out_of_area, Some(false));

    let stored = store.leads();
    assert_eq!(stored.len(), 1);
    assert!(!stored[0].fields.is_out_of_area);
    assert_eq!(stored[0].fields.status, LeadStatus::New);
    assert_eq!(stored[0].fields.venture_id.as_deref(), Some(VENTURE));
    assert_eq!(receipt.message, "Submission confirmed to project [local...].");
}

#[tokio::test]
async fn scenario_missing_name_reports_only_that_field_and_writes_nothing() {
    let (service, store) = build_service();
    let err = service
        .submit_raw(raw_lead("", "8015551234"))
        .await
        .expect_err("validation fails");

    let response = SubmissionResponse::from(&err);
    assert!(!response.success);
    let errors = response.field_errors.expect("field errors");
    assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["full_name"]);
    assert!(response.message.starts_with("Validation Error: full_name"));
    assert!(store.leads().is_empty());
}

#[tokio::test]
async fn stored_flag_matches_area_check_for_each_membership() {
    let (service, store) = build_service();
    let snapshot = AvailabilitySnapshot::permissive_fallback();
    let cases = [
        ("Private", "84010", None),
        ("Private", "99999", None),
        ("Private", "99999", Some("AXIS2026")),
        ("Corporate_New", "84404", None),
        ("Corporate_Employee", "84201", Some("AXIS2026")),
        ("Private", "", None),
    ];

    for (lead_type, zip, code) in cases {
        let mut raw = raw_lead("J. Doe", "8015551234");
        raw.lead_type = Some(lead_type.to_string());
        raw.zip_code = Some(zip.to_string());
        raw.corporate_code = code.map(str::to_string);
        let receipt = service.submit_raw(raw).await.expect("valid submission");

        let membership = receipt.lead.membership_type();
        let expected = snapshot.is_out_of_area(membership, zip, code.is_some());
        assert_eq!(
            receipt.lead.fields.is_out_of_area, expected,
            "{lead_type} {zip:?} {code:?}"
        );
    }
    assert_eq!(store.leads().len(), 6);
}

#[tokio::test]
async fn partial_zip_is_flagged_out_of_area_for_every_membership() {
    let (service, store) = build_service();
    let cases = [
        ("Corporate_New", "840", None),
        ("Corporate_New", "840AB", None),
        ("Corporate_Employee", "8420", Some("AXIS2026")),
        ("Private", "8401", Some("AXIS2026")),
    ];

    for (lead_type, zip, code) in cases {
        let mut raw = raw_lead("J. Doe", "8015551234");
        raw.lead_type = Some(lead_type.to_string());
        raw.zip_code = Some(zip.to_string());
        raw.corporate_code = code.map(str::to_string);
        let receipt = service.submit_raw(raw).await.expect("valid submission");
        assert!(receipt.lead.fields.is_out_of_area, "{lead_type} {zip:?}");
    }
    assert!(store.leads().iter().all(|lead| lead.fields.is_out_of_area));
}

#[tokio::test]
async fn signal_mirrors_lead_after_primary_write() {
    let (service, store) = build_service();
    let receipt = service
        .submit_raw(raw_lead("J. Doe", "8015551234"))
        .await
        .expect("submission succeeds");
    receipt
        .signal
        .expect("venture configured, signal spawned")
        .await
        .expect("signal task completes");

    let signals = store.signals();
    assert_eq!(signals.len(), 1);
    assert_eq!(signals[0].venture_id, VENTURE);
    assert_eq!(signals[0].kind, SignalEvent::LEAD_CAPTURED);
    assert_eq!(signals[0].lead_id, receipt.lead.id);
}

#[tokio::test]
async fn no_signal_without_venture_id() {
    let (service, store) = build_service_with(
        InMemoryLeadStore::new(),
        StoreSettings::Memory { venture_id: None },
    );
    let receipt = service
        .submit_raw(raw_lead("J. Doe", "8015551234"))
        .await
        .expect("submission succeeds");
    assert!(receipt.signal.is_none());
    assert!(store.signals().is_empty());
    assert_eq!(store.leads().len(), 1);
}

#[tokio::test]
async fn signal_failure_does_not_fail_submission() {
    let store = InMemoryLeadStore::new();
    let service = build_intake_service(
        Arc::new(store.clone()),
        Arc::new(BrokenSignals),
        Arc::new(store.clone()),
        &memory_settings(),
        &IntakeConfig::default(),
    );

    let receipt = service
        .submit_raw(raw_lead("J. Doe", "8015551234"))
        .await
        .expect("primary write wins");
    receipt
        .signal
        .expect("signal spawned")
        .await
        .expect("failure is swallowed inside the task");
    assert_eq!(store.leads().len(), 1);
}

#[tokio::test]
async fn storage_failure_surfaces_store_message() {
    let settings = InMemoryLeadStore::new();
    let service = build_intake_service(
        Arc::new(RejectingRepository),
        Arc::new(settings.clone()),
        Arc::new(settings),
        &memory_settings(),
        &IntakeConfig::default(),
    );

    let err = service
        .submit_raw(raw_lead("J. Doe", "8015551234"))
        .await
        .expect_err("store rejects");
    assert!(matches!(err, SubmissionError::Storage(_)));
    assert_eq!(
        err.to_string(),
        "Submission Error: store rejected request (401): Invalid API key"
    );
    assert!(SubmissionResponse::from(&err).field_errors.is_none());
}

#[tokio::test]
async fn missing_configuration_disables_submission() {
    let settings = StoreSettings::resolve(None, None, None, 10);
    let (service, store) = build_service_with(InMemoryLeadStore::new(), settings);

    let err = service
        .submit_raw(raw_lead("J. Doe", "8015551234"))
        .await
        .expect_err("disabled");
    let SubmissionError::Configuration(message) = &err else {
        panic!("expected configuration error, got {err:?}");
    };
    assert!(message.starts_with("Configuration Error"));
    assert!(message.contains("LEADS_STORE_URL, LEADS_STORE_KEY"));
    assert!(store.leads().is_empty());
}

#[tokio::test]
async fn gateway_uses_configured_zones_for_the_flag() {
    let mut settings = IntakeSettings::default();
    settings.private.whitelist = vec!["84014".to_string()];
    let store = InMemoryLeadStore::with_settings(settings);
    let repository = Arc::new(store.clone());
    let availability = Arc::new(AvailabilityService::new(
        Arc::new(store.clone()),
        Arc::clone(&repository),
        None,
    ));
    let gateway = LeadSubmissionGateway::new(
        repository,
        Arc::new(store.clone()),
        availability,
        GatewaySettings {
            project_ref: "abcd1234".to_string(),
            ..GatewaySettings::default()
        },
    );

    let mut raw = raw_lead("J. Doe", "8015551234");
    raw.zip_code = Some("84010".to_string());
    let receipt = gateway.submit(raw).await.expect("stored");
    assert!(receipt.lead.fields.is_out_of_area);
    assert_eq!(receipt.lead.fields.lead_type, LeadType::Private);
    assert_eq!(receipt.message, "Submission confirmed to project [abcd1234...].");

    let active = store
        .count_active(None, MembershipType::Private)
        .await
        .expect("count");
    assert_eq!(active, 1);
}
