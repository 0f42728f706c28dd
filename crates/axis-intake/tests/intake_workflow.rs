//! End-to-end scenarios for the membership intake funnel, driven through the public
//! service facade and HTTP router with the in-memory store.

mod common {
    use std::sync::Arc;

    use axis_intake::config::{IntakeConfig, StoreSettings};
    use axis_intake::workflows::intake::{
        build_intake_service, intake_router, InMemoryLeadStore, IntakeService, IntakeSettings,
    };
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use axum::Router;
    use serde_json::Value;

    pub(super) type Service =
        IntakeService<InMemoryLeadStore, InMemoryLeadStore, InMemoryLeadStore>;

    pub(super) const VENTURE: &str = "axis-performance";

    pub(super) fn service(store: &InMemoryLeadStore) -> Arc<Service> {
        Arc::new(build_intake_service(
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            Arc::new(store.clone()),
            &StoreSettings::Memory {
                venture_id: Some(VENTURE.to_string()),
            },
            &IntakeConfig::default(),
        ))
    }

    pub(super) fn configured_store() -> InMemoryLeadStore {
        InMemoryLeadStore::with_settings(IntakeSettings::default())
    }

    pub(super) fn router(store: &InMemoryLeadStore) -> Router {
        intake_router(service(store))
    }

    pub(super) fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    pub(super) async fn json_body(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("body");
        serde_json::from_slice(&bytes).expect("json")
    }
}

use axis_intake::workflows::intake::session::{CorporateTrack, IdentityChoice};
use axis_intake::workflows::intake::{
    ContactDetails, InMemoryLeadStore, IntakeAction, IntakeStep, LeadStatus, LeadType,
    SessionError,
};
use axum::http::StatusCode;
use common::*;
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn private_lead_in_service_area_is_stored_and_confirmed() {
    let store = InMemoryLeadStore::new();
    let response = router(&store)
        .oneshot(post_json(
            "/api/v1/leads",
            json!({
                "full_name": "J. Doe",
                "phone": "8015551234",
                "zip_code": "84010",
                "lead_type": "Private",
            }),
        ))
        .await
        .expect("route");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["is_out_of_area"], false);
    assert!(body["lead_id"].as_str().is_some());

    let leads = store.leads();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].fields.status, LeadStatus::New);
    assert!(!leads[0].fields.is_out_of_area);
}

#[tokio::test]
async fn blank_name_is_rejected_without_writing() {
    let store = InMemoryLeadStore::new();
    let response = router(&store)
        .oneshot(post_json(
            "/api/v1/leads",
            json!({ "full_name": "", "phone": "8015551234" }),
        ))
        .await
        .expect("route");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    let errors = body["field_errors"].as_object().expect("field errors");
    assert_eq!(errors.keys().collect::<Vec<_>>(), vec!["full_name"]);
    assert!(store.leads().is_empty());
    assert!(store.signals().is_empty());
}

#[tokio::test]
async fn new_lead_is_counted_by_the_next_availability_check() {
    let store = configured_store();
    let service = service(&store);
    let before = service.availability().await;

    let session = service.start_session().await.session_id;
    for action in [
        IntakeAction::SelectIdentity {
            choice: IdentityChoice::Private,
        },
        IntakeAction::SelectObjective {
            objective: "Performance Optimization".to_string(),
        },
        IntakeAction::SelectOutcome {
            outcome: "Bespoke Roadmap".to_string(),
        },
        IntakeAction::SubmitLocation {
            zip_code: "84010".to_string(),
        },
    ] {
        service.apply(&session, action).expect("wizard step");
    }
    let submission = service
        .submit(
            &session,
            ContactDetails {
                full_name: "J. Doe".to_string(),
                phone: "8015551234".to_string(),
                email: Some("j.doe@example.com".to_string()),
            },
        )
        .await
        .expect("submit");
    assert!(submission.response.success);

    let after = service.availability().await;
    assert_eq!(after.private.active_count, before.private.active_count + 1);
    assert_eq!(after.corporate.active_count, before.corporate.active_count);
}

#[tokio::test]
async fn employee_track_loops_on_bad_code_then_captures_entity() {
    let store = InMemoryLeadStore::new();
    let service = service(&store);
    let session = service.start_session().await.session_id;

    service
        .apply(
            &session,
            IntakeAction::SelectIdentity {
                choice: IdentityChoice::Corporate,
            },
        )
        .expect("identity");
    let view = service
        .apply(
            &session,
            IntakeAction::SelectCorporateTrack {
                track: CorporateTrack::Employee,
            },
        )
        .expect("track");
    assert_eq!(view.step, IntakeStep::CorpVerify);

    let view = service
        .apply(
            &session,
            IntakeAction::VerifyAccessCode {
                code: "GUESS".to_string(),
            },
        )
        .expect("rejected code is not an error");
    assert_eq!(view.step, IntakeStep::CorpVerify);
    assert!(!view.is_corporate_verified);
    assert!(view.message.is_some());

    let view = service
        .apply(
            &session,
            IntakeAction::VerifyAccessCode {
                code: "axis2026".to_string(),
            },
        )
        .expect("valid code");
    assert_ne!(view.step, IntakeStep::CorpVerify);
    assert!(view.is_corporate_verified);
    assert_eq!(view.entity_name.as_deref(), Some("Axis Premier Partner"));

    let mut step = view.step;
    while step != IntakeStep::Contact {
        let current = service.session(&session).expect("session");
        let choice = current.options.first().cloned().unwrap_or_default();
        let action = match step {
            IntakeStep::Objective => IntakeAction::SelectObjective { objective: choice },
            IntakeStep::Outcome => IntakeAction::SelectOutcome { outcome: choice },
            IntakeStep::Location => IntakeAction::SubmitLocation {
                zip_code: "84101".to_string(),
            },
            other => panic!("unexpected step {other}"),
        };
        step = service.apply(&session, action).expect("advance").step;
    }

    let submission = service
        .submit(
            &session,
            ContactDetails {
                full_name: "Pat Employee".to_string(),
                phone: "8015550000".to_string(),
                email: None,
            },
        )
        .await
        .expect("submit");
    assert!(submission.response.success);

    let leads = store.leads();
    assert_eq!(leads.len(), 1);
    assert_eq!(leads[0].fields.lead_type, LeadType::CorporateEmployee);
    assert_eq!(leads[0].fields.corporate_code.as_deref(), Some("AXIS2026"));
    assert!(leads[0]
        .fields
        .notes
        .as_deref()
        .is_some_and(|notes| notes.contains("Entity: Axis Premier Partner")));
}

#[tokio::test]
async fn submitting_twice_after_success_is_refused() {
    let store = InMemoryLeadStore::new();
    let service = service(&store);
    let session = service.start_session().await.session_id;
    for action in [
        IntakeAction::SelectIdentity {
            choice: IdentityChoice::Private,
        },
        IntakeAction::SelectObjective {
            objective: "Acute Recovery".to_string(),
        },
        IntakeAction::SelectOutcome {
            outcome: "Treatment Session".to_string(),
        },
        IntakeAction::SubmitLocation {
            zip_code: "84010".to_string(),
        },
    ] {
        service.apply(&session, action).expect("wizard step");
    }

    let contact = ContactDetails {
        full_name: "J. Doe".to_string(),
        phone: "8015551234".to_string(),
        email: None,
    };
    let first = service
        .submit(&session, contact.clone())
        .await
        .expect("first submit");
    assert_eq!(first.session.step, IntakeStep::Success);

    let second = service.submit(&session, contact).await;
    assert!(matches!(second, Err(SessionError::Terminal)));
    assert_eq!(store.leads().len(), 1);
}
