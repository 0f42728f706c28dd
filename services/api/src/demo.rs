use axis_intake::config::{mask_secret, AppConfig, IntakeConfig, StoreSettings};
use axis_intake::error::AppError;
use axis_intake::workflows::intake::session::{CorporateTrack, IdentityChoice};
use axis_intake::workflows::intake::{
    build_intake_service, ContactDetails, InMemoryLeadStore, IntakeAction, IntakeService,
    IntakeSettings, IntakeStep, LeadAdminService, LeadQuery, SessionId, SessionView,
};
use clap::Args;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Corporate access code to present on the verification step
    #[arg(long, default_value = "AXIS2026")]
    pub(crate) code: String,
    /// Zip code entered on the location step
    #[arg(long, default_value = "84101")]
    pub(crate) zip: String,
    /// Try an invalid code first to show the retry loop
    #[arg(long)]
    pub(crate) with_retry: bool,
}

type DemoService = IntakeService<InMemoryLeadStore, InMemoryLeadStore, InMemoryLeadStore>;

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        code,
        zip,
        with_retry,
    } = args;

    let store = InMemoryLeadStore::with_settings(IntakeSettings::default());
    let service: DemoService = build_intake_service(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        &StoreSettings::Memory {
            venture_id: Some("axis-demo".to_string()),
        },
        &IntakeConfig::default(),
    );

    println!("Membership intake demo (corporate employee track)");
    let snapshot = service.availability().await;
    println!(
        "- Capacity: private {}/{} | corporate {}/{} ({:?} source)",
        snapshot.private.active_count,
        snapshot.private.capacity_limit,
        snapshot.corporate.active_count,
        snapshot.corporate.capacity_limit,
        snapshot.source
    );

    let view = service.start_session().await;
    let session = view.session_id.clone();
    render_step(&view);

    let mut script = vec![
        IntakeAction::SelectIdentity {
            choice: IdentityChoice::Corporate,
        },
        IntakeAction::SelectCorporateTrack {
            track: CorporateTrack::Employee,
        },
    ];
    if with_retry {
        script.push(IntakeAction::VerifyAccessCode {
            code: "NOT-A-CODE".to_string(),
        });
    }
    script.push(IntakeAction::VerifyAccessCode { code });

    for action in script {
        if !apply(&service, &session, action) {
            return Ok(());
        }
    }

    let mut view = match service.session(&session) {
        Ok(view) => view,
        Err(err) => {
            println!("  Session lost: {err}");
            return Ok(());
        }
    };
    if view.step == IntakeStep::CorpVerify {
        println!("  Access code was not accepted; stopping before qualification.");
        return Ok(());
    }

    while view.step != IntakeStep::Contact {
        let first = view.options.first().cloned().unwrap_or_default();
        let action = match view.step {
            IntakeStep::Objective => IntakeAction::SelectObjective { objective: first },
            IntakeStep::Outcome => IntakeAction::SelectOutcome { outcome: first },
            IntakeStep::Location => IntakeAction::SubmitLocation {
                zip_code: zip.clone(),
            },
            other => {
                println!("  Demo script has no answer for step {other}");
                return Ok(());
            }
        };
        if !apply(&service, &session, action) {
            return Ok(());
        }
        view = match service.session(&session) {
            Ok(view) => view,
            Err(err) => {
                println!("  Session lost: {err}");
                return Ok(());
            }
        };
    }

    let contact = ContactDetails {
        full_name: "Demo Employee".to_string(),
        phone: "8015550100".to_string(),
        email: Some("demo.employee@example.com".to_string()),
    };
    let submission = match service.submit(&session, contact).await {
        Ok(submission) => submission,
        Err(err) => {
            println!("  Submission refused: {err}");
            return Ok(());
        }
    };
    println!("- {}", submission.response.message);
    render_step(&submission.session);
    if let Some(booking) = &submission.session.booking {
        println!("  Booking link ({:?}): {}", booking.category, booking.url);
    }

    let admin = LeadAdminService::new(Arc::new(store.clone()));
    let summary = match admin.summary(&LeadQuery::default()).await {
        Ok(summary) => summary,
        Err(err) => {
            println!("  Pipeline summary unavailable: {err}");
            return Ok(());
        }
    };
    println!(
        "\nPipeline: {} lead(s), {} out of area",
        summary.total, summary.out_of_area
    );
    for (status, count) in &summary.by_status {
        println!("  - {status}: {count}");
    }
    println!("Signals recorded: {}", store.signals().len());

    Ok(())
}

fn apply(service: &DemoService, session: &SessionId, action: IntakeAction) -> bool {
    let name = action.name();
    match service.apply(session, action) {
        Ok(view) => {
            println!("  {name} ->");
            render_step(&view);
            true
        }
        Err(err) => {
            println!("  {name} rejected: {err}");
            false
        }
    }
}

fn render_step(view: &SessionView) {
    println!("- [{:>3}%] {}", view.progress, view.step);
    if let Some(entity) = &view.entity_name {
        println!("    verified partner: {entity}");
    }
    if let Some(message) = &view.message {
        println!("    {message}");
    }
    if view.is_out_of_range {
        println!("    outside the primary service zone");
    }
}

pub(crate) fn run_check_config() -> Result<(), AppError> {
    let config = AppConfig::load()?;

    println!("Environment: {:?}", config.environment);
    println!("Bind address: {}", config.server.socket_addr()?);
    println!(
        "Log level: {} ({:?} format)",
        config.telemetry.log_level, config.telemetry.format
    );
    match &config.store {
        StoreSettings::Memory { venture_id } => {
            println!("Lead store: in-memory (venture {:?})", venture_id);
        }
        StoreSettings::Configured(store) => {
            println!("Lead store: {} (project {})", store.url, store.project_ref());
            println!("  key: {}", store.masked_key());
            println!("  venture: {:?}", store.venture_id);
            println!("  timeout: {:?}", store.timeout);
        }
        StoreSettings::Missing { missing, .. } => {
            println!("Lead store: not configured ({} missing)", missing.join(", "));
        }
    }
    if let Some(issue) = config.store.configuration_issue() {
        println!("  {issue}");
    }
    println!("Booking base URL: {}", config.intake.booking_base_url);
    println!("Access codes: {}", config.intake.access_codes.len());
    println!(
        "Admin token: {}",
        config
            .admin
            .api_token
            .as_deref()
            .map(mask_secret)
            .unwrap_or_else(|| "not set (admin routes disabled)".to_string())
    );
    Ok(())
}
