use axis_intake_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("axis-intake [{}]: {err}", err.code());
        std::process::exit(err.exit_code());
    }
}
