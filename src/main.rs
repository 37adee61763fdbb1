use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    match medappoint::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "MedAppoint stopped");
            eprintln!("medappoint: {e}");
            ExitCode::FAILURE
        }
    }
}
