use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use vm_build::interrupt;
use vm_build::{BuildConfig, RunContext, RunStatus, Runner, StepCreateVm, TracingUi};

/// Create the build VM described by a JSON config file.
#[derive(Debug, Parser)]
#[command(name = "vm-build", version)]
struct Cli {
    /// Path to the build config (JSON).
    config: PathBuf,

    /// Destroy an existing VM or template with the same name first.
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    let config = match BuildConfig::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let driver = match vm_driver::build_driver() {
        Ok(driver) => driver,
        Err(e) => {
            tracing::error!(error = %e, "failed to build driver");
            return ExitCode::FAILURE;
        }
    };

    // Cancellation is observed by the runner between steps
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if interrupt::cancel_on_interrupt(tokio::signal::ctrl_c, cancel_tx).await {
            std::process::exit(130);
        }
    });

    let ui = Arc::new(TracingUi::new(config.location.vm_name.clone()));
    let mut ctx = RunContext::new(ui, driver);

    let runner = Runner::new(vec![Box::new(StepCreateVm::new(
        config.create,
        config.location,
        cli.force,
    ))]);

    match runner.run(&mut ctx, &cancel_rx).await {
        RunStatus::Completed => {
            if let Some(vm) = ctx.vm() {
                tracing::info!(vm_id = %vm.id, vm = %vm.name, "build vm ready");
            }
            ExitCode::SUCCESS
        }
        _ => ExitCode::FAILURE,
    }
}
