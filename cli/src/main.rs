use std::error::Error;
use std::io::stdout;

use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

use gly_application::cancellable::Cancellable;
use gly_cli::args::Args;
use gly_cli::bootstrap::state::CliState;
use gly_cli::config_loader;
use gly_cli::inspect::inspect;
use gly_cli::observability;
use gly_cli::report;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = config_loader::load_config()?;

    observability::tracing::setup_logging(&config)?;
    observability::startup_info::log_loader_info(&config);

    if args.list_types {
        report::write_types(&mut stdout().lock())?;
        return Ok(());
    }

    let Some(path) = args.path.clone() else {
        return Err("missing image path".into());
    };

    let state = CliState::new(config);
    let cancellable = Cancellable::new();
    tokio::spawn(cancel_on_ctrl_c(cancellable.clone()));

    info!("Loading {}", path.display());
    let report = match inspect(&state, &args, &path, &cancellable).await {
        Ok(report) => report,
        Err(e) => {
            error!("Failed to load {}: {}", path.display(), e);
            return Err(e.into());
        }
    };

    let mut out = stdout().lock();
    if args.json {
        report::write_json(&mut out, &report)?;
    } else {
        report::write_text(&mut out, &report)?;
    }

    Ok(())
}

async fn cancel_on_ctrl_c(cancellable: Cancellable) {
    match signal::ctrl_c().await {
        Ok(()) => {
            warn!("Received Ctrl+C, canceling");
            cancellable.cancel();
        }
        Err(e) => {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    }
}
