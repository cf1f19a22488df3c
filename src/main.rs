//! Hekavisor CLI: a thin shell around the supervision engine.
//!
//! Loads the persisted configuration, applies command-line overrides through
//! `update_config`, starts supervision, and runs until a termination signal.
//! Events are rendered through `tracing` by the built-in [`TraceWriter`].

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use hekavisor::{wait_for_shutdown_signal, ConfigPatch, Mode, Supervisor, TraceWriter};

#[derive(Parser, Debug)]
#[command(name = "hekavisor", version, about = "Process supervisor for the Hekabrain desktop app")]
struct Args {
    /// Launch mode override (dev | production).
    #[arg(long, value_enum)]
    mode: Option<CliMode>,

    /// Source tree used by dev mode (persisted into the config).
    #[arg(long)]
    dev_path: Option<String>,

    /// Packaged binary used by production mode (persisted into the config).
    #[arg(long)]
    exe: Option<String>,

    /// Build the project first, then start in production mode.
    #[arg(long)]
    build: bool,

    /// Tracing filter, e.g. `info` or `hekavisor=debug`.
    #[arg(long, default_value = "info")]
    log_filter: String,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CliMode {
    Dev,
    Production,
}

impl From<CliMode> for Mode {
    fn from(mode: CliMode) -> Self {
        match mode {
            CliMode::Dev => Mode::Dev,
            CliMode::Production => Mode::Production,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_filter)),
        )
        .init();

    let supervisor = Supervisor::open(vec![Arc::new(TraceWriter)]).await?;

    let patch = ConfigPatch {
        target_dev_path: args.dev_path,
        target_exe_path: args.exe,
        ..ConfigPatch::default()
    };
    if patch.target_dev_path.is_some() || patch.target_exe_path.is_some() {
        supervisor.update_config(patch).await;
    }

    if args.build {
        supervisor.build_and_run().await;
    } else {
        supervisor.start(args.mode.map(Into::into)).await;
    }

    wait_for_shutdown_signal().await?;
    supervisor.shutdown().await;
    Ok(())
}
