//! Entry point for the `vmwarden` daemon.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::signal::unix::{signal, SignalKind};
use tracing_subscriber::EnvFilter;
use warden_core::VmIdentity;
use warden_daemon::{DaemonConfig, DaemonError, ExitStatus, Supervisor};
use warden_vix::{VmrunConfig, VmrunHost};

/// Keep one VMware virtual machine running; suspend it on SIGTERM.
#[derive(Parser, Debug)]
#[command(name = "vmwarden", version, about)]
struct Cli {
    /// Path to the VM's `.vmx` file (not the `.vmwarevm` bundle).
    vmx_path: PathBuf,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Nothing left to report to if stderr is closed.
            e.print().ok();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_logging();

    match run(cli).await {
        Ok(status) => status.into(),
        Err(e) => {
            e.log();
            ExitStatus::Failure.into()
        }
    }
}

async fn run(cli: Cli) -> Result<ExitStatus, DaemonError> {
    // Replaces SIGTERM's default disposition for the rest of the process.
    // A signal delivered during startup is held until the steady state.
    let mut sigterm = signal(SignalKind::terminate()).map_err(DaemonError::Signal)?;

    let vmrun = VmrunConfig::from_env()?;
    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        vmrun = %vmrun.binary.display(),
        host_type = %vmrun.host_type,
        "starting vmwarden"
    );

    let config = DaemonConfig::from_env()?;
    let identity = VmIdentity::new(cli.vmx_path);
    let mut supervisor = Supervisor::new(VmrunHost::new(vmrun), identity, config);

    let status = supervisor
        .run(async move {
            sigterm.recv().await;
        })
        .await;
    Ok(status)
}

/// Log to stderr, filtered by `VMWARDEN_LOG`, then `RUST_LOG`, then `info`.
fn init_logging() {
    let filter = EnvFilter::try_from_env("VMWARDEN_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
