//! model-dl binary entry point
//!
//! Parses the CLI surface, bootstraps dual console/log-file tracing output,
//! resolves credentials, builds the job list, and drives the batch
//! orchestrator. The process exit code communicates aggregate health:
//! 0 on success or dry run, 1 when all jobs failed or the configuration is
//! invalid, 2 on a fatal preflight failure.

use clap::Parser;
use model_dl::cli::Cli;
use model_dl::client::{CliSnapshotClient, NoOpSnapshotClient, SnapshotClient};
use model_dl::error::Error;
use model_dl::{credentials, jobs, orchestrator};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() {
    let code = run().await;
    std::process::exit(code);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    let log_path = init_logging(&cli.log_level, cli.log_dir.as_deref());
    match &log_path {
        Some(path) => info!(log_file = %path.display(), "log file"),
        None => warn!("log file could not be created; console output only"),
    }
    info!(
        version = env!("CARGO_PKG_VERSION"),
        os = std::env::consts::OS,
        arch = std::env::consts::ARCH,
        "model-dl starting"
    );

    let token = credentials::resolve_token(cli.token.as_deref());
    if token.is_some() {
        info!("auth token detected via flag or environment");
    } else {
        warn!("no auth token provided; public repositories only");
    }

    let config = Arc::new(cli.batch_config());

    let jobs = match jobs::build_jobs(cli.jobs_file.as_deref(), cli.cli_job(), &config.output_dir)
    {
        Ok(jobs) => jobs,
        Err(e) => {
            error!(error = %e, "failed to build job list");
            return 1;
        }
    };

    let client: Arc<dyn SnapshotClient> = match CliSnapshotClient::from_path() {
        Some(client) => Arc::new(client),
        // A dry run never invokes the client, so the missing binary only
        // matters once a transfer would actually start
        None if cli.dry_run => Arc::new(NoOpSnapshotClient),
        None => {
            error!("no artifact client binary found on PATH (tried `hf`, `huggingface-cli`)");
            return 1;
        }
    };

    match orchestrator::run_batch(config, jobs, token, client).await {
        Ok(summary) => summary.exit_code(),
        Err(err @ Error::InsufficientSpace { .. }) => {
            error!(error = %err, "fatal preflight failure");
            2
        }
        Err(err) => {
            error!(error = %err, "batch aborted");
            1
        }
    }
}

/// Initialize dual console/file tracing output
///
/// The file layer writes a timestamped log file under the requested
/// directory, falling back to `./logs` when that directory is not
/// writable, and is skipped entirely when neither location works.
fn init_logging(log_level: &str, log_dir: Option<&Path>) -> Option<PathBuf> {
    let filter =
        EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let primary_dir = log_dir.map(Path::to_path_buf).unwrap_or_else(default_log_dir);
    let file = create_log_file(&primary_dir)
        .or_else(|_| create_log_file(Path::new("logs")))
        .ok();

    let stdout_layer = fmt::layer().with_writer(std::io::stdout);

    match file {
        Some((path, file)) => {
            let file_layer = fmt::layer().with_ansi(false).with_writer(Arc::new(file));
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .with(file_layer)
                .init();
            Some(path)
        }
        None => {
            tracing_subscriber::registry()
                .with(filter)
                .with(stdout_layer)
                .init();
            None
        }
    }
}

/// Default log directory: `~/logs`, or `./logs` when no home resolves
fn default_log_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Create a timestamped log file inside `dir`, creating `dir` if needed
fn create_log_file(dir: &Path) -> std::io::Result<(PathBuf, File)> {
    std::fs::create_dir_all(dir)?;
    let name = format!(
        "model_dl_{}.log",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let path = dir.join(name);
    let file = File::create(&path)?;
    Ok((path, file))
}
