//! Artifact repository client seam
//!
//! The actual byte-level transfer (resume, parallel-chunk fetch, remote
//! listing) is owned by an external collaborator behind the
//! [`SnapshotClient`] trait. The production implementation drives the hub
//! CLI binary; a no-op implementation provides graceful degradation when no
//! binary is available.

use crate::credentials::ENDPOINT_ENV_VAR;
use crate::error::DownloadError;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// Parameters for one snapshot transfer
///
/// Assembled by the executor from the job and the batch configuration;
/// consumed read-only by the client.
#[derive(Debug, Clone, Default)]
pub struct SnapshotRequest {
    /// Remote repository identifier
    pub repo_id: String,
    /// Revision/tag pin, forwarded only when present
    pub revision: Option<String>,
    /// Destination directory (exists before the call)
    pub local_dir: PathBuf,
    /// Cache directory reused across runs, if configured
    pub cache_dir: Option<PathBuf>,
    /// Re-download even if files already exist
    pub force_download: bool,
    /// Concurrency hint for parallel file transfer within this job
    pub max_workers: usize,
    /// Auth token, if one resolved
    pub token: Option<String>,
    /// Endpoint override, forwarded only when present
    pub endpoint: Option<String>,
    /// Allow-list glob patterns (empty means no filter)
    pub includes: Vec<String>,
    /// Deny-list glob patterns, evaluated by the client as a veto over the
    /// allow-list
    pub excludes: Vec<String>,
}

/// Trait for artifact repository clients
///
/// One synchronous-from-the-caller's-view call per job: the client either
/// completes (destination directory populated) or fails with a
/// [`DownloadError`]. Resume-on-partial-download behavior is entirely owned
/// by the implementation.
#[async_trait]
pub trait SnapshotClient: Send + Sync {
    /// Transfer one repository snapshot into `request.local_dir`
    ///
    /// # Errors
    ///
    /// Returns an error if the transfer fails for any reason; the caller
    /// contains it at single-job granularity.
    async fn download_snapshot(&self, request: &SnapshotRequest)
    -> Result<(), DownloadError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Candidate hub CLI binary names, in discovery order
const CLIENT_BINARIES: &[&str] = &["hf", "huggingface-cli"];

/// Artifact client backed by the hub CLI binary
///
/// Discovers `hf` (or the legacy `huggingface-cli`) on PATH and spawns it
/// once per job with the assembled flag set. The endpoint override is
/// exported only into the child process environment, so this process stays
/// reentrant.
pub struct CliSnapshotClient {
    binary_path: PathBuf,
}

impl CliSnapshotClient {
    /// Create a client with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find a hub CLI binary in PATH
    ///
    /// Tries the names in [`CLIENT_BINARIES`] in order and returns `None`
    /// when none is found.
    #[must_use]
    pub fn from_path() -> Option<Self> {
        CLIENT_BINARIES
            .iter()
            .find_map(|name| which::which(name).ok())
            .map(Self::new)
    }

    /// Assemble the argument vector for one transfer
    fn command_args(request: &SnapshotRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "download".into(),
            request.repo_id.clone().into(),
            "--local-dir".into(),
            request.local_dir.clone().into(),
            "--max-workers".into(),
            request.max_workers.to_string().into(),
        ];

        if let Some(revision) = &request.revision {
            args.push("--revision".into());
            args.push(revision.clone().into());
        }
        if let Some(cache_dir) = &request.cache_dir {
            args.push("--cache-dir".into());
            args.push(cache_dir.clone().into());
        }
        if request.force_download {
            args.push("--force-download".into());
        }
        if let Some(token) = &request.token {
            args.push("--token".into());
            args.push(token.clone().into());
        }
        for pattern in &request.includes {
            args.push("--include".into());
            args.push(pattern.clone().into());
        }
        for pattern in &request.excludes {
            args.push("--exclude".into());
            args.push(pattern.clone().into());
        }

        args
    }
}

/// Last non-empty stderr line, for compact error reporting
fn stderr_excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    text.lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("no diagnostic output")
        .to_string()
}

#[async_trait]
impl SnapshotClient for CliSnapshotClient {
    async fn download_snapshot(
        &self,
        request: &SnapshotRequest,
    ) -> Result<(), DownloadError> {
        let args = Self::command_args(request);
        debug!(
            binary = %self.binary_path.display(),
            repo_id = %request.repo_id,
            "spawning artifact client"
        );

        let mut command = Command::new(&self.binary_path);
        command.args(&args);
        if let Some(endpoint) = &request.endpoint {
            command.env(ENDPOINT_ENV_VAR, endpoint);
        }

        let output = command.output().await.map_err(|e| DownloadError::ClientFailed {
            repo_id: request.repo_id.clone(),
            reason: format!("failed to execute {}: {e}", self.binary_path.display()),
        })?;

        if !output.status.success() {
            return Err(DownloadError::ClientFailed {
                repo_id: request.repo_id.clone(),
                reason: format!(
                    "{} exited with {}: {}",
                    self.binary_path.display(),
                    output.status,
                    stderr_excerpt(&output.stderr)
                ),
            });
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "cli-hf"
    }
}

/// No-op artifact client used when no hub CLI binary is available
///
/// Fails every transfer with [`DownloadError::ClientUnavailable`]. It lets
/// a dry run proceed in environments without the binary, and keeps the
/// batch's per-job isolation intact everywhere else.
pub struct NoOpSnapshotClient;

#[async_trait]
impl SnapshotClient for NoOpSnapshotClient {
    async fn download_snapshot(
        &self,
        _request: &SnapshotRequest,
    ) -> Result<(), DownloadError> {
        Err(DownloadError::ClientUnavailable)
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
