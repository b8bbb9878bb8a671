//! Single-job download execution
//!
//! Prepares the destination, gates on the job-level free-space threshold,
//! and delegates the transfer to the artifact client. Free space is logged
//! immediately before and after the client call regardless of outcome, to
//! support post-mortem diagnosis of space exhaustion.

use crate::client::{SnapshotClient, SnapshotRequest};
use crate::config::BatchConfig;
use crate::error::DownloadError;
use crate::jobs::DownloadJob;
use crate::preflight;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Run one download job against the artifact client
///
/// # Errors
///
/// Returns a [`DownloadError`] when the destination cannot be prepared,
/// when its filesystem is below the batch free-space threshold, or when
/// the client fails. The orchestrator contains the error at single-job
/// granularity; it never aborts sibling jobs.
pub async fn run_job(
    job: &DownloadJob,
    config: &BatchConfig,
    token: Option<&str>,
    client: &dyn SnapshotClient,
) -> Result<PathBuf, DownloadError> {
    std::fs::create_dir_all(&job.local_dir).map_err(|e| DownloadError::Io {
        repo_id: job.repo_id.clone(),
        source: e,
    })?;

    info!(repo_id = %job.repo_id, client = client.name(), "starting download");
    info!(target_dir = %job.local_dir.display(), "target directory");
    if let Some(revision) = &job.revision {
        info!(repo_id = %job.repo_id, %revision, "pinned revision");
    }

    if let Some(free_gb) = log_free_space(&job.local_dir, "before")
        && free_gb < config.min_free_gb
    {
        return Err(DownloadError::InsufficientSpace {
            repo_id: job.repo_id.clone(),
            available_gb: free_gb,
            required_gb: config.min_free_gb,
        });
    }

    let request = SnapshotRequest {
        repo_id: job.repo_id.clone(),
        revision: job.revision.clone(),
        local_dir: job.local_dir.clone(),
        cache_dir: config.cache_dir.clone(),
        force_download: config.force_download,
        max_workers: config.max_workers,
        token: token.map(str::to_string),
        endpoint: config.endpoint.clone(),
        includes: job.includes.clone().unwrap_or_default(),
        excludes: job.excludes.clone().unwrap_or_default(),
    };

    let result = client.download_snapshot(&request).await;
    log_free_space(&job.local_dir, "after");
    result?;

    info!(repo_id = %job.repo_id, "download complete");
    Ok(job.local_dir.clone())
}

/// Log free-space telemetry for a destination; returns the reading in GB
fn log_free_space(path: &Path, phase: &str) -> Option<f64> {
    match preflight::free_space_gb(path) {
        Ok(free_gb) => {
            info!(phase, free_gb = format_args!("{free_gb:.2}"), "free space");
            Some(free_gb)
        }
        Err(e) => {
            warn!(phase, error = %e, "could not determine free space");
            None
        }
    }
}
