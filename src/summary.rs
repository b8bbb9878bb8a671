//! Batch results and summary reporting

use crate::error::{DownloadError, PackagingError};
use crate::jobs::DownloadJob;
use std::path::PathBuf;
use tracing::{info, warn};

/// Outcome of one job
///
/// Created exactly once per job at the end of its execution attempt; the
/// only unit written to the final summary. A packaging failure is carried
/// separately from the download outcome so it never masks a completed
/// download.
#[must_use]
#[derive(Debug, Clone)]
pub struct JobResult {
    /// The job this result describes
    pub job: DownloadJob,
    /// Whether the download completed
    pub succeeded: bool,
    /// Final local path, populated on success
    pub local_path: Option<PathBuf>,
    /// Archive path when packaging ran and succeeded
    pub archive_path: Option<PathBuf>,
    /// Download-phase error message, populated on failure
    pub error: Option<String>,
    /// Packaging-phase error message; the download remains complete
    pub packaging_error: Option<String>,
}

impl JobResult {
    /// Result for a completed download
    pub fn success(job: DownloadJob, local_path: PathBuf) -> Self {
        Self {
            job,
            succeeded: true,
            local_path: Some(local_path),
            archive_path: None,
            error: None,
            packaging_error: None,
        }
    }

    /// Result for a failed download
    pub fn failure(job: DownloadJob, error: &DownloadError) -> Self {
        Self {
            job,
            succeeded: false,
            local_path: None,
            archive_path: None,
            error: Some(error.to_string()),
            packaging_error: None,
        }
    }

    /// Record a packaging failure without revoking the download's success
    pub fn note_packaging_failure(&mut self, error: &PackagingError) {
        self.packaging_error = Some(error.to_string());
    }
}

/// Aggregated outcome of a whole batch
///
/// Results appear in the same order as the normalized job list, at every
/// concurrency level.
#[must_use]
#[derive(Debug)]
pub struct BatchSummary {
    /// Per-job results in input order
    pub results: Vec<JobResult>,
    /// Whether this batch was a dry run (plan logged, nothing transferred)
    pub dry_run: bool,
}

impl BatchSummary {
    /// Number of jobs whose download completed
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.succeeded).count()
    }

    /// Number of jobs whose download failed
    #[must_use]
    pub fn failed(&self) -> usize {
        self.results.len() - self.succeeded()
    }

    /// Process exit code communicating aggregate health
    ///
    /// 0 when at least one job succeeded (or the batch was a dry run),
    /// 1 when all jobs failed. The fatal-preflight code 2 is assigned by
    /// the binary before any summary exists.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.dry_run || self.succeeded() > 0 {
            0
        } else {
            1
        }
    }

    /// Render the summary block to the log
    pub fn log(&self) {
        info!("=== Download Summary ===");
        info!(
            "Completed: {} / {} job(s)",
            self.succeeded(),
            self.results.len()
        );

        for result in &self.results {
            if result.succeeded {
                if let Some(path) = &result.local_path {
                    info!("  - {}", path.display());
                }
                if let Some(archive) = &result.archive_path {
                    info!("    archive: {}", archive.display());
                }
                if let Some(packaging_error) = &result.packaging_error {
                    warn!(
                        repo_id = %result.job.repo_id,
                        error = %packaging_error,
                        "download completed but packaging failed"
                    );
                }
            } else if let Some(error) = &result.error {
                warn!(repo_id = %result.job.repo_id, error = %error, "job failed");
            }
        }
    }
}

/// Format a byte count in human units
#[must_use]
pub fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    let mut value = bytes as f64;
    for unit in &UNITS[..UNITS.len() - 1] {
        if value < 1024.0 {
            return format!("{value:.2} {unit}");
        }
        value /= 1024.0;
    }
    format!("{value:.2} TB")
}
