//! Batch orchestration
//!
//! Drives the batch state machine: job-list validation, the baseline
//! disk-space preflight, the dry-run short-circuit, a bounded worker pool
//! with per-job failure isolation, and the final summary. Results are
//! restored to input order before the summary regardless of the pool's
//! concurrency.

use crate::archiver;
use crate::client::SnapshotClient;
use crate::config::BatchConfig;
use crate::error::{Error, Result};
use crate::executor;
use crate::jobs::DownloadJob;
use crate::preflight;
use crate::summary::{BatchSummary, JobResult, human_bytes};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

/// Run a whole batch: preflight, worker pool, summary
///
/// The baseline free-space check runs once against the output root before
/// any transfer; failure there aborts the batch with
/// [`Error::InsufficientSpace`] (the binary maps it to exit code 2). Every
/// job-scoped failure is contained in that job's [`JobResult`] instead.
///
/// # Errors
///
/// Fails only for batch-fatal conditions: an empty job list or the
/// baseline preflight.
pub async fn run_batch(
    config: Arc<BatchConfig>,
    jobs: Vec<DownloadJob>,
    token: Option<String>,
    client: Arc<dyn SnapshotClient>,
) -> Result<BatchSummary> {
    if jobs.is_empty() {
        return Err(Error::Config {
            message: "no download jobs specified; provide --repo-id or --jobs-file"
                .to_string(),
            key: None,
        });
    }

    let planned: Vec<&str> = jobs.iter().map(|j| j.repo_id.as_str()).collect();
    info!(jobs = %planned.join(", "), "planned jobs");

    let free_gb = preflight::check_disk_space(&config.output_dir, config.min_free_gb)?;
    info!(free_gb = format_args!("{free_gb:.2}"), "initial free space");

    if let Some(endpoint) = &config.endpoint {
        info!(%endpoint, "using custom endpoint");
    }

    if config.dry_run {
        for job in &jobs {
            info!(
                repo_id = %job.repo_id,
                dest = %job.local_dir.display(),
                "dry run: would download"
            );
        }
        info!("dry run complete; exiting without download");
        return Ok(BatchSummary {
            results: Vec::new(),
            dry_run: true,
        });
    }

    let total = jobs.len();
    let workers = config.job_concurrency.clamp(1, total);
    let queue: Arc<Mutex<VecDeque<(usize, DownloadJob)>>> =
        Arc::new(Mutex::new(jobs.into_iter().enumerate().collect()));
    let (result_tx, mut result_rx) = mpsc::channel::<(usize, JobResult)>(total);

    for worker_id in 0..workers {
        let queue = Arc::clone(&queue);
        let result_tx = result_tx.clone();
        let config = Arc::clone(&config);
        let client = Arc::clone(&client);
        let token = token.clone();

        tokio::spawn(async move {
            loop {
                let next = { queue.lock().await.pop_front() };
                let Some((index, job)) = next else { break };

                let result =
                    process_job(job, &config, token.as_deref(), client.as_ref()).await;
                if result_tx.send((index, result)).await.is_err() {
                    break;
                }
            }
            debug!(worker_id, "worker drained the job queue");
        });
    }
    drop(result_tx);

    let mut slots: Vec<Option<JobResult>> = (0..total).map(|_| None).collect();
    while let Some((index, result)) = result_rx.recv().await {
        slots[index] = Some(result);
    }

    let results: Vec<JobResult> = slots.into_iter().flatten().collect();
    if results.len() != total {
        // A worker died mid-job; the remaining slots have no result to report
        warn!(
            expected = total,
            collected = results.len(),
            "some jobs produced no result"
        );
    }

    let summary = BatchSummary {
        results,
        dry_run: false,
    };
    summary.log();
    Ok(summary)
}

/// Execute one job with full failure isolation
///
/// Every error path ends in a [`JobResult`]; nothing escapes to abort
/// sibling jobs.
async fn process_job(
    job: DownloadJob,
    config: &BatchConfig,
    token: Option<&str>,
    client: &dyn SnapshotClient,
) -> JobResult {
    let local_path = match executor::run_job(&job, config, token, client).await {
        Ok(local_path) => local_path,
        Err(e) => {
            error!(repo_id = %job.repo_id, error = %e, "download failed");
            return JobResult::failure(job, &e);
        }
    };

    let mut result = JobResult::success(job, local_path.clone());

    if config.packaging.enabled {
        let package_dir = config
            .packaging
            .dir
            .clone()
            .unwrap_or_else(|| config.output_dir.clone());

        match archiver::package_directory(&local_path, &package_dir, config.packaging.format)
            .await
        {
            Ok(archive_path) => {
                match std::fs::metadata(&archive_path) {
                    Ok(meta) => info!(
                        archive = %archive_path.display(),
                        size = %human_bytes(meta.len()),
                        "archive created"
                    ),
                    Err(_) => info!(archive = %archive_path.display(), "archive created"),
                }
                result.archive_path = Some(archive_path);
            }
            Err(e) => {
                warn!(
                    repo_id = %result.job.repo_id,
                    error = %e,
                    "packaging failed; download remains complete"
                );
                result.note_packaging_failure(&e);
            }
        }
    }

    result
}
