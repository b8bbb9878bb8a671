//! End-to-end batch orchestration against a recording stub client
//!
//! Covers the resilience contract (per-job isolation), the dry-run and
//! preflight short-circuits, result ordering, and the packaging step.

mod common;

use common::{RecordingClient, test_config};
use model_dl::{ArchiveFormat, BatchConfig, DownloadJob, Error, run_batch};
use std::sync::Arc;
use tempfile::TempDir;

fn jobs_for(config: &BatchConfig, repo_ids: &[&str]) -> Vec<DownloadJob> {
    repo_ids
        .iter()
        .map(|id| DownloadJob::with_derived_dir(*id, &config.output_dir))
        .collect()
}

#[tokio::test]
async fn failing_middle_job_does_not_abort_siblings() {
    let temp_dir = TempDir::new().unwrap();
    let config = Arc::new(test_config(&temp_dir));
    let jobs = jobs_for(&config, &["Org/A", "Org/B", "Org/C"]);
    let client = Arc::new(RecordingClient::failing_on(&["Org/B"]));

    let summary = run_batch(config, jobs, None, client.clone())
        .await
        .unwrap();

    assert_eq!(client.call_count(), 3, "job C must still run after B fails");
    assert_eq!(summary.succeeded(), 2);
    assert_eq!(summary.failed(), 1);
    assert_eq!(summary.exit_code(), 0);

    let repo_ids: Vec<&str> = summary
        .results
        .iter()
        .map(|r| r.job.repo_id.as_str())
        .collect();
    assert_eq!(repo_ids, ["Org/A", "Org/B", "Org/C"], "input order preserved");
    assert!(summary.results[0].succeeded);
    assert!(!summary.results[1].succeeded);
    assert!(summary.results[1].error.as_deref().unwrap().contains("Org/B"));
    assert!(summary.results[2].succeeded);
}

#[tokio::test]
async fn all_jobs_failing_exits_one() {
    let temp_dir = TempDir::new().unwrap();
    let config = Arc::new(test_config(&temp_dir));
    let jobs = jobs_for(&config, &["Org/A", "Org/B"]);
    let client = Arc::new(RecordingClient::failing_on(&["Org/A", "Org/B"]));

    let summary = run_batch(config, jobs, None, client).await.unwrap();
    assert_eq!(summary.succeeded(), 0);
    assert_eq!(summary.exit_code(), 1);
}

#[tokio::test]
async fn dry_run_invokes_no_transfers() {
    let temp_dir = TempDir::new().unwrap();
    let config = Arc::new(BatchConfig {
        dry_run: true,
        ..test_config(&temp_dir)
    });
    let jobs = jobs_for(&config, &["Org/A", "Org/B"]);
    let client = Arc::new(RecordingClient::new());

    let summary = run_batch(config, jobs, None, client.clone())
        .await
        .unwrap();

    assert_eq!(client.call_count(), 0);
    assert!(summary.dry_run);
    assert_eq!(summary.exit_code(), 0);
}

#[tokio::test]
async fn baseline_preflight_failure_blocks_all_transfers() {
    let temp_dir = TempDir::new().unwrap();
    let config = Arc::new(BatchConfig {
        min_free_gb: 1e12,
        ..test_config(&temp_dir)
    });
    let jobs = jobs_for(&config, &["Org/A"]);
    let client = Arc::new(RecordingClient::new());

    let result = run_batch(config, jobs, None, client.clone()).await;

    assert!(matches!(result, Err(Error::InsufficientSpace { .. })));
    assert_eq!(client.call_count(), 0, "no transfer may start");
}

#[tokio::test]
async fn empty_job_list_is_a_config_error() {
    let temp_dir = TempDir::new().unwrap();
    let config = Arc::new(test_config(&temp_dir));
    let client = Arc::new(RecordingClient::new());

    let result = run_batch(config, Vec::new(), None, client).await;
    assert!(matches!(result, Err(Error::Config { .. })));
}

#[tokio::test]
async fn results_keep_input_order_under_concurrency() {
    let temp_dir = TempDir::new().unwrap();
    let config = Arc::new(BatchConfig {
        job_concurrency: 4,
        ..test_config(&temp_dir)
    });
    let repo_ids = ["Org/A", "Org/B", "Org/C", "Org/D", "Org/E"];
    let jobs = jobs_for(&config, &repo_ids);
    let client = Arc::new(RecordingClient::new());

    let summary = run_batch(config, jobs, None, client).await.unwrap();

    assert_eq!(summary.succeeded(), 5);
    let ordered: Vec<&str> = summary
        .results
        .iter()
        .map(|r| r.job.repo_id.as_str())
        .collect();
    assert_eq!(ordered, repo_ids);
}

#[tokio::test]
async fn batch_settings_reach_the_client_request() {
    let temp_dir = TempDir::new().unwrap();
    let config = Arc::new(BatchConfig {
        cache_dir: Some(temp_dir.path().join("cache")),
        max_workers: 3,
        force_download: true,
        endpoint: Some("https://mirror.example".to_string()),
        ..test_config(&temp_dir)
    });
    let jobs = jobs_for(&config, &["Org/A"]);
    let client = Arc::new(RecordingClient::new());

    run_batch(config.clone(), jobs, Some("tok".to_string()), client.clone())
        .await
        .unwrap();

    let calls = client.calls();
    assert_eq!(calls.len(), 1);
    let request = &calls[0];
    assert_eq!(request.cache_dir, config.cache_dir);
    assert_eq!(request.max_workers, 3);
    assert!(request.force_download);
    assert_eq!(request.endpoint.as_deref(), Some("https://mirror.example"));
    assert_eq!(request.token.as_deref(), Some("tok"));
}

#[tokio::test]
async fn packaging_archives_successful_downloads() {
    let temp_dir = TempDir::new().unwrap();
    let package_dir = temp_dir.path().join("archives");
    let mut config = test_config(&temp_dir);
    config.packaging.enabled = true;
    config.packaging.dir = Some(package_dir.clone());
    config.packaging.format = ArchiveFormat::Gz;
    let config = Arc::new(config);

    let jobs = jobs_for(&config, &["Org/Model"]);
    let client = Arc::new(RecordingClient::new());

    let summary = run_batch(config, jobs, None, client).await.unwrap();

    let result = &summary.results[0];
    assert!(result.succeeded);
    let archive = result.archive_path.as_ref().unwrap();
    assert_eq!(archive, &package_dir.join("Org__Model.tar.gz"));
    assert!(archive.is_file());
    assert!(result.packaging_error.is_none());
}

#[tokio::test]
async fn packaging_is_skipped_for_failed_downloads() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = test_config(&temp_dir);
    config.packaging.enabled = true;
    config.packaging.format = ArchiveFormat::Gz;
    let config = Arc::new(config);

    let jobs = jobs_for(&config, &["Org/A"]);
    let client = Arc::new(RecordingClient::failing_on(&["Org/A"]));

    let summary = run_batch(config, jobs, None, client).await.unwrap();
    let result = &summary.results[0];
    assert!(!result.succeeded);
    assert!(result.archive_path.is_none());
}
