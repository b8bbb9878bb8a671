//! Shared fixtures for the integration suite

#![allow(dead_code)]

use async_trait::async_trait;
use model_dl::{BatchConfig, DownloadError, SnapshotClient, SnapshotRequest};
use std::collections::HashSet;
use std::sync::Mutex;
use tempfile::TempDir;

/// Stub artifact client that records every request it receives
///
/// Succeeds by default (leaving a marker file in the destination so
/// packaging has something to bundle); fails with an injected transfer
/// error for configured repo ids.
pub struct RecordingClient {
    calls: Mutex<Vec<SnapshotRequest>>,
    fail_repos: HashSet<String>,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_repos: HashSet::new(),
        }
    }

    pub fn failing_on(repo_ids: &[&str]) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_repos: repo_ids.iter().map(|id| id.to_string()).collect(),
        }
    }

    /// Snapshot of all recorded requests, in arrival order
    pub fn calls(&self) -> Vec<SnapshotRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl SnapshotClient for RecordingClient {
    async fn download_snapshot(&self, request: &SnapshotRequest) -> Result<(), DownloadError> {
        self.calls.lock().unwrap().push(request.clone());

        if self.fail_repos.contains(&request.repo_id) {
            return Err(DownloadError::ClientFailed {
                repo_id: request.repo_id.clone(),
                reason: "injected transfer failure".to_string(),
            });
        }

        // Simulate a populated destination
        std::fs::write(request.local_dir.join("weights.bin"), b"stub-weights").map_err(|e| {
            DownloadError::Io {
                repo_id: request.repo_id.clone(),
                source: e,
            }
        })?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

/// Batch configuration rooted in a temp directory, with the free-space
/// gate effectively disabled
pub fn test_config(temp_dir: &TempDir) -> BatchConfig {
    BatchConfig {
        output_dir: temp_dir.path().join("out"),
        min_free_gb: 0.0,
        ..BatchConfig::default()
    }
}
