//! # model-dl
//!
//! Batch orchestrator for downloading model repositories from a Hugging
//! Face style hub.
//!
//! ## Design Philosophy
//!
//! model-dl is designed to be:
//! - **Resilient** - One bad job never aborts the batch; every failure is
//!   contained at single-job granularity
//! - **Repeatable** - Deterministic destination derivation and resume-aware
//!   delegation make re-runs cheap
//! - **Declarative** - Jobs come from CLI flags or a jobs file in
//!   plain-text, JSON, YAML, or TOML
//! - **Delegating** - Byte-level transfer belongs to the external artifact
//!   client; archive codecs are selected, not implemented
//!
//! ## Quick Start
//!
//! ```no_run
//! use model_dl::{BatchConfig, DownloadJob, NoOpSnapshotClient, run_batch};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Arc::new(BatchConfig::default());
//!     let jobs = vec![DownloadJob::with_derived_dir(
//!         "IndexTeam/IndexTTS-2",
//!         &config.output_dir,
//!     )];
//!
//!     let summary = run_batch(config, jobs, None, Arc::new(NoOpSnapshotClient)).await?;
//!     println!("{} job(s) completed", summary.succeeded());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Post-download packaging with codec fallback
pub mod archiver;
/// Command-line argument surface
pub mod cli;
/// Artifact repository client seam
pub mod client;
/// Configuration types
pub mod config;
/// Credential resolution
pub mod credentials;
/// Error types
pub mod error;
/// Single-job download execution
pub mod executor;
/// Job model and loader
pub mod jobs;
/// Batch orchestration
pub mod orchestrator;
/// Preflight resource checks
pub mod preflight;
/// Batch results and summary reporting
pub mod summary;

// Re-export commonly used types
pub use archiver::{ArchiveFormat, package_directory};
pub use client::{CliSnapshotClient, NoOpSnapshotClient, SnapshotClient, SnapshotRequest};
pub use config::{BatchConfig, PackagingConfig};
pub use credentials::resolve_token;
pub use error::{DownloadError, Error, PackagingError, Result};
pub use jobs::{CliJob, DownloadJob, build_jobs, load_jobs_from_file, sanitize_repo_id};
pub use orchestrator::run_batch;
pub use summary::{BatchSummary, JobResult};
