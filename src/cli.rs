//! Command-line argument surface
//!
//! One flat flag set mirroring the batch configuration, plus the
//! single-job `--repo-id` path. Conversion into [`BatchConfig`] and
//! [`CliJob`] keeps the rest of the crate independent of clap.

use crate::archiver::ArchiveFormat;
use crate::config::{self, BatchConfig, PackagingConfig};
use crate::jobs::CliJob;
use clap::Parser;
use std::path::PathBuf;

/// Batch downloader for Hugging Face style model repositories
#[derive(Debug, Parser)]
#[command(name = "model-dl", version, about)]
pub struct Cli {
    /// Repository id for a single job, e.g. IndexTeam/IndexTTS-2
    #[arg(long)]
    pub repo_id: Option<String>,

    /// Specific revision/tag to download
    #[arg(long)]
    pub revision: Option<String>,

    /// Path to a file describing multiple jobs (txt/json/yaml/toml)
    #[arg(long)]
    pub jobs_file: Option<PathBuf>,

    /// Explicit destination directory for the single --repo-id job
    #[arg(long)]
    pub local_dir: Option<PathBuf>,

    /// Base directory used when a job has no explicit destination
    #[arg(long, default_value = "hf_models")]
    pub output_dir: PathBuf,

    /// Cache directory reused across runs
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Concurrent transfer workers within one job
    #[arg(long, default_value_t = config::default_max_workers())]
    pub max_workers: usize,

    /// Jobs processed concurrently (1 = sequential)
    #[arg(long, default_value_t = 1)]
    pub job_concurrency: usize,

    /// Allow patterns (glob) forwarded to the artifact client
    #[arg(long)]
    pub include: Vec<String>,

    /// Ignore patterns (glob) forwarded to the artifact client
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Force re-download even if files exist
    #[arg(long)]
    pub force_download: bool,

    /// Explicit auth token (otherwise environment variables are consulted)
    #[arg(long)]
    pub token: Option<String>,

    /// Custom hub endpoint or mirror URL
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Abort if free disk space (GB) is below this value
    #[arg(long, default_value_t = 2.0)]
    pub min_free_gb: f64,

    /// Logging level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Directory to store log files (defaults to ~/logs, then ./logs)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Create a compressed archive after each successful download
    #[arg(long)]
    pub package: bool,

    /// Directory to store archives (defaults to the output directory)
    #[arg(long)]
    pub package_dir: Option<PathBuf>,

    /// Preferred archive format
    #[arg(long, value_enum, default_value_t = ArchiveFormat::Zst)]
    pub package_format: ArchiveFormat,

    /// Validate options and log the plan without downloading
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Build the batch configuration from the parsed flags
    #[must_use]
    pub fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            output_dir: self.output_dir.clone(),
            cache_dir: self.cache_dir.clone(),
            max_workers: self.max_workers,
            job_concurrency: self.job_concurrency,
            force_download: self.force_download,
            min_free_gb: self.min_free_gb,
            endpoint: self.endpoint.clone(),
            dry_run: self.dry_run,
            packaging: PackagingConfig {
                enabled: self.package,
                dir: self.package_dir.clone(),
                format: self.package_format,
            },
        }
    }

    /// The single CLI-flag job, when `--repo-id` was given
    #[must_use]
    pub fn cli_job(&self) -> Option<CliJob> {
        self.repo_id.as_ref().map(|repo_id| CliJob {
            repo_id: repo_id.clone(),
            local_dir: self.local_dir.clone(),
            revision: self.revision.clone(),
            includes: (!self.include.is_empty()).then(|| self.include.clone()),
            excludes: (!self.exclude.is_empty()).then(|| self.exclude.clone()),
        })
    }
}
