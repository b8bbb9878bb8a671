//! Configuration types for model-dl

use crate::archiver::ArchiveFormat;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Global run settings for one batch
///
/// Built from the CLI surface in the binary; consumable from serialized
/// form as well. All fields have sensible defaults so a zero-configuration
/// batch works out of the box.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Base directory used when a job has no explicit destination
    /// (default: "hf_models")
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Cache directory reused across runs (None = client default)
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Concurrent transfer workers within one job, forwarded to the
    /// artifact client (default: min(8, CPU count))
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Jobs processed concurrently by the batch worker pool
    /// (default: 1 = sequential)
    #[serde(default = "default_job_concurrency")]
    pub job_concurrency: usize,

    /// Re-download even if files already exist
    #[serde(default)]
    pub force_download: bool,

    /// Abort the whole batch when the output root's free space (GB) is
    /// below this value (default: 2.0)
    #[serde(default = "default_min_free_gb")]
    pub min_free_gb: f64,

    /// Custom hub endpoint or mirror URL (None = client default)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Validate options and log the plan without downloading
    #[serde(default)]
    pub dry_run: bool,

    /// Post-download packaging settings
    #[serde(default)]
    pub packaging: PackagingConfig,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            cache_dir: None,
            max_workers: default_max_workers(),
            job_concurrency: default_job_concurrency(),
            force_download: false,
            min_free_gb: default_min_free_gb(),
            endpoint: None,
            dry_run: false,
            packaging: PackagingConfig::default(),
        }
    }
}

/// Post-download packaging settings
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PackagingConfig {
    /// Create a compressed archive after each successful download
    #[serde(default)]
    pub enabled: bool,

    /// Directory to store archives (None = the batch output directory)
    #[serde(default)]
    pub dir: Option<PathBuf>,

    /// Preferred archive format (default: zst, with gzip fallback)
    #[serde(default)]
    pub format: ArchiveFormat,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("hf_models")
}

pub(crate) fn default_max_workers() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(4)
        .min(8)
}

fn default_job_concurrency() -> usize {
    1
}

fn default_min_free_gb() -> f64 {
    2.0
}
