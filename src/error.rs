//! Error types for model-dl
//!
//! This module provides the error taxonomy for the batch downloader:
//! - Batch-fatal errors (configuration, baseline preflight)
//! - Per-job download errors, contained at single-job granularity
//! - Per-job packaging errors, reported without revoking a completed download

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for model-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for model-dl
///
/// Only the `Config` and `InsufficientSpace` variants may abort a whole
/// batch; everything job-scoped is carried by [`DownloadError`] and
/// [`PackagingError`] and converted into a failed job result instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "jobs_file")
        key: Option<String>,
    },

    /// Insufficient disk space at the baseline preflight check
    #[error(
        "insufficient disk space at {}: {available_gb:.2} GB free, {required_gb:.2} GB required",
        .path.display()
    )]
    InsufficientSpace {
        /// The directory whose filesystem was probed
        path: PathBuf,
        /// Free space observed, in GB
        available_gb: f64,
        /// The configured minimum, in GB
        required_gb: f64,
    },

    /// Failed to query free disk space
    #[error("failed to check disk space: {0}")]
    DiskSpaceCheckFailed(String),

    /// Download-related error
    #[error("download error: {0}")]
    Download(#[from] DownloadError),

    /// Packaging error (post-download archiving)
    #[error("packaging error: {0}")]
    Packaging(#[from] PackagingError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Download-related errors, scoped to a single job
#[derive(Debug, Error)]
pub enum DownloadError {
    /// No artifact repository client binary could be found on PATH
    #[error("no artifact client binary found on PATH (tried `hf` and `huggingface-cli`)")]
    ClientUnavailable,

    /// The external artifact client failed while transferring a repository
    #[error("transfer failed for {repo_id}: {reason}")]
    ClientFailed {
        /// The repository whose transfer failed
        repo_id: String,
        /// The reason the transfer failed
        reason: String,
    },

    /// The job's destination filesystem is below the free-space threshold
    #[error(
        "insufficient disk space for {repo_id}: {available_gb:.2} GB free, \
         {required_gb:.2} GB required"
    )]
    InsufficientSpace {
        /// The repository that was about to be transferred
        repo_id: String,
        /// Free space observed at the destination, in GB
        available_gb: f64,
        /// The configured minimum, in GB
        required_gb: f64,
    },

    /// I/O error while preparing the job's destination directory
    #[error("I/O error for {repo_id}: {source}")]
    Io {
        /// The repository whose destination could not be prepared
        repo_id: String,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Packaging errors, scoped to a single job after a successful download
#[derive(Debug, Error)]
pub enum PackagingError {
    /// Building the archive bundle from the source directory failed
    #[error("failed to bundle {}: {reason}", .archive.display())]
    Bundle {
        /// The archive path that could not be produced
        archive: PathBuf,
        /// The reason bundling failed
        reason: String,
    },

    /// The external compressor exited with an error
    #[error("compressor failed: {reason}")]
    CompressorFailed {
        /// The reason the compressor failed
        reason: String,
    },

    /// I/O error during packaging
    #[error("I/O error during packaging: {0}")]
    Io(#[from] std::io::Error),
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn download_error_converts_into_top_level_error() {
        let err: Error = DownloadError::ClientUnavailable.into();
        assert!(matches!(err, Error::Download(_)));
    }

    #[test]
    fn insufficient_space_message_carries_both_quantities() {
        let err = Error::InsufficientSpace {
            path: PathBuf::from("/models"),
            available_gb: 1.5,
            required_gb: 2.0,
        };
        let message = err.to_string();
        assert!(message.contains("1.50 GB free"));
        assert!(message.contains("2.00 GB required"));
    }

    #[test]
    fn packaging_error_preserves_archive_path() {
        let err = PackagingError::Bundle {
            archive: PathBuf::from("/archives/model.tar.zst"),
            reason: "source directory has no usable base name".to_string(),
        };
        assert!(err.to_string().contains("model.tar.zst"));
    }
}
