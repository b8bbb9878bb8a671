//! Post-download packaging
//!
//! Bundles a completed download directory into a compressed tar archive.
//! The preferred codec is zstd, driven through the external `zstd` binary;
//! when that binary is not on PATH the archiver falls back to an in-process
//! gzip stream. The fallback is a logged policy decision, not an error
//! path, and never fails the job on its own.

use crate::error::PackagingError;
use clap::ValueEnum;
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

/// zstd compression level used for preferred-tier archives
const ZSTD_LEVEL: u32 = 10;

/// Preferred archive codec
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveFormat {
    /// Zstandard-compressed tar stream (`.tar.zst`); requires a `zstd`
    /// binary on PATH
    #[default]
    Zst,
    /// Gzip-compressed tar stream (`.tar.gz`); always available
    Gz,
}

impl ArchiveFormat {
    /// File name suffix for archives of this format
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            ArchiveFormat::Zst => ".tar.zst",
            ArchiveFormat::Gz => ".tar.gz",
        }
    }
}

impl std::fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArchiveFormat::Zst => write!(f, "zst"),
            ArchiveFormat::Gz => write!(f, "gz"),
        }
    }
}

/// Package a directory into a compressed archive
///
/// The archive is named after the source directory's base name and every
/// entry is prefixed with that name. An existing archive at the output
/// path is overwritten.
///
/// With [`ArchiveFormat::Zst`] preferred, the archiver first checks for a
/// `zstd` binary; if none is present it logs the decision and degrades to
/// [`ArchiveFormat::Gz`] without failing.
///
/// # Errors
///
/// Returns a [`PackagingError`] when the bundle cannot be built or the
/// compressor fails; the caller reports this per job without revoking the
/// completed download.
pub async fn package_directory(
    source_dir: &Path,
    package_dir: &Path,
    preferred: ArchiveFormat,
) -> Result<PathBuf, PackagingError> {
    std::fs::create_dir_all(package_dir)?;

    let base_name = source_dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| PackagingError::Bundle {
            archive: source_dir.to_path_buf(),
            reason: "source directory has no usable base name".to_string(),
        })?
        .to_string();

    if preferred == ArchiveFormat::Zst {
        if let Ok(zstd_bin) = which::which("zstd") {
            return package_zst(source_dir, package_dir, &base_name, &zstd_bin).await;
        }
        // Explicit, observable fallback decision
        info!(
            source = %source_dir.display(),
            "zstd binary not found on PATH; falling back to tar.gz"
        );
    }

    package_gz(source_dir, package_dir, &base_name).await
}

/// Build the uncompressed tar bundle, compress it as a single zstd stream,
/// then delete the intermediate bundle
async fn package_zst(
    source_dir: &Path,
    package_dir: &Path,
    base_name: &str,
    zstd_bin: &Path,
) -> Result<PathBuf, PackagingError> {
    let tar_path = package_dir.join(format!("{base_name}.tar"));
    let out_path = package_dir.join(format!("{base_name}.tar.zst"));

    build_tar_bundle(
        source_dir.to_path_buf(),
        tar_path.clone(),
        base_name.to_string(),
    )
    .await?;

    debug!(bundle = %tar_path.display(), "compressing bundle with zstd");
    let output = Command::new(zstd_bin)
        .arg("-q")
        .arg("-f")
        .arg(format!("-{ZSTD_LEVEL}"))
        .arg(&tar_path)
        .arg("-o")
        .arg(&out_path)
        .output()
        .await
        .map_err(|e| PackagingError::CompressorFailed {
            reason: format!("failed to execute zstd: {e}"),
        })?;

    // The intermediate bundle is disposable either way
    if let Err(e) = std::fs::remove_file(&tar_path) {
        warn!(bundle = %tar_path.display(), error = %e, "could not remove intermediate bundle");
    }

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(PackagingError::CompressorFailed {
            reason: format!("zstd exited with {}: {}", output.status, stderr.trim()),
        });
    }

    Ok(out_path)
}

/// Stream the source directory straight through an in-process gzip encoder
async fn package_gz(
    source_dir: &Path,
    package_dir: &Path,
    base_name: &str,
) -> Result<PathBuf, PackagingError> {
    let out_path = package_dir.join(format!("{base_name}.tar.gz"));
    let source_dir = source_dir.to_path_buf();
    let base_name = base_name.to_string();
    let archive_path = out_path.clone();

    run_archive_task(out_path.clone(), move || {
        let file = File::create(&archive_path)?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut builder = tar::Builder::new(encoder);
        builder.append_dir_all(&base_name, &source_dir)?;
        let encoder = builder.into_inner()?;
        encoder.finish()?;
        Ok(())
    })
    .await?;

    Ok(out_path)
}

/// Write an uncompressed tar bundle of the source directory
async fn build_tar_bundle(
    source_dir: PathBuf,
    tar_path: PathBuf,
    base_name: String,
) -> Result<(), PackagingError> {
    run_archive_task(tar_path.clone(), move || {
        let file = File::create(&tar_path)?;
        let mut builder = tar::Builder::new(file);
        builder.append_dir_all(&base_name, &source_dir)?;
        builder.finish()?;
        Ok(())
    })
    .await
}

/// Run blocking archive IO off the async runtime
async fn run_archive_task<F>(archive: PathBuf, task: F) -> Result<(), PackagingError>
where
    F: FnOnce() -> Result<(), PackagingError> + Send + 'static,
{
    spawn_blocking(task)
        .await
        .map_err(|e| PackagingError::Bundle {
            archive,
            reason: format!("archive task failed: {e}"),
        })?
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::fs;
    use tempfile::TempDir;

    fn make_source(temp_dir: &TempDir) -> PathBuf {
        let source = temp_dir.path().join("Org__Model");
        fs::create_dir_all(source.join("sub")).unwrap();
        fs::write(source.join("config.json"), "{}").unwrap();
        fs::write(source.join("sub").join("weights.bin"), vec![0u8; 256]).unwrap();
        source
    }

    fn gz_entry_names(archive: &Path) -> Vec<String> {
        let file = fs::File::open(archive).unwrap();
        let mut tar = tar::Archive::new(GzDecoder::new(file));
        tar.entries()
            .unwrap()
            .map(|entry| {
                entry
                    .unwrap()
                    .path()
                    .unwrap()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    #[tokio::test]
    async fn gz_archive_prefixes_entries_with_base_name() {
        let temp_dir = TempDir::new().unwrap();
        let source = make_source(&temp_dir);
        let package_dir = temp_dir.path().join("archives");

        let archive = package_directory(&source, &package_dir, ArchiveFormat::Gz)
            .await
            .unwrap();
        assert_eq!(archive, package_dir.join("Org__Model.tar.gz"));

        let names = gz_entry_names(&archive);
        assert!(names.iter().all(|n| n.starts_with("Org__Model")));
        assert!(names.iter().any(|n| n == "Org__Model/config.json"));
        assert!(names.iter().any(|n| n == "Org__Model/sub/weights.bin"));

        // Every file on disk must appear in the archive under the prefix
        for entry in walkdir::WalkDir::new(&source) {
            let entry = entry.unwrap();
            if entry.file_type().is_file() {
                let relative = entry.path().strip_prefix(&source).unwrap();
                let expected = format!("Org__Model/{}", relative.display());
                assert!(names.contains(&expected), "missing {expected}");
            }
        }
    }

    #[tokio::test]
    async fn existing_archive_is_overwritten() {
        let temp_dir = TempDir::new().unwrap();
        let source = make_source(&temp_dir);
        let package_dir = temp_dir.path().join("archives");
        fs::create_dir_all(&package_dir).unwrap();

        let stale = package_dir.join("Org__Model.tar.gz");
        fs::write(&stale, "not an archive").unwrap();

        let archive = package_directory(&source, &package_dir, ArchiveFormat::Gz)
            .await
            .unwrap();
        assert_eq!(archive, stale);
        // A real gzip stream replaced the stale placeholder
        assert!(!gz_entry_names(&archive).is_empty());
    }

    #[tokio::test]
    async fn zst_preference_degrades_to_gz_without_the_binary() {
        let temp_dir = TempDir::new().unwrap();
        let source = make_source(&temp_dir);
        let package_dir = temp_dir.path().join("archives");

        let archive = package_directory(&source, &package_dir, ArchiveFormat::Zst)
            .await
            .unwrap();

        if which::which("zstd").is_ok() {
            assert_eq!(archive, package_dir.join("Org__Model.tar.zst"));
            // The intermediate uncompressed bundle must be gone
            assert!(!package_dir.join("Org__Model.tar").exists());
        } else {
            assert_eq!(archive, package_dir.join("Org__Model.tar.gz"));
            assert!(gz_entry_names(&archive)
                .iter()
                .any(|n| n == "Org__Model/config.json"));
        }
    }

    #[tokio::test]
    async fn missing_source_directory_fails_packaging() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("does-not-exist");
        let package_dir = temp_dir.path().join("archives");

        let result = package_directory(&source, &package_dir, ArchiveFormat::Gz).await;
        assert!(result.is_err());
    }

    #[test]
    fn format_extensions() {
        assert_eq!(ArchiveFormat::Zst.extension(), ".tar.zst");
        assert_eq!(ArchiveFormat::Gz.extension(), ".tar.gz");
        assert_eq!(ArchiveFormat::default(), ArchiveFormat::Zst);
    }
}
