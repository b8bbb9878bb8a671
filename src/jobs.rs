//! Job model and loader
//!
//! Normalizes heterogeneous job sources into a uniform sequence of
//! [`DownloadJob`]s. Jobs come from a declarative jobs file (plain-text line
//! list, JSON, YAML, or TOML — selected by extension), from the `--repo-id`
//! CLI flag, or from both (file entries first, CLI job appended).

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One repo-id-to-local-directory download task
///
/// Jobs are constructed once by the loader from immutable input, consumed
/// read-only by the executor, and never mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    /// Remote repository identifier, treated as opaque (e.g. "Org/Model")
    pub repo_id: String,
    /// Destination directory for the snapshot
    pub local_dir: PathBuf,
    /// Optional revision/tag pin; absent means latest
    pub revision: Option<String>,
    /// Optional allow-list glob patterns forwarded to the artifact client
    pub includes: Option<Vec<String>>,
    /// Optional deny-list glob patterns forwarded to the artifact client
    pub excludes: Option<Vec<String>>,
}

impl DownloadJob {
    /// Create a job whose destination is derived from the repo id
    ///
    /// The destination is `base_output / sanitize_repo_id(repo_id)`, so
    /// repeated runs map the same repository to the same directory.
    pub fn with_derived_dir(repo_id: impl Into<String>, base_output: &Path) -> Self {
        let repo_id = repo_id.into();
        let local_dir = base_output.join(sanitize_repo_id(&repo_id));
        Self {
            repo_id,
            local_dir,
            revision: None,
            includes: None,
            excludes: None,
        }
    }
}

/// Job fields supplied directly on the command line (the `--repo-id` path)
#[derive(Debug, Clone, Default)]
pub struct CliJob {
    /// Remote repository identifier
    pub repo_id: String,
    /// Explicit destination directory, if any
    pub local_dir: Option<PathBuf>,
    /// Optional revision/tag pin
    pub revision: Option<String>,
    /// Optional allow-list glob patterns
    pub includes: Option<Vec<String>>,
    /// Optional deny-list glob patterns
    pub excludes: Option<Vec<String>>,
}

/// Map a repository id to a filesystem-safe directory name
///
/// Pure, deterministic, and idempotent: `/` becomes `__` and `:` becomes
/// `_`, so `Org/Model` maps to `Org__Model` on every run.
#[must_use]
pub fn sanitize_repo_id(repo_id: &str) -> String {
    repo_id.replace('/', "__").replace(':', "_")
}

/// A single raw jobs-file entry — either a bare repo id or a full record
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawEntry {
    RepoId(String),
    Record(RawRecord),
}

/// Per-job mapping record as it appears in a jobs file
#[derive(Debug, Deserialize)]
struct RawRecord {
    repo_id: String,
    #[serde(default)]
    local_dir: Option<PathBuf>,
    #[serde(default)]
    revision: Option<String>,
    #[serde(default, alias = "includes")]
    include: Option<Vec<String>>,
    #[serde(default, alias = "excludes")]
    exclude: Option<Vec<String>>,
}

/// Top-level jobs-file shape: a bare list, or a mapping holding the list
/// under a `jobs` or `models` key
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JobsFileRoot {
    List(Vec<RawEntry>),
    Keyed(KeyedRoot),
}

#[derive(Debug, Deserialize)]
struct KeyedRoot {
    #[serde(default, alias = "models")]
    jobs: Option<Vec<RawEntry>>,
}

fn jobs_file_error(path: &Path, reason: impl std::fmt::Display) -> Error {
    Error::Config {
        message: format!("failed to decode jobs file {}: {reason}", path.display()),
        key: Some("jobs_file".to_string()),
    }
}

/// Decode a jobs file into raw entries, dispatching on the file extension
///
/// `.json`/`.jsonl`, `.yaml`/`.yml`, and `.toml` decode through serde; any
/// other extension is read as a plain-text line list where blank lines and
/// `#`-prefixed lines are ignored.
fn decode_jobs_file(path: &Path, text: &str) -> Result<Vec<RawEntry>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let root: JobsFileRoot = match ext.as_str() {
        "json" | "jsonl" => serde_json::from_str(text).map_err(|e| jobs_file_error(path, e))?,
        "yaml" | "yml" => serde_yaml::from_str(text).map_err(|e| jobs_file_error(path, e))?,
        "toml" => toml::from_str(text).map_err(|e| jobs_file_error(path, e))?,
        _ => {
            let entries = text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(|line| RawEntry::RepoId(line.to_string()))
                .collect();
            return Ok(entries);
        }
    };

    Ok(match root {
        JobsFileRoot::List(entries) => entries,
        JobsFileRoot::Keyed(keyed) => keyed.jobs.unwrap_or_default(),
    })
}

fn normalize_entry(entry: RawEntry, base_output: &Path) -> Result<DownloadJob> {
    let record = match entry {
        RawEntry::RepoId(repo_id) => RawRecord {
            repo_id,
            local_dir: None,
            revision: None,
            include: None,
            exclude: None,
        },
        RawEntry::Record(record) => record,
    };

    if record.repo_id.is_empty() {
        return Err(Error::Config {
            message: "jobs file entry has an empty repo_id".to_string(),
            key: Some("repo_id".to_string()),
        });
    }

    let local_dir = record
        .local_dir
        .unwrap_or_else(|| base_output.join(sanitize_repo_id(&record.repo_id)));

    Ok(DownloadJob {
        repo_id: record.repo_id,
        local_dir,
        revision: record.revision,
        includes: record.include,
        excludes: record.exclude,
    })
}

/// Load jobs from a declarative jobs file
///
/// Fails with a configuration error when the file does not exist or cannot
/// be decoded. Entries without an explicit `local_dir` derive one under
/// `base_output`.
pub fn load_jobs_from_file(path: &Path, base_output: &Path) -> Result<Vec<DownloadJob>> {
    if !path.exists() {
        return Err(Error::Config {
            message: format!("jobs file not found: {}", path.display()),
            key: Some("jobs_file".to_string()),
        });
    }

    let text = std::fs::read_to_string(path)?;
    decode_jobs_file(path, &text)?
        .into_iter()
        .map(|entry| normalize_entry(entry, base_output))
        .collect()
}

/// Build the normalized job list from all configured sources
///
/// File-derived jobs come first, in file order; a CLI-flag job is appended
/// after them. Both sources are additive. The base output directory is
/// created if absent. Fails with a configuration error when no source
/// yields any job.
pub fn build_jobs(
    jobs_file: Option<&Path>,
    cli_job: Option<CliJob>,
    base_output: &Path,
) -> Result<Vec<DownloadJob>> {
    std::fs::create_dir_all(base_output)?;

    let mut jobs = Vec::new();

    if let Some(path) = jobs_file {
        jobs.extend(load_jobs_from_file(path, base_output)?);
    }

    if let Some(cli_job) = cli_job {
        let local_dir = cli_job
            .local_dir
            .unwrap_or_else(|| base_output.join(sanitize_repo_id(&cli_job.repo_id)));
        jobs.push(DownloadJob {
            repo_id: cli_job.repo_id,
            local_dir,
            revision: cli_job.revision,
            includes: cli_job.includes,
            excludes: cli_job.excludes,
        });
    }

    if jobs.is_empty() {
        return Err(Error::Config {
            message: "no download jobs specified; provide --repo-id or --jobs-file".to_string(),
            key: None,
        });
    }

    Ok(jobs)
}
