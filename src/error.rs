use std::path::PathBuf;
use thiserror::Error;

use crate::types::Split;

/// Errors raised while preparing the dataset.
///
/// Configuration errors abort the run. Everything else is raised per record and is
/// expected to be logged and skipped by the caller.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("{} record(s) with group value '{}' have no assignment rule", .0.records, .0.group_value)]
    AssignmentGap(AssignmentGap),

    #[error("{} leakage violation(s) found", .0.len())]
    Leakage(Vec<LeakageViolation>),

    #[error("input file {} not found", .0.display())]
    MissingInput(PathBuf),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to decode video {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    #[error("invalid image size {width}x{height}")]
    InvalidImageSize { width: u32, height: u32 },
}

impl DatasetError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DatasetError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A folder that could not be turned into a `VideoRecord`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScanWarning {
    #[error("category directory {} does not exist", .0.display())]
    MissingCategory(PathBuf),

    #[error("frames path {} does not exist", .0.display())]
    MissingFrames(PathBuf),

    #[error("folder name '{name}' does not match <prefix>_<camera>_<place>_<subject>_<brightness>: {reason}")]
    MalformedFolderName { name: String, reason: String },

    #[error("folder name '{name}' in {} already used by {}", duplicate.display(), first.display())]
    DuplicateFolder {
        name: String,
        first: PathBuf,
        duplicate: PathBuf,
    },

    #[error("cannot list {}: {message}", path.display())]
    Unreadable { path: PathBuf, message: String },
}

/// Records dropped because their group value had no rule in the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentGap {
    pub group_value: String,
    pub records: usize,
    pub folders: Vec<String>,
}

/// A folder that appears in more than one split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeakageViolation {
    pub folder: String,
    pub first: Split,
    pub second: Split,
}

impl std::fmt::Display for LeakageViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "folder {} is present in both {} and {}",
            self.folder, self.first, self.second
        )
    }
}
