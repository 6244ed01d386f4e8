//! Error types for procfs attribute reads and fixture loading.
//!
//! None of these errors reach the caller of a snapshot build: the inspector
//! turns every failed attribute read into the field's default value. They
//! exist so each reader can be tested on its own and so the reason for a
//! missing value shows up in debug logs.

use std::path::PathBuf;

/// Failure while reading or parsing a file under `/proc`.
#[derive(Debug, thiserror::Error)]
pub enum ProcfsError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unexpected format in {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("not an ELF image: {0}")]
    NotElf(String),

    #[error("field {field} not present in {path}")]
    MissingField { path: PathBuf, field: &'static str },
}

impl ProcfsError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// True when the read failed because the caller lacks permission.
    pub fn is_permission_denied(&self) -> bool {
        matches!(
            self,
            Self::Io { source, .. } if source.kind() == std::io::ErrorKind::PermissionDenied
        )
    }
}

/// Failure while loading a synthetic process fixture.
#[derive(Debug, thiserror::Error)]
pub enum FixtureError {
    #[error("test data file not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read test data file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse test data JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ProcfsResult<T> = Result<T, ProcfsError>;
