//! Error taxonomy for configuration resolution.
//!
//! Every failure carries the file or settings path it concerns. Callers that
//! only care about the class of failure should match on [`KonfigError::kind`].

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Coarse error classes for programmatic handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// A source file (or every file of a multi-file load) is missing.
    NotFound,
    /// A located source is empty, not valid YAML, not a mapping, or its
    /// template expressions failed to evaluate.
    EmptyOrUnparseableSource,
    /// Bad provider mode, missing working directory, or similar.
    ArgumentInvalid,
    /// A settings path does not exist in the resolved tree.
    KeyLookup,
    /// A located file could not be read.
    Io,
}

/// Errors raised while resolving or reading configuration.
#[derive(Debug, Error)]
pub enum KonfigError {
    #[error("config file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("config file is empty: {}", path.display())]
    EmptyFile { path: PathBuf },

    #[error("failed to parse YAML in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("top-level node of {} must be a mapping", path.display())]
    NotAMapping { path: PathBuf },

    #[error("template error in {}: {message}", path.display())]
    Template { path: PathBuf, message: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unknown settings key: {path}")]
    KeyLookup { path: String },

    #[error("cannot decode settings value at {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl KonfigError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileNotFound { .. } => ErrorKind::NotFound,
            Self::EmptyFile { .. }
            | Self::Parse { .. }
            | Self::NotAMapping { .. }
            | Self::Template { .. } => ErrorKind::EmptyOrUnparseableSource,
            Self::Io { .. } => ErrorKind::Io,
            Self::InvalidArgument(_) => ErrorKind::ArgumentInvalid,
            Self::KeyLookup { .. } | Self::Decode { .. } => ErrorKind::KeyLookup,
        }
    }

    // Convenience constructors

    pub fn not_found(path: impl AsRef<Path>) -> Self {
        Self::FileNotFound {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Key lookup failure for the given path segments.
    pub fn key_lookup<S: AsRef<str>>(segments: &[S]) -> Self {
        Self::KeyLookup {
            path: dotted(segments),
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub fn is_key_lookup(&self) -> bool {
        self.kind() == ErrorKind::KeyLookup
    }
}

/// Join path segments with dots for display.
pub(crate) fn dotted<S: AsRef<str>>(segments: &[S]) -> String {
    segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(".")
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, KonfigError>;
