//! Failure taxonomy and exit codes.
//!
//! Every way a run can fail maps to exactly one [`FailureKind`], and every
//! kind carries a fixed process exit code. Scripted callers branch on these
//! codes, so they are part of the public contract:
//!
//! | Kind | Code |
//! |------|------|
//! | [`FailureKind::ParseError`] | 10 |
//! | [`FailureKind::FileNotFound`] | 11 |
//! | [`FailureKind::PermissionDenied`] | 12 |
//! | [`FailureKind::MissingArgument`] | 13 |
//! | [`FailureKind::MissingClassname`] | 14 |
//! | [`FailureKind::MissingName`] | 15 |
//! | [`FailureKind::UnknownError`] | 100 |

use std::io;
use std::path::{Path, PathBuf};

/// Result type for processing operations.
pub type ProcessResult<T> = Result<T, ProcessError>;

/// Closed set of failure kinds, each with a stable exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The input is not well-formed XML.
    ParseError,
    /// The input path does not exist.
    FileNotFound,
    /// The input path exists but cannot be read.
    PermissionDenied,
    /// No input path was supplied, or the `-j` flag was missing.
    MissingArgument,
    /// A `testcase` element has no `classname` attribute.
    MissingClassname,
    /// A `testcase` element has no `name` attribute.
    MissingName,
    /// Anything else.
    UnknownError,
}

impl FailureKind {
    /// Process exit code for this kind of failure.
    pub fn exit_code(self) -> i32 {
        match self {
            FailureKind::ParseError => 10,
            FailureKind::FileNotFound => 11,
            FailureKind::PermissionDenied => 12,
            FailureKind::MissingArgument => 13,
            FailureKind::MissingClassname => 14,
            FailureKind::MissingName => 15,
            FailureKind::UnknownError => 100,
        }
    }
}

/// Errors that abort processing of a report.
///
/// Detection happens at the point of failure; nothing is recovered locally
/// and no partial output is produced.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    /// Caller did not provide what the command line requires.
    #[error("{0}")]
    MissingArgument(String),

    #[error("File not found: {}", .path.display())]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Access denied: {}", .path.display())]
    PermissionDenied {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The input is not well-formed XML.
    #[error("Cannot parse XML file: {0}")]
    Parse(String),

    /// Test case at `index` (among the root's `testcase` children) has no classname.
    #[error("Missing classname attribute on testcase #{index}")]
    MissingClassname { index: usize },

    /// Test case at `index` has a classname but no name.
    #[error("Missing name attribute on testcase #{index}")]
    MissingName { index: usize },

    /// Other unexpected failures.
    #[error("Unexpected error: {0:#}")]
    Unknown(#[from] anyhow::Error),
}

impl ProcessError {
    /// Builds the error for a failed read of `path`, classified by I/O error kind.
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => ProcessError::FileNotFound {
                path: path.to_path_buf(),
                source,
            },
            io::ErrorKind::PermissionDenied => ProcessError::PermissionDenied {
                path: path.to_path_buf(),
                source,
            },
            _ => ProcessError::Unknown(
                anyhow::Error::new(source)
                    .context(format!("Failed to read {}", path.display())),
            ),
        }
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            ProcessError::MissingArgument(_) => FailureKind::MissingArgument,
            ProcessError::FileNotFound { .. } => FailureKind::FileNotFound,
            ProcessError::PermissionDenied { .. } => FailureKind::PermissionDenied,
            ProcessError::Parse(_) => FailureKind::ParseError,
            ProcessError::MissingClassname { .. } => FailureKind::MissingClassname,
            ProcessError::MissingName { .. } => FailureKind::MissingName,
            ProcessError::Unknown(_) => FailureKind::UnknownError,
        }
    }

    pub fn exit_code(&self) -> i32 {
        self.kind().exit_code()
    }
}
