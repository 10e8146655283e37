//! Shared error types for the audit-and-upgrade engine

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for pyforge operations
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed structured document. Fatal to the step touching the file,
    /// raised before any mutation is committed.
    #[error("Parse error in {file}:{line}: {reason}")]
    Parse {
        file: PathBuf,
        line: usize,
        reason: String,
    },

    /// A step's transform cannot be applied to the observed document shape.
    /// Fatal to the run; a live run rolls back before surfacing this.
    #[error("Step '{step_id}' could not be applied to {file}: {reason}")]
    StepApplication {
        step_id: String,
        file: PathBuf,
        reason: String,
    },

    /// Post-write re-parse failed. Fatal; a live run rolls back.
    #[error("Step '{step_id}' produced an invalid document at {file}: {reason}")]
    Verification {
        step_id: String,
        file: PathBuf,
        reason: String,
    },

    /// The project path does not exist or is not a directory.
    #[error("Invalid target project {path}: {reason}")]
    InvalidProject { path: PathBuf, reason: String },

    /// Restoring from the backup failed. The one unrecoverable condition;
    /// the backup path is included for manual recovery.
    #[error("ROLLBACK FAILED: {reason}. Recover manually from backup at {backup_path}")]
    RollbackFailed {
        backup_path: PathBuf,
        reason: String,
    },

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a parse error with line context
    pub fn parse(file: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            reason: reason.into(),
        }
    }

    pub fn step_application(
        step_id: impl Into<String>,
        file: impl Into<PathBuf>,
        reason: impl Into<String>,
    ) -> Self {
        Self::StepApplication {
            step_id: step_id.into(),
            file: file.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_project(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidProject {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;
