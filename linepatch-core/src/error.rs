//! Error types for linepatch-core.
//!
//! - Validation failures (exit code 2) abort the batch before any file is touched.
//! - Operation-scoped failures (range, content resolution, io) become failed results.
//! - Runtime failures (exit code 1) cover everything the batch cannot recover from.

use linepatch_edit::EditError;
use linepatch_types::result::{ErrorDetail, ErrorKind};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("schema validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{file}: {source}")]
    Range {
        file: String,
        #[source]
        source: EditError,
    },

    #[error("{file}: cannot read block file {path}: {message}")]
    ContentResolution {
        file: String,
        path: String,
        message: String,
    },

    #[error("{file}: {message}")]
    Io { file: String, message: String },

    #[error("{0:#}")]
    Runtime(#[from] anyhow::Error),
}

impl PatchError {
    pub fn io(file: impl Into<String>, err: impl fmt::Display) -> Self {
        PatchError::Io {
            file: file.into(),
            message: err.to_string(),
        }
    }

    /// Returns the recommended exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            PatchError::Validation(_) => 2,
            _ => 1,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PatchError::Validation(_) => ErrorKind::Validation,
            PatchError::Range { .. } => ErrorKind::Range,
            PatchError::ContentResolution { .. } => ErrorKind::ContentResolution,
            PatchError::Io { .. } | PatchError::Runtime(_) => ErrorKind::Io,
        }
    }

    /// Structured detail for a failed operation result.
    pub fn to_detail(&self, file: &str) -> ErrorDetail {
        let (requested, line_count) = match self {
            PatchError::Range { source, .. } => (source.requested(), source.line_count()),
            _ => (None, None),
        };
        ErrorDetail {
            kind: self.kind(),
            message: self.to_string(),
            file: file.to_string(),
            requested,
            line_count,
        }
    }
}

/// One allow-list rejection. `index` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    FileNotAllowed {
        index: usize,
        task_id: String,
        file: String,
        allowed: Vec<String>,
    },
    OperationNotAllowed {
        index: usize,
        task_id: String,
        op: String,
        allowed: Vec<String>,
    },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::FileNotAllowed {
                index,
                task_id,
                file,
                allowed,
            } => write!(
                f,
                "operation {index}: file '{file}' not allowed for task {task_id} (allowed: {})",
                allowed.join(", ")
            ),
            Violation::OperationNotAllowed {
                index,
                task_id,
                op,
                allowed,
            } => write!(
                f,
                "operation {index}: op '{op}' not allowed for task {task_id} (allowed: {})",
                allowed.join(", ")
            ),
        }
    }
}

/// Every allow-list violation found in a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    pub violations: Vec<Violation>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .violations
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{joined}")
    }
}
