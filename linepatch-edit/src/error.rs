//! Error types for linepatch-edit.
//!
//! Every bounds failure names what was requested and how many lines the buffer had,
//! so callers can tell a stale line number from a malformed request.

use linepatch_types::ops::OpKind;
use linepatch_types::result::LineSpan;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// `replace-block` range does not fit inside the buffer.
    #[error("line range {start}-{end} is out of range (file has {line_count} lines)")]
    RangeOutOfBounds {
        start: usize,
        end: usize,
        line_count: usize,
    },

    /// An insert position outside `min..=max`.
    #[error("{op}: line {line} is out of range {min}..={max} (file has {line_count} lines)")]
    LineOutOfBounds {
        op: OpKind,
        line: usize,
        min: usize,
        max: usize,
        line_count: usize,
    },

    /// A diff could not be parsed or did not apply.
    #[error("diff error: {message}")]
    Diff { message: String },
}

impl EditError {
    /// The requested bounds, when the error is a bounds failure.
    pub fn requested(&self) -> Option<LineSpan> {
        match self {
            EditError::RangeOutOfBounds { start, end, .. } => Some(LineSpan {
                start: *start,
                end: *end,
            }),
            EditError::LineOutOfBounds { line, .. } => Some(LineSpan {
                start: *line,
                end: *line,
            }),
            EditError::Diff { .. } => None,
        }
    }

    pub fn line_count(&self) -> Option<usize> {
        match self {
            EditError::RangeOutOfBounds { line_count, .. }
            | EditError::LineOutOfBounds { line_count, .. } => Some(*line_count),
            EditError::Diff { .. } => None,
        }
    }
}

pub type EditResult<T> = Result<T, EditError>;
