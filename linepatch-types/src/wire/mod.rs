pub mod batch_v1;

pub use batch_v1::{BatchV1, PatchOpV1};

/// Errors emitted while converting wire documents into validated models.
///
/// `index` is the 1-based position of the offending operation in `patches`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    UnknownOp { index: usize, op: String },
    MissingField { index: usize, op: &'static str, field: &'static str },
    InvalidLine { index: usize, field: &'static str, value: usize },
    InvertedRange { index: usize, start: usize, end: usize },
    ContentSource { index: usize, both: bool },
    UnsafePath { index: usize, field: &'static str, path: String },
}

impl WireError {
    pub fn index(&self) -> usize {
        match self {
            WireError::UnknownOp { index, .. }
            | WireError::MissingField { index, .. }
            | WireError::InvalidLine { index, .. }
            | WireError::InvertedRange { index, .. }
            | WireError::ContentSource { index, .. }
            | WireError::UnsafePath { index, .. } => *index,
        }
    }
}

impl std::fmt::Display for WireError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WireError::UnknownOp { index, op } => {
                write!(f, "operation {}: unknown op '{}'", index, op)
            }
            WireError::MissingField { index, op, field } => {
                write!(f, "operation {}: {} requires '{}'", index, op, field)
            }
            WireError::InvalidLine {
                index,
                field,
                value,
            } => write!(
                f,
                "operation {}: '{}' must be at least 1 (got {})",
                index, field, value
            ),
            WireError::InvertedRange { index, start, end } => write!(
                f,
                "operation {}: start {} is after end {}",
                index, start, end
            ),
            WireError::ContentSource { index, both: true } => write!(
                f,
                "operation {}: 'block' and 'blockFile' are mutually exclusive",
                index
            ),
            WireError::ContentSource { index, both: false } => write!(
                f,
                "operation {}: either 'block' or 'blockFile' must be provided",
                index
            ),
            WireError::UnsafePath { index, field, path } => write!(
                f,
                "operation {}: '{}' must be a relative path inside the project ({})",
                index, field, path
            ),
        }
    }
}

impl std::error::Error for WireError {}
