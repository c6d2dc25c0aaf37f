use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operation kind for patch ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OpKind {
    ReplaceBlock,
    InsertBefore,
    InsertAfter,
    Append,
    Prepend,
}

impl OpKind {
    pub const ALL: [OpKind; 5] = [
        OpKind::ReplaceBlock,
        OpKind::InsertBefore,
        OpKind::InsertAfter,
        OpKind::Append,
        OpKind::Prepend,
    ];

    /// The wire spelling used in batch documents and task schemas.
    pub fn as_str(self) -> &'static str {
        match self {
            OpKind::ReplaceBlock => "replace-block",
            OpKind::InsertBefore => "insert-before",
            OpKind::InsertAfter => "insert-after",
            OpKind::Append => "append",
            OpKind::Prepend => "prepend",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation '{0}'")]
pub struct UnknownOpKind(pub String);

impl FromStr for OpKind {
    type Err = UnknownOpKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OpKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownOpKind(s.to_string()))
    }
}

/// Positional shape of an edit. Each variant carries only the fields its kind needs.
///
/// Line numbers are 1-based. `InsertAfter { line: 0 }` inserts at the top of the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Edit {
    ReplaceBlock { start: usize, end: usize },
    InsertBefore { line: usize },
    InsertAfter { line: usize },
    Append,
    Prepend,
}

impl Edit {
    pub fn kind(&self) -> OpKind {
        match self {
            Edit::ReplaceBlock { .. } => OpKind::ReplaceBlock,
            Edit::InsertBefore { .. } => OpKind::InsertBefore,
            Edit::InsertAfter { .. } => OpKind::InsertAfter,
            Edit::Append => OpKind::Append,
            Edit::Prepend => OpKind::Prepend,
        }
    }
}

/// Where the block text comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentSource {
    Inline(String),
    /// Path to a block file, relative to the project root.
    FileRef(Utf8PathBuf),
}

/// Indentation handling for positional edits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndentMode {
    /// Copy the reference line's leading whitespace onto the first content line.
    #[default]
    Preserve,
    /// Insert content exactly as authored ("open space").
    Raw,
}

impl IndentMode {
    pub fn from_open_space(open_space: bool) -> Self {
        if open_space {
            IndentMode::Raw
        } else {
            IndentMode::Preserve
        }
    }

    pub fn preserves(self) -> bool {
        matches!(self, IndentMode::Preserve)
    }
}

/// A single validated patch operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchOperation {
    pub edit: Edit,
    /// Target file, relative to the project root.
    pub file: Utf8PathBuf,
    pub content: ContentSource,
    #[serde(default)]
    pub indent: IndentMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
}

impl PatchOperation {
    pub fn new(edit: Edit, file: impl Into<Utf8PathBuf>, content: ContentSource) -> Self {
        Self {
            edit,
            file: file.into(),
            content,
            indent: IndentMode::Preserve,
            task_id: None,
        }
    }

    pub fn with_indent(mut self, indent: IndentMode) -> Self {
        self.indent = indent;
        self
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = Some(task_id.into());
        self
    }

    pub fn kind(&self) -> OpKind {
        self.edit.kind()
    }
}
