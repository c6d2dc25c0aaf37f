use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::batch::{DEFAULT_REQUESTER, PatchBatch};
use crate::ops::{ContentSource, Edit, IndentMode, OpKind, PatchOperation};
use crate::wire::WireError;

/// Schema-exact wire representation of a batch document as agents submit it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchV1 {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    #[serde(default)]
    pub patches: Vec<PatchOpV1>,
}

/// One operation as written on the wire. Positional fields are optional here and
/// checked against the op kind during conversion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchOpV1 {
    pub op: String,
    pub file: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_space: Option<bool>,

    /// Accepts `"1"` or `1`.
    #[serde(
        default,
        deserialize_with = "crate::task_schema::opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub task_id: Option<String>,
}

impl TryFrom<BatchV1> for PatchBatch {
    type Error = WireError;

    fn try_from(batch: BatchV1) -> Result<Self, Self::Error> {
        let patches = batch
            .patches
            .into_iter()
            .enumerate()
            .map(|(i, op)| op.into_operation(i + 1))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PatchBatch {
            order_id: batch.order_id.filter(|id| !id.is_empty()),
            requester: batch
                .requester
                .filter(|r| !r.is_empty())
                .unwrap_or_else(|| DEFAULT_REQUESTER.to_string()),
            reason: batch.reason.unwrap_or_default(),
            branch: batch.branch.unwrap_or_default(),
            patches,
        })
    }
}

impl From<&PatchBatch> for BatchV1 {
    fn from(batch: &PatchBatch) -> Self {
        Self {
            order_id: batch.order_id.clone(),
            requester: Some(batch.requester.clone()),
            reason: (!batch.reason.is_empty()).then(|| batch.reason.clone()),
            branch: (!batch.branch.is_empty()).then(|| batch.branch.clone()),
            patches: batch.patches.iter().map(PatchOpV1::from).collect(),
        }
    }
}

impl From<&PatchOperation> for PatchOpV1 {
    fn from(op: &PatchOperation) -> Self {
        let mut wire = PatchOpV1 {
            op: op.kind().as_str().to_string(),
            file: op.file.to_string(),
            open_space: (op.indent == IndentMode::Raw).then_some(true),
            task_id: op.task_id.clone(),
            ..Default::default()
        };
        match op.edit {
            Edit::ReplaceBlock { start, end } => {
                wire.start = Some(start);
                wire.end = Some(end);
            }
            Edit::InsertBefore { line } | Edit::InsertAfter { line } => wire.line = Some(line),
            Edit::Append | Edit::Prepend => {}
        }
        match &op.content {
            ContentSource::Inline(text) => wire.block = Some(text.clone()),
            ContentSource::FileRef(path) => wire.block_file = Some(path.to_string()),
        }
        wire
    }
}

impl PatchOpV1 {
    fn into_operation(self, index: usize) -> Result<PatchOperation, WireError> {
        let kind: OpKind = self.op.parse().map_err(|_| WireError::UnknownOp {
            index,
            op: self.op.clone(),
        })?;
        let op = kind.as_str();

        let edit = match kind {
            OpKind::ReplaceBlock => {
                let start = self.start.ok_or(WireError::MissingField {
                    index,
                    op,
                    field: "start",
                })?;
                let end = self.end.ok_or(WireError::MissingField {
                    index,
                    op,
                    field: "end",
                })?;
                if start == 0 {
                    return Err(WireError::InvalidLine {
                        index,
                        field: "start",
                        value: start,
                    });
                }
                if start > end {
                    return Err(WireError::InvertedRange { index, start, end });
                }
                Edit::ReplaceBlock { start, end }
            }
            OpKind::InsertBefore => {
                let line = self.line.ok_or(WireError::MissingField {
                    index,
                    op,
                    field: "line",
                })?;
                if line == 0 {
                    return Err(WireError::InvalidLine {
                        index,
                        field: "line",
                        value: line,
                    });
                }
                Edit::InsertBefore { line }
            }
            // line 0 is the top of the file.
            OpKind::InsertAfter => Edit::InsertAfter {
                line: self.line.ok_or(WireError::MissingField {
                    index,
                    op,
                    field: "line",
                })?,
            },
            OpKind::Append => Edit::Append,
            OpKind::Prepend => Edit::Prepend,
        };

        let content = match (self.block, self.block_file) {
            (Some(_), Some(_)) => return Err(WireError::ContentSource { index, both: true }),
            (None, None) => return Err(WireError::ContentSource { index, both: false }),
            (Some(text), None) => ContentSource::Inline(text),
            (None, Some(path)) => {
                ContentSource::FileRef(checked_relative(index, "blockFile", &path)?)
            }
        };

        let file = checked_relative(index, "file", &self.file)?;

        Ok(PatchOperation {
            edit,
            file,
            content,
            indent: IndentMode::from_open_space(self.open_space.unwrap_or(false)),
            task_id: self.task_id.filter(|t| !t.is_empty()),
        })
    }
}

/// Paths must stay inside the project root: relative, non-empty, no `..`.
fn checked_relative(
    index: usize,
    field: &'static str,
    raw: &str,
) -> Result<Utf8PathBuf, WireError> {
    let path = Utf8Path::new(raw);
    let escapes = path.components().any(|c| {
        matches!(
            c,
            Utf8Component::ParentDir | Utf8Component::RootDir | Utf8Component::Prefix(_)
        )
    });
    if raw.trim().is_empty() || path.is_absolute() || escapes {
        return Err(WireError::UnsafePath {
            index,
            field,
            path: raw.to_string(),
        });
    }
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replace(start: Option<usize>, end: Option<usize>) -> PatchOpV1 {
        PatchOpV1 {
            op: "replace-block".to_string(),
            file: "greet.py".to_string(),
            start,
            end,
            block: Some("x\n".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn insert_after_line_zero_is_accepted() {
        let op = PatchOpV1 {
            op: "insert-after".to_string(),
            file: "a.py".to_string(),
            line: Some(0),
            block: Some("top\n".to_string()),
            ..Default::default()
        };
        let parsed = op.into_operation(1).expect("valid op");
        assert_eq!(parsed.edit, Edit::InsertAfter { line: 0 });
    }

    #[test]
    fn replace_block_requires_both_bounds() {
        let err = replace(Some(1), None).into_operation(2).expect_err("missing end");
        assert_eq!(
            err,
            WireError::MissingField {
                index: 2,
                op: "replace-block",
                field: "end"
            }
        );
    }

    #[test]
    fn replace_block_rejects_zero_and_inverted_ranges() {
        assert!(matches!(
            replace(Some(0), Some(1)).into_operation(1),
            Err(WireError::InvalidLine { field: "start", .. })
        ));
        assert!(matches!(
            replace(Some(3), Some(2)).into_operation(1),
            Err(WireError::InvertedRange { start: 3, end: 2, .. })
        ));
    }

    #[test]
    fn escaping_paths_are_rejected() {
        for bad in ["/etc/passwd", "../outside.py", "src/../../x.py", ""] {
            let mut op = replace(Some(1), Some(1));
            op.file = bad.to_string();
            assert!(
                matches!(op.into_operation(1), Err(WireError::UnsafePath { .. })),
                "{bad:?} should be rejected"
            );
        }
    }
}
