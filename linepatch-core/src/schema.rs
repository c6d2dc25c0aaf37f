//! Task allow-list enforcement.
//!
//! Runs once over a whole batch before any file is touched.

use crate::error::{ValidationError, Violation};
use linepatch_types::batch::PatchBatch;
use linepatch_types::task_schema::TaskSchema;

/// Result of checking a batch against a task schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaCheck {
    pub violations: Vec<Violation>,
    /// Soft findings (unknown task ids). Never block the batch.
    pub warnings: Vec<String>,
}

impl SchemaCheck {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn into_result(self) -> Result<Vec<String>, ValidationError> {
        if self.is_ok() {
            Ok(self.warnings)
        } else {
            Err(ValidationError {
                violations: self.violations,
            })
        }
    }
}

/// Check every operation carrying a task id against `schema`.
///
/// No schema means nothing to enforce. Empty allow-lists are unrestricted.
pub fn check_batch(schema: Option<&TaskSchema>, batch: &PatchBatch) -> SchemaCheck {
    let mut check = SchemaCheck::default();
    let Some(schema) = schema else {
        return check;
    };

    for (i, op) in batch.patches.iter().enumerate() {
        let index = i + 1;
        let Some(task_id) = op.task_id.as_deref() else {
            continue;
        };
        let Some(task) = schema.task(task_id) else {
            check
                .warnings
                .push(format!("operation {index}: task {task_id} not found in schema"));
            continue;
        };

        let file = normalize(op.file.as_str());
        if !task.files.is_empty() && !task.files.iter().any(|f| normalize(f) == file) {
            check.violations.push(Violation::FileNotAllowed {
                index,
                task_id: task_id.to_string(),
                file: op.file.to_string(),
                allowed: task.files.clone(),
            });
        }

        let kind = op.kind().as_str();
        if !task.allowed_operations.is_empty()
            && !task.allowed_operations.iter().any(|o| o == kind)
        {
            check.violations.push(Violation::OperationNotAllowed {
                index,
                task_id: task_id.to_string(),
                op: kind.to_string(),
                allowed: task.allowed_operations.clone(),
            });
        }
    }

    check
}

/// `./src/a.ts` and `src/a.ts` name the same file.
fn normalize(path: &str) -> &str {
    let mut p = path;
    while let Some(rest) = p.strip_prefix("./") {
        p = rest;
    }
    p
}
