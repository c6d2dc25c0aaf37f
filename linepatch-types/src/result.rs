use crate::ops::OpKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of the external type check for a modified file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TypeCheckOutcome {
    Pass,
    Fail { diagnostics: String },
    /// The checker did not produce a verdict (missing binary, unsupported file, timeout...).
    NotApplicable { reason: String },
}

impl TypeCheckOutcome {
    pub fn not_applicable(reason: impl Into<String>) -> Self {
        TypeCheckOutcome::NotApplicable {
            reason: reason.into(),
        }
    }

    /// Tri-state used on the webhook: `Some(true)`, `Some(false)`, or `None` when not applicable.
    pub fn ok(&self) -> Option<bool> {
        match self {
            TypeCheckOutcome::Pass => Some(true),
            TypeCheckOutcome::Fail { .. } => Some(false),
            TypeCheckOutcome::NotApplicable { .. } => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TypeCheckOutcome::Pass => "pass",
            TypeCheckOutcome::Fail { .. } => "fail",
            TypeCheckOutcome::NotApplicable { .. } => "not_applicable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Range,
    ContentResolution,
    Io,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Range => "range",
            ErrorKind::ContentResolution => "content_resolution",
            ErrorKind::Io => "io",
        }
    }
}

/// Requested line bounds, 1-based and inclusive. Inserts use `start == end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpan {
    pub start: usize,
    pub end: usize,
}

/// Structured failure detail, enough for an automated caller to decide retry vs. abandon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub kind: ErrorKind,
    pub message: String,
    pub file: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requested: Option<LineSpan>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_count: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationResult {
    /// 0-based position in the batch.
    pub index: usize,
    pub success: bool,
    pub file: String,
    pub op: OpKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,

    pub type_check: TypeCheckOutcome,

    /// True only when the new contents reached disk.
    #[serde(default)]
    pub written: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_before: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256_after: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines_before: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines_after: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
}

impl OperationResult {
    /// A failed result; no diff and no type-check verdict.
    pub fn failed(
        index: usize,
        file: impl Into<String>,
        op: OpKind,
        task_id: Option<String>,
        error: ErrorDetail,
    ) -> Self {
        Self {
            index,
            success: false,
            file: file.into(),
            op,
            task_id,
            diff: None,
            type_check: TypeCheckOutcome::not_applicable("operation failed"),
            written: false,
            sha256_before: None,
            sha256_after: None,
            lines_before: None,
            lines_after: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunInfo {
    pub started_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub schema: String,
    pub batch_id: String,
    pub success: bool,
    pub dry_run: bool,

    #[serde(default)]
    pub requester: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub branch: String,

    pub run: RunInfo,

    #[serde(default)]
    pub results: Vec<OperationResult>,

    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

impl BatchResult {
    /// Build a result from per-operation outcomes; success and counts are derived, never set.
    pub fn from_results(
        batch_id: impl Into<String>,
        dry_run: bool,
        run: RunInfo,
        results: Vec<OperationResult>,
    ) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        let total = results.len();
        Self {
            schema: crate::schema::LINEPATCH_RESULT_V1.to_string(),
            batch_id: batch_id.into(),
            success: succeeded == total,
            dry_run,
            requester: String::new(),
            reason: String::new(),
            branch: String::new(),
            run,
            results,
            total,
            succeeded,
            failed: total - succeeded,
        }
    }
}
