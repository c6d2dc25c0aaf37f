//! Batch orchestrator.
//!
//! Operations run strictly in list order against the files under the project root.
//! A failed operation is recorded and the batch moves on; only schema validation
//! (and runtime failures loading the schema) stop a batch, and they do so before
//! any file is touched.

use crate::adapters::{FsWritePort, NoSchema, NoTypeCheck, NoopEventSink, TracingReporter};
use crate::error::PatchError;
use crate::notifier::{Notifier, operation_event};
use crate::ports::{EventSink, Reporter, SchemaProvider, TypeChecker, WritePort};
use crate::schema::check_batch;
use crate::settings::ApplySettings;
use camino::Utf8PathBuf;
use chrono::Utc;
use fs_err as fs;
use linepatch_edit::{apply_edit, join_lines, render_diff, split_lines};
use linepatch_types::batch::PatchBatch;
use linepatch_types::ops::{ContentSource, PatchOperation};
use linepatch_types::result::{BatchResult, OperationResult, RunInfo, TypeCheckOutcome};
use sha2::{Digest, Sha256};
use tracing::debug;

static NO_SCHEMA: NoSchema = NoSchema;
static NO_EVENTS: NoopEventSink = NoopEventSink;
static NO_TYPE_CHECK: NoTypeCheck = NoTypeCheck;
static FS_WRITE: FsWritePort = FsWritePort;
static TRACING: TracingReporter = TracingReporter;

/// Applies batches. Every side effect goes through a port; `new` wires no-op
/// schema, events and type checking, filesystem writes and a tracing reporter.
pub struct Orchestrator<'a> {
    settings: ApplySettings,
    schema: &'a dyn SchemaProvider,
    notifier: Notifier<'a>,
    type_checker: &'a dyn TypeChecker,
    writer: &'a dyn WritePort,
    reporter: &'a dyn Reporter,
}

impl<'a> Orchestrator<'a> {
    pub fn new(settings: ApplySettings) -> Self {
        Self {
            settings,
            schema: &NO_SCHEMA,
            notifier: Notifier::new(&NO_EVENTS),
            type_checker: &NO_TYPE_CHECK,
            writer: &FS_WRITE,
            reporter: &TRACING,
        }
    }

    pub fn with_schema(mut self, schema: &'a dyn SchemaProvider) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_events(mut self, sink: &'a dyn EventSink, diff_dir: Option<Utf8PathBuf>) -> Self {
        self.notifier = Notifier::new(sink).with_diff_dir(diff_dir);
        self
    }

    pub fn with_type_checker(mut self, checker: &'a dyn TypeChecker) -> Self {
        self.type_checker = checker;
        self
    }

    pub fn with_writer(mut self, writer: &'a dyn WritePort) -> Self {
        self.writer = writer;
        self
    }

    pub fn with_reporter(mut self, reporter: &'a dyn Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn settings(&self) -> &ApplySettings {
        &self.settings
    }

    /// Check the batch against the task schema without touching any file.
    ///
    /// Soft findings go to the reporter; allow-list violations are returned together.
    pub fn validate(&self, batch: &PatchBatch) -> Result<(), PatchError> {
        let schema = self.schema.load_schema()?;
        let warnings = check_batch(schema.as_ref(), batch).into_result()?;
        for warning in &warnings {
            self.reporter.warning(warning);
        }
        Ok(())
    }

    /// Validate, then apply every operation in order.
    pub fn apply_batch(&self, batch: &PatchBatch) -> Result<BatchResult, PatchError> {
        let started_at = Utc::now();
        self.validate(batch)?;

        let batch_id = batch
            .order_id
            .clone()
            .unwrap_or_else(generate_batch_id);
        let dry_run = self.settings.dry_run;
        self.reporter.batch_started(&batch_id, batch, dry_run);

        let mut results = Vec::with_capacity(batch.len());
        for (index, op) in batch.patches.iter().enumerate() {
            let result = self.apply_operation(index, op).unwrap_or_else(|err| {
                OperationResult::failed(
                    index,
                    op.file.as_str(),
                    op.kind(),
                    op.task_id.clone(),
                    err.to_detail(op.file.as_str()),
                )
            });
            self.reporter.operation_finished(&result);
            self.notifier.deliver(
                operation_event(&batch_id, batch, &result, dry_run),
                result.diff.as_deref(),
            );
            results.push(result);
        }

        let run = RunInfo {
            started_at,
            ended_at: Some(Utc::now()),
        };
        let mut outcome = BatchResult::from_results(batch_id, dry_run, run, results);
        outcome.requester = batch.requester.clone();
        outcome.reason = batch.reason.clone();
        outcome.branch = batch.branch.clone();

        self.reporter.batch_finished(&outcome);
        Ok(outcome)
    }

    fn apply_operation(
        &self,
        index: usize,
        op: &PatchOperation,
    ) -> Result<OperationResult, PatchError> {
        let rel = op.file.as_str();
        let path = self.settings.project_root.join(&op.file);

        let before = fs::read_to_string(&path).map_err(|e| PatchError::io(rel, e))?;
        let content = self.resolve_content(op)?;

        let lines = split_lines(&before);
        let edited = apply_edit(&lines, &op.edit, &content, op.indent).map_err(|source| {
            PatchError::Range {
                file: rel.to_string(),
                source,
            }
        })?;
        let after = join_lines(&edited);
        let diff = render_diff(rel, &before, &after);
        debug!(index, file = rel, diff_bytes = diff.len(), "edit computed");

        let written = if self.settings.dry_run {
            false
        } else {
            self.writer
                .write_file(&path, after.as_bytes())
                .map_err(|e| PatchError::io(rel, format!("{e:#}")))?;
            true
        };

        // The checker reads the file from disk, so it only runs on what was written.
        let type_check = if written {
            self.type_checker
                .check(&self.settings.project_root, &op.file)
        } else {
            TypeCheckOutcome::not_applicable("dry run: file not written")
        };

        Ok(OperationResult {
            index,
            success: true,
            file: rel.to_string(),
            op: op.kind(),
            task_id: op.task_id.clone(),
            diff: Some(diff),
            type_check,
            written,
            sha256_before: Some(sha256_hex(before.as_bytes())),
            sha256_after: Some(sha256_hex(after.as_bytes())),
            lines_before: Some(lines.len()),
            lines_after: Some(edited.len()),
            error: None,
        })
    }

    fn resolve_content(&self, op: &PatchOperation) -> Result<String, PatchError> {
        match &op.content {
            ContentSource::Inline(text) => Ok(text.clone()),
            ContentSource::FileRef(block_file) => {
                let path = self.settings.project_root.join(block_file);
                fs::read_to_string(&path).map_err(|e| PatchError::ContentResolution {
                    file: op.file.to_string(),
                    path: block_file.to_string(),
                    message: e.to_string(),
                })
            }
        }
    }
}

/// `patch-<uuid v4>`, used when the batch carries no order id.
pub fn generate_batch_id() -> String {
    format!("patch-{}", uuid::Uuid::new_v4())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
