//! Default port implementations: filesystem, HTTP webhook, external checker, tracing.

use crate::ports::{EventSink, Reporter, SchemaProvider, TypeChecker, WritePort};
use crate::process::run_with_timeout;
use crate::settings::{TYPECHECK_OUTPUT_LIMIT, TypeCheckSettings};
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use linepatch_types::batch::PatchBatch;
use linepatch_types::event::PatchEvent;
use linepatch_types::result::{BatchResult, OperationResult, TypeCheckOutcome};
use linepatch_types::task_schema::TaskSchema;
use std::io::ErrorKind;
use std::process::Command;
use std::time::Duration;
use tracing::{debug, info, warn};

/// No task schema: every batch passes validation.
#[derive(Debug, Clone, Default)]
pub struct NoSchema;

impl SchemaProvider for NoSchema {
    fn load_schema(&self) -> anyhow::Result<Option<TaskSchema>> {
        Ok(None)
    }
}

/// Reads the task schema from a JSON file.
///
/// A missing file means no schema. A file that is not valid JSON is logged and
/// treated as missing. A file that exists but cannot be read is an error.
#[derive(Debug, Clone)]
pub struct FsSchemaProvider {
    pub path: Utf8PathBuf,
}

impl FsSchemaProvider {
    pub fn new(path: impl Into<Utf8PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SchemaProvider for FsSchemaProvider {
    fn load_schema(&self) -> anyhow::Result<Option<TaskSchema>> {
        if !self.path.exists() {
            debug!(path = %self.path, "no task schema");
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)
            .with_context(|| format!("read task schema {}", self.path))?;
        match serde_json::from_str::<TaskSchema>(&raw) {
            Ok(schema) => Ok(Some(schema)),
            Err(err) => {
                warn!(path = %self.path, error = %err, "task schema is not valid JSON; skipping validation");
                Ok(None)
            }
        }
    }
}

/// Pre-loaded schema for embedding and testing.
#[derive(Debug, Clone, Default)]
pub struct InMemorySchemaProvider {
    schema: Option<TaskSchema>,
}

impl InMemorySchemaProvider {
    pub fn new(schema: TaskSchema) -> Self {
        Self {
            schema: Some(schema),
        }
    }
}

impl SchemaProvider for InMemorySchemaProvider {
    fn load_schema(&self) -> anyhow::Result<Option<TaskSchema>> {
        Ok(self.schema.clone())
    }
}

/// Drops every event.
#[derive(Debug, Clone, Default)]
pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn send(&self, _event: &PatchEvent) -> anyhow::Result<()> {
        Ok(())
    }
}

/// POSTs events as JSON to `<base>/api/patches/events`.
#[derive(Debug, Clone)]
pub struct WebhookEventSink {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl WebhookEventSink {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("build http client")?;
        Ok(Self {
            endpoint: events_endpoint(base_url),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

pub fn events_endpoint(base_url: &str) -> String {
    format!("{}/api/patches/events", base_url.trim_end_matches('/'))
}

impl EventSink for WebhookEventSink {
    fn send(&self, event: &PatchEvent) -> anyhow::Result<()> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(event)
            .send()
            .with_context(|| format!("POST {}", self.endpoint))?;
        response
            .error_for_status()
            .with_context(|| format!("POST {}", self.endpoint))?;
        debug!(endpoint = %self.endpoint, patch_id = %event.patch_id, "event delivered");
        Ok(())
    }
}

/// Type checking disabled.
#[derive(Debug, Clone, Default)]
pub struct NoTypeCheck;

impl TypeChecker for NoTypeCheck {
    fn check(&self, _project_root: &Utf8Path, _file: &Utf8Path) -> TypeCheckOutcome {
        TypeCheckOutcome::not_applicable("type checking disabled")
    }
}

/// Runs `<command...> <file>` from the project root for matching extensions.
#[derive(Debug, Clone)]
pub struct CommandTypeChecker {
    command: Vec<String>,
    extensions: Vec<String>,
    timeout: Duration,
    output_limit: usize,
}

impl CommandTypeChecker {
    pub fn new(command: Vec<String>, extensions: Vec<String>, timeout: Duration) -> Self {
        Self {
            command,
            extensions: extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            timeout,
            output_limit: TYPECHECK_OUTPUT_LIMIT,
        }
    }

    pub fn from_settings(settings: &TypeCheckSettings) -> Self {
        Self::new(
            settings.command.clone(),
            settings.extensions.clone(),
            Duration::from_secs(settings.timeout_secs),
        )
    }

    pub fn handles(&self, file: &Utf8Path) -> bool {
        file.extension()
            .map(|ext| ext.to_ascii_lowercase())
            .is_some_and(|ext| self.extensions.contains(&ext))
    }
}

impl TypeChecker for CommandTypeChecker {
    fn check(&self, project_root: &Utf8Path, file: &Utf8Path) -> TypeCheckOutcome {
        if !self.handles(file) {
            return TypeCheckOutcome::not_applicable("unsupported file type");
        }
        let Some((program, args)) = self.command.split_first() else {
            return TypeCheckOutcome::not_applicable("no type checker command configured");
        };

        let mut cmd = Command::new(program);
        cmd.args(args).arg(file.as_str()).current_dir(project_root);

        let output = match run_with_timeout(cmd, self.timeout, self.output_limit) {
            Ok(output) => output,
            Err(err) => {
                let missing = err
                    .chain()
                    .filter_map(|e| e.downcast_ref::<std::io::Error>())
                    .any(|e| e.kind() == ErrorKind::NotFound);
                if missing {
                    debug!(program = %program, "type checker not installed");
                    return TypeCheckOutcome::not_applicable(format!(
                        "type checker not found: {program}"
                    ));
                }
                let reason = format!("{err:#}");
                warn!(file = %file, error = %reason, "type checker could not run");
                return TypeCheckOutcome::not_applicable(format!(
                    "type checker failed to run: {reason}"
                ));
            }
        };

        if output.timed_out {
            TypeCheckOutcome::not_applicable(format!(
                "type check timed out after {}s",
                self.timeout.as_secs()
            ))
        } else if output.status.success() {
            TypeCheckOutcome::Pass
        } else {
            TypeCheckOutcome::Fail {
                diagnostics: output.diagnostics(),
            }
        }
    }
}

/// Filesystem write operations.
#[derive(Debug, Clone, Default)]
pub struct FsWritePort;

impl WritePort for FsWritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
        fs::write(path, contents).with_context(|| format!("write {}", path))
    }
}

/// Forwards progress to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn batch_started(&self, batch_id: &str, batch: &PatchBatch, dry_run: bool) {
        info!(
            batch_id,
            requester = %batch.requester,
            operations = batch.len(),
            dry_run,
            "applying patch batch"
        );
    }

    fn operation_finished(&self, result: &OperationResult) {
        match &result.error {
            None => info!(
                index = result.index,
                file = %result.file,
                op = %result.op,
                type_check = result.type_check.label(),
                "operation applied"
            ),
            Some(err) => warn!(
                index = result.index,
                file = %result.file,
                op = %result.op,
                kind = err.kind.as_str(),
                error = %err.message,
                "operation failed"
            ),
        }
    }

    fn warning(&self, message: &str) {
        warn!("{message}");
    }

    fn batch_finished(&self, result: &BatchResult) {
        info!(
            batch_id = %result.batch_id,
            succeeded = result.succeeded,
            failed = result.failed,
            "patch batch finished"
        );
    }
}
