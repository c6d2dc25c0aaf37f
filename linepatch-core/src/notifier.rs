//! Best-effort delivery of per-operation lifecycle events.
//!
//! Nothing here can fail an operation: sink and diff-file errors are logged and dropped.

use crate::ports::EventSink;
use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use linepatch_types::batch::PatchBatch;
use linepatch_types::event::{EventStatus, PatchEvent};
use linepatch_types::result::OperationResult;
use serde_json::json;
use std::io::Write;
use tracing::{debug, warn};

pub struct Notifier<'a> {
    sink: &'a dyn EventSink,
    diff_dir: Option<Utf8PathBuf>,
}

impl<'a> Notifier<'a> {
    pub fn new(sink: &'a dyn EventSink) -> Self {
        Self {
            sink,
            diff_dir: None,
        }
    }

    pub fn with_diff_dir(mut self, dir: Option<Utf8PathBuf>) -> Self {
        self.diff_dir = dir;
        self
    }

    /// Send `event`, attaching a diff reference when a diff directory is configured.
    ///
    /// Returns whether the sink accepted the event.
    pub fn deliver(&self, mut event: PatchEvent, diff: Option<&str>) -> bool {
        if let (Some(dir), Some(diff)) = (&self.diff_dir, diff)
            && !diff.is_empty()
        {
            match write_diff_ref(dir, diff) {
                Ok(path) => event.diff_path = Some(path.into_string()),
                Err(err) => {
                    let reason = format!("{err:#}");
                    warn!(error = %reason, "could not save diff reference");
                }
            }
        }

        match self.sink.send(&event) {
            Ok(()) => {
                debug!(
                    patch_id = %event.patch_id,
                    file = %event.file,
                    status = %event.status,
                    "event sent"
                );
                true
            }
            Err(err) => {
                let reason = format!("{err:#}");
                warn!(
                    patch_id = %event.patch_id,
                    file = %event.file,
                    error = %reason,
                    "failed to notify orchestrator"
                );
                false
            }
        }
    }
}

/// Build the event for one finished operation.
pub fn operation_event(
    batch_id: &str,
    batch: &PatchBatch,
    result: &OperationResult,
    dry_run: bool,
) -> PatchEvent {
    let status = if !result.success {
        EventStatus::Failed
    } else if dry_run {
        EventStatus::DryRun
    } else {
        EventStatus::Applied
    };

    let mut meta = serde_json::Map::new();
    meta.insert("operation_index".into(), json!(result.index));
    meta.insert("total_operations".into(), json!(batch.len()));
    meta.insert("requester".into(), json!(batch.requester));
    meta.insert("branch".into(), json!(batch.branch));
    if let Some(err) = &result.error {
        meta.insert("error".into(), json!(err.message));
    }

    PatchEvent {
        patch_id: batch_id.to_string(),
        file: result.file.clone(),
        op: result.op.as_str().to_string(),
        status,
        task_id: result.task_id.clone(),
        ts_check_ok: result.type_check.ok(),
        meta,
        diff_path: None,
    }
}

/// Send the notify-only diagnostic event. Unlike [`Notifier::deliver`], errors are returned.
pub fn send_diagnostic(sink: &dyn EventSink) -> anyhow::Result<()> {
    sink.send(&PatchEvent::diagnostic())
        .context("send diagnostic event")
}

/// Persist `diff` as a uniquely named `*.diff` file under `dir`.
fn write_diff_ref(dir: &Utf8Path, diff: &str) -> anyhow::Result<Utf8PathBuf> {
    fs::create_dir_all(dir)?;
    let mut file = tempfile::Builder::new()
        .prefix("patch-")
        .suffix(".diff")
        .tempfile_in(dir)
        .with_context(|| format!("create diff file in {dir}"))?;
    file.write_all(diff.as_bytes()).context("write diff")?;
    let (_, path) = file.keep().context("keep diff file")?;
    Utf8PathBuf::from_path_buf(path)
        .map_err(|p| anyhow::anyhow!("non-UTF-8 diff path {}", p.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use linepatch_types::ops::OpKind;
    use linepatch_types::result::{ErrorDetail, ErrorKind, TypeCheckOutcome};
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<PatchEvent>>,
    }

    impl EventSink for RecordingSink {
        fn send(&self, event: &PatchEvent) -> anyhow::Result<()> {
            self.events.lock().expect("lock events").push(event.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl EventSink for FailingSink {
        fn send(&self, _event: &PatchEvent) -> anyhow::Result<()> {
            anyhow::bail!("connection refused")
        }
    }

    fn applied(index: usize) -> OperationResult {
        OperationResult {
            index,
            success: true,
            file: "src/app.ts".to_string(),
            op: OpKind::InsertAfter,
            task_id: Some("3".to_string()),
            diff: Some("--- src/app.ts\n+++ src/app.ts\n@@ -1 +1,2 @@\n a\n+b\n".to_string()),
            type_check: TypeCheckOutcome::Pass,
            written: true,
            sha256_before: None,
            sha256_after: None,
            lines_before: Some(1),
            lines_after: Some(2),
            error: None,
        }
    }

    fn batch() -> PatchBatch {
        let mut b = PatchBatch::new(vec![]);
        b.branch = "main".to_string();
        b
    }

    #[test]
    fn event_for_applied_operation() {
        let event = operation_event("patch-1", &batch(), &applied(0), false);
        assert_eq!(event.status, EventStatus::Applied);
        assert_eq!(event.op, "insert-after");
        assert_eq!(event.task_id.as_deref(), Some("3"));
        assert_eq!(event.ts_check_ok, Some(true));
        assert_eq!(event.meta["operation_index"], json!(0));
        assert_eq!(event.meta["requester"], json!("agent"));
        assert_eq!(event.meta["branch"], json!("main"));
        assert!(event.meta.get("error").is_none());
    }

    #[test]
    fn event_status_reflects_dry_run_and_failure() {
        assert_eq!(
            operation_event("p", &batch(), &applied(0), true).status,
            EventStatus::DryRun
        );

        let failed = OperationResult::failed(
            1,
            "b.py",
            OpKind::ReplaceBlock,
            None,
            ErrorDetail {
                kind: ErrorKind::Io,
                message: "b.py: not found".to_string(),
                file: "b.py".to_string(),
                requested: None,
                line_count: None,
            },
        );
        let event = operation_event("p", &batch(), &failed, false);
        assert_eq!(event.status, EventStatus::Failed);
        assert_eq!(event.ts_check_ok, None);
        assert_eq!(event.meta["error"], json!("b.py: not found"));
    }

    #[test]
    fn sink_failure_is_swallowed() {
        let notifier = Notifier::new(&FailingSink);
        assert!(!notifier.deliver(PatchEvent::diagnostic(), None));
    }

    #[test]
    fn diff_dir_attaches_reference_instead_of_text() {
        let dir = TempDir::new().expect("temp dir");
        let diffs = Utf8PathBuf::from_path_buf(dir.path().join("diffs")).expect("utf8");
        let sink = RecordingSink::default();
        let notifier = Notifier::new(&sink).with_diff_dir(Some(diffs.clone()));

        let result = applied(0);
        let event = operation_event("p", &batch(), &result, false);
        assert!(notifier.deliver(event, result.diff.as_deref()));

        let events = sink.events.lock().expect("lock");
        let path = events[0].diff_path.clone().expect("diff reference");
        assert!(path.starts_with(diffs.as_str()));
        assert!(path.ends_with(".diff"));
        assert_eq!(
            fs::read_to_string(&path).expect("diff file"),
            result.diff.clone().expect("diff")
        );
    }

    #[test]
    fn empty_diff_gets_no_reference() {
        let dir = TempDir::new().expect("temp dir");
        let diffs = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf8");
        let sink = RecordingSink::default();
        let notifier = Notifier::new(&sink).with_diff_dir(Some(diffs));
        notifier.deliver(PatchEvent::diagnostic(), Some(""));
        assert!(sink.events.lock().expect("lock")[0].diff_path.is_none());
    }

    #[test]
    fn diagnostic_errors_are_returned() {
        assert!(send_diagnostic(&FailingSink).is_err());
        let sink = RecordingSink::default();
        send_diagnostic(&sink).expect("sent");
        assert_eq!(sink.events.lock().expect("lock")[0].status, EventStatus::Test);
    }
}
