//! Port traits abstracting all side effects away from the orchestrator.

use camino::Utf8Path;
use linepatch_types::batch::PatchBatch;
use linepatch_types::event::PatchEvent;
use linepatch_types::result::{BatchResult, OperationResult, TypeCheckOutcome};
use linepatch_types::task_schema::TaskSchema;

/// Source of the optional task allow-list. `Ok(None)` means no schema is configured.
pub trait SchemaProvider {
    fn load_schema(&self) -> anyhow::Result<Option<TaskSchema>>;
}

/// Destination for per-operation lifecycle events.
pub trait EventSink {
    fn send(&self, event: &PatchEvent) -> anyhow::Result<()>;
}

/// External static checker. Infallible: anything short of a verdict is `NotApplicable`.
pub trait TypeChecker {
    fn check(&self, project_root: &Utf8Path, file: &Utf8Path) -> TypeCheckOutcome;
}

/// File-system write operations.
pub trait WritePort {
    fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()>;
}

/// Receives progress for one orchestrator run.
pub trait Reporter {
    fn batch_started(&self, batch_id: &str, batch: &PatchBatch, dry_run: bool);
    fn operation_finished(&self, result: &OperationResult);
    fn warning(&self, message: &str);
    fn batch_finished(&self, result: &BatchResult);
}
