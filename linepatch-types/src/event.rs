use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status carried on a patch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    Applied,
    /// Computed in dry-run mode; nothing was written.
    DryRun,
    Failed,
    /// Diagnostic event sent by the notify-only mode.
    Test,
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EventStatus::Applied => "applied",
            EventStatus::DryRun => "dry_run",
            EventStatus::Failed => "failed",
            EventStatus::Test => "test",
        };
        f.write_str(s)
    }
}

/// Webhook payload, one per completed operation.
///
/// Field names are the orchestrator's contract; do not rename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchEvent {
    pub patch_id: String,
    pub file: String,
    /// Op spelling; free-form so diagnostic events can use `test`.
    pub op: String,
    pub status: EventStatus,
    pub task_id: Option<String>,
    pub ts_check_ok: Option<bool>,
    #[serde(default)]
    pub meta: serde_json::Map<String, serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_path: Option<String>,
}

impl PatchEvent {
    /// The event sent by the notify-only diagnostic mode.
    pub fn diagnostic() -> Self {
        let mut meta = serde_json::Map::new();
        meta.insert("mode".to_string(), serde_json::json!("notification_only"));
        Self {
            patch_id: "test-patch".to_string(),
            file: "test.ts".to_string(),
            op: "test".to_string(),
            status: EventStatus::Test,
            task_id: None,
            ts_check_ok: None,
            meta,
            diff_path: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_event_matches_orchestrator_contract() {
        let v = serde_json::to_value(PatchEvent::diagnostic()).expect("serialize");
        assert_eq!(
            v,
            serde_json::json!({
                "patch_id": "test-patch",
                "file": "test.ts",
                "op": "test",
                "status": "test",
                "task_id": null,
                "ts_check_ok": null,
                "meta": {"mode": "notification_only"}
            })
        );
    }
}
