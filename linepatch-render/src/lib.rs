//! Rendering helpers (markdown) for human-readable batch summaries.

use linepatch_types::result::{BatchResult, TypeCheckOutcome};

pub fn render_batch_md(result: &BatchResult) -> String {
    let mut out = String::new();
    out.push_str("# linepatch batch\n\n");
    out.push_str(&format!("- Batch: `{}`\n", result.batch_id));
    out.push_str(&format!(
        "- Mode: {}\n",
        if result.dry_run { "dry run" } else { "apply" }
    ));
    if !result.requester.is_empty() {
        out.push_str(&format!("- Requester: {}\n", result.requester));
    }
    if !result.branch.is_empty() {
        out.push_str(&format!("- Branch: `{}`\n", result.branch));
    }
    if !result.reason.is_empty() {
        out.push_str(&format!("- Reason: {}\n", result.reason));
    }
    out.push_str(&format!(
        "- Operations: {} (succeeded {}, failed {})\n\n",
        result.total, result.succeeded, result.failed
    ));

    out.push_str("## Operations\n\n");
    if result.results.is_empty() {
        out.push_str("_No operations._\n");
        return out;
    }

    for r in &result.results {
        out.push_str(&format!("### {}. `{}` {}\n\n", r.index + 1, r.op, r.file));
        out.push_str(&format!(
            "- Status: `{}`\n",
            if r.success { "ok" } else { "failed" }
        ));
        if let Some(task) = &r.task_id {
            out.push_str(&format!("- Task: {}\n", task));
        }
        if let (Some(before), Some(after)) = (r.lines_before, r.lines_after) {
            out.push_str(&format!("- Lines: {} → {}\n", before, after));
        }
        out.push_str(&format!("- Type check: {}\n", type_check_label(&r.type_check)));
        if let Some(err) = &r.error {
            out.push_str(&format!("- Error ({}): {}\n", err.kind.as_str(), err.message));
        }

        if let Some(diff) = r.diff.as_deref().filter(|d| !d.is_empty()) {
            out.push_str("\n```diff\n");
            out.push_str(diff);
            if !diff.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n");
        }
        if let TypeCheckOutcome::Fail { diagnostics } = &r.type_check
            && !diagnostics.trim().is_empty()
        {
            out.push_str("\n**Type check output**\n\n```text\n");
            out.push_str(diagnostics.trim_end());
            out.push_str("\n```\n");
        }
        out.push('\n');
    }

    out
}

fn type_check_label(t: &TypeCheckOutcome) -> String {
    match t {
        TypeCheckOutcome::Pass => "`pass`".to_string(),
        TypeCheckOutcome::Fail { .. } => "`fail`".to_string(),
        TypeCheckOutcome::NotApplicable { reason } => format!("`not_applicable` ({reason})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linepatch_types::ops::OpKind;
    use linepatch_types::result::{ErrorDetail, ErrorKind, OperationResult, RunInfo};
    use pretty_assertions::assert_eq;

    fn run() -> RunInfo {
        RunInfo {
            started_at: chrono::DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
                .expect("timestamp")
                .with_timezone(&chrono::Utc),
            ended_at: None,
        }
    }

    #[test]
    fn empty_batch_renders_placeholder() {
        let result = BatchResult::from_results("patch-0", true, run(), vec![]);
        let md = render_batch_md(&result);
        assert!(md.contains("- Mode: dry run\n"));
        assert!(md.ends_with("_No operations._\n"));
    }

    #[test]
    fn renders_diff_and_failure() {
        let ok = OperationResult {
            index: 0,
            success: true,
            file: "greet.py".to_string(),
            op: OpKind::ReplaceBlock,
            task_id: Some("1".to_string()),
            diff: Some("--- greet.py\n+++ greet.py\n@@ -2 +2 @@\n-a\n+b\n".to_string()),
            type_check: TypeCheckOutcome::not_applicable("unsupported file type"),
            written: true,
            sha256_before: None,
            sha256_after: None,
            lines_before: Some(2),
            lines_after: Some(2),
            error: None,
        };
        let failed = OperationResult::failed(
            1,
            "b.py",
            OpKind::Append,
            None,
            ErrorDetail {
                kind: ErrorKind::Io,
                message: "b.py: missing".to_string(),
                file: "b.py".to_string(),
                requested: None,
                line_count: None,
            },
        );
        let mut result = BatchResult::from_results("patch-1", false, run(), vec![ok, failed]);
        result.requester = "agent".to_string();

        let md = render_batch_md(&result);
        assert!(md.contains("- Operations: 2 (succeeded 1, failed 1)\n"));
        assert!(md.contains("### 1. `replace-block` greet.py\n"));
        assert!(md.contains("```diff\n--- greet.py\n"));
        assert!(md.contains("- Type check: `not_applicable` (unsupported file type)\n"));
        assert!(md.contains("### 2. `append` b.py\n\n- Status: `failed`\n"));
        assert!(md.contains("- Error (io): b.py: missing\n"));
    }

    #[test]
    fn failing_type_check_output_is_included() {
        let mut ok = OperationResult::failed(
            0,
            "a.ts",
            OpKind::Append,
            None,
            ErrorDetail {
                kind: ErrorKind::Range,
                message: String::new(),
                file: "a.ts".to_string(),
                requested: None,
                line_count: None,
            },
        );
        ok.success = true;
        ok.error = None;
        ok.type_check = TypeCheckOutcome::Fail {
            diagnostics: "a.ts(1,5): error TS2322\n".to_string(),
        };
        let result = BatchResult::from_results("p", false, run(), vec![ok]);
        let md = render_batch_md(&result);
        assert!(md.contains("```text\na.ts(1,5): error TS2322\n```\n"));
        assert_eq!(md.matches("```diff").count(), 0);
    }
}
