//! Line editor and diff generator for linepatch.
//!
//! Responsibilities:
//! - Apply one positional edit to an in-memory line buffer.
//! - Copy indentation from a reference line onto the first content line.
//! - Render and apply unified diffs between two versions of a file.
//!
//! Nothing here touches the filesystem. A line is a `String` that keeps its `\n`
//! terminator; only the final line of a buffer may lack one.

pub mod error;

pub use error::{EditError, EditResult};

use linepatch_types::ops::{Edit, IndentMode, OpKind};

/// Split text into lines, keeping terminators. `join_lines(&split_lines(s)) == s`.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split_inclusive('\n').map(str::to_string).collect()
}

pub fn join_lines(lines: &[String]) -> String {
    lines.concat()
}

/// Dispatch an [`Edit`] to the matching line operation.
pub fn apply_edit(
    lines: &[String],
    edit: &Edit,
    content: &str,
    indent: IndentMode,
) -> EditResult<Vec<String>> {
    match *edit {
        Edit::ReplaceBlock { start, end } => replace_block(lines, start, end, content, indent),
        Edit::InsertBefore { line } => insert_before(lines, line, content, indent),
        Edit::InsertAfter { line } => insert_after(lines, line, content, indent),
        Edit::Append => Ok(append(lines, content)),
        Edit::Prepend => Ok(prepend(lines, content)),
    }
}

/// Replace lines `start..=end` (1-based) with `content`.
///
/// Empty content deletes the range. An unterminated final content line is kept as is
/// when the range reaches the end of the buffer, and terminated otherwise.
pub fn replace_block(
    lines: &[String],
    start: usize,
    end: usize,
    content: &str,
    indent: IndentMode,
) -> EditResult<Vec<String>> {
    let line_count = lines.len();
    if start == 0 || start > end || end > line_count {
        return Err(EditError::RangeOutOfBounds {
            start,
            end,
            line_count,
        });
    }

    let mut block = split_lines(content);
    if indent.preserves() {
        reindent_first(&lines[start - 1], &mut block);
    }
    if end < line_count
        && let Some(last) = block.last_mut()
    {
        terminate(last);
    }

    let mut out = Vec::with_capacity(line_count - (end - start + 1) + block.len());
    out.extend_from_slice(&lines[..start - 1]);
    out.extend(block);
    out.extend_from_slice(&lines[end..]);
    Ok(out)
}

/// Insert `content` above line `line`. Valid range is `1..=line_count + 1`.
pub fn insert_before(
    lines: &[String],
    line: usize,
    content: &str,
    indent: IndentMode,
) -> EditResult<Vec<String>> {
    let line_count = lines.len();
    if line == 0 || line > line_count + 1 {
        return Err(EditError::LineOutOfBounds {
            op: OpKind::InsertBefore,
            line,
            min: 1,
            max: line_count + 1,
            line_count,
        });
    }

    let at = line - 1;
    let mut block = terminated_lines(content);
    if indent.preserves()
        && let Some(reference) = lines.get(at)
    {
        reindent_first(reference, &mut block);
    }
    Ok(splice(lines, at, block))
}

/// Insert `content` below line `line`. Valid range is `0..=line_count`; 0 means the top.
pub fn insert_after(
    lines: &[String],
    line: usize,
    content: &str,
    indent: IndentMode,
) -> EditResult<Vec<String>> {
    let line_count = lines.len();
    if line > line_count {
        return Err(EditError::LineOutOfBounds {
            op: OpKind::InsertAfter,
            line,
            min: 0,
            max: line_count,
            line_count,
        });
    }

    let mut block = terminated_lines(content);
    if indent.preserves() && line > 0 {
        reindent_first(&lines[line - 1], &mut block);
    }
    Ok(splice(lines, line, block))
}

/// Add `content` after the last line. Never fails and never deduplicates.
pub fn append(lines: &[String], content: &str) -> Vec<String> {
    splice(lines, lines.len(), split_lines(&normalize_tail(content)))
}

/// Add `content` before the first line.
pub fn prepend(lines: &[String], content: &str) -> Vec<String> {
    splice(lines, 0, split_lines(&normalize_tail(content)))
}

/// Unified diff from `before` to `after` with both headers naming `path`.
///
/// Identical contents give an empty string.
pub fn render_diff(path: &str, before: &str, after: &str) -> String {
    if before == after {
        return String::new();
    }

    let rendered = diffy::create_patch(before, after).to_string();
    let hunks = rendered.find("@@").map_or("", |at| &rendered[at..]);
    let mut out = format!("--- {path}\n+++ {path}\n{hunks}");
    if !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Apply a diff produced by [`render_diff`] to `before`. An empty diff is the identity.
pub fn apply_diff(before: &str, diff: &str) -> EditResult<String> {
    if diff.is_empty() {
        return Ok(before.to_string());
    }
    let patch = diffy::Patch::from_str(diff).map_err(|e| EditError::Diff {
        message: e.to_string(),
    })?;
    diffy::apply(before, &patch).map_err(|e| EditError::Diff {
        message: e.to_string(),
    })
}

fn is_indent(c: char) -> bool {
    c.is_whitespace() && c != '\n' && c != '\r'
}

fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Copy the leading whitespace of `reference` onto the first line of `block`.
///
/// Blank reference lines and blank first lines are left alone.
fn reindent_first(reference: &str, block: &mut [String]) {
    if is_blank(reference) {
        return;
    }
    let Some(first) = block.first_mut() else {
        return;
    };
    if is_blank(first) {
        return;
    }

    let body = reference.trim_start_matches(is_indent);
    let indent = &reference[..reference.len() - body.len()];
    let updated = format!("{indent}{}", first.trim_start_matches(is_indent));
    *first = updated;
}

fn terminate(line: &mut String) {
    if !line.ends_with('\n') {
        line.push('\n');
    }
}

fn terminated_lines(content: &str) -> Vec<String> {
    let mut block = split_lines(content);
    if let Some(last) = block.last_mut() {
        terminate(last);
    }
    block
}

/// Exactly one trailing newline.
fn normalize_tail(content: &str) -> String {
    format!("{}\n", content.trim_end_matches('\n'))
}

/// Insert `block` at index `at`, terminating the preceding line so the two never fuse.
fn splice(lines: &[String], at: usize, block: Vec<String>) -> Vec<String> {
    let mut out = lines.to_vec();
    if block.is_empty() {
        return out;
    }
    if at > 0 {
        terminate(&mut out[at - 1]);
    }
    out.splice(at..at, block);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buf(text: &str) -> Vec<String> {
        split_lines(text)
    }

    #[test]
    fn split_and_join_are_lossless() {
        for text in ["", "a", "a\n", "a\nb", "\n\n", "a\r\nb\r\n"] {
            assert_eq!(join_lines(&split_lines(text)), text);
        }
        assert_eq!(split_lines("a\nb").len(), 2);
    }

    #[test]
    fn reindent_skips_blank_reference() {
        let mut block = buf("  x\n");
        reindent_first("   \n", &mut block);
        assert_eq!(block, buf("  x\n"));
    }

    #[test]
    fn reindent_replaces_existing_indent() {
        let mut block = buf("\t\tx\ny\n");
        reindent_first("    a\n", &mut block);
        assert_eq!(block, buf("    x\ny\n"));
    }

    #[test]
    fn splice_terminates_unterminated_tail() {
        let out = splice(&buf("a"), 1, buf("b\n"));
        assert_eq!(join_lines(&out), "a\nb\n");
    }

    #[test]
    fn normalize_tail_collapses_newlines() {
        assert_eq!(normalize_tail("x"), "x\n");
        assert_eq!(normalize_tail("x\n\n\n"), "x\n");
        assert_eq!(normalize_tail(""), "\n");
    }
}
