#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use linepatch_edit::{apply_diff, apply_edit, join_lines, render_diff, split_lines};
use linepatch_types::ops::{Edit, IndentMode};

#[derive(Debug, Arbitrary)]
enum FuzzEdit {
    ReplaceBlock { start: u8, end: u8 },
    InsertBefore { line: u8 },
    InsertAfter { line: u8 },
    Append,
    Prepend,
}

#[derive(Debug, Arbitrary)]
struct Input {
    before: String,
    content: String,
    edit: FuzzEdit,
    raw: bool,
}

fuzz_target!(|input: Input| {
    let edit = match input.edit {
        FuzzEdit::ReplaceBlock { start, end } => Edit::ReplaceBlock {
            start: start.into(),
            end: end.into(),
        },
        FuzzEdit::InsertBefore { line } => Edit::InsertBefore { line: line.into() },
        FuzzEdit::InsertAfter { line } => Edit::InsertAfter { line: line.into() },
        FuzzEdit::Append => Edit::Append,
        FuzzEdit::Prepend => Edit::Prepend,
    };
    let indent = IndentMode::from_open_space(input.raw);

    let lines = split_lines(&input.before);
    let Ok(edited) = apply_edit(&lines, &edit, &input.content, indent) else {
        return;
    };
    let after = join_lines(&edited);

    let diff = render_diff("fuzz.txt", &input.before, &after);
    if let Ok(replayed) = apply_diff(&input.before, &diff) {
        assert_eq!(replayed, after);
    }
});
