//! Unified diffs between registry snapshots for `hatch-dispatch diff` and
//! release notes.

use similar::TextDiff;

/// Unified diff of `old` against `new`, or `None` when they are identical
/// after line-ending normalisation.
pub fn unified_diff(old: &str, new: &str, old_label: &str, new_label: &str) -> Option<String> {
    let old = normalize_line_endings(old);
    let new = normalize_line_endings(new);
    if old == new {
        return None;
    }
    let unified = TextDiff::from_lines(&old, &new)
        .unified_diff()
        .header(old_label, new_label)
        .context_radius(3)
        .to_string();
    Some(unified)
}

fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}
