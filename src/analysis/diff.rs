//! Zero-context unified diff parsing.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::analysis::types::{ChangeType, ChangedLine};

/// Marker that begins a per-file section in unified diff output.
const FILE_DIFF_MARKER: &str = "diff --git a/";

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static HUNK_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").unwrap());

/// Parses zero-context unified diff text into per-line change records.
///
/// The input may be several concatenated diffs (e.g. unstaged then staged);
/// records come out in diff order. A `-` body line emits a
/// [`ChangeType::Deleted`] record at the old-file position, a `+` line emits
/// a [`ChangeType::Added`] record at the new-file position, and context
/// lines advance both counters without emitting anything. File sections with
/// no hunks (mode-only or binary changes) yield nothing, and a hunk header
/// that fails to parse skips that hunk rather than aborting.
pub fn parse_diff(diff_text: &str) -> Vec<ChangedLine> {
    let mut changed_lines = Vec::new();

    let mut current_file: Option<String> = None;
    let mut old_line_num: usize = 0;
    let mut new_line_num: usize = 0;
    // False until a well-formed hunk header is seen for the current file;
    // body lines outside a valid hunk are skipped.
    let mut in_hunk = false;

    for line in diff_text.lines() {
        if let Some(rest) = line.strip_prefix(FILE_DIFF_MARKER) {
            current_file = Some(extract_path_from_diff_header(rest));
            in_hunk = false;
        } else if line.starts_with("@@") {
            match parse_hunk_header(line) {
                Some((old_start, new_start)) => {
                    old_line_num = old_start;
                    new_line_num = new_start;
                    in_hunk = current_file.is_some();
                }
                None => {
                    debug!(header = line, "skipping malformed hunk header");
                    in_hunk = false;
                }
            }
        } else if line.starts_with("---") || line.starts_with("+++") {
            // File headers, not body lines.
        } else if let Some(content) = line.strip_prefix('-') {
            if in_hunk {
                if let Some(file) = &current_file {
                    changed_lines.push(ChangedLine::new(
                        file.clone(),
                        old_line_num,
                        content,
                        ChangeType::Deleted,
                    ));
                }
                old_line_num += 1;
            }
        } else if let Some(content) = line.strip_prefix('+') {
            if in_hunk {
                if let Some(file) = &current_file {
                    changed_lines.push(ChangedLine::new(
                        file.clone(),
                        new_line_num,
                        content,
                        ChangeType::Added,
                    ));
                }
                new_line_num += 1;
            }
        } else if line.starts_with(' ') {
            if in_hunk {
                old_line_num += 1;
                new_line_num += 1;
            }
        }
        // Anything else (index lines, mode lines, "\ No newline at end of
        // file") carries no position information and is ignored.
    }

    trace!(records = changed_lines.len(), "parsed diff");
    changed_lines
}

/// Extracts both hunk start positions; `None` when either is missing.
fn parse_hunk_header(line: &str) -> Option<(usize, usize)> {
    let captures = HUNK_HEADER.captures(line)?;
    let old_start = captures.get(1)?.as_str().parse().ok()?;
    let new_start = captures.get(3)?.as_str().parse().ok()?;
    Some((old_start, new_start))
}

/// Extracts the file path from the remainder of a `diff --git a/` header
/// line, preferring the `b/` (destination) side.
fn extract_path_from_diff_header(after_marker: &str) -> String {
    // Remainder format: "old_path b/new_path". Find the last " b/" so paths
    // containing spaces still resolve.
    if let Some(b_pos) = after_marker.rfind(" b/") {
        after_marker[b_pos + 3..].to_string()
    } else {
        after_marker.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a standard single-file diff header.
    fn make_file_header(path: &str) -> String {
        format!(
            "diff --git a/{path} b/{path}\n\
             index abc1234..def5678 100644\n\
             --- a/{path}\n\
             +++ b/{path}\n"
        )
    }

    #[test]
    fn empty_input_yields_no_records() {
        assert!(parse_diff("").is_empty());
    }

    #[test]
    fn deleted_line_uses_old_position() {
        let diff = format!("{}@@ -5,1 +4,0 @@\n-removed text\n", make_file_header("a.txt"));
        let records = parse_diff(&diff);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].file_path, "a.txt");
        assert_eq!(records[0].line_number, 5);
        assert_eq!(records[0].content, "removed text");
        assert_eq!(records[0].change_type, ChangeType::Deleted);
    }

    #[test]
    fn added_line_uses_new_position() {
        let diff = format!("{}@@ -3,0 +4,1 @@\n+new text\n", make_file_header("a.txt"));
        let records = parse_diff(&diff);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].line_number, 4);
        assert_eq!(records[0].change_type, ChangeType::Added);
    }

    #[test]
    fn counters_advance_within_a_hunk() {
        // Zero-context diffs still emit consecutive +/- runs.
        let diff = format!(
            "{}@@ -10,2 +10,2 @@\n-old ten\n-old eleven\n+new ten\n+new eleven\n",
            make_file_header("src/lib.rs")
        );
        let records = parse_diff(&diff);

        assert_eq!(records.len(), 4);
        assert_eq!(records[0].line_number, 10);
        assert_eq!(records[1].line_number, 11);
        assert_eq!(records[2].line_number, 10);
        assert_eq!(records[3].line_number, 11);
    }

    #[test]
    fn context_lines_advance_both_counters() {
        let diff = format!(
            "{}@@ -1,3 +1,3 @@\n unchanged\n-old\n+new\n",
            make_file_header("a.txt")
        );
        let records = parse_diff(&diff);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line_number, 2);
        assert_eq!(records[1].line_number, 2);
    }

    #[test]
    fn file_path_tracks_diff_git_headers() {
        let diff = format!(
            "{}@@ -1,1 +1,1 @@\n-x\n+y\n{}@@ -7,0 +8,1 @@\n+z\n",
            make_file_header("first.rs"),
            make_file_header("dir/second.rs")
        );
        let records = parse_diff(&diff);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].file_path, "first.rs");
        assert_eq!(records[1].file_path, "first.rs");
        assert_eq!(records[2].file_path, "dir/second.rs");
    }

    #[test]
    fn rename_header_uses_destination_path() {
        let diff = "diff --git a/old.rs b/new.rs\n\
                    --- a/old.rs\n\
                    +++ b/new.rs\n\
                    @@ -1,1 +1,1 @@\n\
                    -a\n\
                    +b\n";
        let records = parse_diff(diff);
        assert!(records.iter().all(|r| r.file_path == "new.rs"));
    }

    #[test]
    fn path_with_spaces_resolves() {
        assert_eq!(
            extract_path_from_diff_header("my file.rs b/my file.rs"),
            "my file.rs"
        );
    }

    #[test]
    fn file_section_without_hunks_yields_nothing() {
        let diff = "diff --git a/script.sh b/script.sh\n\
                    old mode 100644\n\
                    new mode 100755\n";
        assert!(parse_diff(diff).is_empty());
    }

    #[test]
    fn malformed_hunk_header_is_skipped() {
        let diff = format!(
            "{}@@ garbage @@\n-lost\n+also lost\n@@ -2,1 +2,1 @@\n-old\n+new\n",
            make_file_header("a.txt")
        );
        let records = parse_diff(&diff);

        // Only the well-formed hunk contributes records.
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].content, "old");
        assert_eq!(records[1].content, "new");
    }

    #[test]
    fn file_header_markers_are_not_body_lines() {
        let diff = format!("{}@@ -1,1 +1,1 @@\n-x\n+y\n", make_file_header("a.txt"));
        let records = parse_diff(&diff);

        // "--- a/a.txt" and "+++ b/a.txt" must not emit records.
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn no_newline_marker_is_ignored() {
        let diff = format!(
            "{}@@ -1,1 +1,1 @@\n-x\n\\ No newline at end of file\n+y\n\\ No newline at end of file\n",
            make_file_header("a.txt")
        );
        let records = parse_diff(&diff);

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].line_number, 1);
    }

    #[test]
    fn hunk_counts_are_optional() {
        let diff = format!("{}@@ -3 +3 @@\n-x\n+y\n", make_file_header("a.txt"));
        let records = parse_diff(&diff);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line_number, 3);
    }
}
