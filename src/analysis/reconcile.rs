//! Delete/add reconciliation.
//!
//! Raw diffs represent an edited line as a delete followed by an add, which
//! conflates corrections with pure deletions and leaves the added side with
//! no history to blame. Reconciliation pairs nearby, textually similar
//! delete/add records back into single [`ChangeType::Modified`] records that
//! keep the deleted line's position (still present in history) and the added
//! line's content (the new value).

use std::collections::HashMap;

use similar::TextDiff;
use tracing::debug;

use crate::analysis::types::{ChangeType, ChangedLine};

/// Maximum distance, in lines, between a delete and an add for them to be
/// considered the same logical line.
pub const PAIRING_WINDOW: usize = 5;

/// Minimum similarity ratio (exclusive) for a delete/add pair to be
/// reconciled. Empirical constant, not derived.
pub const SIMILARITY_THRESHOLD: f64 = 0.6;

/// Pairs similar delete/add records into modifications, per file.
///
/// Files are processed independently, in first-appearance order. Within a
/// file, deletions are visited in diff order; each scans the unpaired
/// additions in diff order within [`PAIRING_WINDOW`] and takes the
/// highest-similarity candidate above [`SIMILARITY_THRESHOLD`], ties going
/// to the earliest candidate. Output order per file: paired and unpaired
/// deletions in deletion order, then unpaired additions in addition order,
/// then any other records.
pub fn reconcile_lines(lines: Vec<ChangedLine>) -> Vec<ChangedLine> {
    let mut file_order: Vec<String> = Vec::new();
    let mut by_file: HashMap<String, Vec<ChangedLine>> = HashMap::new();

    for line in lines {
        if !by_file.contains_key(&line.file_path) {
            file_order.push(line.file_path.clone());
        }
        by_file.entry(line.file_path.clone()).or_default().push(line);
    }

    let mut reconciled = Vec::new();
    for file in file_order {
        if let Some(file_lines) = by_file.remove(&file) {
            reconciled.extend(reconcile_file(file_lines));
        }
    }

    reconciled
}

/// Reconciles the records of a single file.
fn reconcile_file(lines: Vec<ChangedLine>) -> Vec<ChangedLine> {
    // Stable three-way partition; `other` is empty today but any future
    // change type must pass through untouched.
    let mut deleted = Vec::new();
    let mut added = Vec::new();
    let mut other = Vec::new();
    for line in lines {
        match line.change_type {
            ChangeType::Deleted => deleted.push(line),
            ChangeType::Added => added.push(line),
            ChangeType::Modified => other.push(line),
        }
    }

    let mut used_added = vec![false; added.len()];
    let mut result = Vec::with_capacity(deleted.len() + added.len() + other.len());

    for del_line in deleted {
        let mut best: Option<(usize, f64)> = None;

        for (idx, add_line) in added.iter().enumerate() {
            if used_added[idx] {
                continue;
            }
            if add_line.line_number.abs_diff(del_line.line_number) > PAIRING_WINDOW {
                continue;
            }

            let similarity = similarity_ratio(&del_line.content, &add_line.content);
            // Strictly-greater comparison keeps the earliest candidate on ties.
            if similarity > SIMILARITY_THRESHOLD && best.map_or(true, |(_, s)| similarity > s) {
                best = Some((idx, similarity));
            }
        }

        if let Some((idx, similarity)) = best {
            used_added[idx] = true;
            debug!(
                file = %del_line.file_path,
                line = del_line.line_number,
                similarity,
                "paired delete/add as modification"
            );
            result.push(ChangedLine::new(
                del_line.file_path,
                del_line.line_number,
                added[idx].content.clone(),
                ChangeType::Modified,
            ));
        } else {
            result.push(del_line);
        }
    }

    for (idx, add_line) in added.into_iter().enumerate() {
        if !used_added[idx] {
            result.push(add_line);
        }
    }
    result.extend(other);

    result
}

/// Normalized textual similarity of two lines, 0.0–1.0.
///
/// Character-level ratio over trimmed content; either side empty after
/// trimming scores 0.0.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a = a.trim();
    let b = b.trim();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    f64::from(TextDiff::from_chars(a, b).ratio())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deleted(file: &str, line: usize, content: &str) -> ChangedLine {
        ChangedLine::new(file, line, content, ChangeType::Deleted)
    }

    fn added(file: &str, line: usize, content: &str) -> ChangedLine {
        ChangedLine::new(file, line, content, ChangeType::Added)
    }

    #[test]
    fn similar_pair_becomes_modification() {
        let result = reconcile_lines(vec![
            deleted("a.py", 10, "foo_bar = 1"),
            added("a.py", 10, "foo_baz = 1"),
        ]);

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].change_type, ChangeType::Modified);
        assert_eq!(result[0].line_number, 10);
        assert_eq!(result[0].content, "foo_baz = 1");
    }

    #[test]
    fn identical_content_beyond_window_stays_separate() {
        let result = reconcile_lines(vec![
            deleted("a.py", 1, "unchanged text"),
            added("a.py", 20, "unchanged text"),
        ]);

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].change_type, ChangeType::Deleted);
        assert_eq!(result[1].change_type, ChangeType::Added);
    }

    #[test]
    fn dissimilar_content_within_window_stays_separate() {
        let result = reconcile_lines(vec![
            deleted("a.py", 5, "import os"),
            added("a.py", 5, "def completely_different():"),
        ]);

        assert_eq!(result.len(), 2);
    }

    #[test]
    fn highest_similarity_candidate_wins() {
        let result = reconcile_lines(vec![
            deleted("a.py", 10, "total_count = 10"),
            added("a.py", 9, "total_count = 10  # adjusted"),
            added("a.py", 10, "total_count = 12"),
        ]);

        // The exact-prefix candidate at line 10 is more similar than the
        // commented one at line 9.
        let modified: Vec<_> = result
            .iter()
            .filter(|l| l.change_type == ChangeType::Modified)
            .collect();
        assert_eq!(modified.len(), 1);
        assert_eq!(modified[0].content, "total_count = 12");

        let leftover: Vec<_> = result
            .iter()
            .filter(|l| l.change_type == ChangeType::Added)
            .collect();
        assert_eq!(leftover.len(), 1);
        assert_eq!(leftover[0].line_number, 9);
    }

    #[test]
    fn equal_similarity_keeps_first_candidate() {
        let result = reconcile_lines(vec![
            deleted("a.py", 10, "value = 1"),
            added("a.py", 9, "value = 2"),
            added("a.py", 11, "value = 2"),
        ]);

        let modified: Vec<_> = result
            .iter()
            .filter(|l| l.change_type == ChangeType::Modified)
            .collect();
        assert_eq!(modified.len(), 1);

        // The surviving addition is the later one.
        let leftover: Vec<_> = result
            .iter()
            .filter(|l| l.change_type == ChangeType::Added)
            .collect();
        assert_eq!(leftover.len(), 1);
        assert_eq!(leftover[0].line_number, 11);
    }

    #[test]
    fn deterministic_output_order() {
        let result = reconcile_lines(vec![
            deleted("a.py", 1, "first deleted line text"),
            deleted("a.py", 2, "second deleted line text"),
            added("a.py", 1, "first deleted line text!"),
            added("a.py", 30, "a brand new line far away"),
        ]);

        // Modified (from deletion 1), unpaired deletion 2, unpaired addition.
        assert_eq!(result.len(), 3);
        assert_eq!(result[0].change_type, ChangeType::Modified);
        assert_eq!(result[0].line_number, 1);
        assert_eq!(result[1].change_type, ChangeType::Deleted);
        assert_eq!(result[1].line_number, 2);
        assert_eq!(result[2].change_type, ChangeType::Added);
        assert_eq!(result[2].line_number, 30);
    }

    #[test]
    fn files_are_reconciled_independently() {
        let result = reconcile_lines(vec![
            deleted("a.py", 3, "shared line content"),
            added("b.py", 3, "shared line content"),
        ]);

        // Same position and content, but different files: no pairing.
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|l| l.change_type != ChangeType::Modified));
    }

    #[test]
    fn whitespace_only_lines_never_pair() {
        let result = reconcile_lines(vec![deleted("a.py", 4, "   "), added("a.py", 4, "\t")]);

        assert_eq!(result.len(), 2);
        assert_eq!(similarity_ratio("   ", "\t"), 0.0);
    }

    #[test]
    fn similarity_is_normalized() {
        assert_eq!(similarity_ratio("same", "same"), 1.0);
        assert!(similarity_ratio("helo world", "hello world") > SIMILARITY_THRESHOLD);
        assert!(similarity_ratio("abcdef", "uvwxyz") < SIMILARITY_THRESHOLD);
    }
}
