//! Value types produced by the discovery engine.

use std::collections::BTreeSet;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// How a line changed according to the diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// Line added in the working copy.
    Added,
    /// Line removed from the working copy.
    Deleted,
    /// A delete/add pair reconciled into a single logical edit.
    ///
    /// Never produced by the raw diff; synthesized only by
    /// [`reconcile_lines`](crate::analysis::reconcile::reconcile_lines).
    Modified,
}

/// Heuristic label describing how likely a change is to be a correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// Small fixes: typos, comments, style tweaks, trivial edits.
    LikelyFixup,
    /// Could be a fixup or a small feature.
    #[default]
    PossibleFixup,
    /// Substantial additions that look like new work.
    UnlikelyFixup,
    /// Part of a file with no committed history.
    NewFile,
}

/// Filtering modes for aggregated targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Drop targets whose changes mostly look like new work.
    #[default]
    SmartDefault,
    /// Keep only targets dominated by high-confidence fixups.
    FixupsOnly,
    /// No filtering.
    IncludeAll,
}

/// A single changed line in the working copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangedLine {
    /// Repository-relative path of the file.
    pub file_path: String,
    /// 1-based line number: post-change position for added/modified lines,
    /// pre-change position for deletions (so blame can still find it).
    pub line_number: usize,
    /// The line's text, without the diff marker.
    pub content: String,
    /// How the line changed.
    pub change_type: ChangeType,
    /// Heuristic fixup likelihood; [`Classification::PossibleFixup`] until
    /// classified.
    #[serde(default)]
    pub classification: Classification,
    /// Surrounding lines, reserved for future heuristics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_lines: Option<Vec<String>>,
}

impl ChangedLine {
    /// Creates an unclassified changed line.
    pub fn new(
        file_path: impl Into<String>,
        line_number: usize,
        content: impl Into<String>,
        change_type: ChangeType,
    ) -> Self {
        Self {
            file_path: file_path.into(),
            line_number,
            content: content.into(),
            change_type,
            classification: Classification::default(),
            context_lines: None,
        }
    }
}

/// Blame attribution for a single line of a tracked file at `HEAD`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlameInfo {
    /// Full hash of the commit that last touched the line.
    pub commit_hash: String,
    /// That commit's message, trimmed.
    pub commit_message: String,
    /// Author display string, `Name <email>`.
    pub author: String,
    /// The line's content at `HEAD`.
    pub line_content: String,
}

/// Message, author, and timestamp of a commit, as resolved by a
/// [`HistorySource`](crate::analysis::source::HistorySource).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    /// Full commit hash.
    pub hash: String,
    /// Commit message, trimmed.
    pub message: String,
    /// Author display string, `Name <email>`.
    pub author: String,
    /// Author timestamp with its original offset.
    pub time: DateTime<FixedOffset>,
}

/// A historical commit inferred to own some of the current changes.
///
/// Built once per discovery pass and discarded after consumption; every
/// changed line appears under exactly one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixupTarget {
    /// Full hash of the inferred origin commit.
    pub commit_hash: String,
    /// The origin commit's message, trimmed.
    pub commit_message: String,
    /// The origin commit's author, `Name <email>`.
    pub author: String,
    /// Changed lines attributed to this commit, in diff order.
    pub changed_lines: Vec<ChangedLine>,
    /// Distinct file paths among `changed_lines`.
    pub files: BTreeSet<String>,
}

impl FixupTarget {
    /// Builds a target from a resolved commit and its attributed lines,
    /// deriving `files` from the lines.
    pub fn new(summary: CommitSummary, changed_lines: Vec<ChangedLine>) -> Self {
        let files = changed_lines
            .iter()
            .map(|line| line.file_path.clone())
            .collect();

        Self {
            commit_hash: summary.hash,
            commit_message: summary.message,
            author: summary.author,
            changed_lines,
            files,
        }
    }
}
