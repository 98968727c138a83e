//! Shared test fakes for the analysis module.

use std::collections::{HashMap, HashSet};

use anyhow::Result;
use chrono::{Duration, FixedOffset, Utc};

use crate::analysis::error::Error;
use crate::analysis::source::{DiffSource, HistorySource};
use crate::analysis::types::{BlameInfo, CommitSummary};

/// In-memory [`HistorySource`] with scripted blame and commit answers.
#[derive(Default)]
pub struct FakeHistory {
    tracked_files: HashSet<String>,
    commits: HashMap<String, CommitSummary>,
    blame: HashMap<(String, usize), String>,
    descendants: HashMap<String, HashSet<String>>,
    diff_text: String,
}

impl FakeHistory {
    /// Marks `path` as existing in the committed tree.
    pub fn track_file(&mut self, path: &str) {
        self.tracked_files.insert(path.to_string());
    }

    /// Registers a commit authored `days_old` days ago.
    pub fn add_commit_at_age(&mut self, hash: &str, message: &str, author: &str, days_old: i64) {
        #[allow(clippy::unwrap_used)] // zero offset is always valid
        let utc_offset = FixedOffset::east_opt(0).unwrap();
        let time = (Utc::now() - Duration::days(days_old)).with_timezone(&utc_offset);
        self.commits.insert(
            hash.to_string(),
            CommitSummary {
                hash: hash.to_string(),
                message: message.to_string(),
                author: author.to_string(),
                time,
            },
        );
    }

    /// Registers a recent commit.
    pub fn add_commit(&mut self, hash: &str, message: &str, author: &str) {
        self.add_commit_at_age(hash, message, author, 1);
    }

    /// Scripts blame for (`file`, `line`) to resolve to `commit`.
    pub fn set_blame(&mut self, file: &str, line: usize, commit: &str) {
        self.track_file(file);
        self.blame
            .insert((file.to_string(), line), commit.to_string());
    }

    /// Scripts the `limit..HEAD` answer for [`HistorySource::commits_since`].
    pub fn set_commits_since(&mut self, limit: &str, hashes: &[&str]) {
        let mut set: HashSet<String> = hashes.iter().map(|h| (*h).to_string()).collect();
        set.insert(limit.to_string());
        self.descendants.insert(limit.to_string(), set);
    }

    /// Sets the diff text returned by [`DiffSource::uncommitted_diff`].
    pub fn set_diff(&mut self, diff_text: &str) {
        self.diff_text = diff_text.to_string();
    }
}

impl HistorySource for FakeHistory {
    fn blame_line(&self, file_path: &str, line_number: usize) -> Option<BlameInfo> {
        let commit = self.blame.get(&(file_path.to_string(), line_number))?;
        // Blame may name a commit the summary lookup no longer resolves;
        // tests use that to exercise stale-group handling.
        let (message, author) = match self.commits.get(commit) {
            Some(summary) => (summary.message.clone(), summary.author.clone()),
            None => (String::new(), String::new()),
        };
        Some(BlameInfo {
            commit_hash: commit.clone(),
            commit_message: message,
            author,
            line_content: format!("content of {file_path}:{line_number}"),
        })
    }

    fn lookup_commit(&self, id: &str) -> Option<CommitSummary> {
        self.commits.get(id).cloned()
    }

    fn file_exists_at_head(&self, file_path: &str) -> bool {
        self.tracked_files.contains(file_path)
    }

    fn commits_since(&self, limit: &str) -> Result<HashSet<String>, Error> {
        self.descendants
            .get(limit)
            .cloned()
            .ok_or_else(|| Error::InvalidReference(limit.to_string()))
    }
}

impl DiffSource for FakeHistory {
    fn uncommitted_diff(&self) -> Result<String> {
        Ok(self.diff_text.clone())
    }
}
