//! Git repository operations

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset};
use git2::{BlameOptions, Commit, DiffOptions, ErrorCode, Oid, Repository};
use similar::TextDiff;
use tracing::debug;

use crate::analysis::source::{DiffSource, HistorySource};
use crate::analysis::types::{BlameInfo, CommitSummary, FixupTarget};
use crate::analysis::Error;
use crate::git::SHORT_HASH_LEN;

/// Context lines shown by [`FixupRepository::diff_context`] by default.
pub const DEFAULT_DIFF_CONTEXT: usize = 3;

/// Read-only git repository wrapper backing the discovery engine.
///
/// Implements the engine's [`HistorySource`] and [`DiffSource`] seams with
/// git2 blame, revision, and diff queries. Nothing here writes to the
/// repository; discovery is safe to run repeatedly.
pub struct FixupRepository {
    repo: Repository,
}

impl FixupRepository {
    /// Open repository at current directory
    pub fn open() -> Result<Self> {
        let repo = Repository::open(".").context("Not in a git repository")?;

        Ok(Self { repo })
    }

    /// Open repository at specified path
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Repository::open(path).context("Failed to open git repository")?;

        Ok(Self { repo })
    }

    /// Get workdir path
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    /// Get access to the underlying git2::Repository
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Zero-context unified diff text of all uncommitted changes: the
    /// unstaged diff (index to working tree) followed by the staged diff
    /// (`HEAD` tree to index).
    pub fn uncommitted_diff_text(&self) -> Result<String> {
        let mut opts = DiffOptions::new();
        opts.context_lines(0);
        let unstaged = self
            .repo
            .diff_index_to_workdir(None, Some(&mut opts))
            .context("Failed to diff index to working tree")?;
        let mut text = render_patch(&unstaged)?;

        let head_tree = self.repo.head().and_then(|head| head.peel_to_tree()).ok();
        let mut opts = DiffOptions::new();
        opts.context_lines(0);
        let staged = self
            .repo
            .diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts))
            .context("Failed to diff HEAD tree to index")?;
        text.push_str(&render_patch(&staged)?);

        Ok(text)
    }

    /// Unified diff between each of the target's files as of the target
    /// commit and its current working-tree content, for human review of
    /// what a fixup would amend.
    ///
    /// Returns `None` when no overlapping file differs. Files missing from
    /// the target commit's tree or unreadable in the working tree are
    /// skipped, not errors.
    pub fn diff_context(
        &self,
        target: &FixupTarget,
        context_lines: usize,
    ) -> Result<Option<String>> {
        let oid = Oid::from_str(&target.commit_hash)
            .with_context(|| format!("Invalid commit hash: {}", target.commit_hash))?;
        let commit = self
            .repo
            .find_commit(oid)
            .with_context(|| format!("Failed to find commit: {}", target.commit_hash))?;
        let tree = commit.tree().context("Failed to get commit tree")?;
        let workdir = self
            .repo
            .workdir()
            .context("Bare repository has no working tree")?;

        let short_len = target.commit_hash.len().min(SHORT_HASH_LEN);
        let short_hash = &target.commit_hash[..short_len];

        let mut sections = Vec::new();
        for file_path in &target.files {
            let Ok(entry) = tree.get_path(Path::new(file_path)) else {
                continue;
            };
            let Ok(blob) = self.repo.find_blob(entry.id()) else {
                continue;
            };
            let old = String::from_utf8_lossy(blob.content()).into_owned();
            let Ok(new) = fs::read_to_string(workdir.join(file_path)) else {
                continue;
            };
            if old == new {
                continue;
            }

            let text_diff = TextDiff::from_lines(&old, &new);
            let unified = text_diff
                .unified_diff()
                .context_radius(context_lines)
                .header(
                    &format!("a/{file_path} (commit {short_hash})"),
                    &format!("b/{file_path} (working tree)"),
                )
                .to_string();
            sections.push(unified);
        }

        if sections.is_empty() {
            Ok(None)
        } else {
            Ok(Some(sections.join("\n")))
        }
    }

    /// Blame attribution for one line, as a hard-failure result; the
    /// [`HistorySource`] impl degrades errors to `None`.
    fn blame_line_inner(&self, file_path: &str, line_number: usize) -> Result<BlameInfo> {
        let mut opts = BlameOptions::new();
        opts.min_line(line_number).max_line(line_number);

        let blame = self
            .repo
            .blame_file(Path::new(file_path), Some(&mut opts))
            .with_context(|| format!("Failed to blame {file_path}"))?;
        let hunk = blame
            .get_line(line_number)
            .with_context(|| format!("No blame hunk for {file_path}:{line_number}"))?;

        let commit = self
            .repo
            .find_commit(hunk.final_commit_id())
            .context("Failed to find blamed commit")?;
        let summary = self.commit_summary(&commit)?;
        let line_content = self.line_at_head(file_path, line_number)?;

        Ok(BlameInfo {
            commit_hash: summary.hash,
            commit_message: summary.message,
            author: summary.author,
            line_content,
        })
    }

    /// Content of a line of `file_path` in `HEAD`'s tree.
    fn line_at_head(&self, file_path: &str, line_number: usize) -> Result<String> {
        let tree = self
            .repo
            .head()
            .and_then(|head| head.peel_to_tree())
            .context("Failed to get HEAD tree")?;
        let entry = tree
            .get_path(Path::new(file_path))
            .with_context(|| format!("{file_path} not in HEAD tree"))?;
        let blob = self
            .repo
            .find_blob(entry.id())
            .context("Failed to read blob")?;

        let content = String::from_utf8_lossy(blob.content());
        Ok(content
            .lines()
            .nth(line_number.saturating_sub(1))
            .unwrap_or("")
            .to_string())
    }

    /// Create CommitSummary from git2::Commit
    fn commit_summary(&self, commit: &Commit<'_>) -> Result<CommitSummary> {
        let author = format!(
            "{} <{}>",
            commit.author().name().unwrap_or("Unknown"),
            commit.author().email().unwrap_or("unknown@example.com")
        );

        let timestamp = commit.author().when();
        let time = DateTime::from_timestamp(timestamp.seconds(), 0)
            .context("Invalid commit timestamp")?
            .with_timezone(
                &FixedOffset::east_opt(timestamp.offset_minutes() * 60)
                    .unwrap_or_else(|| FixedOffset::east_opt(0).unwrap()),
            );

        Ok(CommitSummary {
            hash: commit.id().to_string(),
            message: commit.message().unwrap_or("").trim().to_string(),
            author,
            time,
        })
    }
}

impl HistorySource for FixupRepository {
    fn blame_line(&self, file_path: &str, line_number: usize) -> Option<BlameInfo> {
        match self.blame_line_inner(file_path, line_number) {
            Ok(info) => Some(info),
            Err(err) => {
                debug!(file = file_path, line = line_number, error = %err, "blame query failed");
                None
            }
        }
    }

    fn lookup_commit(&self, id: &str) -> Option<CommitSummary> {
        let commit = self
            .repo
            .revparse_single(id)
            .and_then(|obj| obj.peel_to_commit())
            .ok()?;
        self.commit_summary(&commit).ok()
    }

    fn file_exists_at_head(&self, file_path: &str) -> bool {
        let Ok(tree) = self.repo.head().and_then(|head| head.peel_to_tree()) else {
            // Cannot read HEAD; degrade toward "pre-existing".
            return true;
        };

        match tree.get_path(Path::new(file_path)) {
            Ok(_) => true,
            Err(err) if err.code() == ErrorCode::NotFound => false,
            Err(_) => true,
        }
    }

    fn commits_since(&self, limit: &str) -> Result<HashSet<String>, Error> {
        let commit = self
            .repo
            .revparse_single(limit)
            .and_then(|obj| obj.peel_to_commit())
            .map_err(|_| Error::InvalidReference(limit.to_string()))?;

        let mut commits = HashSet::new();
        commits.insert(commit.id().to_string());

        // Walk limit..HEAD; a failed walk degrades to the limit commit alone.
        let Ok(mut walker) = self.repo.revwalk() else {
            debug!(limit, "revwalk unavailable, range reduced to limit commit");
            return Ok(commits);
        };
        if walker.push_head().is_ok() && walker.hide(commit.id()).is_ok() {
            for oid in walker.flatten() {
                commits.insert(oid.to_string());
            }
        }

        Ok(commits)
    }
}

impl DiffSource for FixupRepository {
    fn uncommitted_diff(&self) -> Result<String> {
        self.uncommitted_diff_text()
    }
}

/// Renders a git2 diff as unified patch text.
fn render_patch(diff: &git2::Diff<'_>) -> Result<String> {
    let mut text = String::new();

    diff.print(git2::DiffFormat::Patch, |_delta, _hunk, line| {
        let content = std::str::from_utf8(line.content()).unwrap_or("<binary>");
        let prefix = match line.origin() {
            '+' => "+",
            '-' => "-",
            ' ' => " ",
            // Hunk and file headers carry their own text.
            _ => "",
        };
        text.push_str(prefix);
        text.push_str(content);
        true
    })
    .context("Failed to format diff")?;

    Ok(text)
}
