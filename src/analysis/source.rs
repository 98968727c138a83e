//! Seams between the engine and the surrounding version-control system.

use std::collections::HashSet;

use anyhow::Result;

use crate::analysis::error::Error;
use crate::analysis::types::{BlameInfo, CommitSummary};

/// Read-only queries against committed history and the working tree.
///
/// Every method is idempotent relative to a fixed `HEAD`; failed lookups
/// degrade to "not found" rather than propagating hard errors, so one bad
/// query never aborts a discovery pass.
pub trait HistorySource {
    /// Blame attribution for `line_number` (1-based) of `file_path` at
    /// `HEAD`. `None` when the line has no history: out-of-range position,
    /// untracked file, or a failed query.
    fn blame_line(&self, file_path: &str, line_number: usize) -> Option<BlameInfo>;

    /// Resolves a commit identifier to its message, author, and timestamp.
    /// `None` when the identifier no longer resolves to a commit object.
    fn lookup_commit(&self, id: &str) -> Option<CommitSummary>;

    /// Whether `file_path` has a blob in `HEAD`'s tree. Lookup failures
    /// count as existing, so classification degrades toward "pre-existing"
    /// rather than "new file".
    fn file_exists_at_head(&self, file_path: &str) -> bool;

    /// Full hashes of `limit` itself plus every commit reachable from
    /// `HEAD` but not from `limit` (i.e. `limit..HEAD`).
    fn commits_since(&self, limit: &str) -> Result<HashSet<String>, Error>;
}

/// Produces the raw diff text a discovery pass consumes.
pub trait DiffSource {
    /// Zero-context unified diff of all uncommitted changes, unstaged
    /// section first, then staged.
    fn uncommitted_diff(&self) -> Result<String>;
}
