//! Target aggregation: attributing changed lines to origin commits.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::analysis::source::HistorySource;
use crate::analysis::types::{BlameInfo, ChangeType, ChangedLine, FixupTarget};

/// Blame probe offsets used to infer an origin commit for added lines,
/// which have no history at their own position. Fixed small window,
/// scanned in this order.
pub const CONTEXT_OFFSETS: [i64; 4] = [-2, -1, 1, 2];

/// Memoizes blame lookups for the duration of one discovery pass.
///
/// Each (file, line) is queried at most once; blame is idempotent relative
/// to a fixed `HEAD`, so caching is invisible to callers.
struct BlameCache<'a, H: HistorySource> {
    history: &'a H,
    cache: HashMap<(String, usize), Option<BlameInfo>>,
}

impl<'a, H: HistorySource> BlameCache<'a, H> {
    fn new(history: &'a H) -> Self {
        Self {
            history,
            cache: HashMap::new(),
        }
    }

    fn blame(&mut self, file_path: &str, line_number: usize) -> Option<BlameInfo> {
        self.cache
            .entry((file_path.to_string(), line_number))
            .or_insert_with(|| {
                let info = self.history.blame_line(file_path, line_number);
                if info.is_none() {
                    trace!(file = file_path, line = line_number, "blame miss");
                }
                info
            })
            .clone()
    }
}

/// Groups classified, reconciled changed lines into one [`FixupTarget`]
/// per origin commit.
///
/// Deleted and modified lines are blamed at their own position (which still
/// exists in history). Added lines are attributed via context: blame is
/// probed at [`CONTEXT_OFFSETS`] around the line, and the first commit
/// found in scan order wins. Lines with no resolvable origin are dropped.
/// Result order follows first-encounter order of commit hashes, which
/// itself follows diff order.
pub fn group_into_targets<H: HistorySource>(
    history: &H,
    lines: Vec<ChangedLine>,
) -> Vec<FixupTarget> {
    let mut blame_cache = BlameCache::new(history);

    // Explicit key sequence keeps output order independent of map internals.
    let mut commit_order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<ChangedLine>> = HashMap::new();

    for line in lines {
        let origin = match line.change_type {
            ChangeType::Deleted | ChangeType::Modified => blame_cache
                .blame(&line.file_path, line.line_number)
                .map(|info| info.commit_hash),
            ChangeType::Added => {
                context_commits(&mut blame_cache, &line.file_path, line.line_number)
                    .into_iter()
                    .next()
            }
        };

        match origin {
            Some(commit_hash) => {
                if !groups.contains_key(&commit_hash) {
                    commit_order.push(commit_hash.clone());
                }
                groups.entry(commit_hash).or_default().push(line);
            }
            None => {
                trace!(
                    file = %line.file_path,
                    line = line.line_number,
                    "no resolvable origin, dropping line"
                );
            }
        }
    }

    let mut targets = Vec::with_capacity(commit_order.len());
    for commit_hash in commit_order {
        let Some(group_lines) = groups.remove(&commit_hash) else {
            continue;
        };
        // A hash that no longer resolves loses its group rather than
        // failing the whole pass.
        let Some(summary) = history.lookup_commit(&commit_hash) else {
            debug!(commit = %commit_hash, "commit no longer resolves, dropping group");
            continue;
        };
        targets.push(FixupTarget::new(summary, group_lines));
    }

    targets
}

/// Commits of nearby lines, in probe-scan order, deduplicated while
/// preserving first-seen order. Non-positive probe positions are skipped.
fn context_commits<H: HistorySource>(
    blame_cache: &mut BlameCache<'_, H>,
    file_path: &str,
    line_number: usize,
) -> Vec<String> {
    let mut commits: Vec<String> = Vec::new();

    for offset in CONTEXT_OFFSETS {
        let probe = line_number as i64 + offset;
        if probe <= 0 {
            continue;
        }
        if let Some(info) = blame_cache.blame(file_path, probe as usize) {
            if !commits.contains(&info.commit_hash) {
                commits.push(info.commit_hash);
            }
        }
    }

    commits
}
