//! Selection policy over aggregated targets.

use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use tracing::{debug, trace};

use crate::analysis::error::Error;
use crate::analysis::source::HistorySource;
use crate::analysis::types::{Classification, FilterMode, FixupTarget};

/// Minimum fraction of likely-fixup lines for a target to pass
/// [`FilterMode::FixupsOnly`]. Empirical constant, not derived.
pub const FIXUPS_ONLY_MIN_LIKELY: f64 = 0.5;

/// A target is dropped under [`FilterMode::SmartDefault`] when the combined
/// fraction of new-file and unlikely-fixup lines reaches this value.
/// Empirical constant, not derived.
pub const SMART_DEFAULT_MAX_UNLIKELY: f64 = 0.7;

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static BRACKETED_EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<([^>]+)>").unwrap());

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static BARE_EMAIL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").unwrap());

/// Applies the selection policy of `mode` over `targets`.
///
/// Aggregation guarantees every target has at least one line, so the
/// fractions below are always well-defined.
pub fn filter_by_mode(targets: Vec<FixupTarget>, mode: FilterMode) -> Vec<FixupTarget> {
    if mode == FilterMode::IncludeAll {
        return targets;
    }

    targets
        .into_iter()
        .filter(|target| {
            let total = target.changed_lines.len() as f64;
            let count = |classification: Classification| {
                target
                    .changed_lines
                    .iter()
                    .filter(|l| l.classification == classification)
                    .count() as f64
            };

            let keep = match mode {
                FilterMode::IncludeAll => true,
                FilterMode::FixupsOnly => {
                    count(Classification::LikelyFixup) / total >= FIXUPS_ONLY_MIN_LIKELY
                }
                FilterMode::SmartDefault => {
                    let unlikely =
                        count(Classification::NewFile) + count(Classification::UnlikelyFixup);
                    unlikely / total < SMART_DEFAULT_MAX_UNLIKELY
                }
            };

            if !keep {
                trace!(commit = %target.commit_hash, ?mode, "target filtered out");
            }
            keep
        })
        .collect()
}

/// Keeps only targets whose author email matches `pattern`
/// (case-insensitive).
///
/// Targets whose author string yields no extractable email are dropped, not
/// errored. A pattern that fails to compile is [`Error::InvalidPattern`].
pub fn filter_by_organization(
    targets: Vec<FixupTarget>,
    pattern: &str,
) -> Result<Vec<FixupTarget>, Error> {
    let regex = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|source| Error::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;

    Ok(targets
        .into_iter()
        .filter(|target| match extract_email(&target.author) {
            Some(email) => regex.is_match(email),
            None => {
                debug!(author = %target.author, "no extractable email, dropping target");
                false
            }
        })
        .collect())
}

/// Restricts `targets` to those whose origin commit is `limit` or one of
/// its descendants reachable from `HEAD`.
pub fn limit_to_range<H: HistorySource>(
    history: &H,
    targets: Vec<FixupTarget>,
    limit: &str,
) -> Result<Vec<FixupTarget>, Error> {
    let allowed = history.commits_since(limit)?;

    Ok(targets
        .into_iter()
        .filter(|target| allowed.contains(&target.commit_hash))
        .collect())
}

/// Extracts an email from an author display string.
///
/// Prefers the `<...>` bracketed form, falling back to a bare
/// `word@word.word` scan.
fn extract_email(author: &str) -> Option<&str> {
    if let Some(captures) = BRACKETED_EMAIL.captures(author) {
        return captures.get(1).map(|m| m.as_str());
    }

    if author.contains('@') && author.contains('.') {
        return BARE_EMAIL.find(author).map(|m| m.as_str());
    }

    None
}
