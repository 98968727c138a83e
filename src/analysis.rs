//! Fixup-target discovery engine.
//!
//! The pipeline runs in diff order: [`diff::parse_diff`] turns raw diff text
//! into flat change records, [`reconcile::reconcile_lines`] upgrades paired
//! delete/add records into modifications, [`classify::ChangeClassifier`]
//! labels each line, [`aggregate::group_into_targets`] attributes lines to
//! origin commits via blame, and [`filter`] applies selection policy.

pub mod aggregate;
pub mod classify;
pub mod diff;
pub mod error;
pub mod filter;
pub mod reconcile;
pub mod source;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

use anyhow::Result;
use tracing::debug;

pub use classify::ChangeClassifier;
pub use error::Error;
pub use source::{DiffSource, HistorySource};
pub use types::{
    BlameInfo, ChangeType, ChangedLine, Classification, CommitSummary, FilterMode, FixupTarget,
};

/// Options controlling a single discovery pass.
///
/// The default runs [`FilterMode::SmartDefault`] with no range limit, no
/// organization filter, and no progress reporting.
#[derive(Default)]
pub struct DiscoveryOptions<'a> {
    /// Selection policy applied over aggregated targets.
    pub filter_mode: FilterMode,
    /// Restrict targets to this commit and its descendants, when set.
    pub limit: Option<&'a str>,
    /// Keep only targets whose author email matches this pattern, when set.
    pub organization_email: Option<&'a str>,
    /// Fire-and-forget progress callback, invoked at coarse checkpoints.
    /// It never affects computed results.
    pub progress: Option<&'a dyn Fn(&str)>,
}

impl std::fmt::Debug for DiscoveryOptions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryOptions")
            .field("filter_mode", &self.filter_mode)
            .field("limit", &self.limit)
            .field("organization_email", &self.organization_email)
            .field("progress", &self.progress.map(|_| "<callback>"))
            .finish()
    }
}

impl DiscoveryOptions<'_> {
    fn report(&self, message: &str) {
        if let Some(progress) = self.progress {
            progress(message);
        }
    }
}

/// Fixup-target discovery over an arbitrary history source.
///
/// Generic over [`HistorySource`] so the engine can be driven by a real
/// repository ([`crate::git::FixupRepository`]) or a test fake.
pub struct FixupFinder<'a, H: HistorySource> {
    history: &'a H,
}

impl<'a, H: HistorySource> FixupFinder<'a, H> {
    /// Creates a finder over the given history source.
    pub fn new(history: &'a H) -> Self {
        Self { history }
    }

    /// Parses, reconciles, and classifies the changed lines in `diff_text`.
    ///
    /// `diff_text` is expected to be zero-context unified diff output,
    /// typically the unstaged diff concatenated with the staged diff.
    pub fn collect_changed_lines(&self, diff_text: &str) -> Vec<ChangedLine> {
        let parsed = diff::parse_diff(diff_text);
        let reconciled = reconcile::reconcile_lines(parsed);

        let classifier = ChangeClassifier::new(self.history);
        reconciled
            .into_iter()
            .map(|mut line| {
                line.classification = classifier.classify(&line, None);
                line
            })
            .collect()
    }

    /// Runs a full discovery pass over `diff_text`.
    ///
    /// Returns the filtered targets in first-encounter order of their origin
    /// commits. An empty result is a normal outcome, not an error. The pass
    /// performs only read-only history queries and is safe to repeat.
    pub fn discover(
        &self,
        diff_text: &str,
        options: &DiscoveryOptions<'_>,
    ) -> Result<Vec<FixupTarget>> {
        options.report("Collecting changed lines...");
        let lines = self.collect_changed_lines(diff_text);

        options.report(&format!("Analyzing {} changed lines...", lines.len()));
        let targets = aggregate::group_into_targets(self.history, lines);
        debug!(targets = targets.len(), "blame sweep complete");

        options.report("Applying filters...");
        let mut targets = filter::filter_by_mode(targets, options.filter_mode);
        if let Some(limit) = options.limit {
            targets = filter::limit_to_range(self.history, targets, limit)?;
        }
        if let Some(pattern) = options.organization_email {
            targets = filter::filter_by_organization(targets, pattern)?;
        }

        options.report("Analysis complete");
        Ok(targets)
    }
}

/// Discovers fixup targets for the uncommitted changes of `source`.
///
/// Convenience entry point for sources that produce their own diff text,
/// such as [`crate::git::FixupRepository`].
pub fn discover_targets<S>(source: &S, options: &DiscoveryOptions<'_>) -> Result<Vec<FixupTarget>>
where
    S: HistorySource + DiffSource,
{
    let diff_text = source.uncommitted_diff()?;
    FixupFinder::new(source).discover(&diff_text, options)
}
