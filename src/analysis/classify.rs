//! Heuristic change classification.
//!
//! A layered cascade of cheap textual checks, evaluated in fixed precedence
//! order over the trimmed line content. Precedence matters: short trivial
//! edits must win before the length check, which only applies to longer
//! content. Classification is best-effort signal, not ground truth.

use std::sync::LazyLock;

use chrono::{Duration, Utc};
use regex::Regex;
use tracing::trace;

use crate::analysis::source::HistorySource;
use crate::analysis::types::{ChangedLine, Classification};

/// Trimmed content shorter than this is treated as a trivial edit.
pub const TRIVIAL_CONTENT_LEN: usize = 10;

/// Trimmed content longer than this suggests a substantial addition.
pub const LARGE_CONTENT_LEN: usize = 100;

/// Commits older than this many days are unlikely to want fixups.
pub const OLD_COMMIT_DAYS: i64 = 30;

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static FIXUP_KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(fix|correct|update|typo|spelling|grammar|format|style|indent)\b").unwrap()
});

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static COMMENT_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#|//|\*)").unwrap());

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static NON_ALPHABETIC: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^a-zA-Z]*$").unwrap());

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static QUOTED_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^["'].*["'][\s,;]*$"#).unwrap());

#[allow(clippy::unwrap_used)] // Compile-time constant regex pattern
static STRUCTURAL_ADDITION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)^(
            (pub\s+)?fn\s+\w+            # Rust function
          | def\s+\w+\s*\(               # Python function
          | class\s+\w+                  # class definition
          | (pub\s+)?(struct|enum|trait|impl)\s+\w+
          | import\s+\w+                 # import forms
          | from\s+\w+\s+import
          | use\s+\w+
          | if\s+\S                      # new conditional
          | (for|while)\s+\S             # new loop
          | @\w+                         # decorator / attribute-like
        )",
    )
    .unwrap()
});

/// Classifies changed lines by fixup likelihood.
pub struct ChangeClassifier<'a, H: HistorySource> {
    history: &'a H,
}

impl<'a, H: HistorySource> ChangeClassifier<'a, H> {
    /// Creates a classifier over the given history source.
    pub fn new(history: &'a H) -> Self {
        Self { history }
    }

    /// Classifies a single change. First matching rule wins:
    ///
    /// 1. [`Classification::NewFile`] when the file has no committed history.
    /// 2. [`Classification::LikelyFixup`] for correction-looking content:
    ///    fixup keywords, comment lines, symbol-only lines, bare string
    ///    literals, or anything shorter than [`TRIVIAL_CONTENT_LEN`].
    /// 3. [`Classification::UnlikelyFixup`] for content longer than
    ///    [`LARGE_CONTENT_LEN`] or structural additions (new function,
    ///    class, import, conditional, loop).
    /// 4. [`Classification::UnlikelyFixup`] when `target_commit` is known
    ///    and older than [`OLD_COMMIT_DAYS`].
    /// 5. [`Classification::PossibleFixup`] otherwise.
    ///
    /// Never fails: unreadable history degrades to treating the file as
    /// pre-existing and the commit as recent.
    pub fn classify(&self, change: &ChangedLine, target_commit: Option<&str>) -> Classification {
        if !self.history.file_exists_at_head(&change.file_path) {
            trace!(file = %change.file_path, "no committed history, new file");
            return Classification::NewFile;
        }

        let trimmed = change.content.trim();
        let lowered = trimmed.to_lowercase();

        if is_likely_fixup_content(&lowered) {
            return Classification::LikelyFixup;
        }

        if is_substantial_content(trimmed) {
            return Classification::UnlikelyFixup;
        }

        if let Some(hash) = target_commit {
            if self.is_old_commit(hash) {
                return Classification::UnlikelyFixup;
            }
        }

        Classification::PossibleFixup
    }

    /// Whether `hash` resolves to a commit older than [`OLD_COMMIT_DAYS`].
    /// Unresolvable commits count as recent.
    fn is_old_commit(&self, hash: &str) -> bool {
        let Some(summary) = self.history.lookup_commit(hash) else {
            return false;
        };

        let age = Utc::now().signed_duration_since(summary.time.with_timezone(&Utc));
        age > Duration::days(OLD_COMMIT_DAYS)
    }
}

/// Content-based checks suggesting a correction rather than new work.
/// Expects trimmed, lowercased content.
fn is_likely_fixup_content(content: &str) -> bool {
    FIXUP_KEYWORDS.is_match(content)
        || COMMENT_MARKER.is_match(content)
        || NON_ALPHABETIC.is_match(content)
        || QUOTED_LITERAL.is_match(content)
        || content.chars().count() < TRIVIAL_CONTENT_LEN
}

/// Size- and structure-based checks suggesting new work. Expects trimmed
/// content with its original casing.
fn is_substantial_content(content: &str) -> bool {
    content.chars().count() > LARGE_CONTENT_LEN || STRUCTURAL_ADDITION.is_match(content)
}
