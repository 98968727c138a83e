//! Typed errors surfaced by the discovery engine.
//!
//! Only conditions the caller must act on become variants. Malformed hunks,
//! unresolved line origins, and failed blame or commit lookups are recovered
//! internally and never abort a discovery pass.

use thiserror::Error;

/// Errors surfaced by filtering steps.
#[derive(Error, Debug)]
pub enum Error {
    /// The organization email pattern failed to compile.
    #[error("invalid email pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern as supplied by the caller.
        pattern: String,
        /// The underlying regex compilation error.
        #[source]
        source: regex::Error,
    },

    /// The commit-range limit does not resolve to a commit.
    #[error("invalid commit reference '{0}'")]
    InvalidReference(String),
}
