//! # fixup-finder
//!
//! A query engine that inspects a working copy's uncommitted edits and
//! determines, for each changed line, which historical commit is the most
//! plausible target for a "fixup" amendment.
//!
//! The engine parses zero-context diffs, pairs delete/add records back into
//! modifications, attributes each changed line to an origin commit via git
//! blame, classifies how much each change looks like a correction, and
//! aggregates the result into per-commit [`FixupTarget`]s ready for display
//! or commit creation by a caller.
//!
//! ## Quick start
//!
//! ```no_run
//! use fixup_finder::{discover_targets, DiscoveryOptions, FixupRepository};
//!
//! # fn main() -> anyhow::Result<()> {
//! let repo = FixupRepository::open()?;
//! let targets = discover_targets(&repo, &DiscoveryOptions::default())?;
//! for target in &targets {
//!     println!("{} {}", &target.commit_hash[..8], target.commit_message);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod git;

pub use analysis::{
    discover_targets, BlameInfo, ChangedLine, Classification, DiscoveryOptions, Error, FilterMode,
    FixupFinder, FixupTarget,
};
pub use git::FixupRepository;

/// The current version of fixup-finder.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
