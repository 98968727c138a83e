//! Git-backed history and diff sources.

pub mod repository;

pub use repository::{FixupRepository, DEFAULT_DIFF_CONTEXT};

/// Number of hex characters to show in abbreviated commit hashes.
pub const SHORT_HASH_LEN: usize = 8;
