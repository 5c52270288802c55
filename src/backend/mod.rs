//! Tag/commit source abstraction.
//!
//! The engine reconciles versions against two possible sources of truth: the
//! local git repository and the remote hosting API. Both are modeled as one
//! capability, [TagBackend], so the semver-aware ordering logic in
//! [crate::resolver] is written once and selected per call site.
//!
//! Implementations:
//!
//! - [local::LocalBackend]: real repository access via the `git2` crate
//! - [remote::RemoteBackend]: adapter over an explicitly passed
//!   [remote::RemoteHost] handle
//! - [mock::MockBackend]: in-memory implementation for tests

pub mod local;
pub mod mock;
pub mod remote;

pub use local::LocalBackend;
pub use mock::MockBackend;
pub use remote::{RemoteBackend, RemoteHost, RepoId};

use std::path::Path;

use crate::domain::CommitRecord;
use crate::error::{NyronError, Result};

/// Raw tag and commit-range operations shared by both backends.
///
/// Only mechanical operations live here; latest/previous resolution and
/// semver filtering belong to [crate::resolver::TagResolver] so the ordering
/// rules cannot drift between implementations.
///
/// All implementors must be `Send + Sync`.
pub trait TagBackend: Send + Sync {
    /// All tag names known to the backend, in no particular order.
    fn tags(&self) -> Result<Vec<String>>;

    /// Create a tag pointing at the current head.
    ///
    /// Fails with [NyronError::TagAlreadyExists] on a name collision and
    /// [NyronError::EmptyHistory] when there is nothing to tag.
    fn create_tag(&self, tag: &str) -> Result<()>;

    /// Publish a tag to the canonical remote.
    fn push_tag(&self, tag: &str) -> Result<()>;

    /// Does the backend have any commit history at all?
    fn has_commits(&self) -> Result<bool>;

    /// Hash of the repository's first (root) commit.
    ///
    /// Used as a synthetic baseline for commit-range queries when a project
    /// has no prior tags.
    fn first_commit_hash(&self) -> Result<String>;

    /// Commits after `base` (a tag name or commit hash) up to the current
    /// head, oldest first.
    fn commits_since(&self, base: &str) -> Result<Vec<CommitRecord>>;

    /// Commits after `base` up to `head`, oldest first.
    fn commits_between(&self, base: &str, head: &str) -> Result<Vec<CommitRecord>>;

    /// Stage exactly the given paths and commit them with `message`.
    ///
    /// Only meaningful for a local working tree; the default reports the
    /// operation as unsupported so callers can degrade gracefully.
    fn commit_paths(&self, paths: &[&Path], message: &str) -> Result<()> {
        let _ = (paths, message);
        Err(NyronError::remote(
            "this backend does not support creating commits",
        ))
    }
}
