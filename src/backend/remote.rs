use std::fmt;

use crate::backend::TagBackend;
use crate::domain::CommitRecord;
use crate::error::{NyronError, Result};

/// Repository identifier in `owner/repo` form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    /// Parse an `owner/repo` slug.
    pub fn parse(slug: &str) -> Result<Self> {
        let mut parts = slug.split('/').filter(|s| !s.is_empty());
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) => Ok(RepoId {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(NyronError::config(format!(
                "invalid repo '{}' — expected \"owner/repo\"",
                slug
            ))),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Interface boundary to the remote hosting API.
///
/// The engine never constructs a lazily cached global client; callers build a
/// host handle once and pass it explicitly, which keeps tests deterministic
/// and free of environment leakage.
pub trait RemoteHost: Send + Sync {
    /// All tag names on the remote repository.
    fn list_tags(&self, repo: &RepoId) -> Result<Vec<String>>;

    /// Create a tag on the remote head. Creation implies publication.
    fn create_tag(&self, repo: &RepoId, tag: &str) -> Result<()>;

    /// Commits reachable from `head` but not `base`, oldest first.
    fn compare_commits(&self, repo: &RepoId, base: &str, head: &str)
        -> Result<Vec<CommitRecord>>;

    /// Create a hosting-provider release for an existing tag.
    fn create_release(&self, repo: &RepoId, tag: &str, title: &str, body: &str) -> Result<()>;

    /// Current head commit hash, `None` for an empty repository.
    fn head_commit(&self, repo: &RepoId) -> Result<Option<String>>;

    /// Root commit hash, `None` for an empty repository.
    fn first_commit(&self, repo: &RepoId) -> Result<Option<String>>;
}

/// [TagBackend] adapter over a [RemoteHost] handle.
pub struct RemoteBackend<'a> {
    host: &'a dyn RemoteHost,
    repo: RepoId,
}

impl<'a> RemoteBackend<'a> {
    pub fn new(host: &'a dyn RemoteHost, repo: RepoId) -> Self {
        RemoteBackend { host, repo }
    }

    pub fn repo(&self) -> &RepoId {
        &self.repo
    }

    /// Direct access to the underlying host, for operations outside the
    /// backend contract (release creation).
    pub fn host(&self) -> &'a dyn RemoteHost {
        self.host
    }
}

impl TagBackend for RemoteBackend<'_> {
    fn tags(&self) -> Result<Vec<String>> {
        self.host.list_tags(&self.repo)
    }

    fn create_tag(&self, tag: &str) -> Result<()> {
        if self.host.head_commit(&self.repo)?.is_none() {
            return Err(NyronError::EmptyHistory(self.repo.to_string()));
        }
        self.host.create_tag(&self.repo, tag)
    }

    fn push_tag(&self, _tag: &str) -> Result<()> {
        // Tag creation through the hosting API is already public.
        Ok(())
    }

    fn has_commits(&self) -> Result<bool> {
        Ok(self.host.head_commit(&self.repo)?.is_some())
    }

    fn first_commit_hash(&self) -> Result<String> {
        self.host
            .first_commit(&self.repo)?
            .ok_or_else(|| NyronError::EmptyHistory(self.repo.to_string()))
    }

    fn commits_since(&self, base: &str) -> Result<Vec<CommitRecord>> {
        self.host.compare_commits(&self.repo, base, "HEAD")
    }

    fn commits_between(&self, base: &str, head: &str) -> Result<Vec<CommitRecord>> {
        self.host.compare_commits(&self.repo, base, head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_id_parse() {
        let repo = RepoId::parse("erebus-sh/erebus").unwrap();
        assert_eq!(repo.owner, "erebus-sh");
        assert_eq!(repo.name, "erebus");
        assert_eq!(repo.to_string(), "erebus-sh/erebus");
    }

    #[test]
    fn test_repo_id_rejects_malformed_slugs() {
        assert!(RepoId::parse("just-a-name").is_err());
        assert!(RepoId::parse("a/b/c").is_err());
        assert!(RepoId::parse("/").is_err());
    }
}
