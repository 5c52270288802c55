use git2::{ErrorCode, Oid, Repository};
use std::path::Path;

use crate::backend::TagBackend;
use crate::domain::CommitRecord;
use crate::error::{NyronError, Result};

/// Local repository backend on top of `git2`.
///
/// Holds the repository slug (`owner/repo`) alongside the handle so commit
/// records can carry the repo identity they came from.
pub struct LocalBackend {
    repo: Repository,
    repo_slug: String,
}

impl LocalBackend {
    /// Open or discover a git repository at (or above) the given path.
    pub fn open<P: AsRef<Path>>(path: P, repo_slug: impl Into<String>) -> Result<Self> {
        let repo = Repository::discover(path)?;
        Ok(LocalBackend {
            repo,
            repo_slug: repo_slug.into(),
        })
    }

    fn head_oid(&self) -> Result<Oid> {
        let head = self.repo.head().map_err(|e| {
            if e.code() == ErrorCode::UnbornBranch || e.code() == ErrorCode::NotFound {
                NyronError::EmptyHistory("HEAD does not point at a commit".to_string())
            } else {
                NyronError::Git(e)
            }
        })?;
        head.target()
            .ok_or_else(|| NyronError::EmptyHistory("HEAD is not a direct reference".to_string()))
    }

    /// Resolve a baseline that may be a tag name or a raw commit hash.
    fn resolve_baseline(&self, base: &str) -> Result<Oid> {
        if let Ok(reference) = self.repo.find_reference(&format!("refs/tags/{}", base)) {
            let object = reference.peel(git2::ObjectType::Any)?;
            return Ok(object.id());
        }
        let object = self.repo.revparse_single(base).map_err(|e| {
            NyronError::remote(format!("cannot resolve baseline '{}': {}", base, e))
        })?;
        Ok(object.peel(git2::ObjectType::Commit)?.id())
    }

    /// Walk from `head` back to (but excluding) `base`, oldest first.
    fn walk_range(&self, base: Oid, head: Oid) -> Result<Vec<CommitRecord>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(head)?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            if oid == base {
                break;
            }
            let commit = self.repo.find_commit(oid)?;
            commits.push(CommitRecord {
                hash: oid.to_string(),
                message: commit.message().unwrap_or("(empty message)").to_string(),
                author: commit.author().name().unwrap_or("unknown").to_string(),
                repo: self.repo_slug.clone(),
                github_user: None,
                url: None,
                affected_folders: Vec::new(),
            });
        }

        commits.reverse();
        Ok(commits)
    }
}

impl TagBackend for LocalBackend {
    fn tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;
        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn create_tag(&self, tag: &str) -> Result<()> {
        let head = self.head_oid()?;
        let object = self.repo.find_object(head, None)?;
        self.repo
            .tag_lightweight(tag, &object, false)
            .map_err(|e| {
                if e.code() == ErrorCode::Exists {
                    NyronError::TagAlreadyExists(tag.to_string())
                } else {
                    NyronError::Git(e)
                }
            })?;
        Ok(())
    }

    fn push_tag(&self, tag: &str) -> Result<()> {
        let mut remote = self
            .repo
            .find_remote("origin")
            .map_err(|e| NyronError::remote(format!("cannot find remote 'origin': {}", e)))?;

        let mut push_options = git2::PushOptions::new();
        let mut callbacks = git2::RemoteCallbacks::new();
        callbacks.credentials(|_url, username_from_url, allowed_types| {
            if allowed_types.contains(git2::CredentialType::SSH_KEY) {
                let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let key_path = format!("{}/.ssh/{}", home, key);
                    let path = std::path::Path::new(&key_path);
                    if path.exists() {
                        if let Ok(cred) = git2::Cred::ssh_key(
                            username_from_url.unwrap_or("git"),
                            None,
                            path,
                            None,
                        ) {
                            return Ok(cred);
                        }
                    }
                }
                if let Ok(cred) =
                    git2::Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"))
                {
                    return Ok(cred);
                }
            }
            git2::Cred::default()
        });
        callbacks.push_update_reference(|refname, status| {
            if let Some(status) = status {
                Err(git2::Error::from_str(&format!(
                    "push rejected for {}: {}",
                    refname, status
                )))
            } else {
                Ok(())
            }
        });
        push_options.remote_callbacks(callbacks);

        let refspec = format!("refs/tags/{}:refs/tags/{}", tag, tag);
        remote
            .push(&[refspec.as_str()], Some(&mut push_options))
            .map_err(|e| NyronError::remote(format!("failed to push tag '{}': {}", tag, e)))?;
        Ok(())
    }

    fn has_commits(&self) -> Result<bool> {
        match self.head_oid() {
            Ok(_) => Ok(true),
            Err(NyronError::EmptyHistory(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn first_commit_hash(&self) -> Result<String> {
        let head = self.head_oid()?;
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(head)?;

        let mut root = None;
        for oid in revwalk {
            let oid = oid?;
            let commit = self.repo.find_commit(oid)?;
            if commit.parent_count() == 0 {
                root = Some(oid.to_string());
            }
        }
        root.ok_or_else(|| NyronError::EmptyHistory("no root commit found".to_string()))
    }

    fn commits_since(&self, base: &str) -> Result<Vec<CommitRecord>> {
        let base_oid = self.resolve_baseline(base)?;
        let head = self.head_oid()?;
        self.walk_range(base_oid, head)
    }

    fn commits_between(&self, base: &str, head: &str) -> Result<Vec<CommitRecord>> {
        let base_oid = self.resolve_baseline(base)?;
        let head_oid = self.resolve_baseline(head)?;
        self.walk_range(base_oid, head_oid)
    }

    fn commit_paths(&self, paths: &[&Path], message: &str) -> Result<()> {
        let workdir = self
            .repo
            .workdir()
            .ok_or_else(|| NyronError::remote("repository has no working tree"))?
            .to_path_buf();

        let mut index = self.repo.index()?;
        for path in paths {
            let relative = path.strip_prefix(&workdir).unwrap_or(path);
            index.add_path(relative)?;
        }
        index.write()?;

        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;
        let signature = self.repo.signature()?;
        let parent = self.repo.find_commit(self.head_oid()?)?;
        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &[&parent])?;
        Ok(())
    }
}

// SAFETY: LocalBackend wraps git2::Repository, which is thread-safe for the
// read and tag operations used here via libgit2's design.
unsafe impl Sync for LocalBackend {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_outside_repository_fails_gracefully() {
        let dir = tempfile::tempdir().unwrap();
        assert!(LocalBackend::open(dir.path(), "owner/repo").is_err());
    }
}
