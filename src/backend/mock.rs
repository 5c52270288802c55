use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::backend::TagBackend;
use crate::domain::CommitRecord;
use crate::error::{NyronError, Result};

/// Mock backend for testing without git or network access.
///
/// Records every mutation (created tags, pushed tags, workspace commits) so
/// tests can assert on what the engine actually did. Failure of `push_tag`
/// and `commit_paths` can be toggled to exercise the orchestrator's
/// fatal/non-fatal error paths.
pub struct MockBackend {
    state: Mutex<MockState>,
}

#[derive(Default)]
struct MockState {
    tags: Vec<String>,
    unlisted_tags: Vec<String>,
    commits_by_base: HashMap<String, Vec<CommitRecord>>,
    first_commit: Option<String>,
    created_tags: Vec<String>,
    pushed_tags: Vec<String>,
    commits_made: Vec<(Vec<PathBuf>, String)>,
    fail_push: bool,
    fail_commit_paths: bool,
}

impl MockBackend {
    /// Create an empty mock repository.
    pub fn new() -> Self {
        MockBackend {
            state: Mutex::new(MockState::default()),
        }
    }

    /// Add a pre-existing tag.
    pub fn add_tag(&self, name: impl Into<String>) {
        self.state.lock().unwrap().tags.push(name.into());
    }

    /// Add a tag that `tags()` does not report but that collides on create.
    ///
    /// Models a tag racing in on the remote between listing and creation.
    pub fn add_unlisted_tag(&self, name: impl Into<String>) {
        self.state.lock().unwrap().unlisted_tags.push(name.into());
    }

    /// Register the commits returned for a given baseline.
    pub fn set_commits_since(&self, base: impl Into<String>, commits: Vec<CommitRecord>) {
        self.state
            .lock()
            .unwrap()
            .commits_by_base
            .insert(base.into(), commits);
    }

    /// Mark the repository as having history rooted at `hash`.
    pub fn set_first_commit(&self, hash: impl Into<String>) {
        self.state.lock().unwrap().first_commit = Some(hash.into());
    }

    /// Make `push_tag` fail.
    pub fn fail_push(&self) {
        self.state.lock().unwrap().fail_push = true;
    }

    /// Make `commit_paths` fail.
    pub fn fail_commit_paths(&self) {
        self.state.lock().unwrap().fail_commit_paths = true;
    }

    /// Tags created through the backend, in order.
    pub fn created_tags(&self) -> Vec<String> {
        self.state.lock().unwrap().created_tags.clone()
    }

    /// Tags pushed through the backend, in order.
    pub fn pushed_tags(&self) -> Vec<String> {
        self.state.lock().unwrap().pushed_tags.clone()
    }

    /// Messages of commits made through the backend.
    pub fn commit_messages(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .commits_made
            .iter()
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Paths staged by the most recent workspace commit.
    pub fn last_committed_paths(&self) -> Vec<PathBuf> {
        self.state
            .lock()
            .unwrap()
            .commits_made
            .last()
            .map(|(paths, _)| paths.clone())
            .unwrap_or_default()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl TagBackend for MockBackend {
    fn tags(&self) -> Result<Vec<String>> {
        let state = self.state.lock().unwrap();
        let mut all = state.tags.clone();
        all.extend(state.created_tags.iter().cloned());
        Ok(all)
    }

    fn create_tag(&self, tag: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.first_commit.is_none() {
            return Err(NyronError::EmptyHistory("mock repository".to_string()));
        }
        if state.tags.iter().any(|t| t == tag)
            || state.unlisted_tags.iter().any(|t| t == tag)
            || state.created_tags.iter().any(|t| t == tag)
        {
            return Err(NyronError::TagAlreadyExists(tag.to_string()));
        }
        state.created_tags.push(tag.to_string());
        Ok(())
    }

    fn push_tag(&self, tag: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_push {
            return Err(NyronError::remote("mock push failure"));
        }
        state.pushed_tags.push(tag.to_string());
        Ok(())
    }

    fn has_commits(&self) -> Result<bool> {
        Ok(self.state.lock().unwrap().first_commit.is_some())
    }

    fn first_commit_hash(&self) -> Result<String> {
        self.state
            .lock()
            .unwrap()
            .first_commit
            .clone()
            .ok_or_else(|| NyronError::EmptyHistory("mock repository".to_string()))
    }

    fn commits_since(&self, base: &str) -> Result<Vec<CommitRecord>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .commits_by_base
            .get(base)
            .cloned()
            .unwrap_or_default())
    }

    fn commits_between(&self, base: &str, _head: &str) -> Result<Vec<CommitRecord>> {
        self.commits_since(base)
    }

    fn commit_paths(&self, paths: &[&Path], message: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_commit_paths {
            return Err(NyronError::remote("mock commit failure"));
        }
        state
            .commits_made
            .push((paths.iter().map(|p| p.to_path_buf()).collect(), message.to_string()));
        Ok(())
    }
}
