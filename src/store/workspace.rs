use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// The `.nyron/` state directory of a repository.
///
/// Carries the workspace root explicitly — nothing in the store reads the
/// process working directory, which keeps every operation addressable from
/// tests and from commands run in subdirectories.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Workspace rooted at an explicit directory.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Workspace {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Workspace rooted at the current directory.
    pub fn discover() -> Result<Self> {
        Ok(Workspace::new(std::env::current_dir()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn nyron_dir(&self) -> PathBuf {
        self.root.join(".nyron")
    }

    pub fn meta_path(&self) -> PathBuf {
        self.nyron_dir().join("meta.json")
    }

    pub fn versions_path(&self) -> PathBuf {
        self.nyron_dir().join("versions.json")
    }

    pub fn changelog_dir(&self) -> PathBuf {
        self.nyron_dir().join("changelog")
    }

    /// Resolve a project path relative to the workspace root.
    pub fn project_dir(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Are the directory structure and both ledgers present?
    pub fn is_initialized(&self) -> bool {
        self.nyron_dir().is_dir()
            && self.changelog_dir().is_dir()
            && self.meta_path().is_file()
            && self.versions_path().is_file()
    }

    /// Create the `.nyron/` structure and empty ledgers.
    ///
    /// Idempotent: existing directories and ledgers are left untouched, so
    /// repeated init calls never lose state.
    pub fn init(&self, now: DateTime<Utc>) -> Result<()> {
        if self.is_initialized() {
            return Ok(());
        }

        fs::create_dir_all(self.changelog_dir())?;

        if !self.meta_path().is_file() {
            super::meta::write_meta(self, &super::meta::Meta::new(now))?;
        }
        if !self.versions_path().is_file() {
            super::versions::write_versions(self, &super::versions::Versions::new(now))?;
        }
        Ok(())
    }
}
