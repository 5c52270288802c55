//! Tag resolution: latest/previous release tags per prefix, ordered by
//! semantic version — never by list position or tag-creation time.
//!
//! The ordering algorithm lives here, once, and runs against any
//! [TagBackend]; the global `nyron-release` markers are the one exception,
//! ordered by their embedded timestamp because they are not project-scoped
//! semantic versions.

use chrono::{DateTime, Utc};
use semver::Version;

use crate::backend::TagBackend;
use crate::domain::tag::{build_tag, parse_release_tag};
use crate::error::{NyronError, Result};
use crate::ui;

/// Semver-aware tag resolution over a backend.
pub struct TagResolver<'a> {
    backend: &'a dyn TagBackend,
}

impl<'a> TagResolver<'a> {
    pub fn new(backend: &'a dyn TagBackend) -> Self {
        TagResolver { backend }
    }

    /// All tags matching the prefix, unordered and unfiltered.
    pub fn tags(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self
            .backend
            .tags()?
            .into_iter()
            .filter(|t| t.starts_with(prefix))
            .collect())
    }

    /// Prefix tags whose suffix is valid semver strictly greater than 0.0.0,
    /// sorted ascending by version.
    ///
    /// The baseline guard drops malformed or unrelated tags that merely share
    /// a prefix.
    fn ordered_versions(&self, prefix: &str) -> Result<Vec<(Version, String)>> {
        let baseline = Version::new(0, 0, 0);
        let mut versions: Vec<(Version, String)> = self
            .tags(prefix)?
            .into_iter()
            .filter_map(|tag| {
                let suffix = &tag[prefix.len()..];
                match Version::parse(suffix) {
                    Ok(v) if v > baseline => Some((v, tag)),
                    _ => None,
                }
            })
            .collect();
        versions.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(versions)
    }

    /// The highest release tag for a prefix, by semver comparison.
    pub fn latest_tag(&self, prefix: &str) -> Result<Option<String>> {
        Ok(self
            .ordered_versions(prefix)?
            .pop()
            .map(|(_, tag)| tag))
    }

    /// The second-highest release tag for a prefix.
    ///
    /// With fewer than two tags the repository's first commit hash is
    /// substituted as a synthetic baseline for commit-range queries; the
    /// substitution is logged, not an error.
    pub fn previous_tag(&self, prefix: &str) -> Result<Option<String>> {
        let mut versions = self.ordered_versions(prefix)?;
        versions.pop();
        if let Some((_, tag)) = versions.pop() {
            return Ok(Some(tag));
        }

        match self.backend.first_commit_hash() {
            Ok(hash) => {
                ui::display_status("No previous tag found. Using first commit as baseline.");
                Ok(Some(hash))
            }
            Err(e) => {
                ui::display_warning(&e.to_string());
                Ok(None)
            }
        }
    }

    /// Exact-name existence check.
    pub fn tag_exists(&self, tag: &str) -> Result<bool> {
        Ok(self.backend.tags()?.iter().any(|t| t == tag))
    }

    /// Build and create `<prefix><version>` at the backend's head.
    ///
    /// Fails fast with a distinguishable error when the backend has no
    /// commits at all — an empty history cannot be tagged.
    pub fn create_tag(&self, prefix: &str, version: &str) -> Result<String> {
        let tag = build_tag(prefix, version)?;
        if !self.backend.has_commits()? {
            return Err(NyronError::EmptyHistory(
                "cannot create a tag before the first commit".to_string(),
            ));
        }
        self.backend.create_tag(&tag)?;
        Ok(tag)
    }

    /// Publish a tag through the backend.
    pub fn push_tag(&self, tag: &str) -> Result<()> {
        self.backend.push_tag(tag)
    }

    /// Global release markers with their embedded timestamps, ascending.
    fn ordered_release_tags(&self) -> Result<Vec<(DateTime<Utc>, String)>> {
        let mut stamps: Vec<(DateTime<Utc>, String)> = self
            .backend
            .tags()?
            .into_iter()
            .filter_map(|tag| parse_release_tag(&tag).map(|date| (date, tag)))
            .collect();
        stamps.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(stamps)
    }

    /// Most recent `nyron-release@…` marker, by embedded timestamp.
    pub fn latest_release_tag(&self) -> Result<Option<String>> {
        Ok(self.ordered_release_tags()?.pop().map(|(_, tag)| tag))
    }

    /// Second most recent `nyron-release@…` marker.
    pub fn previous_release_tag(&self) -> Result<Option<String>> {
        let mut stamps = self.ordered_release_tags()?;
        stamps.pop();
        Ok(stamps.pop().map(|(_, tag)| tag))
    }
}
