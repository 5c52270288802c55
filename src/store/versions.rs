//! The versions ledger: append-only version history per package.
//!
//! Where meta records a single current value, `.nyron/versions.json` records
//! every version a package has ever been bumped to. Bumps append; nothing
//! overwrites an existing history entry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;

use crate::error::{NyronError, Result};
use crate::store::Workspace;

/// One recorded version of a package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageInfo {
    pub prefix: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_published: Option<DateTime<Utc>>,
}

/// The versions document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Versions {
    pub created_at: DateTime<Utc>,
    pub packages: BTreeMap<String, Vec<PackageInfo>>,
}

impl Versions {
    /// Fresh, empty ledger stamped with its creation time.
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Versions {
            created_at,
            packages: BTreeMap::new(),
        }
    }

    /// Most recent history entry for a prefix.
    pub fn latest_of(&self, prefix: &str) -> Option<&PackageInfo> {
        self.packages.get(prefix).and_then(|history| history.last())
    }

    /// All recorded prefixes.
    pub fn prefixes(&self) -> Vec<&str> {
        self.packages.keys().map(|k| k.as_str()).collect()
    }
}

/// Read and validate the versions ledger.
pub fn read_versions(workspace: &Workspace) -> Result<Versions> {
    let path = workspace.versions_path();
    let raw = fs::read_to_string(&path)
        .map_err(|e| NyronError::corrupt_ledger(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw)
        .map_err(|e| NyronError::corrupt_ledger(format!("{}: {}", path.display(), e)))
}

/// Write the whole versions document (2-space JSON, trailing newline).
pub fn write_versions(workspace: &Workspace, versions: &Versions) -> Result<()> {
    let mut content = serde_json::to_string_pretty(versions)?;
    content.push('\n');
    fs::write(workspace.versions_path(), content)?;
    Ok(())
}

/// Append a history entry for a prefix, initializing the history on first use.
pub fn append_package_version(workspace: &Workspace, info: PackageInfo) -> Result<()> {
    let mut versions = read_versions(workspace)?;
    versions
        .packages
        .entry(info.prefix.clone())
        .or_default()
        .push(info);
    write_versions(workspace, &versions)
}

/// Remove a package's entire history. Removing an absent prefix is a no-op.
pub fn remove_package(workspace: &Workspace, prefix: &str) -> Result<()> {
    let mut versions = read_versions(workspace)?;
    versions.packages.remove(prefix);
    write_versions(workspace, &versions)
}
