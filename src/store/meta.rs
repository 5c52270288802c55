//! The meta ledger: one authoritative current-version record per package.
//!
//! `.nyron/meta.json` mirrors the package manifests and is read and written
//! as a whole document. Schema violations are fatal — a corrupted ledger is
//! never silently repaired.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;

use crate::error::{NyronError, Result};
use crate::store::Workspace;

/// Current-version record for one package prefix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaPackage {
    pub prefix: String,
    pub version: String,
}

/// The meta document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub packages: Vec<MetaPackage>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_tag: Option<String>,
}

impl Meta {
    /// Fresh, empty ledger stamped with its creation time.
    pub fn new(created_at: DateTime<Utc>) -> Self {
        Meta {
            packages: Vec::new(),
            created_at,
            latest_tag: None,
        }
    }

    /// Current version recorded for a prefix.
    pub fn version_of(&self, prefix: &str) -> Option<&str> {
        self.packages
            .iter()
            .find(|p| p.prefix == prefix)
            .map(|p| p.version.as_str())
    }

    /// All recorded prefixes, in document order.
    pub fn prefixes(&self) -> Vec<&str> {
        self.packages.iter().map(|p| p.prefix.as_str()).collect()
    }
}

/// Read and validate the meta ledger.
pub fn read_meta(workspace: &Workspace) -> Result<Meta> {
    let path = workspace.meta_path();
    let raw = fs::read_to_string(&path)
        .map_err(|e| NyronError::corrupt_ledger(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw)
        .map_err(|e| NyronError::corrupt_ledger(format!("{}: {}", path.display(), e)))
}

/// Write the whole meta document (2-space JSON, trailing newline).
pub fn write_meta(workspace: &Workspace, meta: &Meta) -> Result<()> {
    let mut content = serde_json::to_string_pretty(meta)?;
    content.push('\n');
    fs::write(workspace.meta_path(), content)?;
    Ok(())
}

/// Set the recorded version of a prefix, adding the record when missing.
pub fn set_package_version(workspace: &Workspace, prefix: &str, version: &str) -> Result<()> {
    let mut meta = read_meta(workspace)?;
    match meta.packages.iter_mut().find(|p| p.prefix == prefix) {
        Some(package) => package.version = version.to_string(),
        None => meta.packages.push(MetaPackage {
            prefix: prefix.to_string(),
            version: version.to_string(),
        }),
    }
    write_meta(workspace, &meta)
}

/// Add a new package record.
pub fn add_package(workspace: &Workspace, prefix: &str, version: &str) -> Result<()> {
    let mut meta = read_meta(workspace)?;
    meta.packages.push(MetaPackage {
        prefix: prefix.to_string(),
        version: version.to_string(),
    });
    write_meta(workspace, &meta)
}

/// Remove a package record. Removing an absent prefix is a no-op.
pub fn remove_package(workspace: &Workspace, prefix: &str) -> Result<()> {
    let mut meta = read_meta(workspace)?;
    meta.packages.retain(|p| p.prefix != prefix);
    write_meta(workspace, &meta)
}

/// Record the most recent global release tag.
pub fn set_latest_tag(workspace: &Workspace, tag: &str) -> Result<()> {
    let mut meta = read_meta(workspace)?;
    meta.latest_tag = Some(tag.to_string());
    write_meta(workspace, &meta)
}
