//! Changelog rendering and persistence.
//!
//! Rendering is a pure function over a fixed template; writing computes a
//! deterministic per-package path under the workspace and overwrites any
//! existing file there, so changelog generation is idempotent per
//! (prefix, version) pair.

use std::fs;
use std::path::PathBuf;

use crate::domain::Organized;
use crate::error::Result;
use crate::store::Workspace;
use crate::ui;

/// Render the changelog markdown for a set of updated packages.
///
/// A section is omitted entirely when its list is empty — never rendered as a
/// header with no items.
pub fn render(versions: &[String], organized: &Organized) -> String {
    let mut out = String::from("# Changelog release notes\n\n## Updated packages\n\n");

    for version in versions {
        out.push_str(&format!("- {}\n", version));
    }

    if !organized.features.is_empty() {
        out.push_str("\n### ✨ Features\n");
        for line in &organized.features {
            out.push_str(&format!("- {}\n", line));
        }
    }

    if !organized.fixes.is_empty() {
        out.push_str("\n### 🐛 Fixes\n");
        for line in &organized.fixes {
            out.push_str(&format!("- {}\n", line));
        }
    }

    if !organized.chores.is_empty() {
        out.push_str("\n### 🧹 Chores\n");
        for line in &organized.chores {
            out.push_str(&format!("- {}\n", line));
        }
    }

    out
}

/// Replace the characters that are unsafe in file names (`@`, `/`) with `_`.
pub fn sanitize(component: &str) -> String {
    component.replace(['@', '/'], "_")
}

/// Deterministic changelog location for a (prefix, version) pair:
/// `.nyron/changelog/<sanitized-prefix>/CHANGELOG-<sanitized-prefix>-<sanitized-version>.md`
pub fn changelog_path(workspace: &Workspace, prefix: &str, version: &str) -> PathBuf {
    let prefix_part = sanitize(prefix);
    workspace.changelog_dir().join(&prefix_part).join(format!(
        "CHANGELOG-{}-{}.md",
        prefix_part,
        sanitize(version)
    ))
}

/// Write the changelog for a package version, creating intermediate
/// directories and logging when an existing file is overwritten.
pub fn write_changelog(
    workspace: &Workspace,
    prefix: &str,
    version: &str,
    organized: &Organized,
) -> Result<PathBuf> {
    let versions = vec![format!("{}{}", prefix, version)];
    let content = render(&versions, organized);

    let path = changelog_path(workspace, prefix, version);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    if path.exists() {
        ui::display_warning(&format!(
            "Overwriting existing changelog: {}",
            path.display()
        ));
    }

    fs::write(&path, content)?;
    Ok(path)
}
