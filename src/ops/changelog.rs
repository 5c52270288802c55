//! Regenerate the changelog between the two most recent release tags of a
//! project.
//!
//! Used to rebuild a changelog after the fact; the bump transaction writes
//! its own changelog as part of phase 2.

use std::path::PathBuf;

use crate::backend::TagBackend;
use crate::changelog::write_changelog;
use crate::domain::commit::{organize_for_changelog, parse_commits};
use crate::domain::tag::parse_tag;
use crate::error::Result;
use crate::resolver::TagResolver;
use crate::store::Workspace;
use crate::ui;

/// Generate the changelog for the span `previous tag .. latest tag`.
///
/// Missing tags and empty commit ranges warn and return `None` rather than
/// erroring — there is simply nothing to document yet.
pub fn changelog(
    workspace: &Workspace,
    backend: &dyn TagBackend,
    prefix: &str,
) -> Result<Option<PathBuf>> {
    let resolver = TagResolver::new(backend);

    let latest = match resolver.latest_tag(prefix)? {
        Some(tag) => tag,
        None => {
            ui::display_warning(&format!("No tag found for {}", prefix));
            ui::display_hint("Create a tag with: nyron tag --prefix <prefix> --version <version>");
            return Ok(None);
        }
    };

    let previous = match resolver.previous_tag(prefix)? {
        Some(baseline) => baseline,
        None => {
            ui::display_warning(&format!("No previous tag found for {}", prefix));
            return Ok(None);
        }
    };

    ui::display_status(&format!(
        "Generating changelog from {} to {}",
        previous, latest
    ));

    let commits = backend.commits_between(&previous, &latest)?;
    if commits.is_empty() {
        ui::display_warning("No commits found between tags");
        return Ok(None);
    }

    let parsed = parse_commits(&commits);
    let organized = organize_for_changelog(&parsed);

    let parts = match parse_tag(&latest)? {
        Some(parts) => parts,
        None => {
            ui::display_warning(&format!("Could not parse version from tag: {}", latest));
            return Ok(None);
        }
    };

    let path = write_changelog(workspace, prefix, &parts.version, &organized)?;
    ui::display_success(&format!("Changelog written to: {}", path.display()));
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::domain::CommitRecord;
    use chrono::Utc;

    fn setup() -> (tempfile::TempDir, Workspace, MockBackend) {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(dir.path());
        workspace.init(Utc::now()).unwrap();
        let backend = MockBackend::new();
        backend.set_first_commit("root");
        (dir, workspace, backend)
    }

    #[test]
    fn test_changelog_between_two_tags() {
        let (_dir, ws, backend) = setup();
        backend.add_tag("sdk@1.1.0");
        backend.add_tag("sdk@1.2.0");
        backend.set_commits_since(
            "sdk@1.1.0",
            vec![
                CommitRecord::new("1", "feat(ui): add button", "A", "o/r"),
                CommitRecord::new("2", "fix(api): fix endpoint", "B", "o/r"),
            ],
        );

        let path = changelog(&ws, &backend, "sdk@").unwrap().unwrap();
        assert!(path.ends_with(".nyron/changelog/sdk_/CHANGELOG-sdk_-1.2.0.md"));
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("**ui**: add button"));
        assert!(content.contains("**api**: fix endpoint"));
    }

    #[test]
    fn test_changelog_without_tags_is_none() {
        let (_dir, ws, backend) = setup();
        assert!(changelog(&ws, &backend, "sdk@").unwrap().is_none());
    }

    #[test]
    fn test_changelog_without_commits_is_none() {
        let (_dir, ws, backend) = setup();
        backend.add_tag("sdk@1.1.0");
        backend.add_tag("sdk@1.2.0");
        assert!(changelog(&ws, &backend, "sdk@").unwrap().is_none());
    }
}
