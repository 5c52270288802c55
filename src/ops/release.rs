//! Global release notes over `nyron-release@…` markers.
//!
//! Commits since the last release marker are classified into one changelog
//! covering every package, with the "Updated packages" list derived from the
//! drift between the meta and versions ledgers.

use chrono::{DateTime, Utc};

use crate::backend::{RemoteHost, RepoId, TagBackend};
use crate::changelog::render;
use crate::config::NyronConfig;
use crate::domain::commit::{organize_for_changelog, parse_commits};
use crate::domain::tag::generate_release_tag;
use crate::error::{NyronError, Result};
use crate::resolver::TagResolver;
use crate::store::{self, Workspace};
use crate::ui;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseOptions {
    /// Print the rendered changelog instead of creating anything.
    pub dry_run: bool,
    /// Mint a fresh release marker instead of re-releasing the latest one.
    pub new_tag: bool,
}

/// Outcome of a release run.
#[derive(Debug, Clone)]
pub struct ReleaseReport {
    pub tag: String,
    pub body: String,
    pub created: bool,
}

/// Build (and optionally publish) release notes since the last release marker.
///
/// Publication goes through the explicitly passed [RemoteHost]; without one,
/// a newly minted marker is still tagged and pushed through the backend and
/// the provider release is skipped with a warning.
pub fn release(
    workspace: &Workspace,
    config: &NyronConfig,
    backend: &dyn TagBackend,
    host: Option<&dyn RemoteHost>,
    options: ReleaseOptions,
    now: DateTime<Utc>,
) -> Result<Option<ReleaseReport>> {
    let resolver = TagResolver::new(backend);
    let latest = resolver
        .latest_release_tag()?
        .ok_or_else(|| NyronError::NoPriorTag("nyron-release@".to_string()))?;
    ui::display_status(&format!("Found release tag: {}", latest));

    let commits = backend.commits_since(&latest)?;
    if commits.is_empty() {
        ui::display_warning("No commits found since last release - skipping");
        return Ok(None);
    }
    ui::display_status(&format!("Found {} commit(s)", commits.len()));

    let parsed = parse_commits(&commits);
    let organized = organize_for_changelog(&parsed);

    let meta = store::meta::read_meta(workspace)?;
    let versions = store::versions::read_versions(workspace)?;
    let updated = store::updated_versions(&meta, &versions);

    let body = render(&updated, &organized);

    if options.dry_run {
        println!("{}", body);
        ui::display_success("Dry run completed - no release was created");
        return Ok(Some(ReleaseReport {
            tag: latest,
            body,
            created: false,
        }));
    }

    let release_tag = if options.new_tag {
        let tag = generate_release_tag(now);
        backend.create_tag(&tag)?;
        backend.push_tag(&tag)?;
        ui::display_status(&format!("New release tag: {}", tag));
        tag
    } else {
        latest
    };

    let created = match host {
        Some(host) => {
            let repo = RepoId::parse(&config.repo)?;
            host.create_release(&repo, &release_tag, &release_tag, &body)?;
            ui::display_success("Release created successfully!");
            true
        }
        None => {
            ui::display_warning(
                "No remote host configured - tag pushed, provider release skipped",
            );
            false
        }
    };

    Ok(Some(ReleaseReport {
        tag: release_tag,
        body,
        created,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::config::parse_config;
    use crate::domain::CommitRecord;
    use chrono::TimeZone;
    use std::sync::Mutex;

    struct RecordingHost {
        releases: Mutex<Vec<(String, String)>>,
    }

    impl RecordingHost {
        fn new() -> Self {
            RecordingHost {
                releases: Mutex::new(Vec::new()),
            }
        }
    }

    impl RemoteHost for RecordingHost {
        fn list_tags(&self, _repo: &RepoId) -> Result<Vec<String>> {
            Ok(Vec::new())
        }
        fn create_tag(&self, _repo: &RepoId, _tag: &str) -> Result<()> {
            Ok(())
        }
        fn compare_commits(
            &self,
            _repo: &RepoId,
            _base: &str,
            _head: &str,
        ) -> Result<Vec<CommitRecord>> {
            Ok(Vec::new())
        }
        fn create_release(
            &self,
            _repo: &RepoId,
            tag: &str,
            _title: &str,
            body: &str,
        ) -> Result<()> {
            self.releases
                .lock()
                .unwrap()
                .push((tag.to_string(), body.to_string()));
            Ok(())
        }
        fn head_commit(&self, _repo: &RepoId) -> Result<Option<String>> {
            Ok(Some("head".to_string()))
        }
        fn first_commit(&self, _repo: &RepoId) -> Result<Option<String>> {
            Ok(Some("root".to_string()))
        }
    }

    fn config() -> NyronConfig {
        parse_config(
            r#"
repo = "owner/repo"

[projects.sdk]
tag-prefix = "sdk@"
path = "packages/sdk"
"#,
        )
        .unwrap()
    }

    fn setup() -> (tempfile::TempDir, Workspace, MockBackend) {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(dir.path());
        workspace.init(Utc::now()).unwrap();
        let backend = MockBackend::new();
        backend.set_first_commit("root");
        backend.add_tag("nyron-release@2024-01-15T143025.123Z");
        backend.set_commits_since(
            "nyron-release@2024-01-15T143025.123Z",
            vec![CommitRecord::new("1", "feat: new feature", "A", "owner/repo")],
        );
        (dir, workspace, backend)
    }

    #[test]
    fn test_release_requires_marker_tag() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::new(dir.path());
        ws.init(Utc::now()).unwrap();
        let backend = MockBackend::new();
        backend.set_first_commit("root");

        let err = release(
            &ws,
            &config(),
            &backend,
            None,
            ReleaseOptions::default(),
            Utc::now(),
        )
        .unwrap_err();
        assert!(matches!(err, NyronError::NoPriorTag(_)));
    }

    #[test]
    fn test_release_dry_run_renders_without_creating() {
        let (_dir, ws, backend) = setup();
        let report = release(
            &ws,
            &config(),
            &backend,
            None,
            ReleaseOptions {
                dry_run: true,
                new_tag: false,
            },
            Utc::now(),
        )
        .unwrap()
        .unwrap();

        assert!(!report.created);
        assert!(report.body.contains("new feature"));
        assert!(backend.created_tags().is_empty());
    }

    #[test]
    fn test_release_with_host_and_new_tag() {
        let (_dir, ws, backend) = setup();
        let host = RecordingHost::new();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();

        let report = release(
            &ws,
            &config(),
            &backend,
            Some(&host),
            ReleaseOptions {
                dry_run: false,
                new_tag: true,
            },
            now,
        )
        .unwrap()
        .unwrap();

        assert!(report.created);
        assert_eq!(report.tag, "nyron-release@2024-03-01T120000.000Z");
        assert_eq!(backend.created_tags(), vec![report.tag.clone()]);
        let releases = host.releases.lock().unwrap();
        assert_eq!(releases.len(), 1);
        assert_eq!(releases[0].0, report.tag);
    }
}
