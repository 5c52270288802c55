//! The version-bump transaction.
//!
//! Four phases with an explicit current state and a transition log, so a
//! partial failure (changelog committed but tag push failed) is queryable
//! from the report instead of only inferable from console output:
//!
//! `Validating → ChangelogGenerated → ChangelogCommitted → Executed`,
//! with `Failed` reachable from any state.

use std::path::PathBuf;

use crate::backend::TagBackend;
use crate::changelog;
use crate::config::NyronConfig;
use crate::domain::commit::{filter_meta_commits, organize_for_changelog, parse_commits};
use crate::domain::semver::{bump_version, BumpType};
use crate::domain::tag::{build_tag, parse_tag};
use crate::domain::CommitRecord;
use crate::error::{NyronError, Result};
use crate::manifest;
use crate::resolver::TagResolver;
use crate::store::{self, Workspace};
use crate::ui;

/// Named state of a bump transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpPhase {
    Validating,
    ChangelogGenerated,
    ChangelogCommitted,
    Executed,
    Failed,
}

/// Everything Validate resolves, threaded read-only through later phases.
#[derive(Debug, Clone)]
pub struct BumpContext {
    pub tag_prefix: String,
    pub path: String,
    pub last_tag: String,
    pub real_commits: Vec<CommitRecord>,
    pub new_version: String,
    pub full_tag: String,
    pub package_path: PathBuf,
}

/// Outcome of a completed bump.
#[derive(Debug, Clone)]
pub struct BumpReport {
    pub prefix: String,
    pub new_version: String,
    pub full_tag: String,
    pub changelog_path: Option<PathBuf>,
    pub transitions: Vec<String>,
}

/// The bump transaction state machine.
pub struct BumpTransaction<'a> {
    config: &'a NyronConfig,
    workspace: &'a Workspace,
    backend: &'a dyn TagBackend,
    phase: BumpPhase,
    transitions: Vec<String>,
}

impl<'a> BumpTransaction<'a> {
    pub fn new(
        config: &'a NyronConfig,
        workspace: &'a Workspace,
        backend: &'a dyn TagBackend,
    ) -> Self {
        BumpTransaction {
            config,
            workspace,
            backend,
            phase: BumpPhase::Validating,
            transitions: Vec::new(),
        }
    }

    pub fn phase(&self) -> BumpPhase {
        self.phase
    }

    pub fn transitions(&self) -> &[String] {
        &self.transitions
    }

    fn transition(&mut self, phase: BumpPhase, note: impl Into<String>) {
        self.phase = phase;
        self.transitions.push(note.into());
    }

    fn fail(&mut self, err: NyronError) -> NyronError {
        self.transition(BumpPhase::Failed, format!("failed: {}", err));
        err
    }

    /// Phase 1: pure checks, no side effects.
    ///
    /// Repeatable by construction — two calls with no state change in between
    /// resolve the same context.
    pub fn validate(&self, prefix: &str, bump: BumpType) -> Result<BumpContext> {
        let (_, project) = self
            .config
            .project_by_prefix(prefix)
            .ok_or_else(|| NyronError::ProjectNotFound(prefix.to_string()))?;

        let resolver = TagResolver::new(self.backend);
        let last_tag = resolver
            .latest_tag(prefix)?
            .ok_or_else(|| NyronError::NoPriorTag(prefix.to_string()))?;

        let real_commits = real_commits_since(self.backend, &last_tag)?;

        let package_path = self.workspace.project_dir(&project.path);
        manifest::read_semver_version(&package_path)?;

        let last_parts = parse_tag(&last_tag)?.ok_or_else(|| {
            NyronError::invalid_version(format!("tag '{}' has no version component", last_tag))
        })?;
        let new_version = bump_version(&last_parts.version, bump)?;
        let full_tag = build_tag(prefix, &new_version)?;

        if resolver.tag_exists(&full_tag)? {
            return Err(NyronError::TagAlreadyExists(full_tag));
        }

        Ok(BumpContext {
            tag_prefix: prefix.to_string(),
            path: project.path.clone(),
            last_tag,
            real_commits,
            new_version,
            full_tag,
            package_path,
        })
    }

    /// Phase 2: write the changelog for the version being created.
    fn generate_changelog(&self, ctx: &BumpContext) -> Result<PathBuf> {
        let parsed = parse_commits(&ctx.real_commits);
        let organized = organize_for_changelog(&parsed);
        changelog::write_changelog(self.workspace, &ctx.tag_prefix, &ctx.new_version, &organized)
    }

    /// Phase 4: tag, push, reconcile ledgers, patch the manifest.
    fn execute(&self, ctx: &BumpContext) -> Result<()> {
        let resolver = TagResolver::new(self.backend);
        resolver.create_tag(&ctx.tag_prefix, &ctx.new_version)?;
        resolver.push_tag(&ctx.full_tag)?;

        store::meta::set_package_version(self.workspace, &ctx.tag_prefix, &ctx.new_version)?;
        store::versions::append_package_version(
            self.workspace,
            store::PackageInfo {
                prefix: ctx.tag_prefix.clone(),
                version: ctx.new_version.clone(),
                last_published: None,
            },
        )?;

        // Manifest write happens last: once the tag is durably pushed, the
        // manifest must catch up, never the other way around.
        manifest::write_version(&ctx.package_path, &ctx.new_version)?;
        Ok(())
    }

    /// Drive the whole transaction.
    pub fn run(&mut self, prefix: &str, bump: BumpType) -> Result<BumpReport> {
        self.transition(BumpPhase::Validating, format!("validating {} bump of '{}'", bump, prefix));
        let ctx = match self.validate(prefix, bump) {
            Ok(ctx) => ctx,
            Err(e) => return Err(self.fail(e)),
        };

        let changelog_path = if self.config.auto_changelog {
            let path = match self.generate_changelog(&ctx) {
                Ok(path) => path,
                Err(e) => return Err(self.fail(e)),
            };
            self.transition(
                BumpPhase::ChangelogGenerated,
                format!("changelog written to {}", path.display()),
            );

            let message = format!("chore(release): update changelog for {}", ctx.full_tag);
            match self.backend.commit_paths(&[path.as_path()], &message) {
                Ok(()) => {
                    self.transition(BumpPhase::ChangelogCommitted, "changelog committed");
                }
                Err(e) => {
                    // The changelog already exists on disk; losing the commit
                    // is not worth aborting a half-done release.
                    ui::display_warning(&format!(
                        "changelog commit failed, continuing: {}",
                        e
                    ));
                    self.transitions
                        .push(format!("changelog commit skipped: {}", e));
                }
            }
            Some(path)
        } else {
            self.transitions
                .push("changelog skipped (auto-changelog disabled)".to_string());
            None
        };

        if let Err(e) = self.execute(&ctx) {
            return Err(self.fail(e));
        }
        self.transition(
            BumpPhase::Executed,
            format!("{} -> {}", ctx.last_tag, ctx.full_tag),
        );
        ui::display_success(&format!(
            "Bumped {} from {} to {}",
            ctx.tag_prefix, ctx.last_tag, ctx.full_tag
        ));

        Ok(BumpReport {
            prefix: ctx.tag_prefix,
            new_version: ctx.new_version,
            full_tag: ctx.full_tag,
            changelog_path,
            transitions: self.transitions.clone(),
        })
    }
}

/// Commits since a baseline with the engine's own commits filtered out.
///
/// Fails with distinct conditions for "nothing at all" and "nothing left
/// after filtering" — callers and users need to tell those apart.
pub fn real_commits_since(
    backend: &dyn TagBackend,
    last_tag: &str,
) -> Result<Vec<CommitRecord>> {
    let commits_since = backend.commits_since(last_tag)?;
    if commits_since.is_empty() {
        return Err(NyronError::NoCommits(last_tag.to_string()));
    }

    let real_commits = filter_meta_commits(&commits_since);
    if real_commits.is_empty() {
        return Err(NyronError::OnlyMetaCommits(last_tag.to_string()));
    }

    let filtered = commits_since.len() - real_commits.len();
    if filtered > 0 {
        ui::display_status(&format!(
            "Found {} commit(s) since {} (filtered {} meta commit(s))",
            real_commits.len(),
            last_tag,
            filtered
        ));
    }
    Ok(real_commits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::config::parse_config;
    use chrono::Utc;

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
        manifest::create_manifest(&workspace.project_dir("packages/sdk"), "sdk", "0.0.1").unwrap();

        let backend = MockBackend::new();
        backend.set_first_commit("roothash");
        backend.add_tag("sdk@0.0.1");
        backend.set_commits_since(
            "sdk@0.0.1",
            vec![
                CommitRecord::new("a1", "feat: X", "A", "owner/repo"),
                CommitRecord::new("b2", "fix: Y", "B", "owner/repo"),
                CommitRecord::new("c3", "chore: bump version to 0.0.1", "B", "owner/repo"),
            ],
        );
        (dir, workspace, backend)
    }

    #[test]
    fn test_validate_resolves_context() {
        let (_dir, ws, backend) = setup();
        let cfg = config();
        let tx = BumpTransaction::new(&cfg, &ws, &backend);

        let ctx = tx.validate("sdk@", BumpType::Patch).unwrap();
        assert_eq!(ctx.last_tag, "sdk@0.0.1");
        assert_eq!(ctx.new_version, "0.0.2");
        assert_eq!(ctx.full_tag, "sdk@0.0.2");
        assert_eq!(ctx.real_commits.len(), 2);
    }

    #[test]
    fn test_validate_is_repeatable() {
        let (_dir, ws, backend) = setup();
        let cfg = config();
        let tx = BumpTransaction::new(&cfg, &ws, &backend);

        let first = tx.validate("sdk@", BumpType::Patch).unwrap();
        let second = tx.validate("sdk@", BumpType::Patch).unwrap();
        assert_eq!(first.new_version, second.new_version);
        assert_eq!(first.full_tag, second.full_tag);
        // Validation performed no side effects.
        assert!(backend.created_tags().is_empty());
        assert!(backend.pushed_tags().is_empty());
    }

    #[test]
    fn test_validate_unknown_project() {
        let (_dir, ws, backend) = setup();
        let cfg = config();
        let tx = BumpTransaction::new(&cfg, &ws, &backend);
        let err = tx.validate("cli@", BumpType::Patch).unwrap_err();
        assert!(matches!(err, NyronError::ProjectNotFound(_)));
    }

    #[test]
    fn test_validate_no_commits_vs_only_meta() {
        let (_dir, ws, backend) = setup();
        let cfg = config();

        backend.set_commits_since("sdk@0.0.1", vec![]);
        let tx = BumpTransaction::new(&cfg, &ws, &backend);
        assert!(matches!(
            tx.validate("sdk@", BumpType::Patch).unwrap_err(),
            NyronError::NoCommits(_)
        ));

        backend.set_commits_since(
            "sdk@0.0.1",
            vec![CommitRecord::new(
                "c3",
                "chore: bump version to 0.0.1",
                "B",
                "owner/repo",
            )],
        );
        assert!(matches!(
            tx.validate("sdk@", BumpType::Patch).unwrap_err(),
            NyronError::OnlyMetaCommits(_)
        ));
    }

    #[test]
    fn test_validate_rejects_raced_target_tag() {
        let (_dir, ws, backend) = setup();
        let cfg = config();
        // The target tag exists on the backend but is invisible to listing
        // (raced in remotely); creation must still refuse to overwrite.
        backend.add_unlisted_tag("sdk@0.0.2");
        let mut tx = BumpTransaction::new(&cfg, &ws, &backend);
        assert!(matches!(
            tx.run("sdk@", BumpType::Patch).unwrap_err(),
            NyronError::TagAlreadyExists(_)
        ));
        assert_eq!(tx.phase(), BumpPhase::Failed);
    }

    #[test]
    fn test_validate_requires_readable_manifest() {
        let (_dir, ws, backend) = setup();
        let cfg = config();
        std::fs::write(
            ws.project_dir("packages/sdk").join("package.json"),
            "{\"name\": \"sdk\"}",
        )
        .unwrap();
        let tx = BumpTransaction::new(&cfg, &ws, &backend);
        assert!(matches!(
            tx.validate("sdk@", BumpType::Patch).unwrap_err(),
            NyronError::InvalidManifest(_)
        ));
    }

    #[test]
    fn test_run_full_transaction() {
        let (_dir, ws, backend) = setup();
        let cfg = config();
        let mut tx = BumpTransaction::new(&cfg, &ws, &backend);

        let report = tx.run("sdk@", BumpType::Patch).unwrap();
        assert_eq!(tx.phase(), BumpPhase::Executed);
        assert_eq!(report.new_version, "0.0.2");
        assert_eq!(report.full_tag, "sdk@0.0.2");

        // Tag created and pushed.
        assert_eq!(backend.created_tags(), vec!["sdk@0.0.2".to_string()]);
        assert_eq!(backend.pushed_tags(), vec!["sdk@0.0.2".to_string()]);

        // Changelog written under the new version and committed with the
        // fixed conventional message.
        let path = report.changelog_path.unwrap();
        assert!(path.ends_with(".nyron/changelog/sdk_/CHANGELOG-sdk_-0.0.2.md"));
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("X (A)"));
        assert!(content.contains("Y (B)"));
        assert_eq!(
            backend.commit_messages(),
            vec!["chore(release): update changelog for sdk@0.0.2".to_string()]
        );

        // Ledgers and manifest reconciled.
        let meta = store::meta::read_meta(&ws).unwrap();
        assert_eq!(meta.version_of("sdk@"), Some("0.0.2"));
        let versions = store::versions::read_versions(&ws).unwrap();
        assert_eq!(versions.latest_of("sdk@").unwrap().version, "0.0.2");
        assert_eq!(
            manifest::read_version(&ws.project_dir("packages/sdk")).unwrap(),
            "0.0.2"
        );
    }

    #[test]
    fn test_run_changelog_commit_failure_is_non_fatal() {
        let (_dir, ws, backend) = setup();
        let cfg = config();
        backend.fail_commit_paths();
        let mut tx = BumpTransaction::new(&cfg, &ws, &backend);

        let report = tx.run("sdk@", BumpType::Patch).unwrap();
        assert_eq!(tx.phase(), BumpPhase::Executed);
        assert!(report
            .transitions
            .iter()
            .any(|t| t.contains("changelog commit skipped")));
        assert_eq!(backend.pushed_tags(), vec!["sdk@0.0.2".to_string()]);
    }

    #[test]
    fn test_run_push_failure_is_fatal() {
        let (_dir, ws, backend) = setup();
        let cfg = config();
        backend.fail_push();
        let mut tx = BumpTransaction::new(&cfg, &ws, &backend);

        let err = tx.run("sdk@", BumpType::Patch).unwrap_err();
        assert!(matches!(err, NyronError::Remote(_)));
        assert_eq!(tx.phase(), BumpPhase::Failed);
        // Manifest untouched after the fatal phase-4 error.
        assert_eq!(
            manifest::read_version(&ws.project_dir("packages/sdk")).unwrap(),
            "0.0.1"
        );
    }

    #[test]
    fn test_run_validation_failure_has_no_side_effects() {
        let (_dir, ws, backend) = setup();
        let cfg = config();
        backend.set_commits_since("sdk@0.0.1", vec![]);
        let mut tx = BumpTransaction::new(&cfg, &ws, &backend);

        assert!(tx.run("sdk@", BumpType::Patch).is_err());
        assert_eq!(tx.phase(), BumpPhase::Failed);
        assert!(backend.created_tags().is_empty());
        assert!(!ws.changelog_dir().join("sdk_").exists());
    }

    #[test]
    fn test_run_respects_auto_changelog_flag() {
        let (_dir, ws, backend) = setup();
        let mut cfg = config();
        cfg.auto_changelog = false;
        let mut tx = BumpTransaction::new(&cfg, &ws, &backend);

        let report = tx.run("sdk@", BumpType::Patch).unwrap();
        assert!(report.changelog_path.is_none());
        assert!(backend.commit_messages().is_empty());
        assert_eq!(backend.pushed_tags(), vec!["sdk@0.0.2".to_string()]);
    }

    #[test]
    fn test_prerelease_bump_enters_beta_channel() {
        let (_dir, ws, backend) = setup();
        let cfg = config();
        let tx = BumpTransaction::new(&cfg, &ws, &backend);
        let ctx = tx.validate("sdk@", BumpType::Prerelease).unwrap();
        assert_eq!(ctx.new_version, "0.0.2-beta.0");
        assert_eq!(ctx.full_tag, "sdk@0.0.2-beta.0");
    }
}
