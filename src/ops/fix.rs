//! Consistency auditor: cross-checks config, ledgers, and manifests, then
//! repairs drift.
//!
//! Detection is read-only and never treats drift as an error — drift is data.
//! Safe repairs (ledger orphans/gaps, version mismatches, release-tag drift)
//! are applied without prompting; destructive or creative repairs (writing a
//! new manifest) ask per issue, and a declined repair is recorded as skipped,
//! not retried.

use crate::backend::TagBackend;
use crate::config::NyronConfig;
use crate::error::Result;
use crate::manifest;
use crate::resolver::TagResolver;
use crate::store::{self, Meta, PackageInfo, Versions, Workspace};
use crate::ui;

/// Classification of a broken project path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathIssueKind {
    MissingDir,
    MissingManifest,
    InvalidManifest,
}

/// A configured project whose on-disk layout is broken.
#[derive(Debug, Clone)]
pub struct PathIssue {
    pub name: String,
    pub prefix: String,
    pub path: String,
    pub kind: PathIssueKind,
}

/// A package whose manifest and meta record disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMismatch {
    pub prefix: String,
    pub manifest_version: String,
    pub meta_version: String,
}

/// Drift between the newest global release tag and meta's record of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDrift {
    pub recorded: Option<String>,
    pub latest: String,
}

/// Everything the detect phase found.
#[derive(Debug, Clone, Default)]
pub struct DetectedIssues {
    pub path_issues: Vec<PathIssue>,
    pub orphaned_in_meta: Vec<String>,
    pub orphaned_in_versions: Vec<String>,
    pub missing_in_meta: Vec<String>,
    pub missing_in_versions: Vec<String>,
    pub version_mismatches: Vec<VersionMismatch>,
    pub latest_tag_mismatch: Option<TagDrift>,
}

impl DetectedIssues {
    pub fn is_clean(&self) -> bool {
        self.path_issues.is_empty()
            && self.orphaned_in_meta.is_empty()
            && self.orphaned_in_versions.is_empty()
            && self.missing_in_meta.is_empty()
            && self.missing_in_versions.is_empty()
            && self.version_mismatches.is_empty()
            && self.latest_tag_mismatch.is_none()
    }
}

/// Applied and skipped repairs, in order.
#[derive(Debug, Clone, Default)]
pub struct FixSummary {
    pub fixes: Vec<String>,
}

/// Phase 1: detect all issues without fixing anything.
pub fn detect(
    workspace: &Workspace,
    config: &NyronConfig,
    meta: &Meta,
    versions: &Versions,
    backend: &dyn TagBackend,
) -> DetectedIssues {
    let mut issues = DetectedIssues::default();

    for (name, project) in &config.projects {
        let dir = workspace.project_dir(&project.path);
        let kind = if !dir.is_dir() {
            Some(PathIssueKind::MissingDir)
        } else if !manifest::manifest_exists(&dir) {
            Some(PathIssueKind::MissingManifest)
        } else if !manifest::validate(&dir) {
            Some(PathIssueKind::InvalidManifest)
        } else {
            None
        };
        if let Some(kind) = kind {
            issues.path_issues.push(PathIssue {
                name: name.clone(),
                prefix: project.tag_prefix.clone(),
                path: project.path.clone(),
                kind,
            });
        }
    }

    let config_prefixes: Vec<&str> = config.tag_prefixes();

    for prefix in meta.prefixes() {
        if !config_prefixes.contains(&prefix) {
            issues.orphaned_in_meta.push(prefix.to_string());
        }
    }
    for prefix in versions.prefixes() {
        if !config_prefixes.contains(&prefix) {
            issues.orphaned_in_versions.push(prefix.to_string());
        }
    }

    for prefix in &config_prefixes {
        if meta.version_of(prefix).is_none() {
            issues.missing_in_meta.push(prefix.to_string());
        }
        if !versions.prefixes().contains(prefix) {
            issues.missing_in_versions.push(prefix.to_string());
        }
    }

    for project in config.projects.values() {
        let dir = workspace.project_dir(&project.path);
        if !manifest::validate(&dir) {
            continue;
        }
        if let (Ok(manifest_version), Some(meta_version)) = (
            manifest::read_version(&dir),
            meta.version_of(&project.tag_prefix),
        ) {
            if manifest_version != meta_version {
                issues.version_mismatches.push(VersionMismatch {
                    prefix: project.tag_prefix.clone(),
                    manifest_version,
                    meta_version: meta_version.to_string(),
                });
            }
        }
    }

    // Resolver failures here are not drift; a workspace without release tags
    // (or without a repository at all) is simply silent.
    let resolver = TagResolver::new(backend);
    if let Ok(Some(latest)) = resolver.latest_release_tag() {
        if meta.latest_tag.as_deref() != Some(latest.as_str()) {
            issues.latest_tag_mismatch = Some(TagDrift {
                recorded: meta.latest_tag.clone(),
                latest,
            });
        }
    }

    issues
}

/// Phase 2: apply every repair that needs no confirmation.
///
/// The ledgers are reconciled toward config + manifest: orphans removed,
/// gaps filled at the manifest-derived version (`0.0.0` when unreadable),
/// mismatches synced from the manifest, release-tag drift recorded.
pub fn auto_fix(
    workspace: &Workspace,
    config: &NyronConfig,
    issues: &DetectedIssues,
) -> Result<Vec<String>> {
    let mut fixes = Vec::new();

    for prefix in &issues.orphaned_in_meta {
        store::meta::remove_package(workspace, prefix)?;
        fixes.push(format!("Removed orphaned package \"{}\" from meta.json", prefix));
    }

    for prefix in &issues.orphaned_in_versions {
        store::versions::remove_package(workspace, prefix)?;
        fixes.push(format!(
            "Removed orphaned package \"{}\" from versions.json",
            prefix
        ));
    }

    for prefix in &issues.missing_in_meta {
        let version = manifest_version_or_default(workspace, config, prefix);
        store::meta::add_package(workspace, prefix, &version)?;
        fixes.push(format!(
            "Added missing package \"{}\" to meta.json with version {}",
            prefix, version
        ));
    }

    for prefix in &issues.missing_in_versions {
        let version = manifest_version_or_default(workspace, config, prefix);
        store::versions::append_package_version(
            workspace,
            PackageInfo {
                prefix: prefix.clone(),
                version: version.clone(),
                last_published: None,
            },
        )?;
        fixes.push(format!(
            "Added missing package \"{}\" to versions.json with version {}",
            prefix, version
        ));
    }

    for mismatch in &issues.version_mismatches {
        store::meta::set_package_version(workspace, &mismatch.prefix, &mismatch.manifest_version)?;
        fixes.push(format!(
            "Synced version for \"{}\": {} -> {}",
            mismatch.prefix, mismatch.meta_version, mismatch.manifest_version
        ));
    }

    if let Some(drift) = &issues.latest_tag_mismatch {
        store::meta::set_latest_tag(workspace, &drift.latest)?;
        fixes.push(format!(
            "Updated latest release tag: {} -> {}",
            drift.recorded.as_deref().unwrap_or("(not set)"),
            drift.latest
        ));
    }

    Ok(fixes)
}

fn manifest_version_or_default(
    workspace: &Workspace,
    config: &NyronConfig,
    prefix: &str,
) -> String {
    config
        .project_by_prefix(prefix)
        .and_then(|(_, project)| {
            manifest::read_version(&workspace.project_dir(&project.path)).ok()
        })
        .unwrap_or_else(|| "0.0.0".to_string())
}

/// Phase 3: ask about each destructive/creative path repair independently.
///
/// The confirmer is injected so the CLI can pass the interactive prompt and
/// tests can script answers.
pub fn prompt_path_issues(
    workspace: &Workspace,
    issues: &DetectedIssues,
    confirm: &mut dyn FnMut(&str) -> Result<bool>,
) -> Result<Vec<String>> {
    let mut fixes = Vec::new();

    for issue in &issues.path_issues {
        let (question, action): (String, &str) = match issue.kind {
            PathIssueKind::MissingDir => (
                format!(
                    "Path \"{}\" for project \"{}\" doesn't exist. Create directory with package.json?",
                    issue.path, issue.name
                ),
                "Created directory and package.json",
            ),
            PathIssueKind::MissingManifest => (
                format!(
                    "package.json missing at \"{}\" for project \"{}\". Create package.json with version 0.0.0?",
                    issue.path, issue.name
                ),
                "Created package.json",
            ),
            PathIssueKind::InvalidManifest => (
                format!(
                    "package.json at \"{}\" for project \"{}\" is missing the \"version\" field. Add version 0.0.0?",
                    issue.path, issue.name
                ),
                "Added version field to package.json",
            ),
        };

        if !confirm(&question)? {
            fixes.push(format!("Skipped repairing \"{}\"", issue.name));
            continue;
        }

        let dir = workspace.project_dir(&issue.path);
        let result = match issue.kind {
            PathIssueKind::MissingDir | PathIssueKind::MissingManifest => {
                manifest::create_manifest(&dir, &issue.name, "0.0.0")
            }
            PathIssueKind::InvalidManifest => manifest::write_version(&dir, "0.0.0"),
        };
        match result {
            Ok(()) => fixes.push(format!("{} for \"{}\" at {}", action, issue.name, issue.path)),
            Err(e) => {
                ui::display_warning(&format!("Could not repair \"{}\": {}", issue.name, e));
                fixes.push(format!("Skipped repairing \"{}\" ({})", issue.name, e));
            }
        }
    }

    Ok(fixes)
}

/// The full fix command: detect, auto-repair, prompt, summarize.
///
/// Ledger corruption surfaces before any repair is attempted.
pub fn fix(
    workspace: &Workspace,
    config: &NyronConfig,
    backend: &dyn TagBackend,
    confirm: &mut dyn FnMut(&str) -> Result<bool>,
) -> Result<FixSummary> {
    let meta = store::meta::read_meta(workspace)?;
    let versions = store::versions::read_versions(workspace)?;

    let issues = detect(workspace, config, &meta, &versions, backend);
    if issues.is_clean() {
        ui::display_success("No issues found! Your nyron setup is in good shape.");
        return Ok(FixSummary::default());
    }

    let mut fixes = auto_fix(workspace, config, &issues)?;
    fixes.extend(prompt_path_issues(workspace, &issues, confirm)?);

    Ok(FixSummary { fixes })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::config::parse_config;
    use chrono::Utc;

    fn config_ab() -> NyronConfig {
        parse_config(
            r#"
repo = "owner/repo"

[projects.a]
tag-prefix = "a@"
path = "packages/a"

[projects.b]
tag-prefix = "b@"
path = "packages/b"
"#,
        )
        .unwrap()
    }

    fn setup() -> (tempfile::TempDir, Workspace, MockBackend) {
        let dir = tempfile::tempdir().unwrap();
        let workspace = Workspace::new(dir.path());
        workspace.init(Utc::now()).unwrap();
        (dir, workspace, MockBackend::new())
    }

    #[test]
    fn test_detect_orphans_and_gaps() {
        let (_dir, ws, backend) = setup();
        let config = config_ab();
        manifest::create_manifest(&ws.project_dir("packages/a"), "a", "0.1.0").unwrap();
        manifest::create_manifest(&ws.project_dir("packages/b"), "b", "0.2.0").unwrap();

        // Meta knows a and c; config declares a and b.
        store::meta::add_package(&ws, "a@", "0.1.0").unwrap();
        store::meta::add_package(&ws, "c@", "9.9.9").unwrap();

        let meta = store::meta::read_meta(&ws).unwrap();
        let versions = store::versions::read_versions(&ws).unwrap();
        let issues = detect(&ws, &config, &meta, &versions, &backend);

        assert_eq!(issues.missing_in_meta, vec!["b@".to_string()]);
        assert_eq!(issues.orphaned_in_meta, vec!["c@".to_string()]);
        assert_eq!(
            issues.missing_in_versions,
            vec!["a@".to_string(), "b@".to_string()]
        );
        assert!(issues.path_issues.is_empty());
    }

    #[test]
    fn test_auto_fix_reconciles_ledgers() {
        let (_dir, ws, backend) = setup();
        let config = config_ab();
        manifest::create_manifest(&ws.project_dir("packages/a"), "a", "0.1.0").unwrap();
        // b has no manifest: the gap fills at 0.0.0.
        store::meta::add_package(&ws, "a@", "0.1.0").unwrap();
        store::meta::add_package(&ws, "c@", "9.9.9").unwrap();

        let meta = store::meta::read_meta(&ws).unwrap();
        let versions = store::versions::read_versions(&ws).unwrap();
        let issues = detect(&ws, &config, &meta, &versions, &backend);
        let fixes = auto_fix(&ws, &config, &issues).unwrap();

        let meta = store::meta::read_meta(&ws).unwrap();
        assert_eq!(meta.version_of("b@"), Some("0.0.0"));
        assert_eq!(meta.version_of("c@"), None);
        assert!(fixes.iter().any(|f| f.contains("Removed orphaned")));
        assert!(fixes.iter().any(|f| f.contains("Added missing")));
    }

    #[test]
    fn test_detect_version_mismatch_and_sync() {
        let (_dir, ws, backend) = setup();
        let config = config_ab();
        manifest::create_manifest(&ws.project_dir("packages/a"), "a", "0.5.0").unwrap();
        manifest::create_manifest(&ws.project_dir("packages/b"), "b", "0.2.0").unwrap();
        store::meta::add_package(&ws, "a@", "0.4.0").unwrap();
        store::meta::add_package(&ws, "b@", "0.2.0").unwrap();

        let meta = store::meta::read_meta(&ws).unwrap();
        let versions = store::versions::read_versions(&ws).unwrap();
        let issues = detect(&ws, &config, &meta, &versions, &backend);
        assert_eq!(
            issues.version_mismatches,
            vec![VersionMismatch {
                prefix: "a@".to_string(),
                manifest_version: "0.5.0".to_string(),
                meta_version: "0.4.0".to_string(),
            }]
        );

        auto_fix(&ws, &config, &issues).unwrap();
        assert_eq!(
            store::meta::read_meta(&ws).unwrap().version_of("a@"),
            Some("0.5.0")
        );
    }

    #[test]
    fn test_detect_release_tag_drift() {
        let (_dir, ws, backend) = setup();
        let config = config_ab();
        manifest::create_manifest(&ws.project_dir("packages/a"), "a", "0.1.0").unwrap();
        manifest::create_manifest(&ws.project_dir("packages/b"), "b", "0.1.0").unwrap();
        store::meta::add_package(&ws, "a@", "0.1.0").unwrap();
        store::meta::add_package(&ws, "b@", "0.1.0").unwrap();

        backend.set_first_commit("root");
        backend.add_tag("nyron-release@2024-01-15T143025.123Z");

        let meta = store::meta::read_meta(&ws).unwrap();
        let versions = store::versions::read_versions(&ws).unwrap();
        let issues = detect(&ws, &config, &meta, &versions, &backend);
        let drift = issues.latest_tag_mismatch.clone().unwrap();
        assert_eq!(drift.recorded, None);
        assert_eq!(drift.latest, "nyron-release@2024-01-15T143025.123Z");

        auto_fix(&ws, &config, &issues).unwrap();
        assert_eq!(
            store::meta::read_meta(&ws).unwrap().latest_tag.as_deref(),
            Some("nyron-release@2024-01-15T143025.123Z")
        );
    }

    #[test]
    fn test_path_issue_classification() {
        let (_dir, ws, backend) = setup();
        let config = config_ab();
        // a: directory with manifest lacking version; b: missing directory.
        std::fs::create_dir_all(ws.project_dir("packages/a")).unwrap();
        std::fs::write(
            ws.project_dir("packages/a").join("package.json"),
            "{\"name\": \"a\"}",
        )
        .unwrap();

        let meta = store::meta::read_meta(&ws).unwrap();
        let versions = store::versions::read_versions(&ws).unwrap();
        let issues = detect(&ws, &config, &meta, &versions, &backend);

        let kinds: Vec<(String, PathIssueKind)> = issues
            .path_issues
            .iter()
            .map(|i| (i.name.clone(), i.kind))
            .collect();
        assert!(kinds.contains(&("a".to_string(), PathIssueKind::InvalidManifest)));
        assert!(kinds.contains(&("b".to_string(), PathIssueKind::MissingDir)));
    }

    #[test]
    fn test_prompt_declined_records_skip() {
        let (_dir, ws, backend) = setup();
        let config = config_ab();
        let meta = store::meta::read_meta(&ws).unwrap();
        let versions = store::versions::read_versions(&ws).unwrap();
        let issues = detect(&ws, &config, &meta, &versions, &backend);

        let mut asked = 0;
        let fixes = prompt_path_issues(&ws, &issues, &mut |_q| {
            asked += 1;
            Ok(false)
        })
        .unwrap();

        // Both projects are missing; each prompt was independent.
        assert_eq!(asked, 2);
        assert!(fixes.iter().all(|f| f.starts_with("Skipped")));
        assert!(!ws.project_dir("packages/a").exists());
    }

    #[test]
    fn test_prompt_accepted_creates_manifest() {
        let (_dir, ws, backend) = setup();
        let config = config_ab();
        let meta = store::meta::read_meta(&ws).unwrap();
        let versions = store::versions::read_versions(&ws).unwrap();
        let issues = detect(&ws, &config, &meta, &versions, &backend);

        prompt_path_issues(&ws, &issues, &mut |_q| Ok(true)).unwrap();
        assert_eq!(
            manifest::read_version(&ws.project_dir("packages/a")).unwrap(),
            "0.0.0"
        );
    }

    #[test]
    fn test_fix_is_clean_on_consistent_state() {
        let (_dir, ws, backend) = setup();
        let config = config_ab();
        manifest::create_manifest(&ws.project_dir("packages/a"), "a", "0.1.0").unwrap();
        manifest::create_manifest(&ws.project_dir("packages/b"), "b", "0.2.0").unwrap();
        store::meta::add_package(&ws, "a@", "0.1.0").unwrap();
        store::meta::add_package(&ws, "b@", "0.2.0").unwrap();
        for (prefix, version) in [("a@", "0.1.0"), ("b@", "0.2.0")] {
            store::versions::append_package_version(
                &ws,
                PackageInfo {
                    prefix: prefix.to_string(),
                    version: version.to_string(),
                    last_published: None,
                },
            )
            .unwrap();
        }

        let summary = fix(&ws, &config, &backend, &mut |_| Ok(true)).unwrap();
        assert!(summary.fixes.is_empty());
    }

    #[test]
    fn test_fix_fails_on_corrupt_ledger() {
        let (_dir, ws, backend) = setup();
        let config = config_ab();
        std::fs::write(ws.meta_path(), "not json").unwrap();
        let err = fix(&ws, &config, &backend, &mut |_| Ok(true)).unwrap_err();
        assert!(matches!(err, crate::error::NyronError::CorruptLedger(_)));
    }
}
