//! Commit classification: conventional-commit parsing, changelog grouping,
//! and filtering of the engine's own bookkeeping commits.

use regex::Regex;
use std::collections::BTreeMap;

/// Scope bucket used when a commit has no scope of its own.
pub const GENERAL_SCOPE: &str = "general";

/// A raw commit as reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitRecord {
    pub hash: String,
    pub message: String,
    pub author: String,
    pub repo: String,
    pub github_user: Option<String>,
    pub url: Option<String>,
    pub affected_folders: Vec<String>,
}

impl CommitRecord {
    /// Convenience constructor for the common fields.
    pub fn new(
        hash: impl Into<String>,
        message: impl Into<String>,
        author: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        CommitRecord {
            hash: hash.into(),
            message: message.into(),
            author: author.into(),
            repo: repo.into(),
            github_user: None,
            url: None,
            affected_folders: Vec::new(),
        }
    }
}

/// A commit after conventional-commit classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommit {
    pub kind: String,
    pub scope: Option<String>,
    pub message: String,
    pub raw: String,
    pub author: String,
    pub hash: String,
    pub repo: String,
    pub github_user: Option<String>,
    pub url: Option<String>,
    pub affected_folders: Vec<String>,
}

/// Classified commits: category → (scope | "general") → commits, commit
/// order preserved within each scope.
pub type ParsedCommits = BTreeMap<String, BTreeMap<String, Vec<ParsedCommit>>>;

/// Changelog buckets after flattening.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Organized {
    pub features: Vec<String>,
    pub fixes: Vec<String>,
    pub chores: Vec<String>,
}

/// Normalize a matched commit type into its canonical changelog category.
///
/// A matched-but-unrecognized type becomes capitalized "Other"; this is
/// distinct from the lowercase "other" bucket reserved for commits that do
/// not match the conventional grammar at all.
fn normalize_kind(kind: &str) -> &'static str {
    match kind {
        "feat" => "Features",
        "fix" => "Bug Fixes",
        "refactor" => "Refactors",
        "perf" => "Performance",
        "docs" => "Docs",
        "chore" => "Chores",
        "test" => "Tests",
        "style" => "Style",
        _ => "Other",
    }
}

/// Parse commits into structured groups.
///
/// `feat(sdk): add caching` → category "Features", scope "sdk", message
/// "add caching". Commits that do not match the grammar land in
/// `other/general` with their full trimmed message.
pub fn parse_commits(commits: &[CommitRecord]) -> ParsedCommits {
    let grammar = Regex::new(r"^(\w+)(?:\(([^)]+)\))?:\s*(.+)$").expect("static regex is valid");
    let mut groups: ParsedCommits = BTreeMap::new();

    for commit in commits {
        let raw = commit.message.trim().to_string();

        let (kind, scope, message) = match grammar.captures(&raw) {
            Some(caps) => {
                let kind = normalize_kind(caps.get(1).map(|m| m.as_str()).unwrap_or_default());
                let scope = caps.get(2).map(|m| m.as_str().to_string());
                let message = caps
                    .get(3)
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default();
                (kind.to_string(), scope, message)
            }
            None => ("other".to_string(), None, raw.clone()),
        };

        let scope_key = scope.clone().unwrap_or_else(|| GENERAL_SCOPE.to_string());
        groups
            .entry(kind.clone())
            .or_default()
            .entry(scope_key.clone())
            .or_default()
            .push(ParsedCommit {
                kind,
                scope: Some(scope_key),
                message,
                raw,
                author: commit.author.clone(),
                hash: commit.hash.clone(),
                repo: commit.repo.clone(),
                github_user: commit.github_user.clone(),
                url: commit.url.clone(),
                affected_folders: commit.affected_folders.clone(),
            });
    }
    groups
}

/// Render one changelog line for a classified commit.
///
/// Shape: `[**scope**: ]message (author-or-@handle) [[shortHash](url)]`.
/// The scope label is omitted for the general bucket, the remote handle wins
/// over the raw author name, and the URL falls back to the canonical
/// commit URL for the repo.
fn format_line(commit: &ParsedCommit) -> String {
    let scope_label = match commit.scope.as_deref() {
        Some(scope) if scope != GENERAL_SCOPE => format!("**{}**: ", scope),
        _ => String::new(),
    };
    let who = match &commit.github_user {
        Some(handle) => format!("@{}", handle),
        None => commit.author.clone(),
    };
    let short_hash = if commit.hash.len() > 7 {
        &commit.hash[..7]
    } else {
        commit.hash.as_str()
    };
    let url = commit.url.clone().unwrap_or_else(|| {
        format!("https://github.com/{}/commit/{}", commit.repo, commit.hash)
    });

    format!(
        "{}{} ({}) [[{}]({})]",
        scope_label, commit.message, who, short_hash, url
    )
}

/// Flatten classified commits into the three changelog sections.
///
/// Features and Bug Fixes map one-to-one; every other category — including
/// both "Other" and the grammar-miss "other" bucket — folds into chores.
pub fn organize_for_changelog(parsed: &ParsedCommits) -> Organized {
    let mut organized = Organized::default();

    for (kind, scopes) in parsed {
        let target = match kind.as_str() {
            "Features" => &mut organized.features,
            "Bug Fixes" => &mut organized.fixes,
            _ => &mut organized.chores,
        };
        for commits in scopes.values() {
            for commit in commits {
                target.push(format_line(commit));
            }
        }
    }
    organized
}

/// Message prefixes that mark a commit as produced by nyron itself.
const META_COMMIT_PREFIXES: &[&str] = &["chore(release):", "chore(changelog):", "changelog:"];

fn is_meta_commit(message: &str) -> bool {
    let lowered = message.trim().to_lowercase();
    if lowered.contains("bump") && lowered.contains("version") {
        return true;
    }
    META_COMMIT_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
}

/// Drop version-bump and changelog commits so the engine's own bookkeeping
/// never pollutes the next changelog.
pub fn filter_meta_commits(commits: &[CommitRecord]) -> Vec<CommitRecord> {
    commits
        .iter()
        .filter(|c| !is_meta_commit(&c.message))
        .cloned()
        .collect()
}
