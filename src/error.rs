use thiserror::Error;

/// Unified error type for nyron operations
///
/// Variants map onto five broad conditions: something was not found
/// (project/tag/commits), something failed validation (versions, manifests,
/// config, ledgers), something already exists (tag collisions), an external
/// call failed (git, remote host, filesystem), or the user declined a prompt.
#[derive(Error, Debug)]
pub enum NyronError {
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("No release tag found for prefix '{0}'")]
    NoPriorTag(String),

    #[error("No new commits since {0}")]
    NoCommits(String),

    #[error("Only version bump and changelog commits found since {0}")]
    OnlyMetaCommits(String),

    #[error("Invalid semantic version: {0}")]
    InvalidVersion(String),

    #[error("Invalid package manifest: {0}")]
    InvalidManifest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ledger corrupted: {0}")]
    CorruptLedger(String),

    #[error("Tag already exists: {0}")]
    TagAlreadyExists(String),

    #[error("Repository has no commits: {0}")]
    EmptyHistory(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Aborted by user: {0}")]
    Aborted(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results in nyron
pub type Result<T> = std::result::Result<T, NyronError>;

impl NyronError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        NyronError::Config(msg.into())
    }

    /// Create an invalid-version error with context
    pub fn invalid_version(msg: impl Into<String>) -> Self {
        NyronError::InvalidVersion(msg.into())
    }

    /// Create an invalid-manifest error with context
    pub fn invalid_manifest(msg: impl Into<String>) -> Self {
        NyronError::InvalidManifest(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        NyronError::Remote(msg.into())
    }

    /// Create a corrupt-ledger error with context
    pub fn corrupt_ledger(msg: impl Into<String>) -> Self {
        NyronError::CorruptLedger(msg.into())
    }

    /// An actionable next step for the user, when one exists.
    ///
    /// Printed under the one-line cause by the CLI before exiting non-zero.
    pub fn remediation(&self) -> Option<&'static str> {
        match self {
            NyronError::ProjectNotFound(_) => {
                Some("Add the project to nyron.toml or check the prefix spelling")
            }
            NyronError::NoPriorTag(_) => {
                Some("Create the first tag with: nyron tag --prefix <prefix> --version 0.0.1")
            }
            NyronError::NoCommits(_) => Some("Make some changes and commit them before bumping"),
            NyronError::OnlyMetaCommits(_) => {
                Some("Add feature, fix, or other meaningful commits before bumping")
            }
            NyronError::InvalidVersion(_) => {
                Some("Version must follow semver format (e.g. 1.0.0)")
            }
            NyronError::InvalidManifest(_) => Some("Run 'nyron fix' to repair package manifests"),
            NyronError::Config(_) => Some("Run 'nyron init' to create a configuration file"),
            NyronError::CorruptLedger(_) => {
                Some("Restore .nyron/meta.json and .nyron/versions.json from version control")
            }
            NyronError::TagAlreadyExists(_) => {
                Some("Bump again to compute a fresh version, or delete the stale tag")
            }
            NyronError::EmptyHistory(_) => Some("Make at least one commit before tagging"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = NyronError::config("missing repo field");
        assert_eq!(err.to_string(), "Configuration error: missing repo field");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: NyronError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_error_constructors() {
        assert!(NyronError::invalid_version("x")
            .to_string()
            .contains("Invalid semantic version"));
        assert!(NyronError::remote("x").to_string().contains("Remote"));
        assert!(NyronError::corrupt_ledger("x")
            .to_string()
            .contains("Ledger corrupted"));
        assert!(NyronError::Aborted("fix declined".to_string())
            .to_string()
            .starts_with("Aborted by user"));
    }

    #[test]
    fn test_distinct_commit_conditions() {
        // The two empty-commit-set failures must stay distinguishable.
        let none = NyronError::NoCommits("sdk@0.0.1".to_string());
        let meta_only = NyronError::OnlyMetaCommits("sdk@0.0.1".to_string());
        assert_ne!(none.to_string(), meta_only.to_string());
        assert!(matches!(none, NyronError::NoCommits(_)));
        assert!(matches!(meta_only, NyronError::OnlyMetaCommits(_)));
    }

    #[test]
    fn test_remediation_present_for_validate_failures() {
        let errors = vec![
            NyronError::ProjectNotFound("sdk@".to_string()),
            NyronError::NoPriorTag("sdk@".to_string()),
            NyronError::NoCommits("sdk@0.0.1".to_string()),
            NyronError::OnlyMetaCommits("sdk@0.0.1".to_string()),
            NyronError::invalid_manifest("no version field"),
            NyronError::TagAlreadyExists("sdk@0.0.2".to_string()),
        ];
        for err in errors {
            assert!(err.remediation().is_some(), "no hint for {}", err);
        }
    }

    #[test]
    fn test_remediation_absent_for_external_failures() {
        let err: NyronError =
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
        assert!(err.remediation().is_none());
    }
}
