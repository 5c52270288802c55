use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::error::{NyronError, Result};

/// Per-project configuration for versioning and tagging.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ProjectConfig {
    /// Prefix for git tags (e.g. "sdk@", "@my-scope/cli@")
    pub tag_prefix: String,

    /// Path to the project directory relative to the repo root
    pub path: String,
}

/// Complete nyron configuration.
///
/// Loaded from a declarative `nyron.toml` file — configuration is data, never
/// an executed module. Projects are keyed by a display name; lookups inside
/// the engine go through the tag prefix.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(rename_all = "kebab-case")]
pub struct NyronConfig {
    /// Repository identifier in "owner/repo" format
    pub repo: String,

    /// Project configurations keyed by project name
    pub projects: BTreeMap<String, ProjectConfig>,

    /// Generate and commit a changelog during bump
    #[serde(default = "default_true")]
    pub auto_changelog: bool,

    /// Remind the user to push after a bump completes
    #[serde(default = "default_true")]
    pub on_push_reminder: bool,
}

fn default_true() -> bool {
    true
}

impl NyronConfig {
    /// Find the project whose tag prefix matches, together with its name.
    pub fn project_by_prefix(&self, prefix: &str) -> Option<(&str, &ProjectConfig)> {
        self.projects
            .iter()
            .find(|(_, p)| p.tag_prefix == prefix)
            .map(|(name, p)| (name.as_str(), p))
    }

    /// All configured tag prefixes, in stable order.
    pub fn tag_prefixes(&self) -> Vec<&str> {
        self.projects.values().map(|p| p.tag_prefix.as_str()).collect()
    }

    /// Structural validation beyond what serde enforces.
    pub fn validate(&self) -> Result<()> {
        if self.repo.trim().is_empty() {
            return Err(NyronError::config(
                "missing 'repo' field — expected \"owner/repo\"",
            ));
        }
        if self.repo.split('/').filter(|s| !s.is_empty()).count() != 2 {
            return Err(NyronError::config(format!(
                "invalid 'repo' value '{}' — expected \"owner/repo\"",
                self.repo
            )));
        }
        if self.projects.is_empty() {
            return Err(NyronError::config(
                "no projects defined — at least one [projects.<name>] is required",
            ));
        }
        for (name, project) in &self.projects {
            if project.tag_prefix.trim().is_empty() {
                return Err(NyronError::config(format!(
                    "project '{}' has an empty tag-prefix",
                    name
                )));
            }
            if project.path.trim().is_empty() {
                return Err(NyronError::config(format!(
                    "project '{}' has an empty path",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Loads configuration from a file.
///
/// Resolution order:
/// 1. Explicit path provided as parameter
/// 2. `nyron.toml` in the current directory
/// 3. `nyron.toml` in the user config directory
///
/// Unlike tools with usable zero-config defaults, nyron cannot run without a
/// config: it names the repository and the projects to manage.
///
/// # Arguments
/// * `config_path` - Optional path to a custom configuration file
///
/// # Returns
/// * `Ok(NyronConfig)` - Loaded and validated configuration
/// * `Err` - If no file is found, or a file exists but cannot be parsed
pub fn load_config(config_path: Option<&Path>) -> Result<NyronConfig> {
    let config_str = if let Some(path) = config_path {
        fs::read_to_string(path)?
    } else if Path::new("./nyron.toml").exists() {
        fs::read_to_string("./nyron.toml")?
    } else if let Some(config_dir) = dirs::config_dir() {
        let fallback = config_dir.join("nyron.toml");
        if fallback.exists() {
            fs::read_to_string(fallback)?
        } else {
            return Err(NyronError::config("configuration file not found"));
        }
    } else {
        return Err(NyronError::config("configuration file not found"));
    };

    parse_config(&config_str)
}

/// Parse and validate a TOML configuration string.
pub fn parse_config(config_str: &str) -> Result<NyronConfig> {
    let config: NyronConfig = toml::from_str(config_str)
        .map_err(|e| NyronError::config(format!("failed to parse nyron.toml: {}", e)))?;
    config.validate()?;
    Ok(config)
}

/// Starter configuration written by `nyron init`.
pub fn sample_config() -> &'static str {
    r#"repo = "owner/repo"
auto-changelog = true
on-push-reminder = true

[projects.sdk]
tag-prefix = "sdk@"
path = "packages/sdk"
"#
}
