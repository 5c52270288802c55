//! Semantic-version rules on top of the `semver` crate.
//!
//! Increment semantics follow the node-semver conventions the rest of the
//! ecosystem expects: bumping major/minor/patch on a prerelease *finalizes*
//! it instead of over-incrementing, and prerelease bumps ride a `beta`
//! channel.

use semver::{Prerelease, Version};
use std::fmt;
use std::str::FromStr;

use crate::error::{NyronError, Result};

/// The kind of version increment to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpType {
    Major,
    Minor,
    Patch,
    Prerelease,
}

impl fmt::Display for BumpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BumpType::Major => write!(f, "major"),
            BumpType::Minor => write!(f, "minor"),
            BumpType::Patch => write!(f, "patch"),
            BumpType::Prerelease => write!(f, "prerelease"),
        }
    }
}

impl FromStr for BumpType {
    type Err = NyronError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "major" => Ok(BumpType::Major),
            "minor" => Ok(BumpType::Minor),
            "patch" => Ok(BumpType::Patch),
            "prerelease" | "pre" | "beta" => Ok(BumpType::Prerelease),
            other => Err(NyronError::invalid_version(format!(
                "unknown bump type '{}'",
                other
            ))),
        }
    }
}

fn parse(version: &str) -> Result<Version> {
    Version::parse(version).map_err(|_| NyronError::invalid_version(version.to_string()))
}

/// Increments a semantic version string according to the bump type.
///
/// - `major`/`minor`/`patch` behave like `semver.inc`: a prerelease version is
///   finalized first (`1.0.1-beta.0` + patch → `1.0.1`), a stable version is
///   incremented with lower components reset.
/// - `prerelease` increments the trailing numeric identifier of an existing
///   prerelease, or moves a stable version to `<patch+1>-beta.0`.
///
/// # Example
/// ```ignore
/// bump_version("0.1.2", BumpType::Patch)?;       // "0.1.3"
/// bump_version("0.1.2", BumpType::Prerelease)?;  // "0.1.3-beta.0"
/// bump_version("0.1.3-beta.1", BumpType::Prerelease)?; // "0.1.3-beta.2"
/// ```
pub fn bump_version(version: &str, bump: BumpType) -> Result<String> {
    let v = parse(version)?;
    let bumped = match bump {
        BumpType::Major => {
            if !v.pre.is_empty() && v.minor == 0 && v.patch == 0 {
                Version::new(v.major, 0, 0)
            } else {
                Version::new(v.major + 1, 0, 0)
            }
        }
        BumpType::Minor => {
            if !v.pre.is_empty() && v.patch == 0 {
                Version::new(v.major, v.minor, 0)
            } else {
                Version::new(v.major, v.minor + 1, 0)
            }
        }
        BumpType::Patch => {
            if !v.pre.is_empty() {
                Version::new(v.major, v.minor, v.patch)
            } else {
                Version::new(v.major, v.minor, v.patch + 1)
            }
        }
        BumpType::Prerelease => {
            if v.pre.is_empty() {
                let mut next = Version::new(v.major, v.minor, v.patch + 1);
                next.pre = Prerelease::new("beta.0").expect("static prerelease is valid");
                next
            } else {
                let mut next = Version::new(v.major, v.minor, v.patch);
                next.pre = increment_prerelease(v.pre.as_str());
                next
            }
        }
    };
    Ok(bumped.to_string())
}

/// Bump the trailing numeric identifier of a prerelease, or append `.0` when
/// there is none (`beta` → `beta.0`, `beta.1` → `beta.2`).
fn increment_prerelease(pre: &str) -> Prerelease {
    let mut parts: Vec<String> = pre.split('.').map(str::to_string).collect();
    match parts.last().and_then(|p| p.parse::<u64>().ok()) {
        Some(n) => {
            let last = parts.len() - 1;
            parts[last] = (n + 1).to_string();
        }
        None => parts.push("0".to_string()),
    }
    Prerelease::new(&parts.join(".")).expect("incremented prerelease stays valid")
}

/// Is `a` strictly newer than `b` under semver precedence?
pub fn is_newer(a: &str, b: &str) -> Result<bool> {
    Ok(parse(a)? > parse(b)?)
}

/// Is `a` strictly older than `b` under semver precedence?
pub fn is_older(a: &str, b: &str) -> Result<bool> {
    Ok(parse(a)? < parse(b)?)
}

/// Does the version carry a `beta` prerelease identifier?
///
/// Returns false for unparsable input — callers use this as a classification,
/// not a validation.
pub fn is_beta(version: &str) -> bool {
    match Version::parse(version) {
        Ok(v) => v
            .pre
            .as_str()
            .split('.')
            .any(|part| part.to_lowercase().contains("beta")),
        Err(_) => false,
    }
}

/// Transitions a stable version into its beta prerelease.
///
/// Idempotent: a version that already has prerelease identifiers is returned
/// unchanged; a stable version becomes `<patch+1>-beta.0`.
pub fn enter_beta(version: &str) -> Result<String> {
    let v = parse(version)?;
    if !v.pre.is_empty() {
        return Ok(version.to_string());
    }
    bump_version(version, BumpType::Prerelease)
}
