//! Tag codec: pure parse/build functions for the two tag shapes nyron owns.
//!
//! Project release tags are `<prefix><semver>` where the prefix itself may
//! contain `@` (scoped packages). Global release markers are
//! `nyron-release@<UTC timestamp>` with colons stripped, since colons are not
//! legal in git refnames.

use chrono::{DateTime, NaiveDateTime, Utc};
use semver::Version;

use crate::error::{NyronError, Result};

/// Prefix of the global date-stamped release marker.
pub const RELEASE_TAG_PREFIX: &str = "nyron-release";

const RELEASE_STAMP_FORMAT: &str = "%Y-%m-%dT%H%M%S%.3fZ";

/// Components of a parsed project release tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagParts {
    pub prefix: String,
    pub version: String,
    pub prerelease: bool,
}

/// Parses a tag string into its prefix and version components.
///
/// Splits at the *last* `@` so scoped prefixes keep their own `@`:
/// - `"@erebus-sh/sdk@0.0.179"` → prefix `"@erebus-sh/sdk@"`, version `"0.0.179"`
/// - `"sdk@0.0.179"` → prefix `"sdk@"`, version `"0.0.179"`
///
/// # Returns
/// * `Ok(Some(TagParts))` - Parsed prefix/version/prerelease flag
/// * `Ok(None)` - The tag contains no `@` at all
/// * `Err(InvalidVersion)` - The suffix after the last `@` is not valid semver
pub fn parse_tag(tag: &str) -> Result<Option<TagParts>> {
    let last_at = match tag.rfind('@') {
        Some(idx) => idx,
        None => return Ok(None),
    };

    let prefix = &tag[..=last_at];
    let version = &tag[last_at + 1..];

    if Version::parse(version).is_err() {
        return Err(NyronError::invalid_version(format!(
            "tag '{}' does not end in a semantic version",
            tag
        )));
    }

    Ok(Some(TagParts {
        prefix: prefix.to_string(),
        version: version.to_string(),
        prerelease: super::semver::is_beta(version),
    }))
}

/// Constructs a tag string from a prefix and a semantic version.
///
/// Inverse of [parse_tag]; rejects invalid semver instead of emitting a tag
/// that could never be parsed back.
pub fn build_tag(prefix: &str, version: &str) -> Result<String> {
    if Version::parse(version).is_err() {
        return Err(NyronError::invalid_version(version.to_string()));
    }
    Ok(format!("{}{}", prefix, version))
}

/// Generates a global release marker for the given instant.
///
/// The timestamp keeps millisecond resolution, so tags generated in sequence
/// sort (and compare) monotonically. The clock value is a parameter so
/// callers stay deterministic under test.
pub fn generate_release_tag(now: DateTime<Utc>) -> String {
    format!(
        "{}@{}",
        RELEASE_TAG_PREFIX,
        now.format(RELEASE_STAMP_FORMAT)
    )
}

/// Parses a global release marker back into its embedded timestamp.
///
/// Returns `None` on prefix mismatch or an unparsable date — never errors,
/// because arbitrary tags flow through here during release-tag resolution.
pub fn parse_release_tag(tag: &str) -> Option<DateTime<Utc>> {
    let stamp = tag.strip_prefix(RELEASE_TAG_PREFIX)?.strip_prefix('@')?;
    NaiveDateTime::parse_from_str(stamp, RELEASE_STAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
